//! Report boundary: the combined percentile/histogram result, the request
//! error taxonomy, and the JSON body + status a web layer would emit.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::percentile::validate_score;
use crate::registry::WorkoutDefinition;

/// Per-request failures. All are recoverable at the request boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReportError {
    #[error("workout '{id}' not found")]
    UnknownWorkout { id: String },

    #[error("no valid data for '{workout}' with the selected filter")]
    NoData { workout: String },

    #[error("invalid score: {reason}")]
    InvalidScore { reason: String },
}

impl ReportError {
    /// HTTP-style status for the error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownWorkout { .. } => 404,
            Self::NoData { .. } => 500,
            Self::InvalidScore { .. } => 400,
        }
    }

    /// Message shown to the end user.
    pub fn public_message(&self) -> String {
        match self {
            Self::UnknownWorkout { .. } => "Workout not found.".into(),
            Self::NoData { workout } => {
                format!("No valid data for '{workout}' with the selected filter.")
            }
            Self::InvalidScore { .. } => "Invalid score provided.".into(),
        }
    }
}

/// Successful percentile request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileReport {
    pub user_score: f64,
    /// Direction-adjusted percentile, rounded half-to-even.
    pub percentile: u32,
    pub config: WorkoutDefinition,
    pub chart_labels: Vec<String>,
    pub chart_data: Vec<u64>,
    /// Size of the cleaned population the score was ranked against.
    #[serde(skip)]
    pub population: usize,
}

/// What the thin JSON layer sends back: a status code and a body.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportResponse {
    pub status: u16,
    pub body: Value,
}

impl ReportResponse {
    pub fn from_result(result: &Result<PercentileReport, ReportError>) -> Self {
        match result {
            Ok(report) => Self::success(report),
            Err(e) => Self {
                status: e.status_code(),
                body: json!({ "error": e.public_message() }),
            },
        }
    }

    /// `200` with the serialized value, or `500` if it cannot be serialized.
    pub fn success<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self { status: 200, body },
            Err(e) => {
                error!(error = %e, "failed to serialize response body");
                Self {
                    status: 500,
                    body: json!({ "error": "Internal server error." }),
                }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Parse a user score from text. Non-numeric, non-finite and non-positive
/// inputs are rejected.
pub fn parse_score(text: &str) -> Result<f64, ReportError> {
    let trimmed = text.trim();
    let value: f64 = trimmed.parse().map_err(|_| ReportError::InvalidScore {
        reason: format!("'{trimmed}' is not a number"),
    })?;
    validate_score(value)
}

/// Extract a user score from a request body field. Accepts a JSON number or
/// a numeric string; a missing field is invalid.
pub fn score_from_json(value: Option<&Value>) -> Result<f64, ReportError> {
    match value {
        Some(Value::Number(n)) => {
            let v = n.as_f64().ok_or_else(|| ReportError::InvalidScore {
                reason: format!("{n} is not representable"),
            })?;
            validate_score(v)
        }
        Some(Value::String(s)) => parse_score(s),
        Some(other) => Err(ReportError::InvalidScore {
            reason: format!("unsupported score value {other}"),
        }),
        None => Err(ReportError::InvalidScore {
            reason: "score is missing".into(),
        }),
    }
}
