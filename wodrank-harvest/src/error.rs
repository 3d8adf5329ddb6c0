use std::path::PathBuf;
use thiserror::Error;

/// Failures while harvesting. Page and profile errors are logged and skipped
/// by the orchestrator; only the circuit breaker stops a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by leaderboard site (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("hard stop: leaderboard site has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("page at {url} is not an athlete profile")]
    NotAProfile { url: String },

    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("output file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
