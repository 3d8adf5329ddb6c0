//! Page sources for the harvester.
//!
//! [`ProfileSource`] hides how pages are fetched so orchestration can be
//! exercised against canned HTML. [`HttpProfileSource`] is the live
//! implementation: blocking HTTP with retries and a circuit breaker.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::error::HarvestError;

/// Longest `Retry-After` the source will sit out before giving up on a URL.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

pub trait ProfileSource: Send + Sync {
    fn name(&self) -> &str;

    /// HTML of leaderboard page `page`.
    fn leaderboard_page(&self, page: u32) -> Result<String, HarvestError>;

    /// HTML of an athlete profile.
    fn profile_page(&self, url: &str) -> Result<String, HarvestError>;

    /// False once the source refuses further requests.
    fn is_available(&self) -> bool;
}

pub struct HttpProfileSource {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    /// Leaderboard URL with a `{page}` placeholder.
    leaderboard_template: String,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpProfileSource {
    pub fn new(
        leaderboard_template: impl Into<String>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, HarvestError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| HarvestError::Client(e.to_string()))?;

        Ok(Self {
            client,
            circuit_breaker,
            leaderboard_template: leaderboard_template.into(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn leaderboard_url(&self, page: u32) -> String {
        self.leaderboard_template.replace("{page}", &page.to_string())
    }

    fn get_with_retry(&self, url: &str) -> Result<String, HarvestError> {
        let mut last_error = None;
        let mut retry_after = Duration::ZERO;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = (self.base_delay * 2u32.pow(attempt - 1)).max(retry_after);
                debug!(url, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                std::thread::sleep(delay);
            }
            if !self.circuit_breaker.is_allowed() {
                return Err(HarvestError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(HarvestError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(HarvestError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(HarvestError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let header = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok());
                let retry_after_secs = header.unwrap_or(MAX_RETRY_AFTER.as_secs());
                warn!(url, retry_after_secs, "rate limited");
                if Duration::from_secs(retry_after_secs) > MAX_RETRY_AFTER {
                    return Err(HarvestError::RateLimited { retry_after_secs });
                }
                retry_after = header.map_or(Duration::ZERO, Duration::from_secs);
                last_error = Some(HarvestError::RateLimited { retry_after_secs });
                continue;
            }
            if status.is_server_error() {
                self.circuit_breaker.record_failure();
                last_error = Some(HarvestError::HttpStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
                continue;
            }
            if !status.is_success() {
                return Err(HarvestError::HttpStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let body = resp
                .text()
                .map_err(|e| HarvestError::NetworkUnreachable(e.to_string()))?;
            self.circuit_breaker.record_success();
            return Ok(body);
        }

        Err(last_error.unwrap_or_else(|| HarvestError::NetworkUnreachable("max retries exceeded".into())))
    }
}

impl ProfileSource for HttpProfileSource {
    fn name(&self) -> &str {
        "http"
    }

    fn leaderboard_page(&self, page: u32) -> Result<String, HarvestError> {
        self.get_with_retry(&self.leaderboard_url(page))
    }

    fn profile_page(&self, url: &str) -> Result<String, HarvestError> {
        self.get_with_retry(url)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::DEFAULT_COOLDOWN;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Local server answering every request with the same status line and
    /// extra headers. Returns its base URL and a request counter.
    fn canned_server(status: &'static str, headers: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let body = "<html></html>";
                let response = format!(
                    "HTTP/1.1 {status}\r\n{headers}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn local_source(base: &str, breaker: Arc<CircuitBreaker>) -> HttpProfileSource {
        let mut src = HttpProfileSource::new(format!("{base}/leaderboard?page={{page}}"), breaker).unwrap();
        src.client = reqwest::blocking::Client::builder().no_proxy().build().unwrap();
        src.base_delay = Duration::from_millis(1);
        src
    }

    #[test]
    fn ok_response_returns_body() {
        let (base, hits) = canned_server("200 OK", "");
        let src = local_source(&base, Arc::new(CircuitBreaker::default()));
        assert_eq!(src.leaderboard_page(1).unwrap(), "<html></html>");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(src.is_available());
    }

    #[test]
    fn forbidden_trips_breaker_on_first_hit() {
        let (base, hits) = canned_server("403 Forbidden", "");
        let src = local_source(&base, Arc::new(CircuitBreaker::default()));
        assert!(matches!(
            src.profile_page(&format!("{base}/athlete/1")),
            Err(HarvestError::CircuitBreakerTripped)
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!src.is_available());
    }

    #[test]
    fn server_errors_are_retried_until_breaker_opens() {
        let (base, hits) = canned_server("503 Service Unavailable", "");
        let src = local_source(&base, Arc::new(CircuitBreaker::default()));
        assert!(matches!(
            src.leaderboard_page(1),
            Err(HarvestError::CircuitBreakerTripped)
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert!(!src.is_available());
    }

    #[test]
    fn server_error_below_threshold_reports_status() {
        let (base, hits) = canned_server("500 Internal Server Error", "");
        let src = local_source(&base, Arc::new(CircuitBreaker::new(DEFAULT_COOLDOWN, 10)));
        assert!(matches!(
            src.leaderboard_page(1),
            Err(HarvestError::HttpStatus { status: 500, .. })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 4);
        assert!(src.is_available());
    }

    #[test]
    fn not_found_is_not_retried() {
        let (base, hits) = canned_server("404 Not Found", "");
        let src = local_source(&base, Arc::new(CircuitBreaker::default()));
        assert!(matches!(
            src.profile_page(&format!("{base}/athlete/2")),
            Err(HarvestError::HttpStatus { status: 404, .. })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(src.is_available());
    }

    #[test]
    fn rate_limit_waits_for_retry_after() {
        let (base, hits) = canned_server("429 Too Many Requests", "Retry-After: 1\r\n");
        let src = local_source(&base, Arc::new(CircuitBreaker::new(DEFAULT_COOLDOWN, 10)));
        let started = std::time::Instant::now();
        assert!(matches!(
            src.leaderboard_page(1),
            Err(HarvestError::RateLimited { retry_after_secs: 1 })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 4);
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[test]
    fn long_retry_after_gives_up_at_once() {
        let (base, hits) = canned_server("429 Too Many Requests", "Retry-After: 3600\r\n");
        let src = local_source(&base, Arc::new(CircuitBreaker::default()));
        assert!(matches!(
            src.leaderboard_page(1),
            Err(HarvestError::RateLimited { retry_after_secs: 3600 })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(src.is_available());
    }

    #[test]
    fn leaderboard_url_substitutes_page() {
        let src = HttpProfileSource::new(
            "https://example.test/leaderboard?page={page}",
            Arc::new(CircuitBreaker::default()),
        )
        .unwrap();
        assert_eq!(src.leaderboard_url(101), "https://example.test/leaderboard?page=101");
    }

    #[test]
    fn tripped_breaker_refuses_without_network() {
        let cb = Arc::new(CircuitBreaker::default());
        cb.trip();
        let src = HttpProfileSource::new("http://127.0.0.1:9/{page}", Arc::clone(&cb)).unwrap();
        assert!(!src.is_available());
        assert!(matches!(
            src.leaderboard_page(1),
            Err(HarvestError::CircuitBreakerTripped)
        ));
    }
}
