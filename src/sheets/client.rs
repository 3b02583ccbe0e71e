//! Google Sheets v4 `values` reads with retry and bounded parallelism

use crate::error::{Result, TerritoryError};
use rayon::prelude::*;
use serde::Deserialize;
use std::thread;
use std::time::Duration;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/";

/// Default number of concurrent range requests
pub const DEFAULT_MAX_CONCURRENCY: usize = 6;

/// Retry-with-backoff for transient HTTP failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based); doubles each time
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// attempts run out
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    log::warn!(
                        "{}: {} (attempt {}/{}), retrying in {:?}",
                        what,
                        e,
                        attempt,
                        self.max_attempts,
                        delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Cells of a `values.get` response body as strings
pub fn parse_value_range(body: &str) -> Result<Vec<Vec<String>>> {
    let range: ValueRange = serde_json::from_str(body)?;
    Ok(range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(value_to_string).collect())
        .collect())
}

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Read-only client for spreadsheet values, authenticated with an API key
pub struct SheetsClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: Url,
    retry: RetryPolicy,
}

impl SheetsClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("territory-analytics/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TerritoryError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| TerritoryError::Sheets(format!("Invalid base URL: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url,
            retry: RetryPolicy::default(),
        })
    }

    /// Point the client at a different host (a proxy or a test server)
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Url::parse(base_url)
            .map_err(|e| TerritoryError::Sheets(format!("Invalid base URL: {}", e)))?;
        Ok(self)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `.../v4/spreadsheets/{id}/values/{range}?key=...`, every segment escaped
    pub fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TerritoryError::Sheets("Base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Fetch one range, retrying 429/5xx and connection failures
    pub fn fetch_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(spreadsheet_id, range)?;
        let what = format!("Sheets range '{}'", range);
        self.retry.run(&what, || self.get_once(&url))
    }

    fn get_once(&self, url: &Url) -> Result<Vec<Vec<String>>> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|e| TerritoryError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TerritoryError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message: String = body.chars().take(200).collect();
            return Err(TerritoryError::Http {
                status: status.as_u16(),
                message,
            });
        }
        parse_value_range(&body)
    }

    /// Fetch several ranges with at most `max_concurrency` requests in flight.
    ///
    /// Each range succeeds or fails on its own; results come back in the
    /// order of `ranges`.
    pub fn fetch_ranges(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
        max_concurrency: usize,
    ) -> Result<Vec<Result<Vec<Vec<String>>>>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_concurrency.max(1))
            .build()
            .map_err(|e| TerritoryError::Sheets(format!("Failed to start fetch pool: {}", e)))?;

        Ok(pool.install(|| {
            ranges
                .par_iter()
                .map(|range| self.fetch_values(spreadsheet_id, range))
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn instant_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(0),
        }
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_retries_transient_then_succeeds() {
        let calls = Cell::new(0);
        let result = instant_retry().run("test", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(TerritoryError::Http {
                    status: 429,
                    message: "rate limited".to_string(),
                })
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_client_error_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = instant_retry().run("test", || {
            calls.set(calls.get() + 1);
            Err(TerritoryError::Http {
                status: 403,
                message: "forbidden".to_string(),
            })
        });
        assert!(matches!(result, Err(TerritoryError::Http { status: 403, .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<()> = instant_retry().run("test", || {
            calls.set(calls.get() + 1);
            Err(TerritoryError::Transport("connection reset".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_values_url_escapes_range() {
        let client = SheetsClient::new("secret").unwrap();
        let url = client.values_url("abc123", "Иванов!A:E").unwrap();
        let text = url.as_str();
        assert!(text.starts_with("https://sheets.googleapis.com/v4/spreadsheets/abc123/values/"));
        assert!(!text.contains("Иванов"));
        assert!(text.ends_with("?key=secret"));
    }

    /// Minimal HTTP/1.1 server on a random port. `respond` gets the request
    /// number (0-based) and path and returns status and body.
    struct TestServer {
        base_url: String,
        requests: Arc<AtomicUsize>,
        peak_in_flight: Arc<AtomicUsize>,
    }

    fn spawn_server<F>(delay: Duration, respond: F) -> TestServer
    where
        F: Fn(usize, &str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak_in_flight = Arc::new(AtomicUsize::new(0));
        let respond = Arc::new(respond);

        let (requests_seen, peak) = (requests.clone(), peak_in_flight.clone());
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let (requests, in_flight, peak, respond) =
                    (requests_seen.clone(), in_flight.clone(), peak.clone(), respond.clone());
                thread::spawn(move || {
                    let mut request = Vec::new();
                    let mut buf = [0_u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf) {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let head = String::from_utf8_lossy(&request);
                    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

                    let n = requests.fetch_add(1, Ordering::SeqCst);
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(delay);
                    let (status, body) = respond(n, &path);
                    in_flight.fetch_sub(1, Ordering::SeqCst);

                    let response = format!(
                        "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes());
                    let _ = stream.flush();
                });
            }
        });

        TestServer {
            base_url: format!("http://{}/", addr),
            requests,
            peak_in_flight,
        }
    }

    fn local_client(server: &TestServer) -> SheetsClient {
        SheetsClient::new("k")
            .unwrap()
            .with_base_url(&server.base_url)
            .unwrap()
            .with_retry(instant_retry())
    }

    /// Range name from ".../values/{range}?key=k"
    fn range_of(path: &str) -> String {
        let tail = path.split("/values/").nth(1).unwrap_or("");
        tail.split('?').next().unwrap_or("").to_string()
    }

    #[test]
    fn test_rate_limited_request_is_retried() {
        let server = spawn_server(Duration::ZERO, |n, _| {
            if n == 0 {
                (429, r#"{"error":"rate"}"#.to_string())
            } else {
                (200, r#"{"values":[["Адрес"],["Тула"]]}"#.to_string())
            }
        });
        let cells = local_client(&server).fetch_values("sheet", "A:E").unwrap();
        assert_eq!(cells, vec![vec!["Адрес"], vec!["Тула"]]);
        assert_eq!(server.requests.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_forbidden_is_not_retried() {
        let server = spawn_server(Duration::ZERO, |_, _| (403, "denied".to_string()));
        let err = local_client(&server).fetch_values("sheet", "A:E").unwrap_err();
        match err {
            TerritoryError::Http { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "denied");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(server.requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_server_errors_exhaust_attempts() {
        let server = spawn_server(Duration::ZERO, |_, _| (503, String::new()));
        let err = local_client(&server).fetch_values("sheet", "A:E").unwrap_err();
        assert!(matches!(err, TerritoryError::Http { status: 503, .. }));
        assert_eq!(server.requests.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_fetch_ranges_keeps_order_and_cap() {
        let server = spawn_server(Duration::from_millis(50), |_, path| {
            let range = range_of(path);
            if range == "bad" {
                (404, "missing".to_string())
            } else {
                (200, format!(r#"{{"values":[["{}"]]}}"#, range))
            }
        });
        let ranges: Vec<String> = ["r1", "r2", "bad", "r4", "r5", "r6"]
            .iter()
            .map(|r| r.to_string())
            .collect();

        let results = local_client(&server).fetch_ranges("sheet", &ranges, 2).unwrap();
        assert_eq!(results.len(), 6);
        for (range, result) in ranges.iter().zip(&results) {
            if range == "bad" {
                assert!(matches!(result, Err(TerritoryError::Http { status: 404, .. })));
            } else {
                assert_eq!(result.as_ref().unwrap(), &vec![vec![range.clone()]]);
            }
        }
        assert!(server.peak_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(server.requests.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_parse_value_range() {
        let body = r#"{"range":"A1:C2","majorDimension":"ROWS","values":[["Адрес","Широта"],["г. Казань",55.79,null]]}"#;
        let cells = parse_value_range(body).unwrap();
        assert_eq!(cells[0], vec!["Адрес", "Широта"]);
        assert_eq!(cells[1], vec!["г. Казань", "55.79", ""]);

        // A range with no data has no "values" key at all
        assert!(parse_value_range(r#"{"range":"A1:C2"}"#).unwrap().is_empty());
    }
}
