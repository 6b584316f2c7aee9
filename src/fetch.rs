//! Downloading external CSS/JS.
//!
//! The [`Fetcher`] trait is the seam between importers and the network; the
//! production implementation is [`HttpFetcher`], a blocking `reqwest` client.

use crate::settings::HttpConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Something that can turn a URL into response text.
pub trait Fetcher: Send + Sync {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP client with the configured timeout and user agent.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let request_error = |e: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = self.client.get(url).send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(request_error)?;
        debug!("Downloaded {} bytes from {url}", body.len());
        Ok(body)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Fetcher serving canned responses and recording every requested URL.
    #[derive(Default)]
    pub struct MockFetcher {
        pub responses: Mutex<HashMap<String, String>>,
        pub requests: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: &str, body: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), body.to_string());
            self
        }

        pub fn get_requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Fetcher for MockFetcher {
        fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    #[test]
    fn mock_serves_known_url() {
        let fetcher = MockFetcher::new().with_response("https://x/a.css", "a{}");
        assert_eq!(fetcher.fetch_text("https://x/a.css").unwrap(), "a{}");
        assert_eq!(fetcher.get_requests(), vec!["https://x/a.css"]);
    }

    #[test]
    fn mock_unknown_url_is_404() {
        let fetcher = MockFetcher::new();
        assert!(matches!(
            fetcher.fetch_text("https://x/missing.js"),
            Err(FetchError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn http_fetcher_builds_from_defaults() {
        assert!(HttpFetcher::new(&HttpConfig::default()).is_ok());
    }

    /// Serve `/ok.css` with a body and everything else as 404, for `requests` connections.
    fn serve_local(requests: usize) -> (String, std::thread::JoinHandle<()>) {
        use std::io::{BufRead, BufReader, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            for stream in listener.incoming().take(requests) {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    if header == "\r\n" || header.is_empty() {
                        break;
                    }
                }
                let (status, body) = if request_line.starts_with("GET /ok.css ") {
                    ("200 OK", "a{color:red}")
                } else {
                    ("404 Not Found", "missing")
                };
                write!(
                    stream,
                    "HTTP/1.1 {status}\r\nContent-Type: text/css\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
                stream.flush().unwrap();
            }
        });
        (base, handle)
    }

    #[test]
    fn http_fetcher_returns_body_and_maps_error_status() {
        let (base, server) = serve_local(2);
        // Loopback must not go through an ambient HTTP proxy.
        let fetcher = HttpFetcher {
            client: reqwest::blocking::Client::builder().no_proxy().build().unwrap(),
        };

        assert_eq!(fetcher.fetch_text(&format!("{base}/ok.css")).unwrap(), "a{color:red}");

        let missing = format!("{base}/missing.js");
        match fetcher.fetch_text(&missing) {
            Err(FetchError::Status { url, status }) => {
                assert_eq!(url, missing);
                assert_eq!(status, 404);
            }
            other => panic!("expected status error, got {other:?}"),
        }
        server.join().unwrap();
    }
}
