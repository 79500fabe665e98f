//! Remote triple store over the SPARQL 1.1 protocol (GraphDB repository layout).
//!
//! - reads: `GET <endpoint>?query=…` with an `Accept` header
//! - writes: form `POST <endpoint>/statements` with `update=…`
//! - health: `GET <endpoint>/health`

use std::io::Read;
use std::time::Duration;

use super::{GraphStore, StoreResult, WriteOutcome};
use crate::config::StoreConfig;
use crate::error::StoreError;

/// HTTP triple store adapter using ureq (sync).
pub struct HttpStore {
    endpoint: String,
    agent: ureq::Agent,
    auth: Option<String>,
}

impl HttpStore {
    pub fn new(config: &StoreConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build();
        let auth = config
            .username
            .as_deref()
            .map(|user| basic_auth(user, config.password.as_deref().unwrap_or("")));
        Self {
            endpoint: config.endpoint(),
            agent,
            auth,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let request = self.agent.request(method, url);
        match &self.auth {
            Some(header) => request.set("Authorization", header),
            None => request,
        }
    }

    /// Whole response body; ureq's `into_string` caps bodies at 10 MB.
    fn body(&self, resp: ureq::Response) -> StoreResult<String> {
        let status = resp.status();
        let mut body = String::new();
        resp.into_reader()
            .read_to_string(&mut body)
            .map_err(|e| StoreError::Results {
                message: format!("read body (status {status}): {e}"),
            })?;
        Ok(body)
    }

    fn unavailable(&self, e: impl std::fmt::Display) -> StoreError {
        StoreError::Unavailable {
            endpoint: self.endpoint.clone(),
            message: e.to_string(),
        }
    }
}

impl GraphStore for HttpStore {
    fn name(&self) -> &'static str {
        "http"
    }

    fn read(&self, query: &str, accept: &str) -> StoreResult<String> {
        tracing::debug!(endpoint = %self.endpoint, accept, "sparql query");
        let response = self
            .request("GET", &self.endpoint)
            .set("Accept", accept)
            .query("query", query)
            .call();
        match response {
            Ok(resp) => self.body(resp),
            Err(ureq::Error::Status(status, resp)) => Err(StoreError::Rejected {
                status,
                message: self.body(resp).unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(t)) => Err(self.unavailable(t)),
        }
    }

    fn write(&self, update: &str) -> StoreResult<WriteOutcome> {
        tracing::debug!(endpoint = %self.endpoint, bytes = update.len(), "sparql update");
        let url = format!("{}/statements", self.endpoint);
        match self.request("POST", &url).send_form(&[("update", update)]) {
            Ok(_) => Ok(WriteOutcome::accepted()),
            Err(ureq::Error::Status(status, resp)) => {
                let body = self.body(resp).unwrap_or_default();
                tracing::warn!(endpoint = %self.endpoint, status, "sparql update rejected");
                Ok(WriteOutcome::rejected(body))
            }
            Err(ureq::Error::Transport(t)) => Err(self.unavailable(t)),
        }
    }

    fn check_connectivity(&self) -> bool {
        let url = format!("{}/health", self.endpoint);
        match self.request("GET", &url).call() {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(endpoint = %self.endpoint, error = %e, "health check failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore")
            .field("endpoint", &self.endpoint)
            .field("auth", &self.auth.is_some())
            .finish()
    }
}

/// Build a basic HTTP Authorization header value.
fn basic_auth(user: &str, pass: &str) -> String {
    format!("Basic {}", base64_encode(format!("{user}:{pass}").as_bytes()))
}

/// Minimal base64 encoder (standard alphabet, padded).
fn base64_encode(input: &[u8]) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);
    for chunk in input.chunks(3) {
        let n = chunk
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, b)| acc | (u32::from(*b) << (16 - 8 * i)));
        for i in 0..4 {
            if i <= chunk.len() {
                out.push(CHARS[((n >> (18 - 6 * i)) & 0x3F) as usize] as char);
            } else {
                out.push('=');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_encode_basic() {
        assert_eq!(base64_encode(b"user:pass"), "dXNlcjpwYXNz");
        assert_eq!(base64_encode(b"a"), "YQ==");
        assert_eq!(base64_encode(b"ab"), "YWI=");
        assert_eq!(base64_encode(b"abc"), "YWJj");
    }

    #[test]
    fn basic_auth_header() {
        assert_eq!(basic_auth("admin", "root"), "Basic YWRtaW46cm9vdA==");
    }

    #[test]
    fn endpoint_layout() {
        let config = StoreConfig {
            url: "http://localhost:7200/".into(),
            repository: "assets".into(),
            ..StoreConfig::default()
        };
        let store = HttpStore::new(&config);
        assert_eq!(store.endpoint(), "http://localhost:7200/repositories/assets");
        assert!(format!("{store:?}").contains("auth: false"));
    }

    /// Serve one canned HTTP response on a local port.
    fn serve_once(status: &str, body: String) -> StoreConfig {
        use std::io::{BufRead, BufReader, Read, Write};
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let status = status.to_string();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(body.as_bytes()).unwrap();
        });
        StoreConfig {
            url: format!("http://127.0.0.1:{port}"),
            timeout_ms: 10_000,
            ..StoreConfig::default()
        }
    }

    #[test]
    fn large_results_are_read_in_full() {
        let body = "x".repeat(11 * 1024 * 1024);
        let store = HttpStore::new(&serve_once("200 OK", body.clone()));
        let read = store.read("ASK {}", super::super::ACCEPT_RESULTS_JSON).unwrap();
        assert_eq!(read.len(), body.len());
    }

    #[test]
    fn rejected_update_keeps_the_store_message() {
        let message = "MALFORMED QUERY: Lexical error at line 1".to_string();
        let store = HttpStore::new(&serve_once("400 Bad Request", message.clone()));
        let outcome = store.write("INSERT DATA {").unwrap();
        assert!(!outcome.ok);
        assert_eq!(outcome.message, message);
    }

    #[test]
    fn unreachable_store_is_unavailable() {
        let config = StoreConfig {
            url: "http://127.0.0.1:9".into(),
            timeout_ms: 500,
            ..StoreConfig::default()
        };
        let store = HttpStore::new(&config);
        assert!(!store.check_connectivity());
        let err = store.read("ASK {}", super::super::ACCEPT_RESULTS_JSON).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::StoreUnavailable);
    }
}
