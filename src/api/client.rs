//! Blocking HTTP client for the Chatbase APIs
//!
//! Wraps reqwest::blocking::Client with the fixed header pair and the
//! endpoint table. Responses are handed back as-is: no retries and no
//! status-code validation.

use std::time::Duration;

use url::Url;

use super::Endpoint;
use crate::config::{Config, DEFAULT_EVENTS_HOST, DEFAULT_MESSAGE_HOST};
use crate::error::Result;

const CONTENT_TYPE: &str = "application/json";
const ACCEPT: &str = "text/plain";

/// Raw result of a POST: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Client for the message host (`/api/...`) and events host (`/apis/v1/...`).
#[derive(Debug, Clone)]
pub struct ChatbaseClient {
    http: reqwest::blocking::Client,
    message_host: Url,
    events_host: Url,
}

impl ChatbaseClient {
    /// Client against the public Chatbase hosts with no request timeout.
    pub fn new() -> Result<Self> {
        Self::with_hosts(DEFAULT_MESSAGE_HOST, DEFAULT_EVENTS_HOST)
    }

    /// Client against custom hosts, e.g. a local stub server.
    pub fn with_hosts(message_host: &str, events_host: &str) -> Result<Self> {
        Self::build(message_host, events_host, None)
    }

    /// Build from loaded configuration (hosts and timeout).
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(
            config.message_host(),
            config.events_host(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    fn build(message_host: &str, events_host: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        // reqwest's blocking client defaults to 30s; unset means no timeout
        builder = builder.timeout(timeout);

        Ok(Self {
            http: builder.build()?,
            message_host: base_url(message_host)?,
            events_host: base_url(events_host)?,
        })
    }

    /// Full URL for an endpoint, with the api_key query parameter when the
    /// endpoint authenticates that way.
    pub fn endpoint_url(&self, endpoint: Endpoint, api_key: &str) -> Result<Url> {
        let host = if endpoint.uses_events_host() {
            &self.events_host
        } else {
            &self.message_host
        };
        let mut url = host.join(endpoint.path().trim_start_matches('/'))?;
        if endpoint.key_in_query() {
            url.query_pairs_mut().append_pair("api_key", api_key);
        }
        Ok(url)
    }

    /// POST a serialized JSON body to an endpoint.
    ///
    /// Transport failures surface as errors; any HTTP status, including
    /// 4xx/5xx, is returned to the caller in the `ApiResponse`.
    pub fn post(&self, endpoint: Endpoint, api_key: &str, body: String) -> Result<ApiResponse> {
        let url = self.endpoint_url(endpoint, api_key)?;
        tracing::debug!("Chatbase POST {}", redact(&url));

        let resp = self
            .http
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .body(body)
            .send()?;

        let status = resp.status().as_u16();
        let body = resp.text()?;
        tracing::debug!("Chatbase POST {} -> {}", redact(&url), status);

        Ok(ApiResponse { status, body })
    }
}

/// Parse a host as a join base. A path prefix such as `/chatbase` on a
/// proxy is kept: the path gets a trailing '/' so endpoint paths land
/// under it instead of replacing it.
fn base_url(host: &str) -> Result<Url> {
    let mut url = Url::parse(host)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// URL for logging with the api_key query value masked.
fn redact(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "api_key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        return masked.to_string();
    }
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

#[cfg(test)]
pub(crate) mod stub {
    //! One-shot HTTP server capturing a single request.

    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    #[derive(Debug)]
    pub struct CapturedRequest {
        pub request_line: String,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl CapturedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).unwrap()
        }
    }

    /// Start a server answering one request with `status` and `body`.
    /// Returns the base URL and a handle yielding the captured request.
    pub fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((k, v)) = line.split_once(':') {
                    headers.push((k.trim().to_string(), v.trim().to_string()));
                }
            }

            let len = headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.parse::<usize>().ok())
                .unwrap_or(0);
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).unwrap();

            let response = format!(
                "HTTP/1.1 {} STUB\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            reader.get_mut().write_all(response.as_bytes()).unwrap();

            CapturedRequest {
                request_line: request_line.trim_end().to_string(),
                headers,
                body: String::from_utf8(buf).unwrap(),
            }
        });

        (format!("http://{}", addr), handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls_default_hosts() {
        let client = ChatbaseClient::new().unwrap();

        let url = client.endpoint_url(Endpoint::Message, "k").unwrap();
        assert_eq!(url.as_str(), "https://chatbase.com/api/message");

        let url = client.endpoint_url(Endpoint::MessageBatch, "k-1").unwrap();
        assert_eq!(url.as_str(), "https://chatbase.com/api/messages?api_key=k-1");

        let url = client.endpoint_url(Endpoint::Event, "k").unwrap();
        assert_eq!(url.as_str(), "https://api.chatbase.com/apis/v1/events/insert");

        let url = client.endpoint_url(Endpoint::Click, "k").unwrap();
        assert_eq!(url.as_str(), "https://chatbase.com/api/click");
    }

    #[test]
    fn test_api_key_is_query_encoded() {
        let client = ChatbaseClient::new().unwrap();
        let url = client
            .endpoint_url(Endpoint::FacebookUserMessage, "a b&c")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://chatbase.com/api/facebook/send_message?api_key=a+b%26c"
        );
    }

    #[test]
    fn test_invalid_host_rejected() {
        assert!(ChatbaseClient::with_hosts("not a url", DEFAULT_EVENTS_HOST).is_err());
    }

    #[test]
    fn test_redact_masks_api_key() {
        let url = Url::parse("https://chatbase.com/api/messages?api_key=secret").unwrap();
        let shown = redact(&url);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("api_key="));

        let url = Url::parse("https://chatbase.com/api/message").unwrap();
        assert_eq!(redact(&url), "https://chatbase.com/api/message");
    }

    #[test]
    fn test_post_sends_fixed_headers_and_returns_raw_response() {
        let (base, handle) = stub::serve_once(400, "bad key");
        let client = ChatbaseClient::with_hosts(&base, &base).unwrap();

        let resp = client
            .post(Endpoint::MessageBatch, "xyz", r#"{"messages":[]}"#.to_string())
            .unwrap();
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body, "bad key");
        assert!(!resp.is_success());

        let req = handle.join().unwrap();
        assert_eq!(req.request_line, "POST /api/messages?api_key=xyz HTTP/1.1");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), Some("text/plain"));
        assert_eq!(req.body, r#"{"messages":[]}"#);
    }

    #[test]
    fn test_host_path_prefix_is_kept() {
        let client = ChatbaseClient::with_hosts(
            "http://localhost:9000/chatbase",
            "http://localhost:9001/events/",
        )
        .unwrap();

        let url = client.endpoint_url(Endpoint::Message, "k").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/chatbase/api/message");

        let url = client.endpoint_url(Endpoint::MessageBatch, "k").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/chatbase/api/messages?api_key=k");

        let url = client.endpoint_url(Endpoint::Event, "k").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9001/events/apis/v1/events/insert");
    }

    #[test]
    fn test_from_config_uses_configured_hosts() {
        let config = Config {
            message_host: Some("http://localhost:9000".into()),
            events_host: Some("http://localhost:9001".into()),
            timeout_secs: Some(3),
            ..Default::default()
        };
        let client = ChatbaseClient::from_config(&config).unwrap();
        let url = client.endpoint_url(Endpoint::BatchEvents, "k").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9001/apis/v1/events/insert_batch");
    }
}
