//! Transport boundary: one outbound call per attempt.
//!
//! Two modes exist, selected once per batch: `DirectTransport` issues the
//! resolved method/URL/headers as-is; `ProxyTransport` routes a GET through
//! the allorigins CORS relay and unwraps the envelope's `contents` field.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde_json::Value;

use crate::domain::{FetchMode, FetchOutcome, ResolvedRequest};

/// Header names that are never forwarded, whatever the template says. They
/// are either unforwardable by the browser transport the template was
/// captured from, or would corrupt transport-level framing.
pub const FORBIDDEN_HEADERS: [&str; 10] = [
    "user-agent",
    "referer",
    "origin",
    "host",
    "cookie",
    "sec-fetch-dest",
    "sec-fetch-mode",
    "sec-fetch-site",
    "content-length",
    "connection",
];

pub const PROXY_ENDPOINT: &str = "https://api.allorigins.win/get";

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &ResolvedRequest) -> Result<FetchOutcome, String>;
}

pub fn build_headers(input: &[(String, String)]) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();

    for (key, value) in input {
        if key.is_empty() {
            continue;
        }

        let header_name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| format!("Invalid header name `{key}`: {err}"))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| format!("Invalid header value for `{key}`: {err}"))?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

fn build_client() -> Result<Client, String> {
    Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|err| format!("Failed to build HTTP client: {err}"))
}

pub fn make_transport(mode: FetchMode) -> Result<Box<dyn Transport>, String> {
    match mode {
        FetchMode::Direct => Ok(Box::new(DirectTransport::new()?)),
        FetchMode::Proxy => Ok(Box::new(ProxyTransport::new()?)),
    }
}

pub struct DirectTransport {
    client: Client,
}

impl DirectTransport {
    pub fn new() -> Result<Self, String> {
        Ok(Self {
            client: build_client()?,
        })
    }
}

#[async_trait]
impl Transport for DirectTransport {
    async fn fetch(&self, request: &ResolvedRequest) -> Result<FetchOutcome, String> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|err| format!("Invalid HTTP method: {err}"))?;
        let headers = build_headers(&request.headers)?;

        let response = self
            .client
            .request(method, &request.url)
            .headers(headers)
            .send()
            .await
            .map_err(|err| format!("Request failed: {err}"))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| format!("Failed to read response: {err}"))?;

        Ok(FetchOutcome {
            status,
            body: String::from_utf8_lossy(&bytes).to_string(),
        })
    }
}

pub struct ProxyTransport {
    client: Client,
    endpoint: String,
}

impl ProxyTransport {
    pub fn new() -> Result<Self, String> {
        Self::with_endpoint(PROXY_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Result<Self, String> {
        Ok(Self {
            client: build_client()?,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Transport for ProxyTransport {
    async fn fetch(&self, request: &ResolvedRequest) -> Result<FetchOutcome, String> {
        let url = proxy_request_url(&self.endpoint, &request.url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| format!("Proxy request failed: {err}"))?;

        // Status reflects the relay call, not the origin server.
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| format!("Failed to read proxy response: {err}"))?;

        Ok(FetchOutcome {
            status,
            body: unwrap_proxy_envelope(&String::from_utf8_lossy(&bytes)),
        })
    }
}

/// Target URL travels percent-encoded in the relay's `url` query parameter.
pub fn proxy_request_url(endpoint: &str, target: &str) -> Result<Url, String> {
    Url::parse_with_params(endpoint, [("url", target)])
        .map_err(|err| format!("Invalid proxy URL: {err}"))
}

/// The relay wraps the origin body in a JSON envelope; the `contents` field
/// is the effective response body. Anything else yields an empty body.
pub fn unwrap_proxy_envelope(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(envelope) => envelope
            .get("contents")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_headers_accepts_valid_pairs() {
        let headers = build_headers(&[
            ("Accept".to_string(), "application/json".to_string()),
            ("X-Api-Key".to_string(), "abc".to_string()),
        ])
        .expect("valid headers");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("accept").and_then(|v| v.to_str().ok()), Some("application/json"));
    }

    #[test]
    fn build_headers_rejects_invalid_name() {
        let err = build_headers(&[("Bad Header".to_string(), "v".to_string())])
            .expect_err("space in header name");
        assert!(err.contains("Invalid header name"));
    }

    #[test]
    fn build_headers_skips_empty_names() {
        let headers = build_headers(&[(String::new(), "v".to_string())]).expect("skipped");
        assert!(headers.is_empty());
    }

    #[test]
    fn proxy_url_percent_encodes_the_target() {
        let url = proxy_request_url(PROXY_ENDPOINT, "https://api.example.com/daily?sign=leo&day=today")
            .expect("valid proxy url");
        assert_eq!(
            url.as_str(),
            "https://api.allorigins.win/get?url=https%3A%2F%2Fapi.example.com%2Fdaily%3Fsign%3Dleo%26day%3Dtoday"
        );
    }

    #[test]
    fn envelope_contents_becomes_the_body() {
        let body = unwrap_proxy_envelope("{\"contents\":\"{\\\"prediction\\\":\\\"ok\\\"}\",\"status\":{\"http_code\":200}}");
        assert_eq!(body, "{\"prediction\":\"ok\"}");
    }

    #[test]
    fn missing_or_invalid_envelope_yields_empty_body() {
        assert_eq!(unwrap_proxy_envelope("{\"status\":{}}"), "");
        assert_eq!(unwrap_proxy_envelope("not json"), "");
        assert_eq!(unwrap_proxy_envelope("{\"contents\":null}"), "");
    }
}
