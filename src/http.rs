use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{ multipart, Client, Method, RequestBuilder };
use serde_json::Value;
use std::time::Duration;
use log::{ debug, error };

use crate::config::SearchConfig;
use crate::error::HttpClientError;

/// Request headers as ordered name/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Replaces any header with the same (case-insensitive) name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.0.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.0.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `"Name: value"` lines, for transports that take combined header strings.
    pub fn to_lines(&self) -> Vec<String> {
        self.iter()
            .map(|(n, v)| format!("{}: {}", n, v))
            .collect()
    }

    /// Parses `"Name: value"` lines; lines without a colon are skipped.
    pub fn from_lines<I, S>(lines: I) -> Self where I: IntoIterator<Item = S>, S: AsRef<str> {
        let mut headers = Self::new();
        for line in lines {
            if let Some((name, value)) = line.as_ref().split_once(':') {
                headers.insert(name.trim(), value.trim());
            }
        }
        headers
    }
}

/// A file sent as `multipart/form-data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub purpose: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    /// Pre-encoded payload such as newline-delimited JSON.
    Raw {
        content_type: String,
        data: String,
    },
    File(FileUpload),
}

impl Body {
    pub fn ndjson(data: String) -> Self {
        Body::Raw {
            content_type: "application/x-ndjson".to_string(),
            data,
        }
    }

    pub fn text(data: String) -> Self {
        Body::Raw {
            content_type: "text/plain".to_string(),
            data,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// The HTTP capability every search service talks through.
///
/// Implementations return the decoded response body on success and a
/// status-classified [`HttpClientError`] otherwise.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Value, HttpClientError>;

    async fn post(&self, url: &str, body: Body, headers: &Headers) -> Result<Value, HttpClientError>;

    async fn put(&self, url: &str, body: Body, headers: &Headers) -> Result<Value, HttpClientError>;

    async fn delete(&self, url: &str, headers: &Headers) -> Result<Value, HttpClientError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| HttpClientError::from_status(0, Some(e.to_string())))?;
        Ok(Self { client })
    }

    /// Applies the connection timeout the config carries, if any.
    pub fn for_config(config: &SearchConfig) -> Result<Self, HttpClientError> {
        match config.connection_timeout() {
            Some(timeout) => Self::with_timeout(timeout),
            None => Ok(Self::new()),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Body>,
        headers: &Headers
    ) -> Result<RequestBuilder, HttpClientError> {
        let mut request_builder = self.client.request(method, url);
        for (name, value) in headers.iter() {
            request_builder = request_builder.header(name, value);
        }

        request_builder = match body {
            None => request_builder,
            Some(Body::Json(value)) => request_builder.json(&value),
            Some(Body::Raw { content_type, data }) =>
                request_builder.header(CONTENT_TYPE, content_type).body(data),
            Some(Body::File(upload)) => {
                let part = multipart::Part::bytes(upload.contents)
                    .file_name(upload.file_name)
                    .mime_str("application/json")
                    .map_err(|e| HttpClientError::from_status(0, Some(e.to_string())))?;
                let form = multipart::Form::new().text("purpose", upload.purpose).part("file", part);
                request_builder.multipart(form)
            }
        };

        Ok(request_builder)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Body>,
        headers: &Headers
    ) -> Result<Value, HttpClientError> {
        debug!("{} {}", method, url);
        let request = self.build_request(method.clone(), url, body, headers)?;

        let response = request.send().await.map_err(|e| {
            error!("{} {} failed: {}", method, url, e);
            HttpClientError::from_status(e.status().map_or(0, |s| s.as_u16()), Some(e.to_string()))
        })?;
        let status = response.status();
        let text = response
            .text().await
            .map_err(|e| HttpClientError::from_status(status.as_u16(), Some(e.to_string())))?;

        if !status.is_success() {
            error!("{} {} returned {}: {}", method, url, status, text);
            let message = if text.is_empty() { None } else { Some(text) };
            return Err(HttpClientError::from_status(status.as_u16(), message));
        }

        Ok(decode_body(text))
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON when the body parses as JSON, the raw text otherwise, `Null` when empty.
fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Value, HttpClientError> {
        self.send(Method::GET, url, None, headers).await
    }

    async fn post(&self, url: &str, body: Body, headers: &Headers) -> Result<Value, HttpClientError> {
        self.send(Method::POST, url, Some(body), headers).await
    }

    async fn put(&self, url: &str, body: Body, headers: &Headers) -> Result<Value, HttpClientError> {
        self.send(Method::PUT, url, Some(body), headers).await
    }

    async fn delete(&self, url: &str, headers: &Headers) -> Result<Value, HttpClientError> {
        self.send(Method::DELETE, url, None, headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_lines_round_trip() {
        let headers = Headers::new()
            .with("X-Algolia-API-Key", "secret")
            .with("X-Algolia-Application-Id", "APP");
        let lines = headers.to_lines();
        assert_eq!(lines, vec!["X-Algolia-API-Key: secret", "X-Algolia-Application-Id: APP"]);
        assert_eq!(Headers::from_lines(&lines), headers);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut headers = Headers::new().with("Authorization", "Bearer a");
        headers.insert("authorization", "Bearer b");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("AUTHORIZATION"), Some("Bearer b"));
    }

    #[test]
    fn from_lines_keeps_colons_in_value() {
        let headers = Headers::from_lines(["Authorization: Basic a:b", "garbage"]);
        assert_eq!(headers.get("authorization"), Some("Basic a:b"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn decode_body_variants() {
        assert_eq!(decode_body(String::new()), Value::Null);
        assert_eq!(decode_body(r#"{"ok":true}"#.to_string()), json!({ "ok": true }));
        assert_eq!(
            decode_body("{\"success\":true}\n{\"success\":true}".to_string()),
            Value::String("{\"success\":true}\n{\"success\":true}".to_string())
        );
    }
}
