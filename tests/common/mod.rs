//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use search_nexus::http::{ Body, Headers, HttpTransport };
use search_nexus::HttpClientError;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Body>,
}

/// Transport that records every call and replays queued responses in order.
/// With nothing queued it answers `{}`.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<VecDeque<Result<Value, HttpClientError>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: Value) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(&self, error: HttpClientError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests().last().cloned().expect("no request was sent")
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn record(
        &self,
        method: &'static str,
        url: &str,
        body: Option<Body>,
        headers: &Headers
    ) -> Result<Value, HttpClientError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Value::Object(Default::default())))
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Value, HttpClientError> {
        self.record("GET", url, None, headers)
    }

    async fn post(&self, url: &str, body: Body, headers: &Headers) -> Result<Value, HttpClientError> {
        self.record("POST", url, Some(body), headers)
    }

    async fn put(&self, url: &str, body: Body, headers: &Headers) -> Result<Value, HttpClientError> {
        self.record("PUT", url, Some(body), headers)
    }

    async fn delete(&self, url: &str, headers: &Headers) -> Result<Value, HttpClientError> {
        self.record("DELETE", url, None, headers)
    }
}

pub fn json_body(request: &RecordedRequest) -> Value {
    request.body
        .as_ref()
        .and_then(Body::as_json)
        .cloned()
        .expect("request had no JSON body")
}

pub fn raw_body(request: &RecordedRequest) -> (String, String) {
    match &request.body {
        Some(Body::Raw { content_type, data }) => (content_type.clone(), data.clone()),
        other => panic!("expected raw body, got {:?}", other),
    }
}
