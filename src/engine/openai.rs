use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{ json, Value };
use std::sync::Arc;
use log::{ debug, error, info, warn };

use super::{ SearchService, ServiceType };
use crate::config::OpenAiConfig;
use crate::error::{ HttpClientError, Result, SearchError, ValidationError };
use crate::http::{ Body, FileUpload, Headers, HttpTransport };
use crate::query::SearchQuery;
use crate::schema::Schema;

const FILE_PURPOSE: &str = "assistants";

/// Vector-store backend. Only collection creation, bulk indexing and collection
/// lookup are offered; everything else fails with a 403 without touching the network.
pub struct OpenAiService {
    transport: Arc<dyn HttpTransport>,
    config: OpenAiConfig,
}

impl OpenAiService {
    pub fn new(transport: Arc<dyn HttpTransport>, config: OpenAiConfig) -> Self {
        if config.api_key().is_empty() {
            warn!("OpenAI service created without an API key.");
        }
        info!("Initializing OpenAI vector store service at {}", config.base_url());
        Self { transport, config }
    }

    fn headers(&self) -> Headers {
        Headers::new()
            .with("Authorization", format!("Bearer {}", self.config.api_key()))
            .with("OpenAI-Beta", "assistants=v2")
    }

    fn not_implemented(&self, operation: &str) -> SearchError {
        debug!("OpenAI service does not support {}", operation);
        HttpClientError::not_implemented().into()
    }

    async fn upload_document(&self, collection: &str, position: usize, document: &Value) -> Result<String> {
        let upload = FileUpload {
            file_name: format!("{}-{}.json", collection, position),
            purpose: FILE_PURPOSE.to_string(),
            contents: serde_json::to_vec(document)?,
        };
        let url = format!("{}/files", self.config.base_url());
        let response = check_response(
            self.transport.post(&url, Body::File(upload), &self.headers()).await?
        )?;
        response
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SearchError::UnexpectedResponse("file upload returned no 'id'".to_string()))
    }
}

/// Every upload runs to completion. On failure the ids that did upload are logged,
/// since nothing attaches them to the store, and the first error is returned.
fn collect_uploads(uploads: Vec<Result<String>>) -> Result<Vec<String>> {
    let mut file_ids = Vec::with_capacity(uploads.len());
    let mut first_error = None;
    for upload in uploads {
        match upload {
            Ok(id) => file_ids.push(id),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        None => Ok(file_ids),
        Some(e) => {
            error!("File upload failed, {} uploaded files left unattached: {:?}", file_ids.len(), file_ids);
            Err(e)
        }
    }
}

/// Recovers the vector store id from a `create_collection` response, which may also
/// arrive as its JSON text.
pub(crate) fn vector_store_id(prior_response: Option<&Value>) -> std::result::Result<String, ValidationError> {
    let prior = prior_response.ok_or_else(|| {
        ValidationError::CollectionResponse("a collection creation response is required".to_string())
    })?;

    let parsed;
    let response = match prior {
        Value::String(raw) => {
            parsed = serde_json::from_str::<Value>(raw).map_err(|e| {
                ValidationError::CollectionResponse(format!("unparseable response: {}", e))
            })?;
            &parsed
        }
        other => other,
    };

    response
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ValidationError::CollectionResponse("response has no 'id'".to_string()))
}

/// Status carried inside a response body, either as a top-level numeric `code` or as an
/// `error` object.
fn embedded_error(response: &Value) -> Option<(u16, Option<String>)> {
    if let Some(err) = response.get("error").filter(|e| e.is_object()) {
        let status = err
            .get("code")
            .and_then(status_of)
            .unwrap_or(400);
        let message = err.get("message").and_then(Value::as_str).map(str::to_string);
        return Some((status, message));
    }
    let status = response.get("code").and_then(status_of)?;
    let message = response.get("message").and_then(Value::as_str).map(str::to_string);
    Some((status, message))
}

fn status_of(code: &Value) -> Option<u16> {
    let status = match code {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.parse::<u16>().ok(),
        _ => None,
    };
    status.filter(|s| *s >= 400)
}

pub(crate) fn check_response(response: Value) -> Result<Value> {
    match embedded_error(&response) {
        Some((status, message)) => {
            error!("OpenAI reported error {}: {:?}", status, message);
            Err(HttpClientError::from_status(status, message).into())
        }
        None => Ok(response),
    }
}

#[async_trait]
impl SearchService for OpenAiService {
    fn service_type(&self) -> ServiceType {
        ServiceType::OpenAi
    }

    async fn create_collection(&self, schema: &Schema) -> Result<Value> {
        info!("Creating OpenAI vector store '{}'", schema.name);
        let url = format!("{}/vector_stores", self.config.base_url());
        let body = json!({ "name": schema.name });
        check_response(self.transport.post(&url, Body::Json(body), &self.headers()).await?)
    }

    async fn index_document(&self, _collection: &str, _document: &Value) -> Result<Value> {
        Err(self.not_implemented("index_document"))
    }

    async fn bulk_index_documents(
        &self,
        collection: &str,
        documents: &[Value],
        prior_response: Option<&Value>
    ) -> Result<Value> {
        let store_id = vector_store_id(prior_response)?;
        if documents.is_empty() {
            return Err(ValidationError::Required("documents".to_string()).into());
        }
        info!("Uploading {} documents to vector store {}", documents.len(), store_id);

        let uploads = join_all(
            documents
                .iter()
                .enumerate()
                .map(|(position, document)| self.upload_document(collection, position, document))
        ).await;
        let file_ids = collect_uploads(uploads)?;
        debug!("Uploaded files {:?}", file_ids);

        let url = format!("{}/vector_stores/{}/file_batches", self.config.base_url(), store_id);
        let body = json!({ "file_ids": file_ids });
        check_response(self.transport.post(&url, Body::Json(body), &self.headers()).await?)
    }

    async fn search(&self, _collection: &str, _query: &SearchQuery) -> Result<Vec<Value>> {
        Err(self.not_implemented("search"))
    }

    async fn delete_document(&self, _collection: &str, _id: &str) -> Result<()> {
        Err(self.not_implemented("delete_document"))
    }

    async fn delete_collection(&self, _collection: &str) -> Result<()> {
        Err(self.not_implemented("delete_collection"))
    }

    async fn get_document(&self, _collection: &str, _id: &str) -> Result<Value> {
        Err(self.not_implemented("get_document"))
    }

    async fn update_document(&self, _collection: &str, _id: &str, _document: &Value) -> Result<()> {
        Err(self.not_implemented("update_document"))
    }

    async fn update_schema(&self, _collection: &str, _schema: &Schema) -> Result<()> {
        Err(self.not_implemented("update_schema"))
    }

    async fn get_schema(&self, _collection: &str) -> Result<Value> {
        Err(self.not_implemented("get_schema"))
    }

    async fn get_collection(&self, collection: &str) -> Result<Value> {
        let url = format!("{}/vector_stores/{}", self.config.base_url(), collection);
        check_response(self.transport.get(&url, &self.headers()).await?)
    }
}
