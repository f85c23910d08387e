use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use log::{ debug, info, warn };

use super::{ extract, extract_hits, SearchService, ServiceType };
use crate::config::TypesenseConfig;
use crate::error::{ Result, SearchError };
use crate::http::{ Body, Headers, HttpTransport };
use crate::query::SearchQuery;
use crate::schema::Schema;

pub struct TypesenseService {
    transport: Arc<dyn HttpTransport>,
    config: TypesenseConfig,
}

impl TypesenseService {
    /// Fails when `config` has no nodes to talk to.
    pub fn new(transport: Arc<dyn HttpTransport>, config: TypesenseConfig) -> Result<Self> {
        if config.nodes().is_empty() {
            warn!("Typesense configured without nodes.");
            return Err(SearchError::Config {
                service: ServiceType::Typesense.to_string(),
                reason: "at least one node is required".to_string(),
            });
        }
        info!("Initializing Typesense service for node: {}", config.base_url());
        Ok(Self { transport, config })
    }

    fn headers(&self) -> Headers {
        Headers::new().with("X-TYPESENSE-API-KEY", self.config.api_key())
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/collections/{}", self.config.base_url(), collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{}", self.collection_url(collection), id)
    }

    /// One JSON document per line, as the import endpoint expects.
    pub(crate) fn jsonl_payload(documents: &[Value]) -> Result<String> {
        let lines = documents
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(lines.join("\n"))
    }
}

#[async_trait]
impl SearchService for TypesenseService {
    fn service_type(&self) -> ServiceType {
        ServiceType::Typesense
    }

    async fn create_collection(&self, schema: &Schema) -> Result<Value> {
        info!("Creating Typesense collection '{}' with {} fields", schema.name, schema.fields.len());
        let url = format!("{}/collections", self.config.base_url());
        Ok(
            self.transport.post(
                &url,
                Body::Json(schema.to_typesense_schema()),
                &self.headers()
            ).await?
        )
    }

    async fn index_document(&self, collection: &str, document: &Value) -> Result<Value> {
        let url = format!("{}/documents?action=upsert", self.collection_url(collection));
        Ok(self.transport.post(&url, Body::Json(document.clone()), &self.headers()).await?)
    }

    async fn bulk_index_documents(
        &self,
        collection: &str,
        documents: &[Value],
        _prior_response: Option<&Value>
    ) -> Result<Value> {
        let data = Self::jsonl_payload(documents)?;
        debug!("Importing {} documents ({} bytes) into '{}'", documents.len(), data.len(), collection);
        let url = format!("{}/documents/import?action=upsert", self.collection_url(collection));
        Ok(self.transport.post(&url, Body::text(data), &self.headers()).await?)
    }

    async fn search(&self, collection: &str, query: &SearchQuery) -> Result<Vec<Value>> {
        let base = format!("{}/documents/search", self.collection_url(collection));
        let url = Url::parse_with_params(&base, query.to_params()).map_err(|e|
            SearchError::InvalidUrl(format!("{}: {}", base, e))
        )?;
        let response = self.transport.get(url.as_str(), &self.headers()).await?;
        extract_hits(response, &["hits"])
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.transport.delete(&self.document_url(collection, id), &self.headers()).await?;
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        info!("Deleting Typesense collection '{}'", collection);
        self.transport.delete(&self.collection_url(collection), &self.headers()).await?;
        Ok(())
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Value> {
        Ok(self.transport.get(&self.document_url(collection, id), &self.headers()).await?)
    }

    async fn update_document(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        self.transport.put(
            &self.document_url(collection, id),
            Body::Json(document.clone()),
            &self.headers()
        ).await?;
        Ok(())
    }

    async fn update_schema(&self, collection: &str, schema: &Schema) -> Result<()> {
        self.transport.put(
            &self.collection_url(collection),
            Body::Json(schema.to_typesense_schema()),
            &self.headers()
        ).await?;
        Ok(())
    }

    async fn get_schema(&self, collection: &str) -> Result<Value> {
        let response = self.transport.get(&self.collection_url(collection), &self.headers()).await?;
        extract(response, &["fields"])
    }

    async fn get_collection(&self, collection: &str) -> Result<Value> {
        Ok(self.transport.get(&self.collection_url(collection), &self.headers()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn jsonl_payload_has_one_document_per_line() {
        let data = TypesenseService::jsonl_payload(
            &[json!({ "id": "1" }), json!({ "id": "2", "title": "b" })]
        ).unwrap();
        assert_eq!(data, "{\"id\":\"1\"}\n{\"id\":\"2\",\"title\":\"b\"}");
    }
}
