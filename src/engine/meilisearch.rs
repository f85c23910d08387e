use async_trait::async_trait;
use serde_json::{ json, Map, Value };
use std::sync::Arc;
use log::{ debug, info };

use super::{ extract, extract_hits, SearchService, ServiceType };
use crate::config::MeilisearchConfig;
use crate::error::Result;
use crate::http::{ Body, Headers, HttpTransport };
use crate::query::SearchQuery;
use crate::schema::Schema;

pub struct MeilisearchService {
    transport: Arc<dyn HttpTransport>,
    config: MeilisearchConfig,
}

impl MeilisearchService {
    pub fn new(transport: Arc<dyn HttpTransport>, config: MeilisearchConfig) -> Self {
        info!("Initializing Meilisearch service for host: {}", config.host());
        Self { transport, config }
    }

    fn headers(&self) -> Headers {
        Headers::new().with("Authorization", format!("Bearer {}", self.config.api_key()))
    }

    fn index_url(&self, collection: &str) -> String {
        format!("{}/indexes/{}", self.config.base_url(), collection)
    }

    fn documents_url(&self, collection: &str) -> String {
        format!("{}/documents", self.index_url(collection))
    }

    fn search_body(query: &SearchQuery) -> Value {
        let mut body = Map::new();
        body.insert("q".to_string(), json!(query.q()));
        body.insert("limit".to_string(), json!(query.limit()));
        body.insert("offset".to_string(), json!(query.offset()));
        if !query.query_by().is_empty() {
            body.insert("attributesToSearchOn".to_string(), json!(query.query_by()));
        }
        if let Some(filters) = query.filters() {
            body.insert("filter".to_string(), json!(filters));
        }
        Value::Object(body)
    }
}

#[async_trait]
impl SearchService for MeilisearchService {
    fn service_type(&self) -> ServiceType {
        ServiceType::Meilisearch
    }

    async fn create_collection(&self, schema: &Schema) -> Result<Value> {
        info!("Creating Meilisearch index '{}' with {} fields", schema.name, schema.fields.len());
        let url = format!("{}/indexes", self.config.base_url());
        let body = json!({
            "uid": schema.name,
            "schema": schema.to_meilisearch_schema(),
        });
        Ok(self.transport.post(&url, Body::Json(body), &self.headers()).await?)
    }

    async fn index_document(&self, collection: &str, document: &Value) -> Result<Value> {
        let body = Value::Array(vec![document.clone()]);
        Ok(self.transport.post(&self.documents_url(collection), Body::Json(body), &self.headers()).await?)
    }

    async fn bulk_index_documents(
        &self,
        collection: &str,
        documents: &[Value],
        _prior_response: Option<&Value>
    ) -> Result<Value> {
        debug!("Adding {} documents to Meilisearch index '{}'", documents.len(), collection);
        let body = Value::Array(documents.to_vec());
        Ok(self.transport.post(&self.documents_url(collection), Body::Json(body), &self.headers()).await?)
    }

    async fn search(&self, collection: &str, query: &SearchQuery) -> Result<Vec<Value>> {
        let url = format!("{}/search", self.index_url(collection));
        let response = self.transport.post(
            &url,
            Body::Json(Self::search_body(query)),
            &self.headers()
        ).await?;
        extract_hits(response, &["hits"])
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        self.transport.delete(&url, &self.headers()).await?;
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        info!("Deleting Meilisearch index '{}'", collection);
        self.transport.delete(&self.index_url(collection), &self.headers()).await?;
        Ok(())
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Value> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        Ok(self.transport.get(&url, &self.headers()).await?)
    }

    async fn update_document(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        self.transport.put(&url, Body::Json(document.clone()), &self.headers()).await?;
        Ok(())
    }

    async fn update_schema(&self, collection: &str, schema: &Schema) -> Result<()> {
        let body = json!({ "schema": schema.to_meilisearch_schema() });
        self.transport.put(&self.index_url(collection), Body::Json(body), &self.headers()).await?;
        Ok(())
    }

    async fn get_schema(&self, collection: &str) -> Result<Value> {
        let response = self.transport.get(&self.index_url(collection), &self.headers()).await?;
        extract(response, &["schema"])
    }

    async fn get_collection(&self, collection: &str) -> Result<Value> {
        Ok(self.transport.get(&self.index_url(collection), &self.headers()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_body_uses_offset_paging() {
        let query = SearchQuery::new("shoes").with_limit(20).with_page(3).with_filters("brand = nike");
        assert_eq!(
            MeilisearchService::search_body(&query),
            json!({ "q": "shoes", "limit": 20, "offset": 40, "filter": "brand = nike" })
        );
    }
}
