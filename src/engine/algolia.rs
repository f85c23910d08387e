use async_trait::async_trait;
use serde_json::{ json, Map, Value };
use std::sync::Arc;
use log::{ debug, info };

use super::{ extract, extract_hits, SearchService, ServiceType };
use crate::config::AlgoliaConfig;
use crate::error::Result;
use crate::http::{ Body, Headers, HttpTransport };
use crate::query::SearchQuery;
use crate::schema::Schema;

pub struct AlgoliaService {
    transport: Arc<dyn HttpTransport>,
    config: AlgoliaConfig,
}

impl AlgoliaService {
    pub fn new(transport: Arc<dyn HttpTransport>, config: AlgoliaConfig) -> Self {
        info!("Initializing Algolia service for application: {}", config.app_id());
        Self { transport, config }
    }

    fn headers(&self) -> Headers {
        Headers::new()
            .with("X-Algolia-API-Key", self.config.api_key())
            .with("X-Algolia-Application-Id", self.config.app_id())
    }

    fn index_url(&self, collection: &str) -> String {
        format!("{}/indexes/{}", self.config.base_url(), collection)
    }

    fn object_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.index_url(collection), id)
    }

    fn search_body(query: &SearchQuery) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), json!(query.q()));
        body.insert("hitsPerPage".to_string(), json!(query.limit()));
        body.insert("page".to_string(), json!(query.page().saturating_sub(1)));
        if !query.query_by().is_empty() {
            body.insert("restrictSearchableAttributes".to_string(), json!(query.query_by()));
        }
        if let Some(filters) = query.filters() {
            body.insert("filters".to_string(), json!(filters));
        }
        Value::Object(body)
    }
}

#[async_trait]
impl SearchService for AlgoliaService {
    fn service_type(&self) -> ServiceType {
        ServiceType::Algolia
    }

    async fn create_collection(&self, schema: &Schema) -> Result<Value> {
        info!("Creating Algolia index '{}' with {} fields", schema.name, schema.fields.len());
        let url = format!("{}/indexes", self.config.base_url());
        let body = json!({
            "name": schema.name,
            "schema": schema.to_algolia_schema(),
        });
        Ok(self.transport.post(&url, Body::Json(body), &self.headers()).await?)
    }

    async fn index_document(&self, collection: &str, document: &Value) -> Result<Value> {
        let url = self.index_url(collection);
        Ok(self.transport.post(&url, Body::Json(document.clone()), &self.headers()).await?)
    }

    async fn bulk_index_documents(
        &self,
        collection: &str,
        documents: &[Value],
        _prior_response: Option<&Value>
    ) -> Result<Value> {
        debug!("Batching {} documents into Algolia index '{}'", documents.len(), collection);
        let requests: Vec<Value> = documents
            .iter()
            .map(|doc| json!({ "action": "addObject", "body": doc }))
            .collect();
        let url = format!("{}/batch", self.index_url(collection));
        let body = json!({ "requests": requests });
        Ok(self.transport.post(&url, Body::Json(body), &self.headers()).await?)
    }

    async fn search(&self, collection: &str, query: &SearchQuery) -> Result<Vec<Value>> {
        let url = format!("{}/query", self.index_url(collection));
        let response = self.transport.post(
            &url,
            Body::Json(Self::search_body(query)),
            &self.headers()
        ).await?;
        extract_hits(response, &["hits"])
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.transport.delete(&self.object_url(collection, id), &self.headers()).await?;
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        info!("Deleting Algolia index '{}'", collection);
        self.transport.delete(&self.index_url(collection), &self.headers()).await?;
        Ok(())
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Value> {
        Ok(self.transport.get(&self.object_url(collection, id), &self.headers()).await?)
    }

    async fn update_document(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        self.transport.put(
            &self.object_url(collection, id),
            Body::Json(document.clone()),
            &self.headers()
        ).await?;
        Ok(())
    }

    async fn update_schema(&self, collection: &str, schema: &Schema) -> Result<()> {
        let body = json!({ "schema": schema.to_algolia_schema() });
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
    fn search_body_converts_to_zero_based_page() {
        let query = SearchQuery::new("shoes").with_query_by(["title"]).with_filters("brand:nike").with_page(2);
        assert_eq!(
            AlgoliaService::search_body(&query),
            json!({
                "query": "shoes",
                "hitsPerPage": 10,
                "page": 1,
                "restrictSearchableAttributes": ["title"],
                "filters": "brand:nike",
            })
        );
    }
}
