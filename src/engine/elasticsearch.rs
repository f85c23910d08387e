use async_trait::async_trait;
use base64::{ engine::general_purpose::STANDARD, Engine as _ };
use serde_json::{ json, Value };
use std::sync::Arc;
use log::{ debug, info };

use super::{ extract, extract_hits, SearchService, ServiceType };
use crate::config::ElasticsearchConfig;
use crate::error::Result;
use crate::http::{ Body, Headers, HttpTransport };
use crate::query::SearchQuery;
use crate::schema::Schema;

pub struct ElasticsearchService {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    authorization: Option<String>,
}

impl ElasticsearchService {
    pub fn new(transport: Arc<dyn HttpTransport>, config: ElasticsearchConfig) -> Self {
        let base_url = config.base_url();
        info!("Initializing Elasticsearch service for host: {}", base_url);

        let authorization = if let Some(key) = config.api_key() {
            Some(format!("ApiKey {}", key))
        } else if let Some((user, pass)) = config.basic_auth() {
            let encoded = STANDARD.encode(format!("{}:{}", user, pass));
            Some(format!("Basic {}", encoded))
        } else {
            debug!("No Elasticsearch credentials configured, sending unauthenticated requests.");
            None
        };

        Self {
            transport,
            base_url,
            authorization,
        }
    }

    fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        if let Some(auth) = &self.authorization {
            headers.insert("Authorization", auth.as_str());
        }
        headers
    }

    fn index_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/_doc/{}", self.index_url(collection), id)
    }

    /// One action line followed by one source line per document, newline-terminated.
    pub(crate) fn bulk_payload(collection: &str, documents: &[Value]) -> Result<String> {
        let action = serde_json::to_string(&json!({ "index": { "_index": collection } }))?;
        let mut data = String::new();
        for document in documents {
            data.push_str(&action);
            data.push('\n');
            data.push_str(&serde_json::to_string(document)?);
            data.push('\n');
        }
        Ok(data)
    }

    fn search_body(query: &SearchQuery) -> Value {
        let text = query.q().trim();
        let matcher = if text.is_empty() || text == "*" {
            json!({ "match_all": {} })
        } else if query.query_by().is_empty() {
            json!({ "query_string": { "query": text } })
        } else {
            json!({ "multi_match": { "query": text, "fields": query.query_by() } })
        };

        let query_clause = match query.filters() {
            Some(filters) =>
                json!({
                    "bool": {
                        "must": [matcher],
                        "filter": [{ "query_string": { "query": filters } }],
                    }
                }),
            None => matcher,
        };

        json!({
            "query": query_clause,
            "from": query.offset(),
            "size": query.limit(),
        })
    }
}

#[async_trait]
impl SearchService for ElasticsearchService {
    fn service_type(&self) -> ServiceType {
        ServiceType::Elasticsearch
    }

    async fn create_collection(&self, schema: &Schema) -> Result<Value> {
        info!("Creating Elasticsearch index '{}' with {} fields", schema.name, schema.fields.len());
        let body = json!({
            "mappings": { "properties": schema.to_elasticsearch_schema() },
        });
        Ok(self.transport.put(&self.index_url(&schema.name), Body::Json(body), &self.headers()).await?)
    }

    async fn index_document(&self, collection: &str, document: &Value) -> Result<Value> {
        let url = format!("{}/_doc", self.index_url(collection));
        Ok(self.transport.post(&url, Body::Json(document.clone()), &self.headers()).await?)
    }

    async fn bulk_index_documents(
        &self,
        collection: &str,
        documents: &[Value],
        _prior_response: Option<&Value>
    ) -> Result<Value> {
        let data = Self::bulk_payload(collection, documents)?;
        debug!("Bulk indexing {} documents ({} bytes) into '{}'", documents.len(), data.len(), collection);
        let url = format!("{}/_bulk", self.base_url);
        Ok(self.transport.post(&url, Body::ndjson(data), &self.headers()).await?)
    }

    async fn search(&self, collection: &str, query: &SearchQuery) -> Result<Vec<Value>> {
        let url = format!("{}/_search", self.index_url(collection));
        let response = self.transport.post(
            &url,
            Body::Json(Self::search_body(query)),
            &self.headers()
        ).await?;
        extract_hits(response, &["hits", "hits"])
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.transport.delete(&self.doc_url(collection, id), &self.headers()).await?;
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        info!("Deleting Elasticsearch index '{}'", collection);
        self.transport.delete(&self.index_url(collection), &self.headers()).await?;
        Ok(())
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Value> {
        Ok(self.transport.get(&self.doc_url(collection, id), &self.headers()).await?)
    }

    async fn update_document(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        self.transport.put(
            &self.doc_url(collection, id),
            Body::Json(document.clone()),
            &self.headers()
        ).await?;
        Ok(())
    }

    async fn update_schema(&self, collection: &str, schema: &Schema) -> Result<()> {
        let url = format!("{}/_mapping", self.index_url(collection));
        let body = json!({ "properties": schema.to_elasticsearch_schema() });
        self.transport.put(&url, Body::Json(body), &self.headers()).await?;
        Ok(())
    }

    async fn get_schema(&self, collection: &str) -> Result<Value> {
        let response = self.transport.get(&self.index_url(collection), &self.headers()).await?;
        // The index description is either bare or nested under the index name.
        if response.get("mappings").is_some() {
            extract(response, &["mappings", "properties"])
        } else {
            extract(response, &[collection, "mappings", "properties"])
        }
    }

    async fn get_collection(&self, collection: &str) -> Result<Value> {
        Ok(self.transport.get(&self.index_url(collection), &self.headers()).await?)
    }
}
