pub mod algolia;
pub mod elasticsearch;
pub mod meilisearch;
pub mod openai;
pub mod typesense;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use log::info;

use crate::config::SearchConfig;
use crate::error::{ Result, SearchError };
use crate::http::HttpTransport;
use crate::query::SearchQuery;
use crate::schema::Schema;

/// The operations every search backend offers, translated to its own wire protocol.
///
/// Collection names and document ids are inserted into URLs as given.
#[async_trait]
pub trait SearchService: Send + Sync {
    fn service_type(&self) -> ServiceType;

    /// Creates a collection and returns the backend's raw response.
    async fn create_collection(&self, schema: &Schema) -> Result<Value>;

    async fn index_document(&self, collection: &str, document: &Value) -> Result<Value>;

    /// Indexes many documents in one request.
    ///
    /// `prior_response` is the value returned by [`SearchService::create_collection`];
    /// only backends that need to recover the created collection's id read it.
    async fn bulk_index_documents(
        &self,
        collection: &str,
        documents: &[Value],
        prior_response: Option<&Value>
    ) -> Result<Value>;

    /// Runs a query and returns the hits, already unwrapped from the backend's envelope.
    async fn search(&self, collection: &str, query: &SearchQuery) -> Result<Vec<Value>>;

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;

    async fn delete_collection(&self, collection: &str) -> Result<()>;

    async fn get_document(&self, collection: &str, id: &str) -> Result<Value>;

    async fn update_document(&self, collection: &str, id: &str, document: &Value) -> Result<()>;

    async fn update_schema(&self, collection: &str, schema: &Schema) -> Result<()>;

    /// Field definitions of a collection, unwrapped from the collection description.
    async fn get_schema(&self, collection: &str) -> Result<Value>;

    async fn get_collection(&self, collection: &str) -> Result<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Algolia,
    Elasticsearch,
    Meilisearch,
    Typesense,
    OpenAi,
}

impl ServiceType {
    pub const ALL: [ServiceType; 5] = [
        ServiceType::Algolia,
        ServiceType::Elasticsearch,
        ServiceType::Meilisearch,
        ServiceType::Typesense,
        ServiceType::OpenAi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Algolia => "algolia",
            ServiceType::Elasticsearch => "elasticsearch",
            ServiceType::Meilisearch => "meilisearch",
            ServiceType::Typesense => "typesense",
            ServiceType::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        get_service_type(s)
    }
}

pub fn get_service_type(type_str: &str) -> Result<ServiceType> {
    match type_str.to_lowercase().as_str() {
        "algolia" => Ok(ServiceType::Algolia),
        "elasticsearch" => Ok(ServiceType::Elasticsearch),
        "meilisearch" => Ok(ServiceType::Meilisearch),
        "typesense" => Ok(ServiceType::Typesense),
        "openai" => Ok(ServiceType::OpenAi),
        _ => Err(SearchError::UnsupportedService(type_str.to_string())),
    }
}

/// Binds the service matching `config` to `transport`.
///
/// Fails with `SearchError::Config` when the config cannot address a server.
pub fn create_search_service_from_config(
    transport: Arc<dyn HttpTransport>,
    config: SearchConfig
) -> Result<Arc<dyn SearchService>> {
    info!("Creating search service of type: {}", config.service_type());
    Ok(match config {
        SearchConfig::Algolia(c) => Arc::new(algolia::AlgoliaService::new(transport, c)),
        SearchConfig::Elasticsearch(c) =>
            Arc::new(elasticsearch::ElasticsearchService::new(transport, c)),
        SearchConfig::Meilisearch(c) => Arc::new(meilisearch::MeilisearchService::new(transport, c)),
        SearchConfig::Typesense(c) => Arc::new(typesense::TypesenseService::new(transport, c)?),
        SearchConfig::OpenAi(c) => Arc::new(openai::OpenAiService::new(transport, c)),
    })
}

/// Resolves `service_type`, parses `raw_config` for it and builds the service.
///
/// An unknown service type fails before the config is looked at. Every call
/// builds a fresh service.
pub fn create_search_service(
    service_type: &str,
    transport: Arc<dyn HttpTransport>,
    raw_config: &Value
) -> Result<Arc<dyn SearchService>> {
    let service_type = get_service_type(service_type)?;
    let config = SearchConfig::from_value(service_type, raw_config)?;
    create_search_service_from_config(transport, config)
}

/// Follows `path` through nested objects of a response.
pub(crate) fn extract(response: Value, path: &[&str]) -> Result<Value> {
    let mut current = response;
    for key in path {
        current = match current {
            Value::Object(mut map) =>
                map
                    .remove(*key)
                    .ok_or_else(||
                        SearchError::UnexpectedResponse(format!("missing '{}'", path.join(".")))
                    )?,
            _ => {
                return Err(
                    SearchError::UnexpectedResponse(format!("expected object at '{}'", key))
                );
            }
        };
    }
    Ok(current)
}

pub(crate) fn extract_hits(response: Value, path: &[&str]) -> Result<Vec<Value>> {
    match extract(response, path)? {
        Value::Array(hits) => Ok(hits),
        other =>
            Err(
                SearchError::UnexpectedResponse(
                    format!("expected array at '{}', got {}", path.join("."), other)
                )
            ),
    }
}
