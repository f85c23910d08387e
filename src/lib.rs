pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod http;
pub mod query;
pub mod schema;
pub use config::SearchConfig;
pub use engine::{
    SearchService,
    create_search_service,
    create_search_service_from_config,
    get_service_type,
    ServiceType,
};
pub use error::{ HttpClientError, Result, SearchError, ValidationError };
pub use field::{ Field, FieldType };
pub use http::{ Body, Headers, HttpTransport, ReqwestTransport };
pub use query::SearchQuery;
pub use schema::Schema;
