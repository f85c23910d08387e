use serde::de::{ DeserializeOwned, Error as _ };
use serde::{ Deserialize, Deserializer };
use serde_json::Value;
use std::time::Duration;
use log::warn;

use crate::engine::ServiceType;
use crate::error::{ Result, SearchError };

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

fn parse<T: DeserializeOwned>(service: ServiceType, raw: &Value) -> Result<T> {
    T::deserialize(raw).map_err(|e| SearchError::Config {
        service: service.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgoliaConfig {
    app_id: String,
    api_key: String,
}

impl AlgoliaConfig {
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> String {
        format!("https://{}.algolia.net/1", self.app_id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum Hosts {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticsearchConfig {
    hosts: Hosts,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl ElasticsearchConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            hosts: Hosts::One(host.into()),
            api_key: None,
            username: None,
            password: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn hosts(&self) -> Vec<&str> {
        match &self.hosts {
            Hosts::One(host) => vec![host.as_str()],
            Hosts::Many(hosts) => hosts.iter().map(String::as_str).collect(),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// `(username, password)` when both are set and non-empty.
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    /// First configured host; requests are not spread across nodes.
    pub fn base_url(&self) -> String {
        let hosts = self.hosts();
        if hosts.len() > 1 {
            warn!("{} Elasticsearch hosts configured, only {} is used.", hosts.len(), hosts[0]);
        }
        hosts
            .first()
            .map(|h| h.trim_end_matches('/').to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeilisearchConfig {
    host: String,
    api_key: String,
}

impl MeilisearchConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: api_key.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> String {
        self.host.trim_end_matches('/').to_string()
    }
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8108
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Port {
    Number(u16),
    Text(String),
}

/// Ports are written either as numbers or as numeric strings.
fn deserialize_port<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u16, D::Error> {
    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) =>
            text
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid port \"{}\"", text))),
    }
}

fn default_timeout() -> f64 {
    2.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypesenseNode {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,
}

impl Default for TypesenseNode {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypesenseConfig {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    nodes: Vec<TypesenseNode>,
    #[serde(default = "default_timeout")]
    connection_timeout_seconds: f64,
}

impl TypesenseConfig {
    pub fn new(api_key: impl Into<String>, nodes: Vec<TypesenseNode>) -> Self {
        Self {
            api_key: api_key.into(),
            nodes,
            connection_timeout_seconds: default_timeout(),
        }
    }

    pub fn with_connection_timeout(mut self, seconds: f64) -> Self {
        self.connection_timeout_seconds = seconds;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn nodes(&self) -> &[TypesenseNode] {
        &self.nodes
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.connection_timeout_seconds).unwrap_or_else(|_| {
            Duration::from_secs_f64(default_timeout())
        })
    }

    /// URL of the first node, or an empty string when no node is configured.
    pub fn base_url(&self) -> String {
        match self.nodes.first() {
            Some(node) => format!("{}://{}:{}", node.protocol, node.host, node.port),
            None => String::new(),
        }
    }
}

fn default_openai_base_url() -> String {
    OPENAI_BASE_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiConfig {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    base_url: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: default_openai_base_url(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }

    pub fn base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }
}

/// Parsed connection settings for one backend.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchConfig {
    Algolia(AlgoliaConfig),
    Elasticsearch(ElasticsearchConfig),
    Meilisearch(MeilisearchConfig),
    Typesense(TypesenseConfig),
    OpenAi(OpenAiConfig),
}

impl SearchConfig {
    pub fn from_value(service: ServiceType, raw: &Value) -> Result<Self> {
        Ok(match service {
            ServiceType::Algolia => SearchConfig::Algolia(parse(service, raw)?),
            ServiceType::Elasticsearch => SearchConfig::Elasticsearch(parse(service, raw)?),
            ServiceType::Meilisearch => SearchConfig::Meilisearch(parse(service, raw)?),
            ServiceType::Typesense => SearchConfig::Typesense(parse(service, raw)?),
            ServiceType::OpenAi => SearchConfig::OpenAi(parse(service, raw)?),
        })
    }

    pub fn service_type(&self) -> ServiceType {
        match self {
            SearchConfig::Algolia(_) => ServiceType::Algolia,
            SearchConfig::Elasticsearch(_) => ServiceType::Elasticsearch,
            SearchConfig::Meilisearch(_) => ServiceType::Meilisearch,
            SearchConfig::Typesense(_) => ServiceType::Typesense,
            SearchConfig::OpenAi(_) => ServiceType::OpenAi,
        }
    }

    pub fn base_url(&self) -> String {
        match self {
            SearchConfig::Algolia(c) => c.base_url(),
            SearchConfig::Elasticsearch(c) => c.base_url(),
            SearchConfig::Meilisearch(c) => c.base_url(),
            SearchConfig::Typesense(c) => c.base_url(),
            SearchConfig::OpenAi(c) => c.base_url(),
        }
    }

    /// Connection timeout carried by the config, if the backend defines one.
    pub fn connection_timeout(&self) -> Option<Duration> {
        match self {
            SearchConfig::Typesense(c) => Some(c.connection_timeout()),
            _ => None,
        }
    }
}
