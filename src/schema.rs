use serde::{ Deserialize, Serialize };
use serde_json::{ json, Map, Value };

use crate::engine::ServiceType;
use crate::error::{ Result, SearchError, ValidationError };
use crate::field::Field;

/// The structure of one collection: its name, ordered fields and optional default sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Collection (index) name.
    pub name: String,
    /// Fields in declaration order; every serializer preserves this order.
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sorting_field: Option<String>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
            default_sorting_field: None,
        }
    }

    pub fn with_default_sorting_field(mut self, field: impl Into<String>) -> Self {
        self.default_sorting_field = Some(field.into());
        self
    }

    /// Builds a schema from a list of raw attribute maps, validating each one.
    pub fn from_field_maps(name: impl Into<String>, fields: &[Value]) -> Result<Self> {
        let fields = fields
            .iter()
            .map(Field::from_value)
            .collect::<std::result::Result<Vec<_>, ValidationError>>()?;
        Ok(Self::new(name, fields))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Hosted-API shape: one flat object per field with every attribute spelled out.
    pub fn to_algolia_schema(&self) -> Value {
        Value::Array(
            self.fields
                .iter()
                .map(|f| Value::Object(f.to_full_map()))
                .collect()
        )
    }

    /// Search-engine shape: keyed by field name; `facet` and `optional` do not apply.
    pub fn to_elasticsearch_schema(&self) -> Value {
        self.keyed_by_name(&["name", "facet", "optional"])
    }

    /// Lightweight-server shape: keyed by field name, `facet` and `optional` included.
    pub fn to_meilisearch_schema(&self) -> Value {
        self.keyed_by_name(&["name"])
    }

    /// Collection document with the compact field list, as the protocol-native backend expects.
    pub fn to_typesense_schema(&self) -> Value {
        let fields: Vec<Value> = self.fields
            .iter()
            .map(|f| Value::Object(f.to_map()))
            .collect();

        let mut schema = Map::new();
        schema.insert("name".to_string(), json!(self.name));
        schema.insert("fields".to_string(), Value::Array(fields));
        if let Some(sort) = self.default_sorting_field.as_deref().filter(|s| !s.is_empty()) {
            schema.insert("default_sorting_field".to_string(), json!(sort));
        }
        Value::Object(schema)
    }

    /// Serializes for the given backend. The vector store has no schema concept.
    pub fn to_value(&self, service: ServiceType) -> Result<Value> {
        match service {
            ServiceType::Algolia => Ok(self.to_algolia_schema()),
            ServiceType::Elasticsearch => Ok(self.to_elasticsearch_schema()),
            ServiceType::Meilisearch => Ok(self.to_meilisearch_schema()),
            ServiceType::Typesense => Ok(self.to_typesense_schema()),
            ServiceType::OpenAi => Err(SearchError::UnsupportedService(service.to_string())),
        }
    }

    /// Like [`Schema::to_value`], starting from a backend identifier.
    pub fn to_value_for(&self, service: &str) -> Result<Value> {
        let service: ServiceType = service.parse()?;
        self.to_value(service)
    }

    fn keyed_by_name(&self, exclude: &[&str]) -> Value {
        let properties: Map<String, Value> = self.fields
            .iter()
            .map(|f| (f.name().to_string(), Value::Object(f.serialize_attributes(exclude, true))))
            .collect();
        Value::Object(properties)
    }
}
