use serde::{ de, Deserialize, Deserializer, Serialize, Serializer };
use serde_json::{ json, Map, Value };
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_VEC_DIST: &str = "cosine";

/// The closed set of data types a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    StringArray,
    Int32,
    Int32Array,
    Int64,
    Int64Array,
    Float,
    FloatArray,
    Bool,
    BoolArray,
    Geopoint,
    GeopointArray,
    Object,
    ObjectArray,
    StringStar,
    Image,
    Auto,
}

impl FieldType {
    pub const ALL: [FieldType; 17] = [
        FieldType::String,
        FieldType::StringArray,
        FieldType::Int32,
        FieldType::Int32Array,
        FieldType::Int64,
        FieldType::Int64Array,
        FieldType::Float,
        FieldType::FloatArray,
        FieldType::Bool,
        FieldType::BoolArray,
        FieldType::Geopoint,
        FieldType::GeopointArray,
        FieldType::Object,
        FieldType::ObjectArray,
        FieldType::StringStar,
        FieldType::Image,
        FieldType::Auto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::StringArray => "string[]",
            FieldType::Int32 => "int32",
            FieldType::Int32Array => "int32[]",
            FieldType::Int64 => "int64",
            FieldType::Int64Array => "int64[]",
            FieldType::Float => "float",
            FieldType::FloatArray => "float[]",
            FieldType::Bool => "bool",
            FieldType::BoolArray => "bool[]",
            FieldType::Geopoint => "geopoint",
            FieldType::GeopointArray => "geopoint[]",
            FieldType::Object => "object",
            FieldType::ObjectArray => "object[]",
            FieldType::StringStar => "string*",
            FieldType::Image => "image",
            FieldType::Auto => "auto",
        }
    }

    pub fn is_array(&self) -> bool {
        self.as_str().ends_with("[]")
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL.iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue("type".to_string()))
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|_| de::Error::custom(format!("unknown field type '{}'", raw)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Rule {
    Text,
    OneOfTypes,
    Boolean,
    Integer,
}

/// Recognized attributes in serialization order.
const ATTRIBUTES: [(&str, Rule); 14] = [
    ("name", Rule::Text),
    ("type", Rule::OneOfTypes),
    ("facet", Rule::Boolean),
    ("optional", Rule::Boolean),
    ("index", Rule::Boolean),
    ("store", Rule::Boolean),
    ("sort", Rule::Boolean),
    ("infix", Rule::Boolean),
    ("locale", Rule::Text),
    ("num_dim", Rule::Integer),
    ("vec_dist", Rule::Text),
    ("reference", Rule::Text),
    ("range_index", Rule::Boolean),
    ("stem", Rule::Boolean),
];

const REQUIRED_ATTRIBUTES: [&str; 2] = ["name", "type"];

fn rule_for(key: &str) -> Option<Rule> {
    ATTRIBUTES.iter()
        .find(|(name, _)| *name == key)
        .map(|(_, rule)| *rule)
}

fn is_required(key: &str) -> bool {
    REQUIRED_ATTRIBUTES.contains(&key)
}

fn check_value(key: &str, rule: Rule, value: &Value) -> Result<(), ValidationError> {
    if value.is_null() {
        return if is_required(key) {
            Err(ValidationError::Required(key.to_string()))
        } else {
            Ok(())
        };
    }
    if is_required(key) && value.as_str() == Some("") {
        return Err(ValidationError::Required(key.to_string()));
    }
    let valid = match rule {
        Rule::Text => value.is_string(),
        Rule::Boolean => value.is_boolean(),
        Rule::Integer => value.as_u64().map_or(false, |n| n <= u64::from(u32::MAX)),
        Rule::OneOfTypes =>
            value
                .as_str()
                .map_or(false, |s| s.parse::<FieldType>().is_ok()),
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue(key.to_string()))
    }
}

/// One named, typed document attribute and the indexing flags backends care about.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    field_type: FieldType,
    facet: bool,
    optional: bool,
    index: bool,
    store: bool,
    sort: bool,
    infix: bool,
    locale: String,
    num_dim: u32,
    vec_dist: String,
    reference: String,
    range_index: bool,
    stem: bool,
}

impl Field {
    /// A field with every optional attribute at its default.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::Required("name".to_string()));
        }
        Ok(Self {
            name,
            field_type,
            facet: false,
            optional: false,
            index: true,
            store: true,
            sort: false,
            infix: false,
            locale: DEFAULT_LOCALE.to_string(),
            num_dim: 0,
            vec_dist: DEFAULT_VEC_DIST.to_string(),
            reference: String::new(),
            range_index: false,
            stem: false,
        })
    }

    /// Checks an attribute map without building a field.
    ///
    /// Required keys are checked first, then unknown keys, then each value against
    /// the rule declared for its key.
    pub fn validate(attributes: &Map<String, Value>) -> Result<(), ValidationError> {
        for key in REQUIRED_ATTRIBUTES {
            if attributes.get(key).map_or(true, Value::is_null) {
                return Err(ValidationError::Required(key.to_string()));
            }
        }
        if let Some(unknown) = attributes.keys().find(|key| rule_for(key).is_none()) {
            return Err(ValidationError::UnknownKey(unknown.clone()));
        }
        for (key, value) in attributes {
            if let Some(rule) = rule_for(key) {
                check_value(key, rule, value)?;
            }
        }
        Ok(())
    }

    /// Builds a field from a plain attribute map, filling defaults for anything absent or null.
    pub fn create(attributes: &Map<String, Value>) -> Result<Self, ValidationError> {
        Self::validate(attributes)?;

        let name = attributes
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ValidationError::Required("name".to_string()))?;
        let field_type = attributes
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ValidationError::Required("type".to_string()))?
            .parse()?;

        let mut field = Self::new(name, field_type)?;
        for (key, value) in attributes {
            if !is_required(key) && !value.is_null() {
                field.apply(key, value)?;
            }
        }
        Ok(field)
    }

    /// Same as [`Field::create`] for an arbitrary JSON value, which must be an object.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        match value.as_object() {
            Some(attributes) => Self::create(attributes),
            None => Err(ValidationError::InvalidValue("field".to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_facet(&self) -> bool {
        self.facet
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_index(&self) -> bool {
        self.index
    }

    pub fn is_store(&self) -> bool {
        self.store
    }

    pub fn is_sort(&self) -> bool {
        self.sort
    }

    pub fn is_infix(&self) -> bool {
        self.infix
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn num_dim(&self) -> u32 {
        self.num_dim
    }

    /// True when `num_dim` marks this field as an embedding vector.
    pub fn is_vector(&self) -> bool {
        self.num_dim > 0
    }

    pub fn vec_dist(&self) -> &str {
        &self.vec_dist
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn is_range_index(&self) -> bool {
        self.range_index
    }

    pub fn is_stem(&self) -> bool {
        self.stem
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::Required("name".to_string()));
        }
        self.name = name;
        Ok(())
    }

    pub fn set_type(&mut self, field_type: FieldType) {
        self.field_type = field_type;
    }

    pub fn set_facet(&mut self, facet: bool) {
        self.facet = facet;
    }

    pub fn set_optional(&mut self, optional: bool) {
        self.optional = optional;
    }

    pub fn set_index(&mut self, index: bool) {
        self.index = index;
    }

    pub fn set_store(&mut self, store: bool) {
        self.store = store;
    }

    pub fn set_sort(&mut self, sort: bool) {
        self.sort = sort;
    }

    pub fn set_infix(&mut self, infix: bool) {
        self.infix = infix;
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }

    pub fn set_num_dim(&mut self, num_dim: u32) {
        self.num_dim = num_dim;
    }

    pub fn set_vec_dist(&mut self, vec_dist: impl Into<String>) {
        self.vec_dist = vec_dist.into();
    }

    pub fn set_reference(&mut self, reference: impl Into<String>) {
        self.reference = reference.into();
    }

    pub fn set_range_index(&mut self, range_index: bool) {
        self.range_index = range_index;
    }

    pub fn set_stem(&mut self, stem: bool) {
        self.stem = stem;
    }

    /// Reads one attribute by its wire name.
    pub fn attribute(&self, key: &str) -> Result<Value, ValidationError> {
        self.entries()
            .into_iter()
            .find(|(name, _, _)| *name == key)
            .map(|(_, value, _)| value)
            .ok_or_else(|| ValidationError::UnknownKey(key.to_string()))
    }

    /// Changes one attribute by its wire name, validating only that attribute.
    /// A null value restores the default of an optional attribute.
    pub fn set_attribute(&mut self, key: &str, value: &Value) -> Result<(), ValidationError> {
        let rule = rule_for(key).ok_or_else(|| ValidationError::UnknownKey(key.to_string()))?;
        check_value(key, rule, value)?;
        if value.is_null() {
            return self.reset(key);
        }
        self.apply(key, value)
    }

    fn reset(&mut self, key: &str) -> Result<(), ValidationError> {
        let defaults = Self::new(self.name.clone(), self.field_type)?;
        let value = defaults.attribute(key)?;
        self.apply(key, &value)
    }

    // Assumes `value` already passed `check_value` for `key`.
    fn apply(&mut self, key: &str, value: &Value) -> Result<(), ValidationError> {
        let invalid = || ValidationError::InvalidValue(key.to_string());
        let as_bool = || value.as_bool().ok_or_else(invalid);
        let as_text = || value.as_str().map(str::to_string).ok_or_else(invalid);
        match key {
            "name" => self.set_name(as_text()?)?,
            "type" => {
                self.field_type = value.as_str().ok_or_else(invalid)?.parse()?;
            }
            "facet" => {
                self.facet = as_bool()?;
            }
            "optional" => {
                self.optional = as_bool()?;
            }
            "index" => {
                self.index = as_bool()?;
            }
            "store" => {
                self.store = as_bool()?;
            }
            "sort" => {
                self.sort = as_bool()?;
            }
            "infix" => {
                self.infix = as_bool()?;
            }
            "locale" => {
                self.locale = as_text()?;
            }
            "num_dim" => {
                self.num_dim = value
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(invalid)?;
            }
            "vec_dist" => {
                self.vec_dist = as_text()?;
            }
            "reference" => {
                self.reference = as_text()?;
            }
            "range_index" => {
                self.range_index = as_bool()?;
            }
            "stem" => {
                self.stem = as_bool()?;
            }
            _ => {
                return Err(ValidationError::UnknownKey(key.to_string()));
            }
        }
        Ok(())
    }

    /// `(key, value, is_default)` for every attribute, in serialization order.
    /// `name` and `type` never count as default.
    fn entries(&self) -> [(&'static str, Value, bool); 14] {
        [
            ("name", json!(self.name), false),
            ("type", json!(self.field_type.as_str()), false),
            ("facet", json!(self.facet), !self.facet),
            ("optional", json!(self.optional), !self.optional),
            ("index", json!(self.index), self.index),
            ("store", json!(self.store), self.store),
            ("sort", json!(self.sort), !self.sort),
            ("infix", json!(self.infix), !self.infix),
            ("locale", json!(self.locale), self.locale == DEFAULT_LOCALE),
            ("num_dim", json!(self.num_dim), self.num_dim == 0),
            ("vec_dist", json!(self.vec_dist), self.vec_dist == DEFAULT_VEC_DIST),
            ("reference", json!(self.reference), self.reference.is_empty()),
            ("range_index", json!(self.range_index), !self.range_index),
            ("stem", json!(self.stem), !self.stem),
        ]
    }

    pub(crate) fn serialize_attributes(
        &self,
        exclude: &[&str],
        omit_defaults: bool
    ) -> Map<String, Value> {
        self.entries()
            .into_iter()
            .filter(|(key, _, is_default)| !exclude.contains(key) && !(omit_defaults && *is_default))
            .map(|(key, value, _)| (key.to_string(), value))
            .collect()
    }

    /// Compact form: `name` and `type` plus every attribute that differs from its default.
    pub fn to_map(&self) -> Map<String, Value> {
        self.serialize_attributes(&[], true)
    }

    /// Every attribute, defaults included.
    pub fn to_full_map(&self) -> Map<String, Value> {
        self.serialize_attributes(&[], false)
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let attributes = Map::<String, Value>::deserialize(deserializer)?;
        Field::create(&attributes).map_err(de::Error::custom)
    }
}
