use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declared type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::String => write!(f, "string"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Float => write!(f, "float"),
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Date => write!(f, "date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub key: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub mandatory: bool,
    /// Part of the computed key
    #[serde(default)]
    pub identifying: bool,
    /// List-valued
    #[serde(default)]
    pub multiple: bool,
}

impl AttributeDefinition {
    pub fn new(key: &str, value_type: ValueType) -> Self {
        Self {
            key: key.to_string(),
            value_type,
            mandatory: false,
            identifying: false,
            multiple: false,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn identifying(mut self) -> Self {
        self.identifying = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// Read-only view of the entity/relationship types known to the platform.
pub trait SchemaRegistry: Send + Sync {
    /// Attribute definitions of a type, or `None` when the type is unknown.
    fn get_attribute_definitions(&self, type_name: &str) -> Option<&[AttributeDefinition]>;

    fn attribute(&self, type_name: &str, key: &str) -> Option<&AttributeDefinition> {
        self.get_attribute_definitions(type_name)?
            .iter()
            .find(|d| d.key == key)
    }
}

/// Registry backed by a map, for embedding callers and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemorySchemaRegistry {
    types: HashMap<String, Vec<AttributeDefinition>>,
}

impl InMemorySchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, type_name: &str, definitions: Vec<AttributeDefinition>) -> Self {
        self.types.insert(type_name.to_string(), definitions);
        self
    }
}

impl SchemaRegistry for InMemorySchemaRegistry {
    fn get_attribute_definitions(&self, type_name: &str) -> Option<&[AttributeDefinition]> {
        self.types.get(type_name).map(Vec::as_slice)
    }
}
