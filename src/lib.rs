pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{BatchProcessor, MappingValidator, ValidatedMapping};
pub use domain::error::{AppError, FieldError, Result, RowError};
pub use domain::mapping::{
    AttributeRule, AttributeSource, EntityRepresentation, MappingConfiguration,
    RelationshipRepresentation, Representation,
};
pub use domain::record::{BatchResult, BuiltRecord, RowOutcome, Value};
pub use domain::schema::{AttributeDefinition, InMemorySchemaRegistry, SchemaRegistry, ValueType};
pub use infrastructure::config::{EngineConfig, MappingDocument};
