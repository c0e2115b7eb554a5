// ============================================================
// MAPPING DOMAIN LAYER
// ============================================================
// Declarative description of how rows turn into records

mod configuration;
mod representation;

pub use configuration::MappingConfiguration;
pub use representation::{
    AttributeRule, AttributeSource, ColumnConfiguration, ColumnFilter, EntityRepresentation,
    FilterOperator, RelationshipRepresentation, Representation,
};
