use std::collections::BTreeMap;

use super::row_scratch::SlotState;
use super::value_extractor::{RowContext, ValueExtractor};
use crate::domain::error::FieldError;
use crate::domain::mapping::Representation;
use crate::domain::record::{BuiltRecord, Endpoints, RecordKind, Value};
use crate::domain::schema::{AttributeDefinition, SchemaRegistry};
use crate::infrastructure::hashing::computed_key;

/// Why a representation produced nothing for a row. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The column-based filter did not match
    Filtered,
    /// No row-derived attribute had a value
    NoRowData,
    /// A relationship endpoint was skipped
    EndpointSkipped(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Built(BuiltRecord),
    Skipped(SkipReason),
}

pub struct RecordBuilder<'s> {
    schema: &'s dyn SchemaRegistry,
    extractor: ValueExtractor<'s>,
}

impl<'s> RecordBuilder<'s> {
    pub fn new(schema: &'s dyn SchemaRegistry, extractor: ValueExtractor<'s>) -> Self {
        Self { schema, extractor }
    }

    pub fn build(
        &self,
        representation: &Representation,
        ctx: &RowContext<'_, '_, '_>,
    ) -> Result<BuildOutcome, FieldError> {
        if let Some(filter) = representation.column_based() {
            let cell = ctx
                .columns
                .resolve(&filter.column_name)
                .and_then(|idx| ctx.row.cell(idx));
            if !filter.matches(cell) {
                return Ok(BuildOutcome::Skipped(SkipReason::Filtered));
            }
        }

        let endpoints = match representation.endpoints() {
            Some((from, to)) => match (endpoint_key(from, ctx)?, endpoint_key(to, ctx)?) {
                (Some(from), Some(to)) => Some(Endpoints { from, to }),
                (None, _) => {
                    return Ok(BuildOutcome::Skipped(SkipReason::EndpointSkipped(
                        from.to_string(),
                    )))
                }
                (_, None) => {
                    return Ok(BuildOutcome::Skipped(SkipReason::EndpointSkipped(
                        to.to_string(),
                    )))
                }
            },
            None => None,
        };

        let target_type = representation.target_type();
        let definitions: &[AttributeDefinition] = self
            .schema
            .get_attribute_definitions(target_type)
            .unwrap_or(&[]);

        let mut attributes: BTreeMap<String, Value> = BTreeMap::new();
        let mut row_dependent = false;
        let mut row_data = false;
        for rule in representation.attributes() {
            let definition = definitions.iter().find(|d| d.key == rule.attribute_key);
            let extracted = self.extractor.extract(rule, definition, ctx)?;
            if rule.source.is_row_dependent() {
                row_dependent = true;
                row_data |= extracted.is_from_row();
            }
            if let Some(value) = extracted.value() {
                attributes.insert(rule.attribute_key.clone(), value);
            }
        }

        // Endpoints are the row data of a relationship.
        if endpoints.is_none() && (attributes.is_empty() || (row_dependent && !row_data)) {
            return Ok(BuildOutcome::Skipped(SkipReason::NoRowData));
        }

        if let Some(missing) = definitions
            .iter()
            .find(|d| d.mandatory && !attributes.contains_key(&d.key))
        {
            return Err(FieldError::MissingRequiredAttribute {
                attribute: missing.key.clone(),
            });
        }

        let key = {
            let mut identifying: BTreeMap<&str, &Value> = definitions
                .iter()
                .filter(|d| d.identifying)
                .filter_map(|d| attributes.get_key_value(&d.key))
                .map(|(k, v)| (k.as_str(), v))
                .collect();
            if !definitions.iter().any(|d| d.identifying) {
                identifying = attributes.iter().map(|(k, v)| (k.as_str(), v)).collect();
            }
            computed_key(target_type, &identifying, endpoints.as_ref())
        };

        Ok(BuildOutcome::Built(BuiltRecord {
            representation_id: representation.id().to_string(),
            row_index: ctx.row.index,
            computed_key: key,
            kind: if representation.is_entity() {
                RecordKind::Entity
            } else {
                RecordKind::Relationship
            },
            target_type: target_type.to_string(),
            attributes,
            endpoints,
        }))
    }
}

/// `Some(key)` for a built endpoint, `None` when it was skipped.
fn endpoint_key(
    representation_id: &str,
    ctx: &RowContext<'_, '_, '_>,
) -> Result<Option<String>, FieldError> {
    match ctx.prior.state(representation_id) {
        SlotState::Built(record) => Ok(Some(record.computed_key.clone())),
        SlotState::Skipped => Ok(None),
        SlotState::Failed | SlotState::Pending => Err(FieldError::MissingDependency {
            representation: representation_id.to_string(),
        }),
    }
}
