use tracing::debug;

use super::row_scratch::RowScratch;
use crate::domain::csv::{ColumnIndex, CsvRow};
use crate::domain::error::FieldError;
use crate::domain::mapping::{AttributeRule, AttributeSource, ColumnConfiguration};
use crate::domain::record::Value;
use crate::domain::schema::{AttributeDefinition, ValueType};
use crate::infrastructure::config::CoercionOptions;
use crate::infrastructure::date_pattern;

/// Result of resolving one attribute rule against one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// Value read from the row (a cell or an earlier record)
    Row(Value),
    /// Static value: a default source or a rule's fallback
    Default(Value),
    Empty,
}

impl Extracted {
    pub fn value(self) -> Option<Value> {
        match self {
            Extracted::Row(v) | Extracted::Default(v) => Some(v),
            Extracted::Empty => None,
        }
    }

    pub fn is_from_row(&self) -> bool {
        matches!(self, Extracted::Row(_))
    }
}

/// Borrowed view of the row being processed
pub struct RowContext<'r, 'o, 'a> {
    pub row: &'r CsvRow,
    pub columns: &'r ColumnIndex,
    pub prior: &'r RowScratch<'o, 'a>,
}

/// Resolves attribute values and coerces them to their declared type
pub struct ValueExtractor<'c> {
    coercion: &'c CoercionOptions,
    default_list_separator: &'c str,
}

impl<'c> ValueExtractor<'c> {
    pub fn new(coercion: &'c CoercionOptions, default_list_separator: &'c str) -> Self {
        Self {
            coercion,
            default_list_separator,
        }
    }

    pub fn extract(
        &self,
        rule: &AttributeRule,
        definition: Option<&AttributeDefinition>,
        ctx: &RowContext<'_, '_, '_>,
    ) -> Result<Extracted, FieldError> {
        match &rule.source {
            AttributeSource::ColumnRef {
                column_name,
                configuration,
            } => match read_cell(column_name, ctx) {
                Some(raw) => self
                    .coerce(rule, definition, configuration.as_ref(), raw)
                    .map(|v| v.map_or(Extracted::Empty, Extracted::Row)),
                None => self.fallback(rule, definition),
            },
            AttributeSource::DefaultValue { value } => {
                Ok(self
                    .coerce(rule, definition, None, value)?
                    .map_or(Extracted::Empty, Extracted::Default))
            }
            AttributeSource::BasedOnRef {
                representation_id,
                attribute_key,
            } => {
                let record = ctx.prior.record(representation_id).ok_or_else(|| {
                    FieldError::MissingDependency {
                        representation: representation_id.clone(),
                    }
                })?;
                let value = match attribute_key {
                    None => Some(Value::String(record.computed_key.clone())),
                    Some(key) => record.attribute(key).cloned(),
                };
                match value {
                    Some(value) => Ok(Extracted::Row(shape(value, definition))),
                    None => self.fallback(rule, definition),
                }
            }
        }
    }

    fn fallback(
        &self,
        rule: &AttributeRule,
        definition: Option<&AttributeDefinition>,
    ) -> Result<Extracted, FieldError> {
        match rule.default_value.as_deref() {
            Some(value) => Ok(self
                .coerce(rule, definition, None, value)?
                .map_or(Extracted::Empty, Extracted::Default)),
            None => Ok(Extracted::Empty),
        }
    }

    /// Separator first, then date pattern, then the declared type.
    fn coerce(
        &self,
        rule: &AttributeRule,
        definition: Option<&AttributeDefinition>,
        configuration: Option<&ColumnConfiguration>,
        raw: &str,
    ) -> Result<Option<Value>, FieldError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let value_type = definition.map_or(ValueType::String, |d| d.value_type);
        let multiple = definition.is_some_and(|d| d.multiple);

        if let Some(separator) = configuration.and_then(|c| c.separator.as_deref()) {
            return self.coerce_list(rule, value_type, raw, separator);
        }

        if let Some(pattern) = configuration.and_then(|c| c.date_pattern.as_deref()) {
            let date = date_pattern::parse_with_pattern(raw, pattern).ok_or_else(|| {
                FieldError::DateParse {
                    attribute: rule.attribute_key.clone(),
                    value: raw.trim().to_string(),
                    pattern: pattern.to_string(),
                }
            })?;
            let value = Value::Date(date);
            return Ok(Some(if multiple {
                Value::List(vec![value])
            } else {
                value
            }));
        }

        if multiple {
            return self.coerce_list(rule, value_type, raw, self.default_list_separator);
        }
        self.coerce_scalar(rule, value_type, raw).map(Some)
    }

    fn coerce_list(
        &self,
        rule: &AttributeRule,
        value_type: ValueType,
        raw: &str,
        separator: &str,
    ) -> Result<Option<Value>, FieldError> {
        let items = raw
            .split(separator)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| self.coerce_scalar(rule, value_type, s))
            .collect::<Result<Vec<_>, _>>()?;
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(Value::List(items)))
    }

    fn coerce_scalar(
        &self,
        rule: &AttributeRule,
        value_type: ValueType,
        raw: &str,
    ) -> Result<Value, FieldError> {
        let text = raw.trim();
        let mismatch = || FieldError::TypeCoercion {
            attribute: rule.attribute_key.clone(),
            value: text.to_string(),
            expected: value_type.to_string(),
        };
        match value_type {
            // Strings are kept verbatim
            ValueType::String => Ok(Value::String(raw.to_string())),
            ValueType::Integer => text.parse::<i64>().map(Value::Integer).map_err(|_| mismatch()),
            ValueType::Float => match text.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                _ => Err(mismatch()),
            },
            ValueType::Boolean => self
                .coercion
                .parse_bool(text)
                .map(Value::Boolean)
                .ok_or_else(mismatch),
            ValueType::Date => date_pattern::parse_default(text)
                .map(Value::Date)
                .ok_or_else(mismatch),
        }
    }
}

fn read_cell<'r>(column_name: &str, ctx: &RowContext<'r, '_, '_>) -> Option<&'r str> {
    let Some(idx) = ctx.columns.resolve(column_name) else {
        debug!("Column '{}' does not resolve to a position", column_name);
        return None;
    };
    ctx.row.cell(idx).filter(|cell| !cell.trim().is_empty())
}

/// Lists feed list-valued attributes as-is; scalars are wrapped.
fn shape(value: Value, definition: Option<&AttributeDefinition>) -> Value {
    match (value, definition.is_some_and(|d| d.multiple)) {
        (Value::List(items), _) => Value::List(items),
        (scalar, true) => Value::List(vec![scalar]),
        (scalar, false) => scalar,
    }
}
