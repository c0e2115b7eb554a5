use std::collections::HashSet;

use tracing::{debug, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::mapping::{AttributeSource, MappingConfiguration, Representation};
use crate::domain::schema::SchemaRegistry;
use crate::infrastructure::config::MappingOptions;

/// A configuration that passed load-time validation.
#[derive(Debug, Clone)]
pub struct ValidatedMapping {
    configuration: MappingConfiguration,
    warnings: Vec<String>,
}

impl ValidatedMapping {
    pub fn configuration(&self) -> &MappingConfiguration {
        &self.configuration
    }

    /// Rules dropped in lenient mode
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_inner(self) -> MappingConfiguration {
        self.configuration
    }
}

pub struct MappingValidator<'s> {
    schema: &'s dyn SchemaRegistry,
    options: MappingOptions,
}

impl<'s> MappingValidator<'s> {
    pub fn new(schema: &'s dyn SchemaRegistry, options: MappingOptions) -> Self {
        Self { schema, options }
    }

    pub fn validate(&self, configuration: MappingConfiguration) -> Result<ValidatedMapping> {
        let mut configuration = sanitize(configuration);
        let mut warnings = Vec::new();

        if configuration.is_empty() {
            return Err(AppError::InvalidMapping(format!(
                "Mapping '{}' has no representation",
                configuration.name
            )));
        }

        let mut seen = HashSet::new();
        for representation in configuration.iter() {
            if representation.id().trim().is_empty() {
                return Err(AppError::InvalidMapping(
                    "Representation id must not be empty".to_string(),
                ));
            }
            if !seen.insert(representation.id()) {
                return Err(AppError::InvalidMapping(format!(
                    "Duplicate representation id '{}'",
                    representation.id()
                )));
            }
        }

        for idx in 0..configuration.len() {
            let (earlier, rest) = configuration.representations.split_at_mut(idx);
            let representation = &mut rest[0];
            self.check_target_type(idx, representation)?;
            check_endpoints(idx, representation, earlier)?;
            warnings.extend(self.check_attribute_keys(idx, representation)?);
            check_rules(idx, representation, earlier)?;
            self.check_mandatory(idx, representation)?;
        }

        for warning in &warnings {
            warn!("{}", warning);
        }
        debug!(
            "Mapping '{}' validated: {} representations, {} warnings",
            configuration.name,
            configuration.len(),
            warnings.len()
        );

        Ok(ValidatedMapping {
            configuration,
            warnings,
        })
    }

    fn check_target_type(&self, idx: usize, representation: &Representation) -> Result<()> {
        if self
            .schema
            .get_attribute_definitions(representation.target_type())
            .is_none()
        {
            let kind = if representation.is_entity() {
                "entity"
            } else {
                "relationship"
            };
            return Err(AppError::InvalidMapping(format!(
                "{}: unknown {} type '{}'",
                label(idx, representation),
                kind,
                representation.target_type()
            )));
        }
        Ok(())
    }

    /// Strict mode fails; lenient mode drops the rule and reports a warning.
    fn check_attribute_keys(
        &self,
        idx: usize,
        representation: &mut Representation,
    ) -> Result<Vec<String>> {
        let target_type = representation.target_type().to_string();
        let unknown: Vec<String> = representation
            .attributes()
            .iter()
            .filter(|rule| self.schema.attribute(&target_type, &rule.attribute_key).is_none())
            .map(|rule| rule.attribute_key.clone())
            .collect();

        if let Some(attribute) = unknown.first() {
            if self.options.strict {
                return Err(AppError::UnknownAttribute {
                    representation: representation.id().to_string(),
                    target_type,
                    attribute: attribute.clone(),
                });
            }
        }

        let name = label(idx, representation);
        let warnings = unknown
            .iter()
            .map(|attribute| {
                format!(
                    "{}: dropped unknown attribute '{}' for type '{}'",
                    name, attribute, target_type
                )
            })
            .collect();
        representation
            .attributes_mut()
            .retain(|rule| !unknown.contains(&rule.attribute_key));
        Ok(warnings)
    }

    fn check_mandatory(&self, idx: usize, representation: &Representation) -> Result<()> {
        let definitions = self
            .schema
            .get_attribute_definitions(representation.target_type())
            .unwrap_or(&[]);
        for definition in definitions.iter().filter(|d| d.mandatory) {
            if !representation
                .attributes()
                .iter()
                .any(|rule| rule.attribute_key == definition.key)
            {
                return Err(AppError::InvalidMapping(format!(
                    "{}: missing values for required attribute '{}'",
                    label(idx, representation),
                    definition.key
                )));
            }
        }
        Ok(())
    }
}

/// Drop rules whose source points at nothing.
fn sanitize(mut configuration: MappingConfiguration) -> MappingConfiguration {
    for representation in configuration.representations.iter_mut() {
        let id = representation.id().to_string();
        representation.attributes_mut().retain(|rule| {
            let keep = !rule.source.is_blank() || rule.default_value.is_some();
            if !keep {
                debug!("Dropping blank rule '{}' of '{}'", rule.attribute_key, id);
            }
            keep
        });
    }
    configuration
}

fn check_endpoints(idx: usize, representation: &Representation, earlier: &[Representation]) -> Result<()> {
    let Some((from, to)) = representation.endpoints() else {
        return Ok(());
    };
    for endpoint in [from, to] {
        match earlier.iter().find(|r| r.id() == endpoint) {
            Some(r) if r.is_entity() => {}
            Some(_) => {
                return Err(AppError::InvalidMapping(format!(
                    "{}: endpoint '{}' is not an entity representation",
                    label(idx, representation),
                    endpoint
                )));
            }
            None => {
                return Err(AppError::InvalidMapping(format!(
                    "{}: endpoint '{}' must be an entity representation declared earlier",
                    label(idx, representation),
                    endpoint
                )));
            }
        }
    }
    Ok(())
}

fn check_rules(idx: usize, representation: &Representation, earlier: &[Representation]) -> Result<()> {
    let mut keys = HashSet::new();
    for rule in representation.attributes() {
        if !keys.insert(rule.attribute_key.as_str()) {
            return Err(AppError::InvalidMapping(format!(
                "{}: attribute '{}' is mapped twice",
                label(idx, representation),
                rule.attribute_key
            )));
        }

        match &rule.source {
            AttributeSource::ColumnRef {
                configuration: Some(configuration),
                ..
            } => {
                if configuration.separator.is_some() && configuration.date_pattern.is_some() {
                    return Err(AppError::InvalidMapping(format!(
                        "{}: attribute '{}' sets both a separator and a date pattern",
                        label(idx, representation),
                        rule.attribute_key
                    )));
                }
                if configuration.separator.as_deref() == Some("") {
                    return Err(AppError::InvalidMapping(format!(
                        "{}: attribute '{}' has an empty separator",
                        label(idx, representation),
                        rule.attribute_key
                    )));
                }
            }
            AttributeSource::BasedOnRef {
                representation_id,
                attribute_key,
            } => {
                if representation_id == representation.id() {
                    return Err(AppError::InvalidMapping(format!(
                        "{}: attribute '{}' can't reference the representation itself",
                        label(idx, representation),
                        rule.attribute_key
                    )));
                }
                let Some(target) = earlier.iter().find(|r| r.id() == representation_id) else {
                    return Err(AppError::InvalidMapping(format!(
                        "{}: attribute '{}' references '{}', which is not declared earlier",
                        label(idx, representation),
                        rule.attribute_key,
                        representation_id
                    )));
                };
                if let Some(source_key) = attribute_key {
                    if !target
                        .attributes()
                        .iter()
                        .any(|r| &r.attribute_key == source_key)
                    {
                        return Err(AppError::InvalidMapping(format!(
                            "{}: '{}' maps no attribute '{}'",
                            label(idx, representation),
                            representation_id,
                            source_key
                        )));
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn label(idx: usize, representation: &Representation) -> String {
    format!("#{} {} ({})", idx + 1, representation.id(), representation.target_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mapping::{
        AttributeRule, ColumnConfiguration, EntityRepresentation, RelationshipRepresentation,
    };
    use crate::domain::schema::{AttributeDefinition, InMemorySchemaRegistry, ValueType};

    fn schema() -> InMemorySchemaRegistry {
        InMemorySchemaRegistry::new()
            .with_type(
                "Individual",
                vec![
                    AttributeDefinition::new("name", ValueType::String)
                        .mandatory()
                        .identifying(),
                    AttributeDefinition::new("description", ValueType::String),
                    AttributeDefinition::new("published", ValueType::Date),
                ],
            )
            .with_type("related-to", vec![AttributeDefinition::new("description", ValueType::String)])
    }

    fn validate(config: MappingConfiguration, strict: bool) -> Result<ValidatedMapping> {
        let registry = schema();
        let options = MappingOptions {
            strict,
            ..MappingOptions::default()
        };
        MappingValidator::new(&registry, options).validate(config)
    }

    fn person(id: &str) -> EntityRepresentation {
        EntityRepresentation::new(id, "Individual").with_attribute(AttributeRule::column("name", "A"))
    }

    #[test]
    fn test_valid_configuration() {
        let config = MappingConfiguration::new("m")
            .with(person("a"))
            .with(RelationshipRepresentation::new("r", "related-to", "a", "a").with_attribute(
                AttributeRule::default_value("description", "self-link"),
            ));
        let validated = validate(config, true).unwrap();
        assert_eq!(validated.configuration().len(), 2);
        assert!(validated.warnings().is_empty());
    }

    #[test]
    fn test_empty_configuration_is_invalid() {
        let err = validate(MappingConfiguration::new("empty"), true).unwrap_err();
        assert_eq!(
            err,
            AppError::InvalidMapping("Mapping 'empty' has no representation".to_string())
        );
    }

    #[test]
    fn test_forward_based_on_reference() {
        let config = MappingConfiguration::new("m")
            .with(person("a").with_attribute(AttributeRule::based_on("description", "b", Some("name"))))
            .with(person("b"));
        let err = validate(config, true).unwrap_err();
        assert!(matches!(err, AppError::InvalidMapping(msg) if msg.contains("not declared earlier")));
    }

    #[test]
    fn test_self_reference() {
        let config = MappingConfiguration::new("m").with(
            person("a").with_attribute(AttributeRule::based_on("description", "a", Some("name"))),
        );
        let err = validate(config, true).unwrap_err();
        assert!(matches!(err, AppError::InvalidMapping(msg) if msg.contains("itself")));
    }

    #[test]
    fn test_based_on_unmapped_attribute() {
        let config = MappingConfiguration::new("m")
            .with(person("a"))
            .with(person("b").with_attribute(AttributeRule::based_on("description", "a", Some("description"))));
        let err = validate(config, true).unwrap_err();
        assert!(matches!(err, AppError::InvalidMapping(msg) if msg.contains("maps no attribute")));
    }

    #[test]
    fn test_relationship_endpoints_must_be_earlier_entities() {
        let config = MappingConfiguration::new("m")
            .with(RelationshipRepresentation::new("r", "related-to", "a", "a"))
            .with(person("a"));
        assert!(matches!(validate(config, true), Err(AppError::InvalidMapping(_))));

        let config = MappingConfiguration::new("m")
            .with(person("a"))
            .with(RelationshipRepresentation::new("r", "related-to", "a", "a"))
            .with(RelationshipRepresentation::new("r2", "related-to", "a", "r"));
        let err = validate(config, true).unwrap_err();
        assert!(matches!(err, AppError::InvalidMapping(msg) if msg.contains("not an entity")));
    }

    #[test]
    fn test_unknown_target_type() {
        let config = MappingConfiguration::new("m").with(EntityRepresentation::new("a", "Spaceship"));
        let err = validate(config, true).unwrap_err();
        assert!(matches!(err, AppError::InvalidMapping(msg) if msg.contains("unknown entity type 'Spaceship'")));
    }

    #[test]
    fn test_unknown_attribute_strict_and_lenient() {
        let config = MappingConfiguration::new("m")
            .with(person("a").with_attribute(AttributeRule::column("shoe_size", "B")));

        let err = validate(config.clone(), true).unwrap_err();
        assert_eq!(
            err,
            AppError::UnknownAttribute {
                representation: "a".to_string(),
                target_type: "Individual".to_string(),
                attribute: "shoe_size".to_string(),
            }
        );

        let validated = validate(config, false).unwrap();
        assert_eq!(validated.warnings().len(), 1);
        assert!(validated.warnings()[0].contains("shoe_size"));
        assert_eq!(validated.configuration().representations[0].attributes().len(), 1);
    }

    #[test]
    fn test_separator_and_date_pattern_together() {
        let both = ColumnConfiguration {
            separator: Some(";".to_string()),
            date_pattern: Some("YYYY-MM-DD".to_string()),
        };
        let config = MappingConfiguration::new("m")
            .with(person("a").with_attribute(AttributeRule::column_with("published", "B", both)));
        let err = validate(config, true).unwrap_err();
        assert!(matches!(err, AppError::InvalidMapping(msg) if msg.contains("both a separator and a date pattern")));
    }

    #[test]
    fn test_mandatory_attribute_needs_a_rule() {
        let config = MappingConfiguration::new("m").with(
            EntityRepresentation::new("a", "Individual")
                .with_attribute(AttributeRule::column("description", "B")),
        );
        let err = validate(config, true).unwrap_err();
        assert!(matches!(err, AppError::InvalidMapping(msg) if msg.contains("required attribute 'name'")));
    }

    #[test]
    fn test_blank_rules_are_sanitized() {
        let config = MappingConfiguration::new("m").with(
            person("a")
                .with_attribute(AttributeRule::column("description", " "))
                .with_attribute(AttributeRule::column("published", "")),
        );
        let validated = validate(config, true).unwrap();
        assert_eq!(validated.configuration().representations[0].attributes().len(), 1);
    }

    #[test]
    fn test_duplicate_ids() {
        let config = MappingConfiguration::new("m").with(person("a")).with(person("a"));
        let err = validate(config, true).unwrap_err();
        assert!(matches!(err, AppError::InvalidMapping(msg) if msg.contains("Duplicate")));
    }
}
