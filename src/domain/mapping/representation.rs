use serde::{Deserialize, Serialize};

/// Per-rule parsing options for column values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfiguration {
    /// Split the cell into a list on this separator
    #[serde(default)]
    pub separator: Option<String>,

    /// Parse the cell as a date with this pattern (e.g. `YYYY-MM-DD`)
    #[serde(default)]
    pub date_pattern: Option<String>,
}

impl ColumnConfiguration {
    pub fn separator(separator: &str) -> Self {
        Self {
            separator: Some(separator.to_string()),
            date_pattern: None,
        }
    }

    pub fn date_pattern(pattern: &str) -> Self {
        Self {
            separator: None,
            date_pattern: Some(pattern.to_string()),
        }
    }
}

/// Where an attribute value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeSource {
    /// Cell of the current row. String values are taken verbatim; typed
    /// values are parsed from the trimmed cell. A whitespace-only cell is
    /// Empty.
    ColumnRef {
        column_name: String,
        #[serde(default)]
        configuration: Option<ColumnConfiguration>,
    },

    /// Static constant
    DefaultValue { value: String },

    /// Attribute of a record built earlier in the same row. Without an
    /// `attribute_key` the record's computed key is copied.
    BasedOnRef {
        representation_id: String,
        #[serde(default)]
        attribute_key: Option<String>,
    },
}

impl AttributeSource {
    /// Whether the value depends on the current row at all
    pub fn is_row_dependent(&self) -> bool {
        !matches!(self, AttributeSource::DefaultValue { .. })
    }

    pub fn is_blank(&self) -> bool {
        match self {
            AttributeSource::ColumnRef { column_name, .. } => column_name.trim().is_empty(),
            AttributeSource::DefaultValue { value } => value.trim().is_empty(),
            AttributeSource::BasedOnRef {
                representation_id, ..
            } => representation_id.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRule {
    pub attribute_key: String,
    pub source: AttributeSource,

    /// Used when `source` resolves to nothing for a row
    #[serde(default)]
    pub default_value: Option<String>,
}

impl AttributeRule {
    pub fn column(attribute_key: &str, column_name: &str) -> Self {
        Self {
            attribute_key: attribute_key.to_string(),
            source: AttributeSource::ColumnRef {
                column_name: column_name.to_string(),
                configuration: None,
            },
            default_value: None,
        }
    }

    pub fn column_with(
        attribute_key: &str,
        column_name: &str,
        configuration: ColumnConfiguration,
    ) -> Self {
        Self {
            attribute_key: attribute_key.to_string(),
            source: AttributeSource::ColumnRef {
                column_name: column_name.to_string(),
                configuration: Some(configuration),
            },
            default_value: None,
        }
    }

    pub fn default_value(attribute_key: &str, value: &str) -> Self {
        Self {
            attribute_key: attribute_key.to_string(),
            source: AttributeSource::DefaultValue {
                value: value.to_string(),
            },
            default_value: None,
        }
    }

    pub fn based_on(attribute_key: &str, representation_id: &str, source_key: Option<&str>) -> Self {
        Self {
            attribute_key: attribute_key.to_string(),
            source: AttributeSource::BasedOnRef {
                representation_id: representation_id.to_string(),
                attribute_key: source_key.map(str::to_string),
            },
            default_value: None,
        }
    }

    pub fn or_default(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    /// Representation this rule reads from, if any
    pub fn based_on_id(&self) -> Option<&str> {
        match &self.source {
            AttributeSource::BasedOnRef {
                representation_id, ..
            } => Some(representation_id.as_str()),
            _ => None,
        }
    }

    pub fn configuration(&self) -> Option<&ColumnConfiguration> {
        match &self.source {
            AttributeSource::ColumnRef { configuration, .. } => configuration.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    NotEq,
}

/// Restricts a representation to rows whose cell matches a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column_name: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl ColumnFilter {
    /// Compares trimmed, case-insensitively. A missing cell counts as empty.
    pub fn matches(&self, cell: Option<&str>) -> bool {
        let cell = cell.unwrap_or("").trim();
        let equal = cell.eq_ignore_ascii_case(self.value.trim());
        match self.operator {
            FilterOperator::Eq => equal,
            FilterOperator::NotEq => !equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRepresentation {
    pub id: String,
    pub target_entity_type: String,
    #[serde(default)]
    pub column_based: Option<ColumnFilter>,
    #[serde(default)]
    pub attributes: Vec<AttributeRule>,
}

impl EntityRepresentation {
    pub fn new(id: &str, target_entity_type: &str) -> Self {
        Self {
            id: id.to_string(),
            target_entity_type: target_entity_type.to_string(),
            column_based: None,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, rule: AttributeRule) -> Self {
        self.attributes.push(rule);
        self
    }

    pub fn with_filter(mut self, filter: ColumnFilter) -> Self {
        self.column_based = Some(filter);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRepresentation {
    pub id: String,
    pub target_relationship_type: String,
    pub from_representation_id: String,
    pub to_representation_id: String,
    #[serde(default)]
    pub column_based: Option<ColumnFilter>,
    #[serde(default)]
    pub attributes: Vec<AttributeRule>,
}

impl RelationshipRepresentation {
    pub fn new(id: &str, target_relationship_type: &str, from: &str, to: &str) -> Self {
        Self {
            id: id.to_string(),
            target_relationship_type: target_relationship_type.to_string(),
            from_representation_id: from.to_string(),
            to_representation_id: to.to_string(),
            column_based: None,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, rule: AttributeRule) -> Self {
        self.attributes.push(rule);
        self
    }
}

/// One mapping rule-set, producing either entities or relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Representation {
    Entity(EntityRepresentation),
    Relationship(RelationshipRepresentation),
}

impl Representation {
    pub fn id(&self) -> &str {
        match self {
            Representation::Entity(e) => &e.id,
            Representation::Relationship(r) => &r.id,
        }
    }

    pub fn target_type(&self) -> &str {
        match self {
            Representation::Entity(e) => &e.target_entity_type,
            Representation::Relationship(r) => &r.target_relationship_type,
        }
    }

    pub fn attributes(&self) -> &[AttributeRule] {
        match self {
            Representation::Entity(e) => &e.attributes,
            Representation::Relationship(r) => &r.attributes,
        }
    }

    pub fn attributes_mut(&mut self) -> &mut Vec<AttributeRule> {
        match self {
            Representation::Entity(e) => &mut e.attributes,
            Representation::Relationship(r) => &mut r.attributes,
        }
    }

    pub fn column_based(&self) -> Option<&ColumnFilter> {
        match self {
            Representation::Entity(e) => e.column_based.as_ref(),
            Representation::Relationship(r) => r.column_based.as_ref(),
        }
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, Representation::Entity(_))
    }

    /// `(from, to)` representation ids for relationships
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        match self {
            Representation::Entity(_) => None,
            Representation::Relationship(r) => Some((
                r.from_representation_id.as_str(),
                r.to_representation_id.as_str(),
            )),
        }
    }

    /// Every representation id this one reads from within a row
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = self
            .attributes()
            .iter()
            .filter_map(AttributeRule::based_on_id)
            .collect();
        if let Some((from, to)) = self.endpoints() {
            deps.push(from);
            deps.push(to);
        }
        deps.sort_unstable();
        deps.dedup();
        deps
    }
}

impl From<EntityRepresentation> for Representation {
    fn from(value: EntityRepresentation) -> Self {
        Representation::Entity(value)
    }
}

impl From<RelationshipRepresentation> for Representation {
    fn from(value: RelationshipRepresentation) -> Self {
        Representation::Relationship(value)
    }
}
