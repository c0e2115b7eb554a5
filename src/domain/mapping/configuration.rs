use serde::{Deserialize, Serialize};

use super::Representation;

/// Ordered list of representations. Declaration order is evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfiguration {
    #[serde(default)]
    pub name: String,
    pub representations: Vec<Representation>,
}

impl MappingConfiguration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            representations: Vec::new(),
        }
    }

    pub fn with(mut self, representation: impl Into<Representation>) -> Self {
        self.representations.push(representation.into());
        self
    }

    pub fn len(&self) -> usize {
        self.representations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representations.is_empty()
    }

    /// Declaration position of a representation
    pub fn position(&self, id: &str) -> Option<usize> {
        self.representations.iter().position(|r| r.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&Representation> {
        self.representations.iter().find(|r| r.id() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Representation> {
        self.representations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mapping::{AttributeRule, EntityRepresentation};

    #[test]
    fn test_lookup_by_id() {
        let config = MappingConfiguration::new("people")
            .with(EntityRepresentation::new("a", "Individual"))
            .with(
                EntityRepresentation::new("b", "Organization")
                    .with_attribute(AttributeRule::column("name", "B")),
            );

        assert_eq!(config.len(), 2);
        assert_eq!(config.position("b"), Some(1));
        assert_eq!(config.get("a").map(|r| r.target_type()), Some("Individual"));
        assert!(config.get("c").is_none());
    }
}
