use std::collections::HashMap;

use crate::domain::error::{AppError, Result};
use crate::domain::mapping::{MappingConfiguration, Representation};

/// Representations in evaluation order, with each id's slot in the per-row
/// scratch array.
#[derive(Debug)]
pub struct EvaluationOrder<'a> {
    representations: Vec<&'a Representation>,
    slots: HashMap<&'a str, usize>,
}

impl<'a> EvaluationOrder<'a> {
    pub fn len(&self) -> usize {
        self.representations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Representation> + '_ {
        self.representations.iter().copied()
    }

    pub fn slot(&self, id: &str) -> Option<usize> {
        self.slots.get(id).copied()
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.representations.iter().map(|r| r.id()).collect()
    }
}

pub struct DependencyResolver;

impl DependencyResolver {
    /// Declaration order is the evaluation order. Re-checks that every
    /// dependency (based-on reference or relationship endpoint) is declared
    /// strictly earlier, since a configuration can change after validation.
    pub fn order(configuration: &MappingConfiguration) -> Result<EvaluationOrder<'_>> {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        for (idx, representation) in configuration.iter().enumerate() {
            if slots.insert(representation.id(), idx).is_some() {
                return Err(AppError::InvalidMapping(format!(
                    "Duplicate representation id '{}'",
                    representation.id()
                )));
            }
        }

        for (idx, representation) in configuration.iter().enumerate() {
            for dep in representation.dependencies() {
                match slots.get(dep) {
                    None => {
                        return Err(AppError::InvalidMapping(format!(
                            "Representation '{}' references unknown representation '{}'",
                            representation.id(),
                            dep
                        )));
                    }
                    Some(&dep_idx) if dep_idx >= idx => {
                        let detail = match find_cycle(configuration, &slots, idx) {
                            Some(path) => format!("cycle {}", path.join(" -> ")),
                            None => format!(
                                "'{}' depends on '{}', which is evaluated after it",
                                representation.id(),
                                dep
                            ),
                        };
                        return Err(AppError::CyclicDependency(detail));
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(EvaluationOrder {
            representations: configuration.iter().collect(),
            slots,
        })
    }
}

/// Depth-first search for a dependency path leading back to `start`.
fn find_cycle(
    configuration: &MappingConfiguration,
    slots: &HashMap<&str, usize>,
    start: usize,
) -> Option<Vec<String>> {
    fn visit(
        configuration: &MappingConfiguration,
        slots: &HashMap<&str, usize>,
        start: usize,
        current: usize,
        path: &mut Vec<usize>,
        seen: &mut Vec<bool>,
    ) -> bool {
        for dep in configuration.representations[current].dependencies() {
            let Some(&next) = slots.get(dep) else {
                continue;
            };
            if next == start {
                path.push(next);
                return true;
            }
            if seen[next] {
                continue;
            }
            seen[next] = true;
            path.push(next);
            if visit(configuration, slots, start, next, path, seen) {
                return true;
            }
            path.pop();
        }
        false
    }

    let mut path = vec![start];
    let mut seen = vec![false; configuration.len()];
    seen[start] = true;
    if visit(configuration, slots, start, start, &mut path, &mut seen) {
        Some(
            path.into_iter()
                .map(|i| configuration.representations[i].id().to_string())
                .collect(),
        )
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mapping::{AttributeRule, EntityRepresentation, RelationshipRepresentation};

    #[test]
    fn test_declared_order_is_kept() {
        let config = MappingConfiguration::new("m")
            .with(EntityRepresentation::new("a", "Individual"))
            .with(EntityRepresentation::new("b", "Organization"))
            .with(RelationshipRepresentation::new("r", "part-of", "a", "b"));

        let order = DependencyResolver::order(&config).unwrap();
        assert_eq!(order.ids(), vec!["a", "b", "r"]);
        assert_eq!(order.slot("r"), Some(2));
        assert_eq!(order.slot("zzz"), None);
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        // Bypasses validation: a and b reference each other.
        let config = MappingConfiguration::new("m")
            .with(
                EntityRepresentation::new("a", "Individual")
                    .with_attribute(AttributeRule::based_on("name", "b", Some("name"))),
            )
            .with(
                EntityRepresentation::new("b", "Individual")
                    .with_attribute(AttributeRule::based_on("name", "a", Some("name"))),
            );

        let err = DependencyResolver::order(&config).unwrap_err();
        assert_eq!(err, AppError::CyclicDependency("cycle a -> b -> a".to_string()));
    }

    #[test]
    fn test_forward_reference_without_cycle() {
        let config = MappingConfiguration::new("m")
            .with(RelationshipRepresentation::new("r", "part-of", "a", "a"))
            .with(EntityRepresentation::new("a", "Individual"));

        let err = DependencyResolver::order(&config).unwrap_err();
        assert!(matches!(err, AppError::CyclicDependency(msg) if msg.contains("evaluated after")));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let config = MappingConfiguration::new("m").with(
            EntityRepresentation::new("a", "Individual")
                .with_attribute(AttributeRule::based_on("alias", "a", Some("name"))),
        );
        let err = DependencyResolver::order(&config).unwrap_err();
        assert_eq!(err, AppError::CyclicDependency("cycle a -> a".to_string()));
    }

    #[test]
    fn test_unknown_reference() {
        let config = MappingConfiguration::new("m")
            .with(RelationshipRepresentation::new("r", "part-of", "x", "y"));
        assert!(matches!(
            DependencyResolver::order(&config),
            Err(AppError::InvalidMapping(_))
        ));
    }
}
