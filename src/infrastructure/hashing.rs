use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::domain::record::{Endpoints, Value};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Content-addressed key: `<type-slug>--<sha256>` over the type, the
/// identifying attributes (ordered by key) and, for relationships, both
/// endpoint keys.
pub fn computed_key(
    target_type: &str,
    identifying: &BTreeMap<&str, &Value>,
    endpoints: Option<&Endpoints>,
) -> String {
    let mut canonical = format!("t{}:{}|", target_type.len(), target_type);
    for (key, value) in identifying {
        canonical.push_str(&format!("k{}:{}={};", key.len(), key, value.canonical()));
    }
    if let Some(ends) = endpoints {
        canonical.push_str(&format!(
            "|from{}:{}|to{}:{}",
            ends.from.len(),
            ends.from,
            ends.to.len(),
            ends.to
        ));
    }
    format!("{}--{}", type_slug(target_type), sha256_hex(canonical.as_bytes()))
}

fn type_slug(target_type: &str) -> String {
    target_type
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
