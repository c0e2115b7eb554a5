use serde::Deserialize;

use crate::domain::csv::ReaderOptions;
use crate::domain::error::{AppError, Result};
use crate::domain::mapping::{MappingConfiguration, Representation};

/// Representations may arrive inline or as a JSON-encoded string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RepresentationsField {
    Inline(Vec<Representation>),
    Encoded(String),
}

/// Declarative mapping description as stored by the configuration owner.
#[derive(Debug, Deserialize)]
pub struct MappingDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub has_header: Option<bool>,
    #[serde(default)]
    pub separator: Option<char>,
    #[serde(default, alias = "skipLineChar")]
    pub skip_line_char: Option<char>,
    representations: RepresentationsField,
}

impl MappingDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::InvalidMapping(format!("Failed to parse mapping: {}", e)))
    }

    /// Reader options with this document's overrides applied
    pub fn reader_options(&self, base: &ReaderOptions) -> ReaderOptions {
        let mut options = base.clone();
        if let Some(has_header) = self.has_header {
            options.has_header = has_header;
        }
        if let Some(separator) = self.separator {
            options.delimiter = separator;
        }
        if self.skip_line_char.is_some() {
            options.skip_line_char = self.skip_line_char;
        }
        options
    }

    pub fn into_configuration(self) -> Result<MappingConfiguration> {
        let representations = match self.representations {
            RepresentationsField::Inline(list) => list,
            RepresentationsField::Encoded(text) => serde_json::from_str(&text).map_err(|e| {
                AppError::InvalidMapping(format!("Failed to parse representations: {}", e))
            })?,
        };
        Ok(MappingConfiguration {
            name: self.name,
            representations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTITY_JSON: &str = r#"[{
        "type": "entity",
        "id": "area",
        "target_entity_type": "Administrative-Area",
        "attributes": [{ "attribute_key": "name", "source": { "kind": "column_ref", "column_name": "A" } }]
    }]"#;

    #[test]
    fn test_inline_representations() {
        let json = format!(
            r#"{{ "name": "areas", "has_header": false, "separator": ";", "representations": {} }}"#,
            ENTITY_JSON
        );
        let doc = MappingDocument::from_json(&json).unwrap();
        let options = doc.reader_options(&ReaderOptions::default());
        assert!(!options.has_header);
        assert_eq!(options.delimiter, ';');

        let config = doc.into_configuration().unwrap();
        assert_eq!(config.name, "areas");
        assert_eq!(config.representations[0].id(), "area");
    }

    #[test]
    fn test_encoded_representations() {
        let encoded = serde_json::to_string(ENTITY_JSON).unwrap();
        let json = format!(
            r##"{{ "name": "areas", "skipLineChar": "#", "representations": {} }}"##,
            encoded
        );
        let doc = MappingDocument::from_json(&json).unwrap();
        assert_eq!(doc.reader_options(&ReaderOptions::default()).skip_line_char, Some('#'));
        assert_eq!(doc.into_configuration().unwrap().len(), 1);
    }

    #[test]
    fn test_garbage_is_invalid_mapping() {
        let err = MappingDocument::from_json("{ \"representations\": 3 }").unwrap_err();
        assert!(matches!(err, AppError::InvalidMapping(_)));
    }
}
