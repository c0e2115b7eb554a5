// ============================================================
// READER OPTIONS
// ============================================================
// How raw CSV text is split into rows

use serde::{Deserialize, Serialize};

/// Options for the tabular reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// First record is a header row (default: true)
    pub has_header: bool,

    /// Field delimiter (default: ',')
    pub delimiter: char,

    /// Quote character (default: '"'), doubled inside quoted fields
    pub quote: char,

    /// Records whose first cell starts with this character are ignored
    pub skip_line_char: Option<char>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: ',',
            quote: '"',
            skip_line_char: None,
        }
    }
}

impl ReaderOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_skip_line_char(mut self, skip_line_char: Option<char>) -> Self {
        self.skip_line_char = skip_line_char;
        self
    }

    /// Validate option values
    pub fn validate(&self) -> Result<(), String> {
        if !self.delimiter.is_ascii() {
            return Err(format!("delimiter '{}' must be ASCII", self.delimiter));
        }
        if !self.quote.is_ascii() {
            return Err(format!("quote '{}' must be ASCII", self.quote));
        }
        if self.delimiter == self.quote {
            return Err("delimiter and quote must differ".to_string());
        }
        if matches!(self.delimiter, '\n' | '\r') {
            return Err("delimiter cannot be a line break".to_string());
        }
        if let Some(c) = self.skip_line_char {
            if !c.is_ascii() {
                return Err(format!("skip_line_char '{}' must be ASCII", c));
            }
            if c == self.delimiter || c == self.quote {
                return Err(format!(
                    "skip_line_char '{}' clashes with delimiter or quote",
                    c
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ReaderOptions::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_delimiters() {
        assert!(ReaderOptions::new().with_delimiter('é').validate().is_err());
        assert!(ReaderOptions::new().with_delimiter('"').validate().is_err());
        assert!(ReaderOptions::new()
            .with_skip_line_char(Some(','))
            .validate()
            .is_err());
    }
}
