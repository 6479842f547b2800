use serde::Deserialize;

use crate::error::ConfigError;

/// Conversion options, passed by value into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Row field separator (default `,`).
    pub delimiter: char,
    /// Separator between items of an array cell (default `,`).
    pub array_delimiter: String,
    /// Fill blank cells from schema defaults instead of null/error.
    pub write_defaults: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            array_delimiter: ",".to_string(),
            write_defaults: false,
        }
    }
}

impl ConvertOptions {
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_array_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.array_delimiter = delimiter.into();
        self
    }

    pub fn with_write_defaults(mut self, write_defaults: bool) -> Self {
        self.write_defaults = write_defaults;
        self
    }

    /// Row delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(|b| b.is_ascii() && !matches!(*b, b'\n' | b'\r' | b'"'))
            .ok_or_else(|| ConfigError::Delimiter(self.delimiter.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delimiter_byte()?;
        if self.array_delimiter.is_empty() {
            return Err(ConfigError::EmptyArrayDelimiter);
        }
        Ok(())
    }
}

/// Parses a delimiter option. Accepts a single character or the `\t`
/// escape; a literal tab is also fine. Line terminators and the quote
/// character are rejected.
pub fn parse_delimiter(s: &str) -> Result<char, ConfigError> {
    match s {
        "\\t" | "\t" | "tab" => Ok('\t'),
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !matches!(c, '\n' | '\r' | '"') => Ok(c),
                _ => Err(ConfigError::Delimiter(s.to_string())),
            }
        }
    }
}
