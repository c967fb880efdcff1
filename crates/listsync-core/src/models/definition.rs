//! Statically authored list definitions

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One selectable value of a list definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOption {
    /// Stable value code (unique within its list)
    pub code: String,
    /// Display label
    pub label: String,
    /// Position within the list
    #[serde(default)]
    pub sort_order: i64,
    /// Code of the parent value for hierarchical lists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,
}

impl ListOption {
    /// Create a new top-level option
    pub fn new(code: impl Into<String>, label: impl Into<String>, sort_order: i64) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            sort_order,
            parent_code: None,
        }
    }

    /// Attach this option to a parent value
    #[must_use]
    pub fn with_parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }
}

/// A named, option-valued list the application expects to exist in the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDefinition {
    /// Unique list code
    pub code: String,
    /// Display name
    pub name: String,
    /// Values in display order
    #[serde(default)]
    pub options: Vec<ListOption>,
}

impl ListDefinition {
    /// Create a definition without options
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            options: Vec::new(),
        }
    }

    /// Append an option, placing it after the existing ones
    #[must_use]
    pub fn with_option(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        let sort_order = i64::try_from(self.options.len()).unwrap_or(i64::MAX) + 1;
        self.options.push(ListOption::new(code, label, sort_order));
        self
    }

    /// Append a fully specified option
    #[must_use]
    pub fn with(mut self, option: ListOption) -> Self {
        self.options.push(option);
        self
    }

    /// Check the definition can be written to a backend.
    ///
    /// Codes and names must be non-blank and option codes unique.
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(Error::InvalidDefinition("list code is empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidDefinition(format!(
                "list '{}' has an empty name",
                self.code
            )));
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        for option in &self.options {
            if option.code.trim().is_empty() {
                return Err(Error::InvalidDefinition(format!(
                    "list '{}' has an option with an empty code",
                    self.code
                )));
            }
            if !seen.insert(option.code.as_str()) {
                return Err(Error::InvalidDefinition(format!(
                    "list '{}' declares option '{}' more than once",
                    self.code, option.code
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_option_assigns_increasing_sort_order() {
        let definition = ListDefinition::new("formats", "Formats")
            .with_option("print", "Imprimé")
            .with_option("ebook", "Livre numérique");

        assert_eq!(definition.options[0].sort_order, 1);
        assert_eq!(definition.options[1].sort_order, 2);
    }

    #[test]
    fn validate_accepts_empty_options() {
        assert!(ListDefinition::new("empty", "Empty").validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_code() {
        let error = ListDefinition::new("  ", "Blank").validate().unwrap_err();
        assert!(error.to_string().contains("list code is empty"));
    }

    #[test]
    fn validate_rejects_duplicate_option_codes() {
        let definition = ListDefinition::new("languages", "Langues")
            .with_option("fr", "Français")
            .with_option("fr", "French");

        let error = definition.validate().unwrap_err();
        assert!(error.to_string().contains("'fr' more than once"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let definition: ListDefinition = serde_json::from_str(
            r#"{"code": "formats", "name": "Formats", "options": [{"code": "print", "label": "Imprimé"}]}"#,
        )
        .unwrap();

        assert_eq!(definition.options[0].sort_order, 0);
        assert_eq!(definition.options[0].parent_code, None);
    }
}
