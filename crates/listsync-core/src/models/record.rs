//! Persisted list records and the write payloads the engine sends to a backend

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ListDefinition, ListOption};

/// A unique identifier for a stored list, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListId(Uuid);

impl ListId {
    /// Create a new unique list ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ListId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ListId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A unique identifier for a stored list value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueId(Uuid);

impl ValueId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ValueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ValueId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Parent row of a synchronized list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    pub id: ListId,
    /// Unique list code
    pub list_code: String,
    pub list_name: String,
    pub is_active: bool,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

/// Child value row, unique per `(list_id, value_code)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListValue {
    pub id: ValueId,
    pub list_id: ListId,
    pub value_code: String,
    pub value_label: String,
    #[serde(default)]
    pub parent_value_code: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
}

/// A list record together with all of its values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredList {
    pub record: ListRecord,
    pub values: Vec<ListValue>,
}

impl StoredList {
    /// Find a value by its code
    pub fn value(&self, value_code: &str) -> Option<&ListValue> {
        self.values
            .iter()
            .find(|value| value.value_code == value_code)
    }
}

/// A list record with its value count, used for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub record: ListRecord,
    pub value_count: usize,
}

/// Value fields written by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDraft {
    pub value_code: String,
    pub value_label: String,
    pub parent_value_code: Option<String>,
    pub sort_order: i64,
}

impl From<&ListOption> for ValueDraft {
    fn from(option: &ListOption) -> Self {
        Self {
            value_code: option.code.clone(),
            value_label: option.label.clone(),
            parent_value_code: option.parent_code.clone(),
            sort_order: option.sort_order,
        }
    }
}

/// Payload for creating a list and all of its values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewList {
    pub list_code: String,
    pub list_name: String,
    pub values: Vec<ValueDraft>,
}

impl From<&ListDefinition> for NewList {
    fn from(definition: &ListDefinition) -> Self {
        Self {
            list_code: definition.code.clone(),
            list_name: definition.name.clone(),
            values: definition.options.iter().map(ValueDraft::from).collect(),
        }
    }
}

/// A single child row write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueChange {
    /// Value missing from the backend
    Insert(ValueDraft),
    /// Existing value whose fields differ; the write also reactivates it
    Update { id: ValueId, draft: ValueDraft },
}

/// Payload for updating an existing list.
///
/// Applying it sets the name, marks the list active and bumps `updated_at`.
/// Values not mentioned are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListUpdate {
    pub list_id: ListId,
    pub list_name: String,
    pub values: Vec<ValueChange>,
}
