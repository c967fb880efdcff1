//! Backend table families a list can be synchronized into

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Table pair holding list records and their child values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTables {
    pub lists: &'static str,
    pub values: &'static str,
}

/// Which family of lists a repository or report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListTarget {
    /// Reference lists used by forms and back-office screens
    #[default]
    System,
    /// Suggestion lists backing autocomplete inputs
    Autocomplete,
}

impl ListTarget {
    /// All targets in sync order
    pub const ALL: [Self; 2] = [Self::System, Self::Autocomplete];

    #[must_use]
    pub const fn tables(self) -> ListTables {
        match self {
            Self::System => ListTables {
                lists: "system_lists",
                values: "system_list_values",
            },
            Self::Autocomplete => ListTables {
                lists: "autocomplete_lists",
                values: "autocomplete_list_values",
            },
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Autocomplete => "autocomplete",
        }
    }
}

impl fmt::Display for ListTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "autocomplete" => Ok(Self::Autocomplete),
            other => Err(format!("unknown list target '{other}'")),
        }
    }
}
