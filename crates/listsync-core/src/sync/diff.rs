//! Field-level comparison between a definition and its stored list

use std::collections::{HashMap, HashSet};

use crate::models::{ListDefinition, ListUpdate, ListValue, StoredList, ValueChange, ValueDraft};

/// Writes needed to bring a stored list in line with its definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListDiff {
    pub name_changed: bool,
    pub reactivated: bool,
    pub values: Vec<ValueChange>,
    /// Stored values absent from the definition; never written
    pub stale_values: usize,
}

impl ListDiff {
    pub fn compute(definition: &ListDefinition, stored: &StoredList) -> Self {
        let by_code = stored
            .values
            .iter()
            .map(|value| (value.value_code.as_str(), value))
            .collect::<HashMap<_, _>>();

        let values = definition
            .options
            .iter()
            .filter_map(|option| {
                let draft = ValueDraft::from(option);
                match by_code.get(option.code.as_str()) {
                    None => Some(ValueChange::Insert(draft)),
                    Some(value) if value_differs(value, &draft) => Some(ValueChange::Update {
                        id: value.id,
                        draft,
                    }),
                    Some(_) => None,
                }
            })
            .collect();

        let declared = definition
            .options
            .iter()
            .map(|option| option.code.as_str())
            .collect::<HashSet<_>>();
        let stale_values = stored
            .values
            .iter()
            .filter(|value| !declared.contains(value.value_code.as_str()))
            .count();

        Self {
            name_changed: stored.record.list_name != definition.name,
            reactivated: !stored.record.is_active,
            values,
            stale_values,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.name_changed || self.reactivated || !self.values.is_empty()
    }

    /// Human-readable list of pending writes
    pub fn describe(&self) -> Vec<String> {
        let mut changes = Vec::new();
        if self.name_changed {
            changes.push("rename list".to_string());
        }
        if self.reactivated {
            changes.push("reactivate list".to_string());
        }
        for change in &self.values {
            changes.push(match change {
                ValueChange::Insert(draft) => format!("insert value '{}'", draft.value_code),
                ValueChange::Update { draft, .. } => format!("update value '{}'", draft.value_code),
            });
        }
        changes
    }

    pub fn into_update(self, definition: &ListDefinition, stored: &StoredList) -> ListUpdate {
        ListUpdate {
            list_id: stored.record.id,
            list_name: definition.name.clone(),
            values: self.values,
        }
    }
}

fn value_differs(value: &ListValue, draft: &ValueDraft) -> bool {
    !value.is_active
        || value.value_label != draft.value_label
        || value.sort_order != draft.sort_order
        || value.parent_value_code != draft.parent_value_code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListId, ListOption, ListRecord, ValueId};
    use pretty_assertions::assert_eq;

    fn stored(name: &str, values: &[(&str, &str, i64)]) -> StoredList {
        let id = ListId::new();
        StoredList {
            record: ListRecord {
                id,
                list_code: "languages".to_string(),
                list_name: name.to_string(),
                is_active: true,
                updated_at: 0,
            },
            values: values
                .iter()
                .map(|(code, label, sort_order)| ListValue {
                    id: ValueId::new(),
                    list_id: id,
                    value_code: (*code).to_string(),
                    value_label: (*label).to_string(),
                    parent_value_code: None,
                    sort_order: *sort_order,
                    is_active: true,
                })
                .collect(),
        }
    }

    fn languages() -> ListDefinition {
        ListDefinition::new("languages", "Langues")
            .with_option("fr", "Français")
            .with_option("ar", "Arabe")
    }

    #[test]
    fn identical_list_has_no_changes() {
        let stored = stored("Langues", &[("fr", "Français", 1), ("ar", "Arabe", 2)]);
        let diff = ListDiff::compute(&languages(), &stored);

        assert!(!diff.has_changes());
        assert!(diff.describe().is_empty());
    }

    #[test]
    fn detects_rename() {
        let stored = stored("Langues parlées", &[("fr", "Français", 1), ("ar", "Arabe", 2)]);
        let diff = ListDiff::compute(&languages(), &stored);

        assert!(diff.name_changed);
        assert_eq!(diff.describe(), vec!["rename list".to_string()]);
    }

    #[test]
    fn detects_changed_and_missing_values() {
        let stored = stored("Langues", &[("fr", "Francais", 1), ("ar", "Arabe", 5)]);
        let definition = languages().with(ListOption::new("ber", "Amazighe", 3).with_parent("ar"));

        let diff = ListDiff::compute(&definition, &stored);
        assert_eq!(
            diff.describe(),
            vec![
                "update value 'fr'".to_string(),
                "update value 'ar'".to_string(),
                "insert value 'ber'".to_string(),
            ]
        );
    }

    #[test]
    fn inactive_rows_are_reactivated() {
        let mut stored = stored("Langues", &[("fr", "Français", 1), ("ar", "Arabe", 2)]);
        stored.record.is_active = false;
        stored.values[1].is_active = false;

        let diff = ListDiff::compute(&languages(), &stored);
        assert!(diff.reactivated);
        assert_eq!(
            diff.describe(),
            vec![
                "reactivate list".to_string(),
                "update value 'ar'".to_string()
            ]
        );
    }

    #[test]
    fn stale_values_are_counted_but_not_written() {
        let stored = stored(
            "Langues",
            &[("fr", "Français", 1), ("ar", "Arabe", 2), ("la", "Latin", 3)],
        );
        let diff = ListDiff::compute(&languages(), &stored);

        assert_eq!(diff.stale_values, 1);
        assert!(!diff.has_changes());
    }
}
