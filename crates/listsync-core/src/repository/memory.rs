//! In-memory repository, primarily for tests and dry runs

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::ListRepository;
use crate::error::{Error, Result};
use crate::models::{
    ListId, ListRecord, ListSummary, ListTarget, ListUpdate, ListValue, NewList, StoredList,
    ValueChange, ValueDraft, ValueId,
};
use crate::util::unix_timestamp_millis;

/// Repository keeping lists in process memory.
///
/// Counts every write it applies and can simulate backend failures for
/// chosen list codes or for every call.
#[derive(Debug, Default)]
pub struct MemoryListRepository {
    target: ListTarget,
    lists: Mutex<BTreeMap<String, StoredList>>,
    failing_codes: Mutex<HashSet<String>>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryListRepository {
    pub fn new(target: ListTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Make every call touching `code` fail
    pub fn fail_on(&self, code: impl Into<String>) {
        lock(&self.failing_codes).insert(code.into());
    }

    /// Simulate a backend that rejects every call
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Number of insert/update calls applied so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Store a list directly, bypassing the write counter
    pub fn seed(&self, list: &NewList) -> StoredList {
        let stored = build_stored_list(list);
        lock(&self.lists).insert(list.list_code.clone(), stored.clone());
        stored
    }

    /// Replace a stored list wholesale, bypassing the write counter
    pub fn put(&self, stored: StoredList) {
        lock(&self.lists).insert(stored.record.list_code.clone(), stored);
    }

    /// Current state of a list
    pub fn get(&self, code: &str) -> Option<StoredList> {
        lock(&self.lists).get(code).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.lists).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self, code: &str) -> Result<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(Error::Api("backend unavailable (503)".to_string()));
        }
        if lock(&self.failing_codes).contains(code) {
            return Err(Error::Api(format!("simulated failure for '{code}'")));
        }
        Ok(())
    }
}

impl ListRepository for MemoryListRepository {
    fn target(&self) -> ListTarget {
        self.target
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<StoredList>> {
        self.check_available(code)?;
        Ok(lock(&self.lists).get(code).cloned())
    }

    async fn insert(&self, list: &NewList) -> Result<StoredList> {
        self.check_available(&list.list_code)?;

        let mut lists = lock(&self.lists);
        if lists.contains_key(&list.list_code) {
            return Err(Error::Database(format!(
                "duplicate key value violates unique constraint on list_code '{}'",
                list.list_code
            )));
        }

        let stored = build_stored_list(list);
        lists.insert(list.list_code.clone(), stored.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(stored)
    }

    async fn update(&self, update: &ListUpdate) -> Result<()> {
        let mut lists = lock(&self.lists);
        let stored = lists
            .values_mut()
            .find(|stored| stored.record.id == update.list_id)
            .ok_or_else(|| Error::NotFound(update.list_id.to_string()))?;
        self.check_available(&stored.record.list_code)?;

        stored.record.list_name.clone_from(&update.list_name);
        stored.record.is_active = true;
        stored.record.updated_at = unix_timestamp_millis();

        for change in &update.values {
            match change {
                ValueChange::Insert(draft) => {
                    stored.values.push(build_value(stored.record.id, draft));
                }
                ValueChange::Update { id, draft } => {
                    let value = stored
                        .values
                        .iter_mut()
                        .find(|value| value.id == *id)
                        .ok_or_else(|| Error::NotFound(id.to_string()))?;
                    value.value_label.clone_from(&draft.value_label);
                    value.parent_value_code.clone_from(&draft.parent_value_code);
                    value.sort_order = draft.sort_order;
                    value.is_active = true;
                }
            }
        }

        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ListSummary>> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(Error::Api("backend unavailable (503)".to_string()));
        }
        Ok(lock(&self.lists)
            .values()
            .map(|stored| ListSummary {
                record: stored.record.clone(),
                value_count: stored.values.len(),
            })
            .collect())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn build_stored_list(list: &NewList) -> StoredList {
    let id = ListId::new();
    StoredList {
        record: ListRecord {
            id,
            list_code: list.list_code.clone(),
            list_name: list.list_name.clone(),
            is_active: true,
            updated_at: unix_timestamp_millis(),
        },
        values: list
            .values
            .iter()
            .map(|draft| build_value(id, draft))
            .collect(),
    }
}

fn build_value(list_id: ListId, draft: &ValueDraft) -> ListValue {
    ListValue {
        id: ValueId::new(),
        list_id,
        value_code: draft.value_code.clone(),
        value_label: draft.value_label.clone(),
        parent_value_code: draft.parent_value_code.clone(),
        sort_order: draft.sort_order,
        is_active: true,
    }
}
