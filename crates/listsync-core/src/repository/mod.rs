//! Storage interface the sync engine talks to

mod memory;
mod rest;

pub use memory::MemoryListRepository;
pub use rest::{RestClient, RestListRepository};

use crate::error::Result;
use crate::models::{ListSummary, ListTarget, ListUpdate, NewList, StoredList};

/// Trait for list storage operations (async)
///
/// A repository is bound to one [`ListTarget`], i.e. one pair of list/value
/// tables.
#[allow(async_fn_in_trait)]
pub trait ListRepository {
    /// Table family this repository reads and writes
    fn target(&self) -> ListTarget;

    /// Get a list and its values by unique code
    async fn find_by_code(&self, code: &str) -> Result<Option<StoredList>>;

    /// Create a list with all of its values
    async fn insert(&self, list: &NewList) -> Result<StoredList>;

    /// Apply a list update (name, reactivation, changed and new values)
    async fn update(&self, update: &ListUpdate) -> Result<()>;

    /// List every stored list ordered by code
    async fn list_all(&self) -> Result<Vec<ListSummary>>;
}
