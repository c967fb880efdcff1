//! Data models for listsync

mod definition;
mod record;
mod report;
mod target;

pub use definition::{ListDefinition, ListOption};
pub use record::{
    ListId, ListRecord, ListSummary, ListUpdate, ListValue, NewList, StoredList, ValueChange,
    ValueDraft, ValueId,
};
pub use report::{ReportVariant, SyncFailure, SyncReport};
pub use target::{ListTables, ListTarget};
