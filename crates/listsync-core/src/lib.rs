//! listsync-core - Core library for listsync
//!
//! This crate contains the list models, the statically authored catalog, the
//! storage backends (libSQL, managed REST backend, in-memory), and the engine
//! that reconciles list definitions with a backend.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{
    ListDefinition, ListOption, ListRecord, ListTarget, ListValue, StoredList, SyncFailure,
    SyncReport,
};
pub use repository::ListRepository;
pub use sync::{ListSyncEngine, SessionSync};
