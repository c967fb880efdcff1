//! Reconciliation of list definitions with a repository
//!
//! - **engine**: `ListSyncEngine`, the create/update/skip loop and its
//!   observable state (in-progress flag, last run, listeners)
//! - **plan**: read-only dry run of the same comparison
//! - **session**: fire-once startup trigger

mod diff;
mod engine;
mod plan;
mod session;

pub use engine::{ListSyncEngine, ListenerId};
pub use plan::{PlanAction, PlanItem, SyncPlan};
pub use session::SessionSync;
