//! libSQL storage for listsync

mod connection;
mod list_repository;
mod migrations;

pub use connection::{Database, ReplicaConfig};
pub use list_repository::LibSqlListRepository;
