use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] listsync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),
    #[error("{failed} of {total} list definitions failed to sync")]
    SyncFailed { failed: usize, total: usize },
}
