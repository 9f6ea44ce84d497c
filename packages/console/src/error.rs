//! Console errors.

use std::path::PathBuf;

use lambda_view_sync::{ControllerError, EditError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("cannot read config {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unknown environment `{name}` (known: {known})")]
    UnknownEnvironment { name: String, known: String },

    #[error("timed out after {seconds}s waiting for {what}")]
    Timeout { seconds: u64, what: String },

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
