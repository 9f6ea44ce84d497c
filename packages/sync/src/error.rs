//! Errors of the synchronization engine.

use lambda_view_bus::BusError;
use lambda_view_core::{CoercionError, RowId};
use thiserror::Error;

/// Why an edit was not published.
///
/// Every variant except [`EditError::Transport`] is raised before the
/// transport is contacted.
#[derive(Debug, Error)]
pub enum EditError {
    /// No target is selected.
    #[error("no target selected")]
    NoTarget,

    /// Only parameters can be edited.
    #[error("{row} is a state entry and cannot be edited")]
    NotEditable { row: RowId },

    /// The key is not among the current parameters.
    #[error("no parameter named `{key}`")]
    NotFound { key: String },

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// The edited entry could not be serialized.
    #[error("encode error: {message}")]
    Encode { message: String },

    /// The transport refused the publish.
    #[error(transparent)]
    Transport(#[from] BusError),
}

/// Why a target could not be selected.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Core(#[from] lambda_view_core::Error),

    #[error(transparent)]
    Transport(#[from] BusError),
}

/// Result type alias for target selection.
pub type Result<T> = std::result::Result<T, ControllerError>;
