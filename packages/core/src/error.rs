//! Error types for the core layer.
//!
//! Nothing here touches a transport. Transport failures live in
//! `lambda-view-bus`; these are naming, framing and coercion errors.

use thiserror::Error;

/// Raw edit input could not be coerced into the entry's type.
///
/// Always surfaced to whoever submitted the edit. An edit that fails
/// coercion is never published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// The input is not a finite number.
    #[error("`{raw}` is not a finite number")]
    NotNumeric { raw: String },

    /// The input is numeric but has no exact 64-bit integer representation.
    #[error("`{raw}` is not a 64-bit integer")]
    NotInteger { raw: String },

    /// The entry carries a type tag the codec does not know.
    #[error("unknown entry type `{type_name}`")]
    UnknownType { type_name: String },
}

impl CoercionError {
    /// Short machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            CoercionError::NotNumeric { .. } => "NotNumeric",
            CoercionError::NotInteger { .. } => "NotInteger",
            CoercionError::UnknownType { .. } => "UnknownType",
        }
    }
}

/// Errors from the core layer.
#[derive(Debug, Error)]
pub enum Error {
    /// An instance name was empty. There is no target to build channels for.
    #[error("instance name must not be empty")]
    EmptyInstance,

    /// A snapshot payload was not a JSON array of entries.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// Entries could not be serialized for the wire.
    #[error("encode error: {message}")]
    Encode { message: String },

    /// Edit input did not match the entry type.
    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
