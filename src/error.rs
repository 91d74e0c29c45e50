//! Typed errors raised by the query and ACL layers
//!
//! Repository functions return `anyhow::Result`; callers that need to react to
//! a specific condition recover it with `downcast_ref::<RegisterError>()`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    /// Permission filtering was attempted without an authenticated principal.
    /// This is a programming error on the caller's side, never retried.
    #[error("Permission filtering not possible for anonymous user")]
    AnonymousPrincipal,

    #[error("Unknown field '{field}' on {entity}")]
    UnknownField { entity: String, field: String },

    #[error("Unknown sort property '{property}' on {entity}")]
    UnknownSortProperty { entity: String, property: String },

    #[error("Invalid value '{value}' for field '{field}': expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Unknown permission: '{0}'")]
    UnknownPermission(String),

    #[error("Unknown entity type: '{0}'")]
    UnknownEntity(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: i64 },
}

impl RegisterError {
    /// Whether the error signals a broken caller contract rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(self, RegisterError::AnonymousPrincipal)
    }
}
