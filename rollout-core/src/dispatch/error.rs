//! Dispatcher error types

use thiserror::Error;

/// Errors surfaced by a dispatcher call
///
/// The same variants are produced for in-process and remote calls so that
/// callers never need to know where a procedure ran.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// No handler is registered (or reachable) for the procedure
    #[error("Unknown procedure: {module}.{procedure}")]
    UnknownProcedure { module: String, procedure: String },

    /// The input could not be encoded or decoded
    #[error("Invalid input for {procedure}: {message}")]
    InvalidInput { procedure: String, message: String },

    /// The output could not be encoded or decoded
    #[error("Invalid output from {procedure}: {message}")]
    InvalidOutput { procedure: String, message: String },

    /// The request never produced a response (connection, timeout, ...)
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The remote peer answered with an error status
    #[error("Remote error (status {status}): {message}")]
    Remote { status: u16, message: String },

    /// The handler itself failed
    #[error("Handler failed: {0}")]
    Handler(String),
}

impl DispatchError {
    /// Wraps any displayable error as a handler failure
    pub fn handler(err: impl std::fmt::Display) -> Self {
        Self::Handler(err.to_string())
    }

    pub fn unknown(module: impl Into<String>, procedure: impl Into<String>) -> Self {
        Self::UnknownProcedure {
            module: module.into(),
            procedure: procedure.into(),
        }
    }

    /// Check if the error was raised before reaching any handler
    pub fn is_unknown_procedure(&self) -> bool {
        matches!(self, Self::UnknownProcedure { .. })
            || matches!(self, Self::Remote { status: 404, .. })
    }
}
