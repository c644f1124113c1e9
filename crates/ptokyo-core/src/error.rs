// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parallel Tokyo client.

use thiserror::Error;

use crate::types::Table;

/// The primary error type used across all adapter traits and store actions.
#[derive(Debug, Error)]
pub enum PtokyoError {
    /// Configuration errors (missing credentials, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication failures. The message is meant to be shown to the user as-is.
    #[error("{message}")]
    Auth { message: String },

    /// An action that needs a signed-in user was invoked without one.
    #[error("user not authenticated")]
    NotAuthenticated,

    /// Remote data service errors (transport failure, rejected write, bad status).
    #[error("remote error: {message}")]
    Remote {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A row returned by the remote service could not be decoded into a record.
    #[error("failed to decode {table} row: {source}")]
    Decode {
        table: Table,
        source: serde_json::Error,
    },

    /// Realtime subscription errors (socket failure, join rejected).
    #[error("realtime error: {message}")]
    Realtime {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Text generation errors (API failure, quota, empty completion).
    #[error("generation error: {message}")]
    Generation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An optimistic write was driven through an illegal state transition.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// A user-supplied value was rejected before any I/O happened.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A record with the given id is not present.
    #[error("{table} record not found: {id}")]
    NotFound { table: Table, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PtokyoError {
    /// Shorthand for a remote error without an underlying cause.
    pub fn remote(message: impl Into<String>) -> Self {
        PtokyoError::Remote {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a generation error without an underlying cause.
    pub fn generation(message: impl Into<String>) -> Self {
        PtokyoError::Generation {
            message: message.into(),
            source: None,
        }
    }
}
