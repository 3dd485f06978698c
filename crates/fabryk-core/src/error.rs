//! Error types for Fabryk operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Fabryk crates. Uses `thiserror` for derive macros.
//!
//! The taxonomy is deliberately small. Configuration errors surface at setup
//! time; infrastructure errors (shared cache transport and payload decoding)
//! surface per invocation. A missing principal or permission is never an error.

use std::path::Path;

use thiserror::Error;

/// Errors that can occur in Fabryk operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// The path being accessed.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shared cache transport failure.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a cache transport error.
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Wrap an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// True for setup-time configuration errors.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// True for failures of the surrounding infrastructure rather than the caller.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Cache(_) | Self::Serialization(_) | Self::Io(_) | Self::IoWithPath { .. }
        )
    }

    /// Whether a transport-level retry may succeed.
    ///
    /// Only transport failures qualify; a payload that failed to decode will
    /// fail the same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cache(_))
    }
}

/// Result type alias using Fabryk's Error type.
pub type Result<T> = std::result::Result<T, Error>;
