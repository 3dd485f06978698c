//! Fabryk Core: shared error types.
//!
//! This crate provides the foundational types used across all Fabryk crates.
//! It has no internal Fabryk dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias

#![doc = include_str!("../README.md")]

pub mod error;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
