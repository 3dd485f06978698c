//! Operator CLI for the Fabryk access-control engine.
//!
//! Loads a [`FabrykConfig`] (file, environment, defaults), seeds an
//! in-memory permission store from it, and answers authorization queries
//! against the configured cache backend.
//!
//! # Key Abstractions
//!
//! - [`FabrykCli`]: the application, built from parsed [`CliArgs`]
//! - [`FabrykConfig`]: `[acl]` engine settings plus `[seed]` grants
//! - `config` subcommands for inspecting and editing the config file

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::{CheckRequest, FabrykCli};
pub use cli::{BaseCommand, CliArgs, ConfigAction, ConfigCommand};
pub use config::{FabrykConfig, SeedConfig};
