//! CLI argument parsing and command definitions.
//!
//! Provides the `fabryk` command surface: configuration, verbosity, the
//! access-control commands (check, permissions, globals), and the shared
//! version/health/config commands.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "FABRYK_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<BaseCommand>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum BaseCommand {
    /// Evaluate whether a principal holds a permission.
    Check {
        /// Principal id placed in the credential set.
        #[arg(short, long)]
        user: Option<String>,

        /// Permission required by the operation.
        #[arg(short, long)]
        permission: String,

        /// Attribute name carrying the principal id (defaults to the configured one).
        #[arg(short, long)]
        attribute: Option<String>,

        /// Present the credentials as unauthenticated.
        #[arg(long)]
        anonymous: bool,
    },

    /// Print the effective permissions of a principal.
    Permissions {
        /// Principal id.
        #[arg(short, long)]
        user: String,
    },

    /// Print the global permission set.
    Globals,

    /// Print version information.
    Version,

    /// Check that the configured cache backend can be constructed.
    Health,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "acl.backend").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "acl.backend").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================
