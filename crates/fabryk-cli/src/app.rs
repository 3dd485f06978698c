//! FabrykCli application.
//!
//! Wires the loaded [`FabrykConfig`] into an access-control engine and
//! dispatches parsed commands.

use crate::cli::{BaseCommand, CliArgs};
use crate::config::FabrykConfig;
use crate::config_handlers;
use fabryk_acl::{
    AuthorizationDecision, AuthorizationEvaluator, CredentialSet, create_cache_backend,
};
use fabryk_core::{Error, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// FabrykCli
// ============================================================================

/// The `fabryk` command-line application.
pub struct FabrykCli {
    name: String,
    config: Arc<FabrykConfig>,
    version: String,
}

/// Arguments of a `check` command.
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    /// Principal id, if one is presented.
    pub user: Option<String>,
    /// Permission required by the operation.
    pub permission: String,
    /// Attribute to carry the principal id; the configured one when unset.
    pub attribute: Option<String>,
    /// Present the credentials as unauthenticated.
    pub anonymous: bool,
}

impl FabrykCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = FabrykConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    /// Create a new CLI application.
    pub fn new(name: impl Into<String>, config: FabrykConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &FabrykConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    /// Library crates log through the `log` facade, which the subscriber picks up.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Build the evaluator over a store seeded from the `[seed]` section.
    pub async fn evaluator(&self) -> Result<AuthorizationEvaluator> {
        let store = Arc::new(self.config.seed.to_store());
        tracing::debug!(
            principals = store.principal_count(),
            globals = self.config.seed.global.len(),
            "seeded permission store"
        );
        AuthorizationEvaluator::from_config(store, &self.config.acl).await
    }

    /// Evaluate a single check request.
    pub async fn check(&self, request: &CheckRequest) -> Result<AuthorizationDecision> {
        let evaluator = self.evaluator().await?;
        let attribute = request
            .attribute
            .as_deref()
            .unwrap_or_else(|| evaluator.identifier_attribute());

        let mut credentials = if request.anonymous {
            CredentialSet::anonymous()
        } else {
            CredentialSet::authenticated()
        };
        if let Some(user) = &request.user {
            credentials = credentials.with_attribute(attribute, user.as_str());
        }

        evaluator.evaluate(&credentials, &request.permission).await
    }

    /// Effective permissions of `user`.
    pub async fn permissions(&self, user: &str) -> Result<Vec<String>> {
        if user.is_empty() {
            return Err(Error::config("user must not be empty"));
        }
        self.evaluator().await?.service().get_user_permissions(user).await
    }

    /// The global permission set.
    pub async fn globals(&self) -> Result<Vec<String>> {
        let mut globals = self.evaluator().await?.service().get_all_permissions().await;
        globals.sort();
        Ok(globals)
    }

    /// Construct the configured backend and return its name.
    pub async fn health(&self) -> Result<String> {
        let backend = create_cache_backend(&self.config.acl).await?;
        Ok(backend.name().to_string())
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        match args.command {
            Some(BaseCommand::Check {
                user,
                permission,
                attribute,
                anonymous,
            }) => {
                let request = CheckRequest {
                    user,
                    permission,
                    attribute,
                    anonymous,
                };
                let decision = self.check(&request).await?;
                println!("{decision}");
                Ok(())
            }
            Some(BaseCommand::Permissions { user }) => {
                for permission in self.permissions(&user).await? {
                    println!("{permission}");
                }
                Ok(())
            }
            Some(BaseCommand::Globals) => {
                for permission in self.globals().await? {
                    println!("{permission}");
                }
                Ok(())
            }
            Some(BaseCommand::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(BaseCommand::Health) => {
                let backend = self.health().await?;
                println!("{}: healthy ({backend} cache)", self.name);
                Ok(())
            }
            Some(BaseCommand::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("{} {}: use --help for usage", self.name, self.version);
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
