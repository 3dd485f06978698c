//! Configuration for the Fabryk access-control CLI.
//!
//! Provides the [`FabrykConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `FABRYK_CONFIG` environment variable
//! 3. XDG default: `~/.config/fabryk/config.toml`
//! 4. Built-in defaults
//!
//! `FABRYK_*` environment variables overlay the result. The overlay reaches
//! one section deep (`FABRYK_ACL_BACKEND`, `FABRYK_SEED_GLOBAL`) and every
//! value arrives as a string; lists are written as JSON arrays or
//! comma-separated text. Per-principal grants (`seed.users`) are file-only.

use confyg::{Confygery, env};
use fabryk_acl::{AclConfig, InMemoryPermissionStore};
use fabryk_core::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the Fabryk CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FabrykConfig {
    /// Project name, used in diagnostics.
    pub project_name: String,

    /// Access-control engine configuration.
    pub acl: AclConfig,

    /// Grants loaded into the in-memory store at startup.
    pub seed: SeedConfig,
}

/// Initial grants for the in-memory permission store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Permissions granted to every principal.
    #[serde(deserialize_with = "list_or_text")]
    pub global: Vec<String>,

    /// Per-principal grants.
    pub users: BTreeMap<String, Vec<String>>,
}

impl SeedConfig {
    /// Build an in-memory store holding these grants.
    pub fn to_store(&self) -> InMemoryPermissionStore {
        let store = InMemoryPermissionStore::new();
        store.seed(
            self.global.iter().cloned(),
            self.users
                .iter()
                .map(|(principal, perms)| (principal.clone(), perms.iter().cloned())),
        );
        store
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrText {
    List(Vec<String>),
    Text(String),
}

fn list_or_text<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match ListOrText::deserialize(deserializer)? {
        ListOrText::List(items) => Ok(items),
        ListOrText::Text(text) => parse_list(&text).map_err(serde::de::Error::custom),
    }
}

/// Parse `["a","b"]` or `a, b` into a list of non-empty items.
fn parse_list(text: &str) -> std::result::Result<Vec<String>, String> {
    let text = text.trim();
    if text.starts_with('[') {
        return serde_json::from_str(text).map_err(|e| format!("invalid list {text:?}: {e}"));
    }
    Ok(text
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect())
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for FabrykConfig {
    fn default() -> Self {
        Self {
            project_name: "fabryk".to_string(),
            acl: AclConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl FabrykConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// Loading priority:
    /// 1. Explicit `config_path` (from `--config` flag)
    /// 2. `FABRYK_CONFIG` env var
    /// 3. XDG default: `~/.config/fabryk/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level("FABRYK");
        env_opts.add_section("acl");
        env_opts.add_section("seed");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("FABRYK_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("fabryk").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `FABRYK_` prefix.
    ///
    /// Only keys the environment overlay can read back are emitted, so the
    /// output of `fabryk config export` loads as the same configuration.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "FABRYK", 0, &mut vars);
        Ok(vars)
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
///
/// Tables nested below a section are skipped: the overlay cannot address them.
fn flatten_toml_value(
    value: &toml::Value,
    prefix: &str,
    depth: usize,
    out: &mut Vec<(String, String)>,
) {
    match value {
        toml::Value::Table(_) if depth > 1 => {}
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, depth + 1, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => {
            out.push((prefix.to_string(), s.clone()));
        }
        toml::Value::Integer(i) => {
            out.push((prefix.to_string(), i.to_string()));
        }
        toml::Value::Float(f) => {
            out.push((prefix.to_string(), f.to_string()));
        }
        toml::Value::Boolean(b) => {
            out.push((prefix.to_string(), b.to_string()));
        }
        toml::Value::Datetime(dt) => {
            out.push((prefix.to_string(), dt.to_string()));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
