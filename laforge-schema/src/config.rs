//! Configuration file parsing for `laforge.toml`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ast::Dialect;
use crate::error::{SchemaError, SchemaResult};

/// Main configuration structure for `laforge.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LaforgeConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Schema file configuration.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Migration settings.
    #[serde(default)]
    pub migrations: MigrationConfig,
}

/// `[database]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Target SQL dialect.
    #[serde(default)]
    pub dialect: Dialect,

    /// Whether tenant predicates are composed into every policy.
    #[serde(default)]
    pub multi_tenant: bool,
}

/// `[schema]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Path to the domain file.
    #[serde(default = "default_schema_path")]
    pub path: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            path: default_schema_path(),
        }
    }
}

fn default_schema_path() -> String {
    "domain.laforge".to_string()
}

/// `[migrations]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationConfig {
    /// Directory migration files are written to.
    #[serde(default = "default_migrations_dir")]
    pub dir: String,

    /// Whether destructive operations land in the primary migration.
    /// When false they are skipped with a fallback stanza.
    #[serde(default)]
    pub allow_destructive: bool,

    /// Path of the persisted snapshot.
    #[serde(default = "default_snapshot_path")]
    pub snapshot: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            dir: default_migrations_dir(),
            allow_destructive: false,
            snapshot: default_snapshot_path(),
        }
    }
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_snapshot_path() -> String {
    ".laforge/snapshot.json".to_string()
}

impl LaforgeConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        toml::from_str(content).map_err(|e| SchemaError::Toml { source: e })
    }
}
