//! # LaForge
//!
//! A policy-first backend compiler: LaForge ingests a small
//! domain-definition language (data models, declarative row-level
//! policies, lifecycle hooks) and deterministically emits a canonical
//! Model AST, a relational schema, row-level-security predicates, CRUD
//! query templates, and an incremental migration stream diffed against a
//! persisted snapshot.
//!
//! ## Quick Start
//!
//! ```rust
//! use laforge::{CompileOptions, compile};
//!
//! let result = compile(
//!     r#"
//!     model Note {
//!         id: uuid pk
//!         tenantId: uuid tenant
//!         text: string
//!     }
//!     policy Note.read { true }
//!     "#,
//!     &CompileOptions::default().multi_tenant(true),
//! ).unwrap();
//!
//! assert!(result.schema_sql.contains("CREATE TABLE IF NOT EXISTS notes"));
//! assert!(result.rls_sql.contains("current_setting('app.tenant_id')"));
//! ```
//!
//! The core is purely computational: `compile` performs no I/O. The
//! snapshot store ([`laforge_migrate::FsSnapshotStore`]) and the
//! migration writer are driver-side collaborators.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use laforge_codegen::{generate_queries_sql, generate_rls_sql, generate_schema_sql};
use laforge_migrate::{EmissionWarning, MigrationEmitter, MigrationFile, diff_domains};
use laforge_schema::{
    Dialect, Domain, LaforgeConfig, SchemaError, SnapshotDoc, structural_eq,
};

/// Schema parsing, AST types, validation, and the snapshot projection.
pub mod schema {
    pub use laforge_schema::*;
}

/// Policy lowering to SQL predicates.
pub mod policy {
    pub use laforge_policy::*;
}

/// Schema diffing, dialect adapters, and migration emission.
pub mod migrate {
    pub use laforge_migrate::*;
}

/// SQL artifact emitters.
pub mod codegen {
    pub use laforge_codegen::*;
}

pub use laforge_policy::PolicyError;
pub use laforge_schema::ErrorKind as CompileErrorKind;

/// A fatal compilation error. Nothing else escapes the core; warnings
/// travel in [`CompileResult::warnings`].
#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    /// Front-end or validation failure.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    /// Policy lowering failure.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Policy(#[from] PolicyError),
}

impl CompileError {
    /// The coarse error family: syntax, semantic, or policy.
    pub fn kind(&self) -> CompileErrorKind {
        match self {
            Self::Schema(err) => err.kind(),
            Self::Policy(_) => CompileErrorKind::Policy,
        }
    }
}

/// Inputs supplied by the driver.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Target SQL dialect.
    pub dialect: Dialect,
    /// Compose tenant predicates into policies on tenanted models.
    pub multi_tenant: bool,
    /// Let destructive operations into the primary migration file.
    pub allow_destructive: bool,
    /// The previous Model AST (from the snapshot store), enabling
    /// incremental migration emission.
    pub previous: Option<Domain>,
}

impl CompileOptions {
    /// Options for a dialect with everything else defaulted.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    /// Build options from a parsed `laforge.toml`.
    pub fn from_config(config: &LaforgeConfig) -> Self {
        Self {
            dialect: config.database.dialect,
            multi_tenant: config.database.multi_tenant,
            allow_destructive: config.migrations.allow_destructive,
            previous: None,
        }
    }

    /// Set the multi-tenant flag.
    pub fn multi_tenant(mut self, on: bool) -> Self {
        self.multi_tenant = on;
        self
    }

    /// Set the destructive-migration gate.
    pub fn allow_destructive(mut self, on: bool) -> Self {
        self.allow_destructive = on;
        self
    }

    /// Supply the previous Model AST for incremental migration.
    pub fn with_previous(mut self, previous: Domain) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Supply the previous Model AST from a loaded snapshot document.
    pub fn with_snapshot(self, snapshot: &SnapshotDoc) -> Self {
        self.with_previous(snapshot.restore())
    }
}

/// Everything a compilation produces.
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// The canonical, validated Model AST.
    pub domain: Domain,
    /// `schema.sql` contents.
    pub schema_sql: String,
    /// `rls.sql` contents.
    pub rls_sql: String,
    /// `queries.sql` contents.
    pub queries_sql: String,
    /// Migration files (primary and optional fallback); empty when no
    /// previous AST was supplied or nothing changed.
    pub migrations: Vec<MigrationFile>,
    /// Non-fatal warnings accumulated across the pipeline.
    pub warnings: Vec<EmissionWarning>,
}

impl CompileResult {
    /// The snapshot document to persist after a successful run.
    pub fn snapshot(&self) -> SnapshotDoc {
        SnapshotDoc::project(&self.domain)
    }
}

/// Compile a domain file into its SQL artifacts.
///
/// The pipeline is strictly ordered: front end, validator, policy
/// lowering, artifact emission, then (when a previous AST is present)
/// differ and migration emitter. Errors abort before anything is
/// emitted; the pipeline never partially emits.
pub fn compile(source: &str, options: &CompileOptions) -> Result<CompileResult, CompileError> {
    let domain = laforge_schema::compile_domain(source)?;

    // policies lower first so policy errors surface before any artifact
    let rls_sql = generate_rls_sql(&domain, options.multi_tenant)?;
    let schema_sql = generate_schema_sql(&domain, options.dialect);
    let queries_sql = generate_queries_sql(&domain, options.multi_tenant);

    let mut migrations = vec![];
    let mut warnings = vec![];

    if let Some(previous) = &options.previous {
        if structural_eq(previous, &domain) {
            debug!("previous and current domains are structurally equal; no migration");
        } else {
            let diff = diff_domains(previous, &domain);
            let set = MigrationEmitter::new(options.dialect, options.allow_destructive).emit(&diff);
            migrations = set.files;
            warnings = set.warnings;
        }
    }

    debug!(
        models = domain.len(),
        migrations = migrations.len(),
        warnings = warnings.len(),
        "compilation finished"
    );

    Ok(CompileResult {
        domain,
        schema_sql,
        rls_sql,
        queries_sql,
        migrations,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_minimal() {
        let result = compile(
            "model Note { id: uuid pk; text: string }",
            &CompileOptions::default(),
        )
        .unwrap();

        assert_eq!(result.domain.len(), 1);
        assert!(result.schema_sql.contains("notes"));
        assert!(result.migrations.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_error_kind_tags() {
        let syntax = compile("model {", &CompileOptions::default()).unwrap_err();
        assert_eq!(syntax.kind(), CompileErrorKind::Syntax);

        let semantic = compile("model Note { text: string }", &CompileOptions::default())
            .unwrap_err();
        assert_eq!(semantic.kind(), CompileErrorKind::Semantic);

        let policy = compile(
            "model Note { id: uuid pk } policy Note.read { record.nope === 1 }",
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert_eq!(policy.kind(), CompileErrorKind::Policy);
    }

    #[test]
    fn test_policy_error_emits_nothing() {
        // the result type makes partial emission impossible; this pins the
        // error path for a domain whose schema half is fine
        let result = compile(
            "model Note { id: uuid pk } policy Note.read { user.email === \"x\" }",
            &CompileOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_options_from_config() {
        let config = LaforgeConfig::from_str(
            "[database]\ndialect = \"sqlite\"\nmulti_tenant = true\n",
        )
        .unwrap();
        let options = CompileOptions::from_config(&config);
        assert_eq!(options.dialect, Dialect::Sqlite);
        assert!(options.multi_tenant);
        assert!(!options.allow_destructive);
    }
}
