//! # laforge-migrate
//!
//! Migration engine for LaForge: schema diffing, per-dialect SQL
//! rendering, and migration file emission.
//!
//! The engine compares the previous Model AST (loaded from the snapshot
//! store) against the current one and produces an ordered operation
//! sequence, which the emitter renders through a dialect adapter with
//! destructive gating and fallback shadow-copy plans.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//! │ Snapshot     │────▶│ Schema Differ  │────▶│ Dialect Adapter  │
//! │ (previous)   │     │ (ordered ops)  │     │ {pg,mysql,sqlite}│
//! └──────────────┘     └────────────────┘     └──────────────────┘
//!                              │                       │
//!                              ▼                       ▼
//!                      ┌────────────────┐     ┌──────────────────┐
//!                      │ Warnings       │     │ Migration Files  │
//!                      └────────────────┘     │ (+ fallback)     │
//!                                             └──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use laforge_schema::{Dialect, compile_domain};
//! use laforge_migrate::{MigrationEmitter, diff_domains};
//!
//! let previous = compile_domain("model Article { id: uuid pk; title: string }").unwrap();
//! let current = compile_domain("model Post { id: uuid pk; title: string }").unwrap();
//!
//! let diff = diff_domains(&previous, &current);
//! let set = MigrationEmitter::new(Dialect::Postgres, false).emit(&diff);
//! assert_eq!(set.files.len(), 1);
//! assert!(set.files[0].contents.contains("RENAME TO posts"));
//! ```

pub mod dialect;
pub mod diff;
pub mod emitter;
pub mod error;
pub mod operation;
pub mod store;
pub mod warning;

pub use dialect::{DialectAdapter, Rendered, adapter_for};
pub use diff::{DiffResult, diff_domains};
pub use emitter::{MigrationEmitter, MigrationFile, MigrationSet};
pub use error::{MigrateError, MigrateResult};
pub use operation::{ColumnSpec, ForeignKeySpec, SchemaOp};
pub use store::{FsSnapshotStore, SnapshotStore};
pub use warning::{EmissionWarning, WarningKind};
