//! # laforge-schema
//!
//! Lexer, parser, and Model AST for the LaForge domain language.
//!
//! This crate provides:
//! - A hand-written lexer and recursive-descent parser for domain files
//! - Abstract Syntax Tree (AST) types for models, policies, and hooks
//! - Semantic validation (primary keys, relation resolution, cycles)
//! - The structural snapshot used for incremental migrations
//! - Configuration parsing for `laforge.toml`
//!
//! ## Example
//!
//! ```rust
//! use laforge_schema::compile_domain;
//!
//! let domain = compile_domain(r#"
//!     model Note {
//!         id: uuid pk
//!         tenantId: uuid tenant
//!         text: string
//!     }
//!     policy Note.read { true }
//! "#).unwrap();
//!
//! assert_eq!(domain.len(), 1);
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod lexer;
pub mod names;
pub mod parser;
pub mod snapshot;
pub mod validator;

pub use ast::*;
pub use config::LaforgeConfig;
pub use error::{ErrorKind, SchemaError, SchemaResult};
pub use parser::parse_domain;
pub use snapshot::{SNAPSHOT_VERSION, SnapshotDoc, structural_eq};
pub use validator::{Validator, compile_domain};
