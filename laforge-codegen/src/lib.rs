//! # laforge-codegen
//!
//! Mechanical SQL emitters over the LaForge Model AST:
//!
//! - [`generate_schema_sql`] — `CREATE TABLE IF NOT EXISTS` per model,
//!   foreign keys as trailing `ALTER TABLE` statements
//! - [`generate_rls_sql`] — `ENABLE ROW LEVEL SECURITY` plus one
//!   `CREATE POLICY` per model×action
//! - [`generate_queries_sql`] — parametrized CRUD templates
//!
//! All emitters are deterministic with respect to the domain's declaration
//! order: compiling the same AST twice yields byte-identical output. The
//! generated artifacts are purely declarative SQL text; nothing in them is
//! executable code and nothing imports anything.

pub mod queries;
pub mod rls;
pub mod schema_sql;

pub use queries::generate_queries_sql;
pub use rls::generate_rls_sql;
pub use schema_sql::generate_schema_sql;
