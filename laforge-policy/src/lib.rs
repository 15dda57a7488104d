//! # laforge-policy
//!
//! Lowers LaForge policy expression trees into SQL row-level-security
//! predicates.
//!
//! The lowerer evaluates each policy in a scope that binds `user` (scalar
//! accessors only), `record` (the current row of the owning model), and
//! any arrow-head parameters. Relation chains through belongsTo become
//! correlated scalar subqueries bounded at three hops; collection
//! quantifiers become `EXISTS` / `NOT EXISTS` / `IN` subqueries.
//!
//! ## Example
//!
//! ```rust
//! use laforge_schema::{PolicyAction, compile_domain};
//! use laforge_policy::lower_policy;
//!
//! let domain = compile_domain(r#"
//!     model Note { id: uuid pk; ownerId: uuid }
//!     policy Note.read { record.ownerId === user.id }
//! "#).unwrap();
//!
//! let note = domain.get_model("Note").unwrap();
//! let policy = note.policy(PolicyAction::Read).unwrap();
//! let sql = lower_policy(&domain, note, policy, false).unwrap();
//! assert_eq!(sql, "owner_id = laforge_user_id()");
//! ```

pub mod error;
pub mod lower;

pub use error::{PolicyError, PolicyResult};
pub use lower::{MAX_CHAIN_DEPTH, ROLE_SQL, TENANT_ID_SQL, USER_ID_SQL, lower_policy};
