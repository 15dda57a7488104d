//! Identifier casing between the DSL and SQL.
//!
//! The mappings are total and reversible for the identifier classes the
//! parser accepts: model `FooBar` becomes table `foo_bars` (snake case plus
//! a simple `s`), field `createdAt` becomes column `created_at`.

use convert_case::{Case, Casing};

use crate::ast::Model;

/// Table name for a model name: snake case, pluralised with a simple `s`.
pub fn table_name(model_name: &str) -> String {
    format!("{}s", model_name.to_case(Case::Snake))
}

/// Column name for a field name: snake case.
pub fn column_name(field_name: &str) -> String {
    field_name.to_case(Case::Snake)
}

/// Qualified table reference used in emitted predicates.
pub fn qualified_table(model_name: &str) -> String {
    format!("public.{}", table_name(model_name))
}

/// Foreign key constraint name, stable across emissions.
pub fn constraint_name(table: &str, column: &str) -> String {
    format!("fk_{}_{}", table, column)
}

/// Default foreign key field carried by the target of a hasMany or
/// manyToMany relation: the owning model's name, lower-first, plus `Id`.
pub fn owner_foreign_key(owner: &Model) -> String {
    let name = owner.name();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("{}{}Id", first.to_lowercase(), chars.as_str()),
        None => "Id".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ident, Span};

    #[test]
    fn test_table_name() {
        assert_eq!(table_name("User"), "users");
        assert_eq!(table_name("FooBar"), "foo_bars");
        assert_eq!(table_name("Team"), "teams");
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name("createdAt"), "created_at");
        assert_eq!(column_name("id"), "id");
        assert_eq!(column_name("tenantId"), "tenant_id");
    }

    #[test]
    fn test_qualified_table() {
        assert_eq!(qualified_table("Comment"), "public.comments");
    }

    #[test]
    fn test_constraint_name() {
        assert_eq!(constraint_name("users", "team_id"), "fk_users_team_id");
    }

    #[test]
    fn test_owner_foreign_key() {
        let post = Model::new(Ident::new("Post", Span::new(0, 4)), Span::new(0, 4));
        assert_eq!(owner_foreign_key(&post), "postId");

        let blog_post = Model::new(Ident::new("BlogPost", Span::new(0, 8)), Span::new(0, 8));
        assert_eq!(owner_foreign_key(&blog_post), "blogPostId");
    }
}
