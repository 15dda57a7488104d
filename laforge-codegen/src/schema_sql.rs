//! `schema.sql` emission.
//!
//! One `CREATE TABLE IF NOT EXISTS` per model, columns in declaration
//! order with the primary key inline; foreign keys follow as separate
//! `ALTER TABLE` statements after all table creations so declaration
//! order never breaks references.

use laforge_schema::{Dialect, Domain, Field, RelationKind, names};

/// Render the full schema for a domain.
pub fn generate_schema_sql(domain: &Domain, dialect: Dialect) -> String {
    let mut statements: Vec<String> = vec![];

    for model in domain.iter() {
        let table = names::table_name(model.name());
        let columns: Vec<String> = model
            .fields
            .values()
            .map(|f| format!("  {}", column_def(f, dialect)))
            .collect();
        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
            table,
            columns.join(",\n")
        ));
    }

    for model in domain.iter() {
        let table = names::table_name(model.name());
        for rel in &model.relations {
            if rel.kind != RelationKind::BelongsTo {
                continue;
            }
            let Some(target) = domain.relation_target(rel) else {
                continue;
            };
            let Some(target_pk) = target.primary_key() else {
                continue;
            };
            let column = names::column_name(&rel.foreign_key);
            statements.push(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({});",
                table,
                names::constraint_name(&table, &column),
                column,
                names::table_name(target.name()),
                names::column_name(target_pk.name()),
            ));
        }
    }

    let mut sql = statements.join("\n\n");
    sql.push('\n');
    sql
}

fn column_def(field: &Field, dialect: Dialect) -> String {
    let mut def = format!(
        "{} {}",
        names::column_name(field.name()),
        dialect.column_type(field.ty)
    );
    if field.primary_key {
        def.push_str(" PRIMARY KEY");
    } else if !field.optional {
        def.push_str(" NOT NULL");
    }
    if let Some(raw) = &field.default {
        def.push_str(&format!(" DEFAULT {}", default_literal(raw, field.ty)));
    }
    def
}

fn default_literal(raw: &str, ty: laforge_schema::ScalarType) -> String {
    use laforge_schema::ScalarType;
    match ty {
        ScalarType::Integer => raw.to_string(),
        ScalarType::Boolean => raw.to_uppercase(),
        _ => format!("'{}'", raw.replace('\'', "''")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laforge_schema::compile_domain;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tables_in_declaration_order_then_fks() {
        let domain = compile_domain(
            r#"
            model Team { id: uuid pk; name: string }
            model User {
                id: uuid pk
                teamId: uuid
                team: belongsTo(Team)
            }
        "#,
        )
        .unwrap();

        let sql = generate_schema_sql(&domain, Dialect::Postgres);
        let teams = sql.find("CREATE TABLE IF NOT EXISTS teams").unwrap();
        let users = sql.find("CREATE TABLE IF NOT EXISTS users").unwrap();
        let fk = sql.find("ADD CONSTRAINT fk_users_team_id").unwrap();
        assert!(teams < users);
        assert!(users < fk);
        assert!(sql.contains("FOREIGN KEY (team_id) REFERENCES teams (id)"));
    }

    #[test]
    fn test_column_shapes() {
        let domain = compile_domain(
            r#"
            model Note {
                id: uuid pk
                text: string
                draft: boolean default "true"
                body: text optional
            }
        "#,
        )
        .unwrap();

        let sql = generate_schema_sql(&domain, Dialect::Postgres);
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS notes (\n  \
               id UUID PRIMARY KEY,\n  \
               text VARCHAR(255) NOT NULL,\n  \
               draft BOOLEAN NOT NULL DEFAULT TRUE,\n  \
               body TEXT\n);\n"
        );
    }

    #[test]
    fn test_dialect_type_mapping_applies() {
        let domain = compile_domain("model Doc { id: uuid pk; meta: jsonb }").unwrap();

        let pg = generate_schema_sql(&domain, Dialect::Postgres);
        assert!(pg.contains("meta JSONB"));

        let my = generate_schema_sql(&domain, Dialect::Mysql);
        assert!(my.contains("id CHAR(36) PRIMARY KEY"));
        assert!(my.contains("meta JSON"));

        let lite = generate_schema_sql(&domain, Dialect::Sqlite);
        assert!(lite.contains("meta TEXT"));
    }

    #[test]
    fn test_emission_is_deterministic() {
        let src = r#"
            model B { id: uuid pk }
            model A { id: uuid pk; bId: uuid; b: belongsTo(B) }
        "#;
        let domain = compile_domain(src).unwrap();
        assert_eq!(
            generate_schema_sql(&domain, Dialect::Postgres),
            generate_schema_sql(&domain, Dialect::Postgres)
        );
    }
}
