//! `queries.sql` emission: per-model CRUD templates.
//!
//! Templates use numbered placeholders (`$1`, `$2`, …) and list the
//! parameter order in a leading comment. For multi-tenant models every
//! predicate carries an additional `AND tenant_id = $k` term.

use laforge_schema::{Domain, Model, names};

/// Render insert / find-by-id / update / delete templates for every model.
pub fn generate_queries_sql(domain: &Domain, multi_tenant: bool) -> String {
    let mut sections: Vec<String> = vec![];
    for model in domain.iter() {
        sections.push(model_queries(model, multi_tenant));
    }
    let joined = sections.join("");
    format!("{}\n", joined.trim_end())
}

fn model_queries(model: &Model, multi_tenant: bool) -> String {
    let table = names::qualified_table(model.name());
    let columns: Vec<String> = model
        .fields
        .values()
        .map(|f| names::column_name(f.name()))
        .collect();
    let pk = model
        .primary_key()
        .map(|f| names::column_name(f.name()))
        .unwrap_or_else(|| "id".to_string());
    let tenant = if multi_tenant {
        model.tenant_field().map(|f| names::column_name(f.name()))
    } else {
        None
    };

    let mut out = String::new();

    // insert
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
    out.push_str(&format!(
        "-- insert {}\n-- Parameters: {}\nINSERT INTO {} ({})\nVALUES ({})\nRETURNING {};\n\n",
        model.name(),
        param_comment(&columns),
        table,
        columns.join(", "),
        placeholders.join(", "),
        columns.join(", "),
    ));

    // find by id
    let mut find_params = vec![pk.clone()];
    let mut find_where = format!("{} = $1", pk);
    if let Some(tenant_col) = &tenant {
        find_where.push_str(&format!(" AND {} = $2", tenant_col));
        find_params.push(tenant_col.clone());
    }
    out.push_str(&format!(
        "-- find {} by id\n-- Parameters: {}\nSELECT {} FROM {} WHERE {};\n\n",
        model.name(),
        param_comment(&find_params),
        columns.join(", "),
        table,
        find_where,
    ));

    // update: set everything except the key and the tenant column
    let settable: Vec<&String> = columns
        .iter()
        .filter(|c| **c != pk && Some(*c) != tenant.as_ref())
        .collect();
    if !settable.is_empty() {
        let mut update_params: Vec<String> = settable.iter().map(|c| (*c).clone()).collect();
        let assignments: Vec<String> = settable
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ${}", c, i + 1))
            .collect();
        let mut update_where = format!("{} = ${}", pk, settable.len() + 1);
        update_params.push(pk.clone());
        if let Some(tenant_col) = &tenant {
            update_where.push_str(&format!(" AND {} = ${}", tenant_col, settable.len() + 2));
            update_params.push(tenant_col.clone());
        }
        out.push_str(&format!(
            "-- update {}\n-- Parameters: {}\nUPDATE {} SET {}\nWHERE {};\n\n",
            model.name(),
            param_comment(&update_params),
            table,
            assignments.join(", "),
            update_where,
        ));
    }

    // delete
    let mut delete_params = vec![pk.clone()];
    let mut delete_where = format!("{} = $1", pk);
    if let Some(tenant_col) = &tenant {
        delete_where.push_str(&format!(" AND {} = $2", tenant_col));
        delete_params.push(tenant_col.clone());
    }
    out.push_str(&format!(
        "-- delete {}\n-- Parameters: {}\nDELETE FROM {} WHERE {};\n\n",
        model.name(),
        param_comment(&delete_params),
        table,
        delete_where,
    ));

    out
}

fn param_comment(params: &[String]) -> String {
    params
        .iter()
        .enumerate()
        .map(|(i, name)| format!("${} = {}", i + 1, name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use laforge_schema::compile_domain;

    #[test]
    fn test_untenanted_templates() {
        let domain = compile_domain("model Note { id: uuid pk; text: string }").unwrap();
        let sql = generate_queries_sql(&domain, false);

        assert!(sql.contains("INSERT INTO public.notes (id, text)\nVALUES ($1, $2)"));
        assert!(sql.contains("SELECT id, text FROM public.notes WHERE id = $1;"));
        assert!(sql.contains("UPDATE public.notes SET text = $1\nWHERE id = $2;"));
        assert!(sql.contains("DELETE FROM public.notes WHERE id = $1;"));
        assert!(sql.contains("-- Parameters: $1 = id, $2 = text"));
    }

    #[test]
    fn test_tenant_term_on_every_predicate() {
        let domain = compile_domain(
            "model Note { id: uuid pk; tenantId: uuid tenant; text: string }",
        )
        .unwrap();
        let sql = generate_queries_sql(&domain, true);

        assert!(sql.contains("WHERE id = $1 AND tenant_id = $2;"));
        assert!(sql.contains("UPDATE public.notes SET text = $1\nWHERE id = $2 AND tenant_id = $3;"));
        assert!(sql.contains("DELETE FROM public.notes WHERE id = $1 AND tenant_id = $2;"));
    }

    #[test]
    fn test_tenant_ignored_when_multi_tenant_off() {
        let domain = compile_domain(
            "model Note { id: uuid pk; tenantId: uuid tenant; text: string }",
        )
        .unwrap();
        let sql = generate_queries_sql(&domain, false);
        assert!(sql.contains("WHERE id = $1;"));
        assert!(!sql.contains("AND tenant_id"));
    }

    #[test]
    fn test_key_only_model_skips_update_template() {
        let domain = compile_domain("model Ping { id: uuid pk }").unwrap();
        let sql = generate_queries_sql(&domain, false);
        assert!(sql.contains("-- insert Ping"));
        assert!(sql.contains("-- delete Ping"));
        assert!(!sql.contains("-- update Ping"));
    }

    #[test]
    fn test_parameter_order_comments_match_placeholders() {
        let domain = compile_domain(
            "model Note { id: uuid pk; tenantId: uuid tenant; text: string; done: boolean }",
        )
        .unwrap();
        let sql = generate_queries_sql(&domain, true);

        // update sets text and done, then keys
        assert!(sql.contains("-- Parameters: $1 = text, $2 = done, $3 = id, $4 = tenant_id"));
        assert!(sql.contains("SET text = $1, done = $2\nWHERE id = $3 AND tenant_id = $4;"));
    }
}
