//! `rls.sql` emission.
//!
//! Row level security is enabled per table; each declared policy becomes
//! one `CREATE POLICY` named `<table>_<action>`, with the tenant predicate
//! composed in when multi-tenant mode is on.

use laforge_policy::{PolicyResult, lower_policy};
use laforge_schema::{Domain, PolicyAction, names};
use tracing::debug;

/// Render row-level-security SQL for every model×action policy.
pub fn generate_rls_sql(domain: &Domain, multi_tenant: bool) -> PolicyResult<String> {
    let mut statements: Vec<String> = vec![];

    for model in domain.iter() {
        let table = names::qualified_table(model.name());
        statements.push(format!("ALTER TABLE {} ENABLE ROW LEVEL SECURITY;", table));

        for action in PolicyAction::all() {
            let Some(policy) = model.policy(action) else {
                continue;
            };
            let predicate = lower_policy(domain, model, policy, multi_tenant)?;
            let name = format!("{}_{}", names::table_name(model.name()), action.as_str());
            let clause = match action {
                PolicyAction::Read | PolicyAction::Delete => format!("USING ({})", predicate),
                PolicyAction::Create => format!("WITH CHECK ({})", predicate),
                PolicyAction::Update => {
                    format!("USING ({}) WITH CHECK ({})", predicate, predicate)
                }
            };
            statements.push(format!(
                "CREATE POLICY {} ON {} FOR {} {};",
                name,
                table,
                action.sql_command(),
                clause
            ));
        }
    }

    debug!(statements = statements.len(), "rls emitted");
    let mut sql = statements.join("\n\n");
    sql.push('\n');
    Ok(sql)
}
