//! Plans for database-level and introspection statements.

use pgkit_core::{PgKitError, QueryPlan, SqlValue};

use crate::ident::{fold_identifier, validate_column_name, validate_table_name};

/// Columns returned by [`describe_table`], in order.
pub const DESCRIBE_COLUMNS: [&str; 4] = ["column_name", "data_type", "is_nullable", "column_default"];

pub fn create_database(name: &str) -> Result<QueryPlan, PgKitError> {
    validate_column_name(name)?;
    Ok(QueryPlan::statement(format!("CREATE DATABASE {name}"), Vec::new()))
}

/// Terminate other sessions on `name`, then drop it.
///
/// `DROP DATABASE` cannot run inside a transaction, so these two plans are
/// executed one after the other rather than atomically.
pub fn drop_database(name: &str) -> Result<Vec<QueryPlan>, PgKitError> {
    validate_column_name(name)?;
    Ok(vec![
        QueryPlan::query(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
             WHERE datname = $1 AND pid <> pg_backend_pid()",
            vec![SqlValue::Text(name.to_string())],
        ),
        QueryPlan::statement(format!("DROP DATABASE IF EXISTS {name}"), Vec::new()),
    ])
}

pub fn list_databases() -> QueryPlan {
    QueryPlan::query(
        "SELECT datname FROM pg_database WHERE datistemplate = false ORDER BY datname",
        Vec::new(),
    )
}

/// Base tables in `schema`.
pub fn list_tables(schema: &str) -> Result<QueryPlan, PgKitError> {
    validate_column_name(schema)?;
    Ok(QueryPlan::query(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = $1 AND table_type = 'BASE TABLE' ORDER BY table_name",
        vec![SqlValue::Text(fold_identifier(schema))],
    ))
}

/// Column metadata for `table` in declaration order.
///
/// Names are matched the way an unquoted `SELECT * FROM table` resolves them:
/// folded to lower case, and an unqualified name is looked up in
/// `current_schema()` only.
pub fn describe_table(table: &str) -> Result<QueryPlan, PgKitError> {
    validate_table_name(table)?;
    let select = format!(
        "SELECT {} FROM information_schema.columns",
        DESCRIBE_COLUMNS.join(", ")
    );
    let plan = match table.split_once('.') {
        Some((schema, name)) => QueryPlan::query(
            format!("{select} WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position"),
            vec![
                SqlValue::Text(fold_identifier(schema)),
                SqlValue::Text(fold_identifier(name)),
            ],
        ),
        None => QueryPlan::query(
            format!(
                "{select} WHERE table_schema = current_schema() AND table_name = $1 \
                 ORDER BY ordinal_position"
            ),
            vec![SqlValue::Text(fold_identifier(table))],
        ),
    };
    Ok(plan)
}
