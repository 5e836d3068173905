use pgkit_engine::{build_ddl, catalog, Alteration, ColumnDef, DdlRequest, PgKitError, SqlValue};

fn sql_of(request: &DdlRequest) -> Vec<String> {
    build_ddl(request)
        .unwrap()
        .statements()
        .iter()
        .map(|p| p.sql().to_string())
        .collect()
}

#[test]
fn create_table_with_foreign_key() {
    let request = DdlRequest::create_table(
        "orders",
        vec![
            ColumnDef::new("id", "SERIAL PRIMARY KEY"),
            ColumnDef::new("user_id", "INTEGER").with_constraints("REFERENCES users(id)"),
            ColumnDef::vector("embedding", 3),
        ],
    );
    assert_eq!(
        sql_of(&request),
        vec!["CREATE TABLE orders (id SERIAL PRIMARY KEY, user_id INTEGER REFERENCES users(id), embedding vector(3))"]
    );
    assert!(!build_ddl(&request).unwrap().is_atomic());
}

#[test]
fn create_table_if_not_exists_and_empty_columns() {
    let request = DdlRequest::CreateTable {
        table: "t".into(),
        columns: vec![ColumnDef::new("a", "INT")],
        if_not_exists: true,
    };
    assert_eq!(sql_of(&request), vec!["CREATE TABLE IF NOT EXISTS t (a INT)"]);

    let request = DdlRequest::create_table("t", vec![]);
    assert!(matches!(build_ddl(&request), Err(PgKitError::Validation(_))));
}

#[test]
fn alter_combines_plain_actions() {
    let request = DdlRequest::alter_table(
        "users",
        vec![
            Alteration::AddColumn(ColumnDef::new("email", "VARCHAR(100)")),
            Alteration::DropColumn {
                column: "user_id".into(),
            },
            Alteration::SetNotNull {
                column: "email".into(),
            },
        ],
    );
    assert_eq!(
        sql_of(&request),
        vec!["ALTER TABLE users ADD COLUMN email VARCHAR(100), DROP COLUMN user_id, ALTER COLUMN email SET NOT NULL"]
    );
}

#[test]
fn alter_splits_renames_and_keeps_order() {
    let request = DdlRequest::alter_table(
        "app.users",
        vec![
            Alteration::AddColumn(ColumnDef::new("nick", "TEXT")),
            Alteration::RenameColumn {
                from: "nick".into(),
                to: "nickname".into(),
            },
            Alteration::SetDefault {
                column: "nickname".into(),
                default: "''".into(),
            },
            Alteration::RenameTable { to: "members".into() },
            Alteration::DropDefault {
                column: "nickname".into(),
            },
        ],
    );
    let plan = build_ddl(&request).unwrap();
    assert!(plan.is_atomic());
    assert_eq!(
        sql_of(&request),
        vec![
            "ALTER TABLE app.users ADD COLUMN nick TEXT",
            "ALTER TABLE app.users RENAME COLUMN nick TO nickname",
            "ALTER TABLE app.users ALTER COLUMN nickname SET DEFAULT ''",
            "ALTER TABLE app.users RENAME TO members",
            "ALTER TABLE app.members ALTER COLUMN nickname DROP DEFAULT",
        ]
    );
}

#[test]
fn alter_without_alterations_fails() {
    let request = DdlRequest::alter_table("users", vec![]);
    assert!(matches!(build_ddl(&request), Err(PgKitError::Validation(_))));
}

#[test]
fn alter_rejects_injected_fragments() {
    let request = DdlRequest::alter_table(
        "users",
        vec![Alteration::AlterColumnType {
            column: "age".into(),
            data_type: "INT; DROP TABLE users".into(),
        }],
    );
    assert!(matches!(build_ddl(&request), Err(PgKitError::Validation(_))));
}

#[test]
fn constraints_round_trip_through_sql() {
    let request = DdlRequest::alter_table(
        "t",
        vec![
            Alteration::AddConstraint {
                name: "t_age_positive".into(),
                definition: "CHECK (age > 0)".into(),
            },
            Alteration::DropConstraint {
                name: "t_old".into(),
            },
            Alteration::DropNotNull {
                column: "age".into(),
            },
        ],
    );
    assert_eq!(
        sql_of(&request),
        vec!["ALTER TABLE t ADD CONSTRAINT t_age_positive CHECK (age > 0), DROP CONSTRAINT t_old, ALTER COLUMN age DROP NOT NULL"]
    );
}

#[test]
fn drop_truncate_and_extension() {
    assert_eq!(sql_of(&DdlRequest::drop_table("t")), vec!["DROP TABLE IF EXISTS t"]);
    assert_eq!(
        sql_of(&DdlRequest::DropTable {
            table: "t".into(),
            if_exists: false,
            cascade: true
        }),
        vec!["DROP TABLE t CASCADE"]
    );
    assert_eq!(sql_of(&DdlRequest::truncate_table("t")), vec!["TRUNCATE TABLE t"]);
    assert_eq!(
        sql_of(&DdlRequest::EnableVectorExtension),
        vec!["CREATE EXTENSION IF NOT EXISTS vector"]
    );
}

#[test]
fn ddl_request_from_json() {
    let request: DdlRequest = serde_json::from_str(
        r#"{"kind": "alter_table", "table": "t",
            "alterations": [{"action": "rename_column", "from": "a", "to": "b"}]}"#,
    )
    .unwrap();
    assert_eq!(sql_of(&request), vec!["ALTER TABLE t RENAME COLUMN a TO b"]);

    let request: DdlRequest = serde_json::from_str(r#"{"kind": "drop_table", "table": "t"}"#).unwrap();
    assert_eq!(sql_of(&request), vec!["DROP TABLE IF EXISTS t"]);
}

// ---------------------------------------------------------------------------
// Catalog plans
// ---------------------------------------------------------------------------

#[test]
fn drop_database_terminates_sessions_first() {
    let plans = catalog::drop_database("scratch").unwrap();
    assert_eq!(plans.len(), 2);
    assert!(plans[0].sql().contains("pg_terminate_backend"));
    assert_eq!(plans[0].params(), &[SqlValue::Text("scratch".into())]);
    assert_eq!(plans[1].sql(), "DROP DATABASE IF EXISTS scratch");
    assert!(catalog::drop_database("x; --").is_err());
}

#[test]
fn describe_table_binds_names() {
    let plan = catalog::describe_table("users").unwrap();
    assert_eq!(plan.params(), &[SqlValue::Text("users".into())]);
    assert!(plan
        .sql()
        .ends_with("WHERE table_schema = current_schema() AND table_name = $1 ORDER BY ordinal_position"));

    let plan = catalog::describe_table("app.users").unwrap();
    assert_eq!(
        plan.params(),
        &[SqlValue::Text("app".into()), SqlValue::Text("users".into())]
    );
}

#[test]
fn describe_table_folds_unquoted_names() {
    let plan = catalog::describe_table("Users").unwrap();
    assert_eq!(plan.params(), &[SqlValue::Text("users".into())]);

    let plan = catalog::describe_table("App.OrderItems").unwrap();
    assert_eq!(
        plan.params(),
        &[SqlValue::Text("app".into()), SqlValue::Text("orderitems".into())]
    );
}

#[test]
fn unqualified_describe_is_limited_to_one_schema() {
    let plan = catalog::describe_table("users").unwrap();
    assert!(plan.sql().contains("table_schema = current_schema()"));
    assert_eq!(plan.params().len(), 1);
}

#[test]
fn create_database_and_listing() {
    assert_eq!(
        catalog::create_database("analytics").unwrap().sql(),
        "CREATE DATABASE analytics"
    );
    assert!(catalog::list_databases().returns_rows());
    let plan = catalog::list_tables("public").unwrap();
    assert_eq!(plan.params(), &[SqlValue::Text("public".into())]);
}
