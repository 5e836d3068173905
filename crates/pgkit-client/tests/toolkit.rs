use pgkit_client::{ScriptedExecutor, Toolkit};
use pgkit_core::{PgKitError, RawResult, RawRow, SqlValue};
use pgkit_engine::{
    Alteration, ColumnDef, Condition, ConditionSet, DeleteRequest, FieldSet, InsertRequest,
    SelectRequest, UpdateRequest, VectorNear, SCORE_FIELD,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn column_row(name: &str, data_type: &str) -> RawRow {
    RawRow::new()
        .with("column_name", name)
        .with("data_type", data_type)
        .with("is_nullable", "YES")
        .with("column_default", SqlValue::Null)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_with_explicit_columns_keeps_request_order() {
    let executor = ScriptedExecutor::new(vec![Ok(RawResult::rows(vec![RawRow::new()
        .with("name", "ada")
        .with("id", 1)
        .with("extra", true)]))]);
    let toolkit = Toolkit::new(executor.clone());

    let request = SelectRequest::new("users")
        .with_columns(["id", "name"])
        .filter(Condition::equals("active", true));
    let records = toolkit.fetch_records(&request).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].columns().collect::<Vec<_>>(), vec!["id", "name"]);
    assert_eq!(records[0].get("name"), Some(&SqlValue::Text("ada".into())));

    let executed = executor.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].sql, "SELECT id, name FROM users WHERE active = $1");
    assert_eq!(executed[0].params, vec![SqlValue::Bool(true)]);
}

#[tokio::test]
async fn select_star_orders_fields_by_declared_columns() {
    let executor = ScriptedExecutor::new(vec![
        Ok(RawResult::rows(vec![RawRow::new()
            .with("email", "a@example.com")
            .with("id", 7)])),
        Ok(RawResult::rows(vec![
            column_row("id", "integer"),
            column_row("email", "text"),
        ])),
    ]);
    let toolkit = Toolkit::new(executor.clone());

    let records = toolkit.fetch_records(&SelectRequest::new("users")).await.unwrap();
    assert_eq!(records[0].columns().collect::<Vec<_>>(), vec!["id", "email"]);

    let executed = executor.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(executed[0].sql, "SELECT * FROM users");
    assert!(executed[1].sql.starts_with("SELECT column_name, data_type"));
    assert_eq!(executed[1].params, vec![SqlValue::Text("users".into())]);
}

#[tokio::test]
async fn mixed_case_table_is_described_by_its_folded_name() {
    let executor = ScriptedExecutor::new(vec![
        Ok(RawResult::rows(vec![RawRow::new()
            .with("email", "a@example.com")
            .with("id", 7)])),
        Ok(RawResult::rows(vec![
            column_row("id", "integer"),
            column_row("email", "text"),
        ])),
    ]);
    let toolkit = Toolkit::new(executor.clone());

    let records = toolkit.fetch_records(&SelectRequest::new("Users")).await.unwrap();
    assert_eq!(records[0].columns().collect::<Vec<_>>(), vec!["id", "email"]);
    assert_eq!(records[0].get("id"), Some(&SqlValue::Int(7)));

    let executed = executor.executed();
    assert_eq!(executed[0].sql, "SELECT * FROM Users");
    assert_eq!(executed[1].params, vec![SqlValue::Text("users".into())]);
}

#[tokio::test]
async fn rows_without_declared_columns_are_a_schema_mismatch() {
    let executor = ScriptedExecutor::new(vec![
        Ok(RawResult::rows(vec![RawRow::new()
            .with("id", 7)
            .with("email", "a@example.com")])),
        Ok(RawResult::rows(Vec::new())),
    ]);
    let toolkit = Toolkit::new(executor);

    let err = toolkit
        .fetch_records(&SelectRequest::new("users"))
        .await
        .unwrap_err();
    assert!(matches!(err, PgKitError::SchemaMismatch(_)));
}

#[tokio::test]
async fn unqualified_select_star_describes_current_schema_only() {
    let executor = ScriptedExecutor::new(vec![
        Ok(RawResult::rows(vec![RawRow::new().with("id", 7)])),
        Ok(RawResult::rows(vec![column_row("id", "integer")])),
    ]);
    let toolkit = Toolkit::new(executor.clone());

    let records = toolkit.fetch_records(&SelectRequest::new("users")).await.unwrap();
    assert_eq!(records[0].columns().collect::<Vec<_>>(), vec!["id"]);

    let describe = &executor.executed()[1];
    assert!(describe.sql.contains("table_schema = current_schema()"));
    assert_eq!(describe.params, vec![SqlValue::Text("users".into())]);
}

#[tokio::test]
async fn qualified_select_star_describes_that_schema() {
    let executor = ScriptedExecutor::new(vec![
        Ok(RawResult::rows(vec![RawRow::new().with("id", 7)])),
        Ok(RawResult::rows(vec![column_row("id", "integer")])),
    ]);
    let toolkit = Toolkit::new(executor.clone());

    toolkit.fetch_records(&SelectRequest::new("Audit.Users")).await.unwrap();

    let describe = &executor.executed()[1];
    assert!(describe.sql.contains("table_schema = $1 AND table_name = $2"));
    assert_eq!(
        describe.params,
        vec![SqlValue::Text("audit".into()), SqlValue::Text("users".into())]
    );
}

#[tokio::test]
async fn empty_result_skips_introspection() {
    let executor = ScriptedExecutor::default();
    let toolkit = Toolkit::new(executor.clone());

    let records = toolkit.fetch_records(&SelectRequest::new("users")).await.unwrap();
    assert!(records.is_empty());
    assert_eq!(executor.executed().len(), 1);
}

#[tokio::test]
async fn vector_search_appends_score_last() {
    let executor = ScriptedExecutor::new(vec![
        Ok(RawResult::rows(vec![
            RawRow::new()
                .with(SCORE_FIELD, 0.25)
                .with("id", 1)
                .with("embedding", vec![1.0f32, 0.0]),
            RawRow::new()
                .with("id", 2)
                .with("embedding", vec![0.0f32, 1.0])
                .with(SCORE_FIELD, 0.75),
        ])),
        Ok(RawResult::rows(vec![
            column_row("id", "integer"),
            column_row("embedding", "USER-DEFINED"),
        ])),
    ]);
    let toolkit = Toolkit::new(executor.clone());

    let filters = ConditionSet::new().with(Condition::equals("tenant", "acme"));
    let records = toolkit
        .vector_search("items", VectorNear::new("embedding", vec![1.0, 0.0], 5), filters, Some(2))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["id", "embedding", SCORE_FIELD]);
    }
    assert_eq!(records[1].get(SCORE_FIELD), Some(&SqlValue::Float(0.75)));

    let executed = executor.executed();
    assert_eq!(
        executed[0].sql,
        format!(
            "SELECT *, embedding <-> $1 AS {SCORE_FIELD} FROM items WHERE tenant = $2 \
             ORDER BY embedding <-> $1 ASC LIMIT 2"
        )
    );
    assert_eq!(
        executed[0].params,
        vec![SqlValue::Vector(vec![1.0, 0.0]), SqlValue::Text("acme".into())]
    );
}

#[tokio::test]
async fn reserved_score_column_is_rejected() {
    let executor = ScriptedExecutor::new(vec![
        Ok(RawResult::rows(vec![RawRow::new().with("id", 1).with(SCORE_FIELD, 0.1)])),
        Ok(RawResult::rows(vec![
            column_row("id", "integer"),
            column_row(SCORE_FIELD, "real"),
        ])),
    ]);
    let toolkit = Toolkit::new(executor);

    let err = toolkit
        .vector_search("items", VectorNear::new("embedding", vec![1.0], 1), ConditionSet::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PgKitError::ReservedFieldName(_)));
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn insert_reports_affected_and_returned_rows() {
    let executor = ScriptedExecutor::new(vec![Ok(RawResult {
        rows_affected: 2,
        rows: vec![RawRow::new().with("id", 1), RawRow::new().with("id", 2)],
    })]);
    let toolkit = Toolkit::new(executor.clone());

    let request = InsertRequest::new(
        "users",
        vec![
            FieldSet::new().with("name", "a").with("age", 30),
            FieldSet::new().with("age", 31).with("name", "b"),
        ],
    )
    .returning(["id"]);
    let result = toolkit.insert_records(&request).await.unwrap();

    assert_eq!(result.affected, 2);
    let returned = result.returned.unwrap();
    assert_eq!(returned[1].get("id"), Some(&SqlValue::Int(2)));

    let executed = executor.executed();
    assert_eq!(
        executed[0].sql,
        "INSERT INTO users (name, age) VALUES ($1, $2), ($3, $4) RETURNING id"
    );
    assert_eq!(executed[0].params.len(), 4);
    assert!(executed[0].returns_rows);
}

#[tokio::test]
async fn mutation_without_returning_has_no_rows() {
    let executor = ScriptedExecutor::new(vec![Ok(RawResult::affected(3))]);
    let toolkit = Toolkit::new(executor);

    let request = UpdateRequest::new(
        "users",
        FieldSet::new().with("active", false),
        ConditionSet::new().with(Condition::equals("team", "ops")),
    );
    let result = toolkit.update_records(&request).await.unwrap();
    assert_eq!(result.affected, 3);
    assert!(result.returned.is_none());
}

#[tokio::test]
async fn unconditional_delete_never_reaches_executor() {
    let executor = ScriptedExecutor::default();
    let toolkit = Toolkit::new(executor.clone());

    let err = toolkit
        .delete_records(&DeleteRequest::new("users", ConditionSet::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, PgKitError::AffectsAllRows(_)));
    assert!(executor.executed().is_empty());
}

#[tokio::test]
async fn execution_errors_pass_through_unchanged() {
    init_tracing();
    let failure = PgKitError::execution_with_code("duplicate key value", "23505");
    let executor = ScriptedExecutor::new(vec![Err(failure.clone())]);
    let toolkit = Toolkit::new(executor);

    let err = toolkit
        .insert_record("users", FieldSet::new().with("id", 1))
        .await
        .unwrap_err();
    assert_eq!(err, failure);
    assert_eq!(err.sqlstate(), Some("23505"));
}

#[tokio::test]
async fn sequential_calls_reach_executor_in_order() {
    let executor = ScriptedExecutor::default();
    let toolkit = Toolkit::new(executor.clone());

    toolkit
        .insert_record("t", FieldSet::new().with("a", 1))
        .await
        .unwrap();
    toolkit
        .delete_records(&DeleteRequest::new(
            "t",
            ConditionSet::new().with(Condition::equals("a", 1)),
        ))
        .await
        .unwrap();
    toolkit.truncate_table("t").await.unwrap();

    let sql: Vec<String> = executor.executed().into_iter().map(|p| p.sql).collect();
    assert_eq!(
        sql,
        vec![
            "INSERT INTO t (a) VALUES ($1)",
            "DELETE FROM t WHERE a = $1",
            "TRUNCATE TABLE t",
        ]
    );
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[tokio::test]
async fn multi_statement_alter_runs_as_one_batch() {
    init_tracing();
    let executor = ScriptedExecutor::default();
    let toolkit = Toolkit::new(executor.clone());

    toolkit
        .alter_table(
            "users",
            vec![
                Alteration::AddColumn(ColumnDef::new("nick", "TEXT")),
                Alteration::RenameColumn {
                    from: "nick".into(),
                    to: "nickname".into(),
                },
            ],
        )
        .await
        .unwrap();

    let executed = executor.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed.iter().all(|p| p.batch == Some(0)));
    assert_eq!(executed[1].sql, "ALTER TABLE users RENAME COLUMN nick TO nickname");
}

#[tokio::test]
async fn single_statement_ddl_is_not_batched() {
    let executor = ScriptedExecutor::default();
    let toolkit = Toolkit::new(executor.clone());

    toolkit
        .create_table("items", vec![ColumnDef::new("id", "SERIAL PRIMARY KEY"), ColumnDef::vector("embedding", 3)])
        .await
        .unwrap();

    let executed = executor.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].batch, None);
    assert_eq!(
        executed[0].sql,
        "CREATE TABLE items (id SERIAL PRIMARY KEY, embedding vector(3))"
    );
}

#[tokio::test]
async fn list_tables_uses_configured_schema() {
    let executor = ScriptedExecutor::new(vec![Ok(RawResult::rows(vec![
        RawRow::new().with("table_name", "items"),
        RawRow::new().with("table_name", "users"),
    ]))]);
    let toolkit = Toolkit::new(executor.clone()).with_schema("app");

    assert_eq!(toolkit.list_tables().await.unwrap(), vec!["items", "users"]);
    assert_eq!(executor.executed()[0].params, vec![SqlValue::Text("app".into())]);
}

#[tokio::test]
async fn describe_table_reads_column_metadata() {
    let executor = ScriptedExecutor::new(vec![Ok(RawResult::rows(vec![RawRow::new()
        .with("column_name", "id")
        .with("data_type", "integer")
        .with("is_nullable", "NO")
        .with("column_default", "nextval('users_id_seq'::regclass)")]))]);
    let toolkit = Toolkit::new(executor);

    let columns = toolkit.describe_table("users").await.unwrap();
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].name, "id");
    assert!(!columns[0].is_nullable);
    assert!(columns[0].default.is_some());
}

// ---------------------------------------------------------------------------
// Databases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn creating_existing_database_is_tolerated() {
    init_tracing();
    let executor = ScriptedExecutor::new(vec![Err(PgKitError::execution_with_code(
        "database \"scratch\" already exists",
        "42P04",
    ))]);
    let toolkit = Toolkit::new(executor);

    toolkit.create_database("scratch").await.unwrap();
}

#[tokio::test]
async fn other_create_database_errors_propagate() {
    let executor = ScriptedExecutor::new(vec![Err(PgKitError::execution_with_code(
        "permission denied to create database",
        "42501",
    ))]);
    let toolkit = Toolkit::new(executor);

    let err = toolkit.create_database("scratch").await.unwrap_err();
    assert_eq!(err.sqlstate(), Some("42501"));
}

#[tokio::test]
async fn drop_database_terminates_sessions_first() {
    let executor = ScriptedExecutor::default();
    let toolkit = Toolkit::new(executor.clone());

    toolkit.drop_database("scratch").await.unwrap();

    let executed = executor.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].sql.contains("pg_terminate_backend"));
    assert_eq!(executed[1].sql, "DROP DATABASE IF EXISTS scratch");
    assert!(executed.iter().all(|p| p.batch.is_none()));
}

#[tokio::test]
async fn list_databases_rejects_non_text_names() {
    let executor = ScriptedExecutor::new(vec![Ok(RawResult::rows(vec![RawRow::new().with("datname", 5)]))]);
    let toolkit = Toolkit::new(executor);

    assert!(matches!(
        toolkit.list_databases().await,
        Err(PgKitError::SchemaMismatch(_))
    ));
}
