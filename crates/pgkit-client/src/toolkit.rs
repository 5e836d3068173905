use pgkit_core::{ColumnInfo, Executor, MutationResult, PgKitError, QueryPlan, RawResult, RawRow, Record, SqlValue};
use pgkit_engine::{
    build_ddl, build_delete, build_insert, build_select, build_update, catalog, map_column_info,
    map_mutation_result, map_rows, map_scored_rows, Alteration, ColumnDef, Condition, ConditionSet, DdlRequest,
    DeleteRequest, FieldSet, InsertRequest, SelectRequest, UpdateRequest, VectorNear,
};

/// SQLSTATE for `CREATE DATABASE` on an existing name.
const DUPLICATE_DATABASE: &str = "42P04";

/// Async PostgreSQL toolkit.
///
/// Every operation builds its plan with `pgkit-engine`, hands it to the
/// executor, and maps the result. Calls made one after another reach the
/// executor in that order; nothing is retried.
pub struct Toolkit<E> {
    executor: E,
    schema: String,
}

impl<E: Executor> Toolkit<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            schema: "public".to_string(),
        }
    }

    /// Schema used by [`list_tables`](Self::list_tables). Defaults to `public`.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    async fn run(&self, plan: QueryPlan) -> Result<RawResult, PgKitError> {
        let sql = plan.sql().to_string();
        tracing::debug!(sql = %sql, params = plan.params().len(), "executing plan");
        self.executor.execute(plan).await.inspect_err(|e| {
            tracing::error!(sql = %sql, error = %e, "statement failed");
        })
    }

    async fn run_all(&self, plans: Vec<QueryPlan>) -> Result<RawResult, PgKitError> {
        tracing::debug!(statements = plans.len(), "executing atomic batch");
        self.executor.execute_atomic(plans).await.inspect_err(|e| {
            tracing::error!(error = %e, "atomic batch failed");
        })
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    /// Run a select and return records in a stable field order.
    ///
    /// Field order is the request's explicit column list, or for `SELECT *`
    /// the table's declared column order from [`describe_table`](Self::describe_table).
    /// Vector searches carry the score as the last field.
    pub async fn fetch_records(&self, request: &SelectRequest) -> Result<Vec<Record>, PgKitError> {
        let plan = build_select(request)?;
        let raw = self.run(plan).await?;
        if raw.rows.is_empty() {
            return Ok(Vec::new());
        }
        let declared: Vec<String> = match request.explicit_columns() {
            Some(columns) => columns.to_vec(),
            None => self
                .describe_table(&request.table)
                .await?
                .into_iter()
                .map(|c| c.name)
                .collect(),
        };
        if declared.is_empty() {
            return Err(PgKitError::SchemaMismatch(format!(
                "select on {} returned rows but no declared columns were found",
                request.table
            )));
        }
        if request.vector().is_some() {
            map_scored_rows(raw.rows, &declared)
        } else {
            map_rows(raw.rows, &declared)
        }
    }

    /// Nearest-neighbour search, optionally narrowed by `filters` and `limit`.
    pub async fn vector_search(
        &self,
        table: &str,
        near: VectorNear,
        filters: ConditionSet,
        limit: Option<u64>,
    ) -> Result<Vec<Record>, PgKitError> {
        let mut request = SelectRequest::new(table).with_conditions(filters);
        request.conditions.push(Condition::near(near));
        request.limit = limit;
        self.fetch_records(&request).await
    }

    pub async fn insert_record(&self, table: &str, record: FieldSet) -> Result<MutationResult, PgKitError> {
        self.insert_records(&InsertRequest::new(table, vec![record])).await
    }

    pub async fn insert_records(&self, request: &InsertRequest) -> Result<MutationResult, PgKitError> {
        let plan = build_insert(request)?;
        Ok(map_mutation_result(self.run(plan).await?))
    }

    pub async fn update_records(&self, request: &UpdateRequest) -> Result<MutationResult, PgKitError> {
        let plan = build_update(request)?;
        Ok(map_mutation_result(self.run(plan).await?))
    }

    pub async fn delete_records(&self, request: &DeleteRequest) -> Result<MutationResult, PgKitError> {
        let plan = build_delete(request)?;
        Ok(map_mutation_result(self.run(plan).await?))
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    /// Apply a DDL request; multi-statement plans run in one transaction.
    pub async fn apply_ddl(&self, request: &DdlRequest) -> Result<(), PgKitError> {
        let plan = build_ddl(request)?;
        let count = plan.len();
        if plan.is_atomic() {
            self.run_all(plan.into_statements()).await?;
        } else {
            for statement in plan.into_statements() {
                self.run(statement).await?;
            }
        }
        tracing::info!(statements = count, request = %ddl_label(request), "schema change applied");
        Ok(())
    }

    pub async fn create_table(&self, table: &str, columns: Vec<ColumnDef>) -> Result<(), PgKitError> {
        self.apply_ddl(&DdlRequest::create_table(table, columns)).await
    }

    pub async fn alter_table(&self, table: &str, alterations: Vec<Alteration>) -> Result<(), PgKitError> {
        self.apply_ddl(&DdlRequest::alter_table(table, alterations)).await
    }

    pub async fn drop_table(&self, table: &str) -> Result<(), PgKitError> {
        self.apply_ddl(&DdlRequest::drop_table(table)).await
    }

    pub async fn truncate_table(&self, table: &str) -> Result<(), PgKitError> {
        self.apply_ddl(&DdlRequest::truncate_table(table)).await
    }

    pub async fn enable_vector_extension(&self) -> Result<(), PgKitError> {
        self.apply_ddl(&DdlRequest::EnableVectorExtension).await
    }

    /// Base tables in the toolkit's schema.
    pub async fn list_tables(&self) -> Result<Vec<String>, PgKitError> {
        let raw = self.run(catalog::list_tables(&self.schema)?).await?;
        let tables = text_column(raw.rows, "table_name")?;
        tracing::info!(count = tables.len(), schema = %self.schema, "listed tables");
        Ok(tables)
    }

    pub async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, PgKitError> {
        let raw = self.run(catalog::describe_table(table)?).await?;
        map_column_info(raw.rows)
    }

    // -----------------------------------------------------------------------
    // Databases
    // -----------------------------------------------------------------------

    pub async fn list_databases(&self) -> Result<Vec<String>, PgKitError> {
        let raw = self.run(catalog::list_databases()).await?;
        text_column(raw.rows, "datname")
    }

    /// Create a database. An existing database of that name is logged, not an error.
    pub async fn create_database(&self, name: &str) -> Result<(), PgKitError> {
        match self.run(catalog::create_database(name)?).await {
            Ok(_) => {
                tracing::info!(database = %name, "database created");
                Ok(())
            }
            Err(e) if e.sqlstate() == Some(DUPLICATE_DATABASE) => {
                tracing::warn!(database = %name, "database already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Terminate other sessions on `name`, then drop it if it exists.
    pub async fn drop_database(&self, name: &str) -> Result<(), PgKitError> {
        for plan in catalog::drop_database(name)? {
            self.run(plan).await?;
        }
        tracing::info!(database = %name, "database dropped");
        Ok(())
    }
}

fn text_column(rows: Vec<RawRow>, column: &str) -> Result<Vec<String>, PgKitError> {
    rows.into_iter()
        .map(|mut row| match row.take(column) {
            Some(SqlValue::Text(s)) => Ok(s),
            other => Err(PgKitError::SchemaMismatch(format!(
                "expected text in '{column}', got {}",
                other.as_ref().map_or("nothing", SqlValue::kind)
            ))),
        })
        .collect()
}

fn ddl_label(request: &DdlRequest) -> String {
    match request {
        DdlRequest::CreateTable { table, .. } => format!("create {table}"),
        DdlRequest::AlterTable { table, .. } => format!("alter {table}"),
        DdlRequest::DropTable { table, .. } => format!("drop {table}"),
        DdlRequest::TruncateTable { table } => format!("truncate {table}"),
        DdlRequest::EnableVectorExtension => "enable vector extension".to_string(),
    }
}
