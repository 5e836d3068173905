use async_trait::async_trait;
use pgkit_core::{Executor, PgKitError, QueryPlan, RawResult};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Postgres;

use crate::bind::bind_params;
use crate::config::PgConfig;
use crate::decode::decode_row;

/// [`Executor`] over a sqlx connection pool.
#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool using `config`.
    pub async fn connect(config: &PgConfig) -> Result<Self, PgKitError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| map_sqlx_error("failed to connect", e))?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "connected to postgres"
        );
        Ok(Self { pool })
    }

    /// Return a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Executor for PgExecutor {
    async fn execute(&self, plan: QueryPlan) -> Result<RawResult, PgKitError> {
        run_plan(&self.pool, plan).await
    }

    async fn execute_atomic(&self, plans: Vec<QueryPlan>) -> Result<RawResult, PgKitError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("failed to begin transaction", e))?;

        let mut total = RawResult::default();
        for plan in plans {
            // Dropping `tx` on error rolls the batch back.
            let result = run_plan(&mut *tx, plan).await?;
            total.rows_affected += result.rows_affected;
            total.rows.extend(result.rows);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("failed to commit transaction", e))?;
        Ok(total)
    }
}

async fn run_plan<'c, X>(conn: X, plan: QueryPlan) -> Result<RawResult, PgKitError>
where
    X: sqlx::Executor<'c, Database = Postgres>,
{
    let returns_rows = plan.returns_rows();
    let (sql, params) = plan.into_parts();

    if returns_rows {
        let rows = bind_params(sqlx::query(&sql), params)
            .fetch_all(conn)
            .await
            .map_err(|e| map_sqlx_error("query failed", e))?;
        let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
        return Ok(RawResult {
            rows_affected: rows.len() as u64,
            rows,
        });
    }

    let done = if params.is_empty() {
        // Parameterless statements use the simple query protocol.
        conn.execute(sqlx::raw_sql(&sql)).await
    } else {
        bind_params(sqlx::query(&sql), params).execute(conn).await
    }
    .map_err(|e| map_sqlx_error("statement failed", e))?;
    Ok(RawResult::affected(done.rows_affected()))
}

/// Keep the SQLSTATE when the server reported one.
fn map_sqlx_error(context: &str, e: sqlx::Error) -> PgKitError {
    let code = e
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned());
    match code {
        Some(code) => PgKitError::execution_with_code(format!("{context}: {e}"), code),
        None => PgKitError::execution(format!("{context}: {e}")),
    }
}
