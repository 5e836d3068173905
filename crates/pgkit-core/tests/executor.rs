use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pgkit_core::{Executor, PgKitError, QueryPlan, RawResult};

struct CountingExecutor {
    statements: AtomicUsize,
}

#[async_trait]
impl Executor for CountingExecutor {
    async fn execute(&self, _plan: QueryPlan) -> Result<RawResult, PgKitError> {
        self.statements.fetch_add(1, Ordering::SeqCst);
        Ok(RawResult::affected(1))
    }

    async fn execute_atomic(&self, plans: Vec<QueryPlan>) -> Result<RawResult, PgKitError> {
        let n = plans.len();
        self.statements.fetch_add(n, Ordering::SeqCst);
        Ok(RawResult::affected(n as u64))
    }
}

async fn run_through<E: Executor>(executor: &E) -> Result<u64, PgKitError> {
    let single = executor
        .execute(QueryPlan::statement("TRUNCATE TABLE t", Vec::new()))
        .await?;
    let batch = executor
        .execute_atomic(vec![
            QueryPlan::statement("ALTER TABLE t ADD COLUMN a INT", Vec::new()),
            QueryPlan::statement("ALTER TABLE t RENAME COLUMN a TO b", Vec::new()),
        ])
        .await?;
    Ok(single.rows_affected + batch.rows_affected)
}

#[tokio::test]
async fn shared_executor_forwards_calls() {
    let executor = Arc::new(CountingExecutor {
        statements: AtomicUsize::new(0),
    });

    let affected = run_through(&executor).await.unwrap();
    assert_eq!(affected, 3);
    assert_eq!(executor.statements.load(Ordering::SeqCst), 3);
}
