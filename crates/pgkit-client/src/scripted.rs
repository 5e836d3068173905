use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pgkit_core::{Executor, PgKitError, QueryPlan, RawResult, SqlValue};

/// A plan as seen by [`ScriptedExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedPlan {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub returns_rows: bool,
    /// Index of the atomic batch this plan ran in, if any.
    pub batch: Option<usize>,
}

/// In-memory [`Executor`] that replays queued results and records every plan.
///
/// Once the queue is empty each call returns an empty [`RawResult`].
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    responses: Arc<Mutex<VecDeque<Result<RawResult, PgKitError>>>>,
    executed: Arc<Mutex<Vec<ExecutedPlan>>>,
    batches: Arc<Mutex<usize>>,
}

impl ScriptedExecutor {
    pub fn new(responses: Vec<Result<RawResult, PgKitError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Self::default()
        }
    }

    /// Plans executed so far, in submission order.
    pub fn executed(&self) -> Vec<ExecutedPlan> {
        match self.executed.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, plan: QueryPlan, batch: Option<usize>) -> Result<(), PgKitError> {
        let returns_rows = plan.returns_rows();
        let (sql, params) = plan.into_parts();
        self.executed
            .lock()
            .map_err(|e| PgKitError::execution(format!("Lock: {e}")))?
            .push(ExecutedPlan {
                sql,
                params,
                returns_rows,
                batch,
            });
        Ok(())
    }

    fn next_response(&self) -> Result<RawResult, PgKitError> {
        self.responses
            .lock()
            .map_err(|e| PgKitError::execution(format!("Lock: {e}")))?
            .pop_front()
            .unwrap_or_else(|| Ok(RawResult::default()))
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, plan: QueryPlan) -> Result<RawResult, PgKitError> {
        self.record(plan, None)?;
        self.next_response()
    }

    async fn execute_atomic(&self, plans: Vec<QueryPlan>) -> Result<RawResult, PgKitError> {
        let batch = {
            let mut counter = self
                .batches
                .lock()
                .map_err(|e| PgKitError::execution(format!("Lock: {e}")))?;
            *counter += 1;
            *counter - 1
        };
        for plan in plans {
            self.record(plan, Some(batch))?;
        }
        self.next_response()
    }
}
