use pgkit_core::{ColumnInfo, Executor, MutationResult, PgKitError, Record};
use pgkit_engine::{
    Alteration, ColumnDef, ConditionSet, DdlRequest, DeleteRequest, FieldSet, InsertRequest,
    SelectRequest, UpdateRequest, VectorNear,
};
use tokio::runtime::{Builder, Runtime};

use crate::Toolkit;

/// Blocking counterpart of [`Toolkit`].
///
/// Each method drives the matching async method to completion on an owned
/// current-thread runtime, so both clients share one code path. Do not call
/// these methods from inside an async context; use [`Toolkit`] there.
pub struct BlockingToolkit<E> {
    runtime: Runtime,
    inner: Toolkit<E>,
}

impl<E: Executor> BlockingToolkit<E> {
    /// Wrap `executor` with a fresh current-thread runtime.
    pub fn new(executor: E) -> Result<Self, PgKitError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PgKitError::Config(format!("failed to start runtime: {e}")))?;
        Ok(Self::from_parts(runtime, Toolkit::new(executor)))
    }

    /// Use an existing runtime, e.g. the one an executor's pool was created on.
    pub fn from_parts(runtime: Runtime, toolkit: Toolkit<E>) -> Self {
        Self {
            runtime,
            inner: toolkit,
        }
    }

    pub fn toolkit(&self) -> &Toolkit<E> {
        &self.inner
    }

    pub fn executor(&self) -> &E {
        self.inner.executor()
    }

    pub fn fetch_records(&self, request: &SelectRequest) -> Result<Vec<Record>, PgKitError> {
        self.runtime.block_on(self.inner.fetch_records(request))
    }

    pub fn vector_search(
        &self,
        table: &str,
        near: VectorNear,
        filters: ConditionSet,
        limit: Option<u64>,
    ) -> Result<Vec<Record>, PgKitError> {
        self.runtime
            .block_on(self.inner.vector_search(table, near, filters, limit))
    }

    pub fn insert_record(&self, table: &str, record: FieldSet) -> Result<MutationResult, PgKitError> {
        self.runtime.block_on(self.inner.insert_record(table, record))
    }

    pub fn insert_records(&self, request: &InsertRequest) -> Result<MutationResult, PgKitError> {
        self.runtime.block_on(self.inner.insert_records(request))
    }

    pub fn update_records(&self, request: &UpdateRequest) -> Result<MutationResult, PgKitError> {
        self.runtime.block_on(self.inner.update_records(request))
    }

    pub fn delete_records(&self, request: &DeleteRequest) -> Result<MutationResult, PgKitError> {
        self.runtime.block_on(self.inner.delete_records(request))
    }

    pub fn apply_ddl(&self, request: &DdlRequest) -> Result<(), PgKitError> {
        self.runtime.block_on(self.inner.apply_ddl(request))
    }

    pub fn create_table(&self, table: &str, columns: Vec<ColumnDef>) -> Result<(), PgKitError> {
        self.runtime.block_on(self.inner.create_table(table, columns))
    }

    pub fn alter_table(&self, table: &str, alterations: Vec<Alteration>) -> Result<(), PgKitError> {
        self.runtime.block_on(self.inner.alter_table(table, alterations))
    }

    pub fn drop_table(&self, table: &str) -> Result<(), PgKitError> {
        self.runtime.block_on(self.inner.drop_table(table))
    }

    pub fn truncate_table(&self, table: &str) -> Result<(), PgKitError> {
        self.runtime.block_on(self.inner.truncate_table(table))
    }

    pub fn enable_vector_extension(&self) -> Result<(), PgKitError> {
        self.runtime.block_on(self.inner.enable_vector_extension())
    }

    pub fn list_tables(&self) -> Result<Vec<String>, PgKitError> {
        self.runtime.block_on(self.inner.list_tables())
    }

    pub fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, PgKitError> {
        self.runtime.block_on(self.inner.describe_table(table))
    }

    pub fn list_databases(&self) -> Result<Vec<String>, PgKitError> {
        self.runtime.block_on(self.inner.list_databases())
    }

    pub fn create_database(&self, name: &str) -> Result<(), PgKitError> {
        self.runtime.block_on(self.inner.create_database(name))
    }

    pub fn drop_database(&self, name: &str) -> Result<(), PgKitError> {
        self.runtime.block_on(self.inner.drop_database(name))
    }
}
