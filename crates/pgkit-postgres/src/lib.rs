//! PostgreSQL + pgvector backend for pgkit.
//!
//! [`PgExecutor`] implements [`Executor`] over a sqlx pool: plans that return
//! rows are fetched and decoded into [`RawRow`](pgkit_core::RawRow)s, other
//! plans report their affected-row count, and atomic batches run inside one
//! transaction. Vector parameters and columns go through the `pgvector` crate.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use pgkit_postgres::{connect, PgConfig};
//!
//! # async fn example() -> Result<(), pgkit_core::PgKitError> {
//! let toolkit = connect(&PgConfig::from_env()?).await?;
//! toolkit.enable_vector_extension().await?;
//! println!("{:?}", toolkit.list_tables().await?);
//! # Ok(())
//! # }
//! ```

mod bind;
mod config;
mod decode;
mod executor;

pub use config::PgConfig;
pub use executor::PgExecutor;

use pgkit_client::{BlockingToolkit, Toolkit};
use pgkit_core::PgKitError;

// Re-export core traits/types for convenience.
pub use pgkit_core::Executor;

/// Connect and return an async [`Toolkit`].
pub async fn connect(config: &PgConfig) -> Result<Toolkit<PgExecutor>, PgKitError> {
    Ok(Toolkit::new(PgExecutor::connect(config).await?))
}

/// Connect and return a [`BlockingToolkit`].
///
/// The pool is created on the toolkit's own runtime. Must not be called from
/// inside an async context.
pub fn connect_blocking(config: &PgConfig) -> Result<BlockingToolkit<PgExecutor>, PgKitError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| PgKitError::Config(format!("failed to start runtime: {e}")))?;
    let toolkit = runtime.block_on(connect(config))?;
    Ok(BlockingToolkit::from_parts(runtime, toolkit))
}
