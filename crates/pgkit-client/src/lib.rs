//! Async and blocking pgkit clients.
//!
//! [`Toolkit`] awaits its [`Executor`]; [`BlockingToolkit`] wraps a `Toolkit`
//! and blocks the calling thread instead. Both build plans through
//! `pgkit-engine`, so a request produces the same SQL in either mode.
//!
//! # Quick start
//!
//! ```rust
//! use pgkit_client::{ScriptedExecutor, Toolkit};
//! use pgkit_engine::{Condition, SelectRequest};
//!
//! # async fn example() -> Result<(), pgkit_core::PgKitError> {
//! let toolkit = Toolkit::new(ScriptedExecutor::default());
//! let request = SelectRequest::new("users")
//!     .with_columns(["id", "email"])
//!     .filter(Condition::equals("active", true));
//! let records = toolkit.fetch_records(&request).await?;
//! assert!(records.is_empty());
//! # Ok(())
//! # }
//! ```

mod blocking;
mod scripted;
mod toolkit;

pub use blocking::BlockingToolkit;
pub use scripted::{ExecutedPlan, ScriptedExecutor};
pub use toolkit::Toolkit;

// Re-export core traits/types for convenience.
pub use pgkit_core::{Executor, MutationResult, PgKitError, Record};
