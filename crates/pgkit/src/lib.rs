//! pgkit: a PostgreSQL access toolkit.
//!
//! This crate re-exports the pgkit sub-crates for single-import usage.
//! Enable features to control which modules are available.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `client` |
//! | `client` | `Toolkit`, `BlockingToolkit`, `ScriptedExecutor` |
//! | `postgres` | `client` + sqlx/pgvector `PgExecutor`, `PgConfig`, `connect`, `connect_blocking` |
//! | `full` | All features enabled |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pgkit::engine::{Condition, SelectRequest, VectorNear};
//! use pgkit::postgres::{connect, PgConfig};
//! ```

/// Core types: SqlValue, QueryPlan, Record, PgKitError, and the Executor trait.
/// Always available.
pub use pgkit_core as core;

/// Condition translation, vector predicates, statement assembly, DDL, and
/// result mapping. Always available.
pub use pgkit_engine as engine;

/// Async `Toolkit`, `BlockingToolkit`, and the recording `ScriptedExecutor`.
#[cfg(feature = "client")]
pub use pgkit_client as client;

/// PostgreSQL executor over sqlx, plus connection configuration.
#[cfg(feature = "postgres")]
pub use pgkit_postgres as postgres;

pub use pgkit_core::{Executor, MutationResult, PgKitError, QueryPlan, Record, SqlValue};

#[cfg(feature = "client")]
pub use pgkit_client::{BlockingToolkit, Toolkit};
