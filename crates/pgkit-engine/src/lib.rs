//! Query construction engine for pgkit.
//!
//! Turns structured requests into [`QueryPlan`]s (SQL text plus ordered
//! parameters) and shapes raw executor rows back into [`Record`]s. Nothing in
//! this crate performs I/O or keeps state between calls, so the blocking and
//! async clients share it unchanged.
//!
//! - [`translate`]: condition set to `WHERE` body, with `= NULL` rewritten to `IS NULL`
//! - [`translate_vector`]: pgvector distance expression for top-k search
//! - [`build_select`], [`build_insert`], [`build_update`], [`build_delete`], [`build_ddl`]
//! - [`map_rows`], [`map_scored_rows`], [`map_mutation_result`]
//!
//! # Example
//!
//! ```rust
//! use pgkit_engine::{build_select, Condition, SelectRequest};
//!
//! let plan = build_select(
//!     &SelectRequest::new("users").filter(Condition::equals("email", None::<String>)),
//! )
//! .unwrap();
//! assert_eq!(plan.sql(), "SELECT * FROM users WHERE email IS NULL");
//! assert!(plan.params().is_empty());
//! ```

mod assembler;
pub mod catalog;
mod condition;
mod ddl;
mod ident;
mod mapper;
mod params;
mod vector;

pub use assembler::{
    build_delete, build_insert, build_select, build_update, DeleteRequest, Direction, FieldSet,
    InsertRequest, OrderSpec, SelectRequest, UpdateRequest,
};
pub use condition::{translate, CompareOp, Condition, ConditionSet, WhereFragment};
pub use ddl::{build_ddl, Alteration, ColumnDef, DdlPlan, DdlRequest};
pub use ident::{validate_column_name, validate_table_name};
pub use mapper::{map_column_info, map_mutation_result, map_rows, map_scored_rows, SCORE_FIELD};
pub use vector::{effective_limit, translate_vector, DistanceMetric, VectorFragment, VectorNear};

// Re-export core types for convenience.
pub use pgkit_core::{MutationResult, PgKitError, QueryPlan, Record, SqlValue};
