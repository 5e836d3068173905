use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SqlValue
// ---------------------------------------------------------------------------

/// A single bindable or decoded PostgreSQL value.
///
/// Serializes untagged. Deserializing goes through [`serde_json::Value`] and
/// the same mapping as `From<Value>`: a non-empty array of numbers is a
/// `Vector`, any other array or object is `Json`. Strings always read back as
/// `Text`, including UUID strings; build `SqlValue::Uuid` from a [`Uuid`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Vector(Vec<f32>),
    Json(Value),
    Uuid(Uuid),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Float(f) => Some(*f),
            SqlValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            SqlValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Vector(_) => "vector",
            SqlValue::Json(_) => "json",
            SqlValue::Uuid(_) => "uuid",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(x) => write!(f, "{x}"),
            SqlValue::Text(s) => write!(f, "{s}"),
            SqlValue::Vector(v) => write!(f, "{v:?}"),
            SqlValue::Json(j) => write!(f, "{j}"),
            SqlValue::Uuid(u) => write!(f, "{u}"),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v.into())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(v.into())
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<Vec<f32>> for SqlValue {
    fn from(v: Vec<f32>) -> Self {
        SqlValue::Vector(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// Scalars map onto their own variants. A non-empty all-number array is a
/// `Vector`; other arrays and objects stay JSON.
impl From<Value> for SqlValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => SqlValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SqlValue::Text(s),
            Value::Array(items) => match numeric_array(&items) {
                Some(vector) => SqlValue::Vector(vector),
                None => SqlValue::Json(Value::Array(items)),
            },
            other => SqlValue::Json(other),
        }
    }
}

fn numeric_array(items: &[Value]) -> Option<Vec<f32>> {
    if items.is_empty() {
        return None;
    }
    items.iter().map(|v| v.as_f64().map(|f| f as f32)).collect()
}

impl<'de> Deserialize<'de> for SqlValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(SqlValue::from)
    }
}

// ---------------------------------------------------------------------------
// QueryPlan
// ---------------------------------------------------------------------------

/// SQL text plus its ordered parameters, ready for exactly one execution.
///
/// Placeholder `$n` binds to `params()[n - 1]`. The type is intentionally not
/// `Clone`: executors take plans by value.
#[derive(Debug, PartialEq)]
pub struct QueryPlan {
    sql: String,
    params: Vec<SqlValue>,
    returns_rows: bool,
}

impl QueryPlan {
    /// A plan whose result is an affected-row count.
    pub fn statement(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
            returns_rows: false,
        }
    }

    /// A plan whose result is a row set.
    pub fn query(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
            returns_rows: true,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    pub fn returns_rows(&self) -> bool {
        self.returns_rows
    }

    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

// ---------------------------------------------------------------------------
// Raw execution results
// ---------------------------------------------------------------------------

/// One row as produced by an executor, in the executor's column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    columns: Vec<(String, SqlValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Remove and return the first value stored under `column`.
    pub fn take(&mut self, column: &str) -> Option<SqlValue> {
        let idx = self.columns.iter().position(|(name, _)| name == column)?;
        Some(self.columns.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_columns(self) -> Vec<(String, SqlValue)> {
        self.columns
    }
}

impl FromIterator<(String, SqlValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Everything an executor reports back for one statement (or one atomic batch).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    pub rows_affected: u64,
    pub rows: Vec<RawRow>,
}

impl RawResult {
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            rows: Vec::new(),
        }
    }

    pub fn rows(rows: Vec<RawRow>) -> Self {
        Self {
            rows_affected: rows.len() as u64,
            rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A fully resolved row with a caller-stable field order.
///
/// Only the result mapper builds these; see `pgkit_engine::mapper`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, SqlValue)>,
}

impl Record {
    #[doc(hidden)]
    pub fn from_fields(fields: Vec<(String, SqlValue)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(name, v)| (name.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<(String, SqlValue)> {
        self.fields
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outcome of an `INSERT`, `UPDATE` or `DELETE`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationResult {
    pub affected: u64,
    /// Rows produced by a `RETURNING` clause, if any were returned.
    pub returned: Option<Vec<Record>>,
}

/// Column description as reported by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

// ---------------------------------------------------------------------------
// PgKitError
// ---------------------------------------------------------------------------

/// Error type shared by every pgkit crate.
///
/// All variants except `Execution` and `Config` are raised by the query
/// engine before anything reaches a database.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PgKitError {
    #[error("invalid condition: {0}")]
    InvalidCondition(String),
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("statement would affect all rows: {0}")]
    AffectsAllRows(String),
    #[error("reserved field name: {0}")]
    ReservedFieldName(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("execution error: {message}")]
    Execution {
        message: String,
        /// SQLSTATE reported by the server, when there is one.
        code: Option<String>,
    },
}

impl PgKitError {
    pub fn execution(message: impl Into<String>) -> Self {
        PgKitError::Execution {
            message: message.into(),
            code: None,
        }
    }

    pub fn execution_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        PgKitError::Execution {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            PgKitError::Execution { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// True for errors detected while building a plan.
    pub fn is_engine_error(&self) -> bool {
        !matches!(self, PgKitError::Execution { .. } | PgKitError::Config(_))
    }
}

// ---------------------------------------------------------------------------
// Executor trait
// ---------------------------------------------------------------------------

/// Runs query plans against a database session.
///
/// Errors from the backend are reported as [`PgKitError::Execution`] and are
/// never retried here.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, plan: QueryPlan) -> Result<RawResult, PgKitError>;

    /// Run all plans inside one transaction; nothing is applied if any fails.
    /// `rows_affected` is summed and rows are concatenated.
    async fn execute_atomic(&self, plans: Vec<QueryPlan>) -> Result<RawResult, PgKitError>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    async fn execute(&self, plan: QueryPlan) -> Result<RawResult, PgKitError> {
        (**self).execute(plan).await
    }

    async fn execute_atomic(&self, plans: Vec<QueryPlan>) -> Result<RawResult, PgKitError> {
        (**self).execute_atomic(plans).await
    }
}
