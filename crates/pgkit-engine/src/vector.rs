use pgkit_core::{PgKitError, SqlValue};
use serde::{Deserialize, Serialize};

use crate::ident::is_safe_identifier;
use crate::params::Bindings;

/// pgvector distance operators. Smaller is always nearer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Euclidean distance, `<->`.
    #[default]
    L2,
    /// Cosine distance, `<=>`.
    Cosine,
    /// Negative inner product, `<#>`.
    InnerProduct,
    /// Taxicab distance, `<+>`.
    L1,
}

impl DistanceMetric {
    pub fn operator(self) -> &'static str {
        match self {
            DistanceMetric::L2 => "<->",
            DistanceMetric::Cosine => "<=>",
            DistanceMetric::InnerProduct => "<#>",
            DistanceMetric::L1 => "<+>",
        }
    }
}

/// Top-`k` similarity search over a vector column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorNear {
    pub column: String,
    pub vector: Vec<f32>,
    pub k: u64,
    #[serde(default)]
    pub metric: DistanceMetric,
}

impl VectorNear {
    pub fn new(column: impl Into<String>, vector: Vec<f32>, k: u64) -> Self {
        Self {
            column: column.into(),
            vector,
            k,
            metric: DistanceMetric::default(),
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }
}

/// Distance expression for a [`VectorNear`], usable as a score and as a sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorFragment {
    /// e.g. `embedding <-> $1`
    pub distance: String,
    pub params: Vec<SqlValue>,
    /// Ascending by distance, nearest first. No secondary key.
    pub order_by: String,
}

/// Shape the similarity expression for `near`, numbering from `$1`.
///
/// Dimensionality is not checked against the column; the database does that
/// when the plan runs.
pub fn translate_vector(near: &VectorNear) -> Result<VectorFragment, PgKitError> {
    let mut bindings = Bindings::new();
    let distance = vector_into(near, &mut bindings)?;
    Ok(VectorFragment {
        order_by: format!("{distance} ASC"),
        distance,
        params: bindings.into_values(),
    })
}

pub(crate) fn vector_into(near: &VectorNear, bindings: &mut Bindings) -> Result<String, PgKitError> {
    if !is_safe_identifier(&near.column) {
        return Err(PgKitError::InvalidCondition(format!(
            "invalid vector column name '{}'",
            near.column
        )));
    }
    if near.k == 0 {
        return Err(PgKitError::InvalidCondition(format!(
            "k must be positive for vector search on '{}'",
            near.column
        )));
    }
    if near.vector.is_empty() {
        return Err(PgKitError::InvalidCondition(format!(
            "query vector for '{}' is empty",
            near.column
        )));
    }
    if near.vector.iter().any(|x| !x.is_finite()) {
        return Err(PgKitError::InvalidCondition(format!(
            "query vector for '{}' contains non-finite values",
            near.column
        )));
    }
    let ph = bindings.push(SqlValue::Vector(near.vector.clone()));
    Ok(format!("{} {} {ph}", near.column, near.metric.operator()))
}

/// Row bound for a vector search: `k`, or the explicit limit if it is smaller.
pub fn effective_limit(k: u64, explicit: Option<u64>) -> u64 {
    match explicit {
        Some(limit) => limit.min(k),
        None => k,
    }
}
