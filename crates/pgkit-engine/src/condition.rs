use std::fmt;
use std::str::FromStr;

use pgkit_core::{PgKitError, SqlValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ident::is_safe_identifier;
use crate::params::Bindings;
use crate::vector::VectorNear;

// ---------------------------------------------------------------------------
// CompareOp
// ---------------------------------------------------------------------------

/// Comparison operators accepted by [`Condition::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<>")]
    Ne,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::Ne => "<>",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for CompareOp {
    type Err = PgKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(CompareOp::Eq),
            "<" => Ok(CompareOp::Lt),
            ">" => Ok(CompareOp::Gt),
            "<=" => Ok(CompareOp::Le),
            ">=" => Ok(CompareOp::Ge),
            "<>" | "!=" => Ok(CompareOp::Ne),
            other => Err(PgKitError::InvalidCondition(format!(
                "unsupported comparison operator '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// A single filter predicate over one column.
///
/// In JSON form the variant is selected by a `kind` field, e.g.
/// `{"kind": "compare", "column": "age", "op": ">=", "value": 18}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// `column = value`, or `column IS NULL` when `value` is null.
    Equals { column: String, value: SqlValue },
    Compare {
        column: String,
        op: CompareOp,
        value: SqlValue,
    },
    /// `column LIKE pattern`; the pattern is always bound, never inlined.
    TextMatch { column: String, pattern: String },
    VectorNear(VectorNear),
}

impl Condition {
    pub fn equals(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Condition::Equals {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<SqlValue>) -> Self {
        Condition::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn text_match(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Condition::TextMatch {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn near(near: VectorNear) -> Self {
        Condition::VectorNear(near)
    }

    pub fn column(&self) -> &str {
        match self {
            Condition::Equals { column, .. }
            | Condition::Compare { column, .. }
            | Condition::TextMatch { column, .. } => column,
            Condition::VectorNear(near) => &near.column,
        }
    }
}

// ---------------------------------------------------------------------------
// ConditionSet
// ---------------------------------------------------------------------------

/// Ordered conjunction of conditions. Empty means "no WHERE clause".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        self.conditions.iter()
    }

    /// Build a condition set from a JSON description.
    ///
    /// An object `{"col": value, ...}` becomes one `Equals` per key, in the
    /// map's iteration order. An array is read as a list of tagged conditions.
    pub fn from_json(value: &Value) -> Result<Self, PgKitError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Ok(map
                .iter()
                .map(|(column, v)| Condition::equals(column.as_str(), v.clone()))
                .collect()),
            Value::Array(_) => serde_json::from_value(value.clone())
                .map_err(|e| PgKitError::InvalidCondition(format!("malformed condition list: {e}"))),
            other => Err(PgKitError::InvalidCondition(format!(
                "expected an object or array of conditions, got {other}"
            ))),
        }
    }

    /// Split into plain filters and the (at most one) vector predicate.
    pub(crate) fn split_vector(&self) -> Result<(Vec<&Condition>, Option<&VectorNear>), PgKitError> {
        let mut filters = Vec::with_capacity(self.conditions.len());
        let mut near = None;
        for condition in &self.conditions {
            match condition {
                Condition::VectorNear(v) if near.is_none() => near = Some(v),
                Condition::VectorNear(_) => {
                    return Err(PgKitError::InvalidCondition(
                        "only one vector similarity condition is allowed per query".to_string(),
                    ))
                }
                other => filters.push(other),
            }
        }
        Ok((filters, near))
    }
}

impl From<Vec<Condition>> for ConditionSet {
    fn from(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }
}

impl FromIterator<Condition> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ConditionSet {
    type Item = &'a Condition;
    type IntoIter = std::slice::Iter<'a, Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.conditions.iter()
    }
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

/// A `WHERE` body (without the keyword) and the parameters it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereFragment {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl WhereFragment {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Translate a condition set into a `WHERE` body with placeholders `$1..$n`.
///
/// `Equals` against null becomes `IS NULL` and binds nothing. Vector
/// predicates are rejected here; they belong to [`crate::build_select`] or
/// [`crate::translate_vector`].
pub fn translate(conditions: &ConditionSet) -> Result<WhereFragment, PgKitError> {
    let mut bindings = Bindings::new();
    let filters: Vec<&Condition> = conditions.iter().collect();
    let sql = translate_into(&filters, &mut bindings)?;
    Ok(WhereFragment {
        sql,
        params: bindings.into_values(),
    })
}

pub(crate) fn translate_into(
    conditions: &[&Condition],
    bindings: &mut Bindings,
) -> Result<String, PgKitError> {
    let mut parts = Vec::with_capacity(conditions.len());
    for condition in conditions {
        parts.push(condition_sql(condition, bindings)?);
    }
    Ok(parts.join(" AND "))
}

fn condition_sql(condition: &Condition, bindings: &mut Bindings) -> Result<String, PgKitError> {
    check_column(condition.column())?;
    match condition {
        Condition::Equals { column, value } => {
            if value.is_null() {
                Ok(format!("{column} IS NULL"))
            } else {
                let ph = bindings.push(value.clone());
                Ok(format!("{column} = {ph}"))
            }
        }
        Condition::Compare { column, op, value } => {
            if value.is_null() {
                return Err(PgKitError::InvalidCondition(format!(
                    "cannot compare '{column}' {op} NULL; use an equals condition to test for null"
                )));
            }
            let ph = bindings.push(value.clone());
            Ok(format!("{column} {op} {ph}"))
        }
        Condition::TextMatch { column, pattern } => {
            let ph = bindings.push(SqlValue::Text(pattern.clone()));
            Ok(format!("{column} LIKE {ph}"))
        }
        Condition::VectorNear(near) => Err(PgKitError::InvalidCondition(format!(
            "vector condition on '{}' cannot be used as a filter; issue it through a select",
            near.column
        ))),
    }
}

fn check_column(column: &str) -> Result<(), PgKitError> {
    if is_safe_identifier(column) {
        Ok(())
    } else {
        Err(PgKitError::InvalidCondition(format!(
            "invalid column name '{column}'"
        )))
    }
}
