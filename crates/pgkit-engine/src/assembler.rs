use pgkit_core::{PgKitError, QueryPlan, SqlValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::{translate_into, Condition, ConditionSet};
use crate::ident::{validate_column_name, validate_table_name};
use crate::mapper::SCORE_FIELD;
use crate::params::Bindings;
use crate::vector::{effective_limit, vector_into, VectorNear};

// ---------------------------------------------------------------------------
// OrderSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One `ORDER BY` term. Multiple specs apply left to right as tie-breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub column: String,
    #[serde(default)]
    pub direction: Direction,
}

impl OrderSpec {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

// ---------------------------------------------------------------------------
// FieldSet
// ---------------------------------------------------------------------------

/// Column-to-value payload for inserts and updates.
///
/// Keys are unique and keep their first insertion position, which fixes the
/// order parameters are bound in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<(String, SqlValue)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set `column`. An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
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

    /// Build from a JSON object; keys follow the map's iteration order.
    pub fn from_json(value: &Value) -> Result<Self, PgKitError> {
        match value {
            Value::Object(map) => Ok(map
                .iter()
                .map(|(k, v)| (k.clone(), SqlValue::from(v.clone())))
                .collect()),
            other => Err(PgKitError::Validation(format!(
                "expected a JSON object of column values, got {other}"
            ))),
        }
    }

    fn same_keys(&self, other: &FieldSet) -> bool {
        self.len() == other.len() && other.keys().all(|k| self.get(k).is_some())
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SelectRequest {
    pub table: String,
    /// `None` (or empty) selects every column.
    pub columns: Option<Vec<String>>,
    pub conditions: ConditionSet,
    pub order_by: Vec<OrderSpec>,
    pub limit: Option<u64>,
}

impl SelectRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            conditions: ConditionSet::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_conditions(mut self, conditions: ConditionSet) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, spec: OrderSpec) -> Self {
        self.order_by.push(spec);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The vector predicate carried by this request, if any.
    pub fn vector(&self) -> Option<&VectorNear> {
        self.conditions.iter().find_map(|c| match c {
            Condition::VectorNear(near) => Some(near),
            _ => None,
        })
    }

    /// Explicitly requested columns, if the request does not select `*`.
    pub fn explicit_columns(&self) -> Option<&[String]> {
        self.columns.as_deref().filter(|cols| !cols.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertRequest {
    pub table: String,
    pub rows: Vec<FieldSet>,
    pub returning: Vec<String>,
}

impl InsertRequest {
    pub fn new(table: impl Into<String>, rows: Vec<FieldSet>) -> Self {
        Self {
            table: table.into(),
            rows,
            returning: Vec::new(),
        }
    }

    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub table: String,
    pub fields: FieldSet,
    pub conditions: ConditionSet,
    pub allow_unconditional: bool,
    pub returning: Vec<String>,
}

impl UpdateRequest {
    pub fn new(table: impl Into<String>, fields: FieldSet, conditions: ConditionSet) -> Self {
        Self {
            table: table.into(),
            fields,
            conditions,
            allow_unconditional: false,
            returning: Vec::new(),
        }
    }

    /// Permit an update without conditions, touching every row.
    pub fn allow_unconditional(mut self) -> Self {
        self.allow_unconditional = true;
        self
    }

    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    pub table: String,
    pub conditions: ConditionSet,
    pub allow_unconditional: bool,
    pub returning: Vec<String>,
}

impl DeleteRequest {
    pub fn new(table: impl Into<String>, conditions: ConditionSet) -> Self {
        Self {
            table: table.into(),
            conditions,
            allow_unconditional: false,
            returning: Vec::new(),
        }
    }

    /// Permit a delete without conditions, removing every row.
    pub fn allow_unconditional(mut self) -> Self {
        self.allow_unconditional = true;
        self
    }

    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// `SELECT` with optional projection, filters, one vector predicate, ordering and limit.
///
/// With a vector predicate the distance is projected as [`SCORE_FIELD`], it
/// leads the `ORDER BY`, and the limit becomes the smaller of `k` and the
/// explicit limit. No implicit limit is added otherwise.
pub fn build_select(request: &SelectRequest) -> Result<QueryPlan, PgKitError> {
    validate_table_name(&request.table)?;
    let (filters, near) = request.conditions.split_vector()?;

    let projection = match request.explicit_columns() {
        Some(columns) => {
            for column in columns {
                validate_column_name(column)?;
                if near.is_some() && column == SCORE_FIELD {
                    return Err(PgKitError::ReservedFieldName(format!(
                        "'{SCORE_FIELD}' is reserved for the similarity score"
                    )));
                }
            }
            columns.join(", ")
        }
        None => "*".to_string(),
    };

    let mut bindings = Bindings::new();
    // The score expression precedes WHERE in the text, so it binds first.
    let distance = near
        .map(|n| vector_into(n, &mut bindings))
        .transpose()?;

    let mut sql = format!("SELECT {projection}");
    if let Some(distance) = &distance {
        sql.push_str(&format!(", {distance} AS {SCORE_FIELD}"));
    }
    sql.push_str(&format!(" FROM {}", request.table));

    let where_sql = translate_into(&filters, &mut bindings)?;
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }

    let mut order_terms = Vec::with_capacity(request.order_by.len() + 1);
    if let Some(distance) = &distance {
        order_terms.push(format!("{distance} ASC"));
    }
    for spec in &request.order_by {
        validate_column_name(&spec.column)?;
        order_terms.push(format!("{} {}", spec.column, spec.direction.as_sql()));
    }
    if !order_terms.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_terms.join(", "));
    }

    let limit = match near {
        Some(near) => Some(effective_limit(near.k, request.limit)),
        None => request.limit,
    };
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    Ok(QueryPlan::query(sql, bindings.into_values()))
}

/// Multi-row `INSERT`. Every row must carry the same set of columns; values
/// are bound in the first row's column order.
pub fn build_insert(request: &InsertRequest) -> Result<QueryPlan, PgKitError> {
    validate_table_name(&request.table)?;
    let first = request.rows.first().ok_or_else(|| {
        PgKitError::Validation(format!("insert into {} requires at least one row", request.table))
    })?;
    if first.is_empty() {
        return Err(PgKitError::Validation(format!(
            "insert into {} requires at least one column",
            request.table
        )));
    }
    let columns: Vec<&str> = first.keys().collect();
    for column in &columns {
        validate_column_name(column)?;
    }

    let mut bindings = Bindings::new();
    let mut tuples = Vec::with_capacity(request.rows.len());
    for (i, row) in request.rows.iter().enumerate() {
        if !first.same_keys(row) {
            return Err(PgKitError::SchemaMismatch(format!(
                "row {i} has columns [{}] but row 0 has [{}]",
                row.keys().collect::<Vec<_>>().join(", "),
                columns.join(", "),
            )));
        }
        let mut placeholders = Vec::with_capacity(columns.len());
        for column in &columns {
            let value = row.get(column).cloned().unwrap_or(SqlValue::Null);
            placeholders.push(bindings.push(value));
        }
        tuples.push(format!("({})", placeholders.join(", ")));
    }

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        request.table,
        columns.join(", "),
        tuples.join(", ")
    );
    let returns_rows = push_returning(&mut sql, &request.returning)?;
    Ok(finish(sql, bindings, returns_rows))
}

/// `UPDATE ... SET`. SET parameters come first, then the WHERE parameters.
pub fn build_update(request: &UpdateRequest) -> Result<QueryPlan, PgKitError> {
    validate_table_name(&request.table)?;
    if request.fields.is_empty() {
        return Err(PgKitError::Validation(format!(
            "update of {} requires at least one field",
            request.table
        )));
    }
    let filters = mutation_filters(
        "UPDATE",
        &request.table,
        &request.conditions,
        request.allow_unconditional,
    )?;

    let mut bindings = Bindings::new();
    let mut assignments = Vec::with_capacity(request.fields.len());
    for (column, value) in request.fields.iter() {
        validate_column_name(column)?;
        let ph = bindings.push(value.clone());
        assignments.push(format!("{column} = {ph}"));
    }

    let mut sql = format!("UPDATE {} SET {}", request.table, assignments.join(", "));
    let where_sql = translate_into(&filters, &mut bindings)?;
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }
    let returns_rows = push_returning(&mut sql, &request.returning)?;
    Ok(finish(sql, bindings, returns_rows))
}

pub fn build_delete(request: &DeleteRequest) -> Result<QueryPlan, PgKitError> {
    validate_table_name(&request.table)?;
    let filters = mutation_filters(
        "DELETE",
        &request.table,
        &request.conditions,
        request.allow_unconditional,
    )?;

    let mut bindings = Bindings::new();
    let mut sql = format!("DELETE FROM {}", request.table);
    let where_sql = translate_into(&filters, &mut bindings)?;
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }
    let returns_rows = push_returning(&mut sql, &request.returning)?;
    Ok(finish(sql, bindings, returns_rows))
}

fn mutation_filters<'a>(
    verb: &str,
    table: &str,
    conditions: &'a ConditionSet,
    allow_unconditional: bool,
) -> Result<Vec<&'a Condition>, PgKitError> {
    let (filters, near) = conditions.split_vector()?;
    if let Some(near) = near {
        return Err(PgKitError::InvalidCondition(format!(
            "vector condition on '{}' is only valid in a select",
            near.column
        )));
    }
    if filters.is_empty() && !allow_unconditional {
        return Err(PgKitError::AffectsAllRows(format!(
            "{verb} on {table} has no conditions; opt in with allow_unconditional() to touch every row"
        )));
    }
    Ok(filters)
}

fn push_returning(sql: &mut String, returning: &[String]) -> Result<bool, PgKitError> {
    if returning.is_empty() {
        return Ok(false);
    }
    for column in returning {
        if column != "*" {
            validate_column_name(column)?;
        }
    }
    sql.push_str(" RETURNING ");
    sql.push_str(&returning.join(", "));
    Ok(true)
}

fn finish(sql: String, bindings: Bindings, returns_rows: bool) -> QueryPlan {
    if returns_rows {
        QueryPlan::query(sql, bindings.into_values())
    } else {
        QueryPlan::statement(sql, bindings.into_values())
    }
}
