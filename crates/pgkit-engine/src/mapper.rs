use pgkit_core::{ColumnInfo, MutationResult, PgKitError, RawResult, RawRow, Record, SqlValue};

/// Field carrying the vector distance in similarity-search records.
pub const SCORE_FIELD: &str = "__score";

/// Shape raw rows into records whose fields follow `declared` order.
///
/// Raw columns that are not declared are dropped; a declared column missing
/// from a row is a [`PgKitError::SchemaMismatch`].
pub fn map_rows<S: AsRef<str>>(raw_rows: Vec<RawRow>, declared: &[S]) -> Result<Vec<Record>, PgKitError> {
    raw_rows
        .into_iter()
        .map(|row| project(row, declared).map(Record::from_fields))
        .collect()
}

/// Like [`map_rows`], then append the similarity score as the last field.
pub fn map_scored_rows<S: AsRef<str>>(
    raw_rows: Vec<RawRow>,
    declared: &[S],
) -> Result<Vec<Record>, PgKitError> {
    if declared.iter().any(|c| c.as_ref() == SCORE_FIELD) {
        return Err(PgKitError::ReservedFieldName(format!(
            "table has a column named '{SCORE_FIELD}', which is reserved for the similarity score"
        )));
    }
    raw_rows
        .into_iter()
        .map(|mut row| {
            let score = row.take(SCORE_FIELD).ok_or_else(|| {
                PgKitError::SchemaMismatch(format!("similarity score '{SCORE_FIELD}' missing from result row"))
            })?;
            let mut fields = project(row, declared)?;
            fields.push((SCORE_FIELD.to_string(), score));
            Ok(Record::from_fields(fields))
        })
        .collect()
}

fn project<S: AsRef<str>>(mut row: RawRow, declared: &[S]) -> Result<Vec<(String, SqlValue)>, PgKitError> {
    declared
        .iter()
        .map(|column| {
            let column = column.as_ref();
            row.take(column)
                .map(|value| (column.to_string(), value))
                .ok_or_else(|| {
                    PgKitError::SchemaMismatch(format!("column '{column}' missing from result row"))
                })
        })
        .collect()
}

/// Affected count plus any `RETURNING` rows, kept in executor column order.
pub fn map_mutation_result(raw: RawResult) -> MutationResult {
    let returned = if raw.rows.is_empty() {
        None
    } else {
        Some(
            raw.rows
                .into_iter()
                .map(|row| Record::from_fields(row.into_columns()))
                .collect(),
        )
    };
    MutationResult {
        affected: raw.rows_affected,
        returned,
    }
}

/// Read rows produced by [`crate::catalog::describe_table`].
pub fn map_column_info(raw_rows: Vec<RawRow>) -> Result<Vec<ColumnInfo>, PgKitError> {
    raw_rows
        .into_iter()
        .map(|row| {
            let text = |column: &str| -> Result<String, PgKitError> {
                match row.get(column) {
                    Some(SqlValue::Text(s)) => Ok(s.clone()),
                    other => Err(PgKitError::SchemaMismatch(format!(
                        "expected text in '{column}', got {}",
                        other.map_or("nothing", SqlValue::kind)
                    ))),
                }
            };
            Ok(ColumnInfo {
                name: text("column_name")?,
                data_type: text("data_type")?,
                is_nullable: text("is_nullable")? == "YES",
                default: match row.get("column_default") {
                    Some(SqlValue::Text(s)) => Some(s.clone()),
                    _ => None,
                },
            })
        })
        .collect()
}
