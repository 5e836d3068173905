use pgkit_core::{PgKitError, RawRow, SqlValue};
use pgvector::Vector;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};
use uuid::Uuid;

/// Convert a driver row into executor-order `(column, SqlValue)` pairs.
///
/// Types without a [`SqlValue`] counterpart are read as text when the driver
/// allows it, otherwise they come back as `Null`.
pub(crate) fn decode_row(row: &PgRow) -> Result<RawRow, PgKitError> {
    let mut raw = RawRow::new();
    for (index, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();
        let value = decode_column(row, index, type_name).map_err(|e| {
            PgKitError::execution(format!(
                "failed to decode column '{}' ({type_name}): {e}",
                column.name()
            ))
        })?;
        raw.push(column.name(), value);
    }
    Ok(raw)
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Result<SqlValue, sqlx::Error> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.into(),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(i64::from).into(),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(i64::from).into(),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.into(),
        "FLOAT4" => row.try_get::<Option<f32>, _>(index)?.map(f64::from).into(),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.into(),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            row.try_get::<Option<String>, _>(index)?.into()
        }
        "JSON" | "JSONB" => match row.try_get::<Option<Value>, _>(index)? {
            Some(json) => SqlValue::Json(json),
            None => SqlValue::Null,
        },
        "UUID" => row.try_get::<Option<Uuid>, _>(index)?.into(),
        "VECTOR" | "vector" => match row.try_get::<Option<Vector>, _>(index)? {
            Some(vector) => SqlValue::Vector(vector.to_vec()),
            None => SqlValue::Null,
        },
        other => match row.try_get::<Option<String>, _>(index) {
            Ok(text) => text.into(),
            Err(_) => {
                tracing::debug!(column = index, type_name = other, "unsupported column type, returning null");
                SqlValue::Null
            }
        },
    };
    Ok(value)
}
