//! Parameter conversion from `sea_query::Values` to `may_postgres` parameters.
//!
//! Each value is copied into an owned, typed box so that NULLs keep the type
//! Postgres expects for their placeholder, then the closure runs with borrowed
//! `ToSql` references.

use crate::executor::ExecError;
use may_postgres::types::ToSql;
use sea_query::{Value, Values};

fn boxed(value: &Value) -> Result<Box<dyn ToSql>, ExecError> {
    let param: Box<dyn ToSql> = match value {
        Value::Bool(v) => Box::new(*v),
        Value::TinyInt(v) => Box::new(v.map(i16::from)),
        Value::SmallInt(v) => Box::new(*v),
        Value::Int(v) => Box::new(*v),
        Value::BigInt(v) => Box::new(*v),
        Value::TinyUnsigned(v) => Box::new(v.map(i16::from)),
        Value::SmallUnsigned(v) => Box::new(v.map(i32::from)),
        Value::Unsigned(v) => Box::new(v.map(i64::from)),
        Value::BigUnsigned(v) => {
            let converted = v
                .map(|u| {
                    i64::try_from(u).map_err(|_| {
                        ExecError::Other(format!(
                            "BigUnsigned value {} exceeds i64::MAX ({}), cannot be safely cast to i64",
                            u,
                            i64::MAX
                        ))
                    })
                })
                .transpose()?;
            Box::new(converted)
        }
        Value::Float(v) => Box::new(*v),
        Value::Double(v) => Box::new(*v),
        Value::String(v) => Box::new(v.clone()),
        Value::Char(v) => Box::new(v.map(|c| c.to_string())),
        Value::Bytes(v) => Box::new(v.clone()),
        Value::Json(v) => Box::new(v.as_deref().cloned()),
        Value::Uuid(_) => Box::new(
            <Option<uuid::Uuid> as sea_query::ValueType>::try_from(value.clone())
                .map_err(|_| unsupported(value))?,
        ),
        Value::ChronoDate(_) => Box::new(
            <Option<chrono::NaiveDate> as sea_query::ValueType>::try_from(value.clone())
                .map_err(|_| unsupported(value))?,
        ),
        Value::ChronoTime(_) => Box::new(
            <Option<chrono::NaiveTime> as sea_query::ValueType>::try_from(value.clone())
                .map_err(|_| unsupported(value))?,
        ),
        Value::ChronoDateTime(_) => Box::new(
            <Option<chrono::NaiveDateTime> as sea_query::ValueType>::try_from(value.clone())
                .map_err(|_| unsupported(value))?,
        ),
        Value::ChronoDateTimeUtc(_) => Box::new(
            <Option<chrono::DateTime<chrono::Utc>> as sea_query::ValueType>::try_from(
                value.clone(),
            )
            .map_err(|_| unsupported(value))?,
        ),
        _ => return Err(unsupported(value)),
    };
    Ok(param)
}

fn unsupported(value: &Value) -> ExecError {
    ExecError::Other(format!("Unsupported value type in query: {:?}", value))
}

/// Convert sea-query values to `may_postgres` parameters and run `f` with them.
///
/// # Errors
///
/// Returns `ExecError::Other` if a value has no Postgres parameter mapping or
/// an unsigned value does not fit in `BIGINT`. Errors from `f` pass through.
pub fn with_converted_params<F, R>(values: &Values, f: F) -> Result<R, ExecError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, ExecError>,
{
    let owned = values
        .iter()
        .map(boxed)
        .collect::<Result<Vec<_>, _>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|b| b.as_ref()).collect();
    f(&params)
}
