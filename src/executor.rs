//! Query execution seam.
//!
//! Provides the `RowExecutor` trait the rest of the crate talks to, the
//! `RowSet` it returns, and `MayPostgresExecutor`, the `may_postgres`-backed
//! implementation.
//!
//! Rows come back as `sea_query::Value`s paired with their column names, so
//! the scanner never needs to know which driver produced them. Cancellation
//! and timeouts belong to the executor; this crate issues exactly one call per
//! query and never retries.

use may_postgres::types::{FromSql, Type};
use may_postgres::{Client, Error as PostgresError, Row};
use sea_query::{Value, Values};
use std::fmt;
use std::time::Instant;

use crate::value::with_converted_params;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Executor error type
#[derive(Debug)]
pub enum ExecError {
    /// `PostgreSQL` error from `may_postgres`
    PostgresError(PostgresError),
    /// Query execution error
    QueryError(String),
    /// Row parsing/conversion error
    ParseError(String),
    /// Other execution errors
    Other(String),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::PostgresError(e) => {
                write!(f, "PostgreSQL error: {e}")
            }
            ExecError::QueryError(s) => {
                write!(f, "Query error: {s}")
            }
            ExecError::ParseError(s) => {
                write!(f, "Parse error: {s}")
            }
            ExecError::Other(s) => {
                write!(f, "Execution error: {s}")
            }
        }
    }
}

impl std::error::Error for ExecError {}

impl From<PostgresError> for ExecError {
    fn from(err: PostgresError) -> Self {
        ExecError::PostgresError(err)
    }
}

/// Result rows together with their column names.
///
/// Every row holds exactly one value per column, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Trait for executing queries that return rows
///
/// Implementations decide how the statement reaches the database (direct
/// client, pooled connection, transaction, in-memory engine for tests).
///
/// # Examples
///
/// ```no_run
/// use rowmap::{RowExecutor, ExecError};
/// use sea_query::{Value, Values};
///
/// # fn example(executor: &dyn RowExecutor) -> Result<(), ExecError> {
/// let rows = executor.query(
///     "SELECT id, name FROM users WHERE id = $1",
///     &Values(vec![Value::BigInt(Some(42))]),
/// )?;
/// assert_eq!(rows.columns, vec!["id".to_string(), "name".to_string()]);
/// # Ok(())
/// # }
/// ```
pub trait RowExecutor {
    /// Run `query` with positional `$n` parameters and return every row.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the query cannot be executed or a column cannot
    /// be decoded.
    fn query(&self, query: &str, values: &Values) -> Result<RowSet, ExecError>;

    /// Run a statement that returns no rows and report how many rows it affected.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the statement cannot be executed.
    fn execute(&self, query: &str, values: &Values) -> Result<u64, ExecError>;
}

impl<E: RowExecutor + ?Sized> RowExecutor for &E {
    fn query(&self, query: &str, values: &Values) -> Result<RowSet, ExecError> {
        (**self).query(query, values)
    }

    fn execute(&self, query: &str, values: &Values) -> Result<u64, ExecError> {
        (**self).execute(query, values)
    }
}

/// Implementation of `RowExecutor` for `may_postgres::Client`
pub struct MayPostgresExecutor {
    client: Client,
}

impl MayPostgresExecutor {
    /// Create a new executor from a `may_postgres::Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Consume the executor and return the underlying client
    pub fn into_client(self) -> Client {
        self.client
    }
}

impl RowExecutor for MayPostgresExecutor {
    fn query(&self, query: &str, values: &Values) -> Result<RowSet, ExecError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        let start = Instant::now();
        let result = with_converted_params(values, |params| {
            self.client.query(query, params).map_err(|e| {
                #[cfg(feature = "metrics")]
                METRICS.record_query_error();
                ExecError::PostgresError(e)
            })
        });

        let duration = start.elapsed();
        #[cfg(feature = "metrics")]
        METRICS.record_query(duration);
        log::trace!("query finished in {duration:?}");

        let rows = result?;
        let columns = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => Vec::new(),
        };
        let decoded = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RowSet::new(columns, decoded))
    }

    fn execute(&self, query: &str, values: &Values) -> Result<u64, ExecError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        let start = Instant::now();
        let result = with_converted_params(values, |params| {
            self.client.execute(query, params).map_err(|e| {
                #[cfg(feature = "metrics")]
                METRICS.record_query_error();
                ExecError::PostgresError(e)
            })
        });

        let duration = start.elapsed();
        #[cfg(feature = "metrics")]
        METRICS.record_query(duration);
        log::trace!("statement finished in {duration:?}");

        result
    }
}

/// The undecoded wire bytes of a column whose type has no `Value` mapping
/// (`NUMERIC`, arrays, ranges, ...). Lax scans skip such columns; a `Vec<u8>`
/// field or receiver can still take them.
struct RawColumn(Vec<u8>);

impl<'a> FromSql<'a> for RawColumn {
    fn from_sql(
        _ty: &Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(Self(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Decode every column of a `may_postgres` row into a `sea_query::Value`,
/// choosing the variant from the column's Postgres type.
fn decode_row(row: &Row) -> Result<Vec<Value>, ExecError> {
    let mut values = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let ty = column.type_();
        let value = if *ty == Type::BOOL {
            Value::Bool(row.try_get::<_, Option<bool>>(idx)?)
        } else if *ty == Type::INT2 {
            Value::SmallInt(row.try_get::<_, Option<i16>>(idx)?)
        } else if *ty == Type::INT4 {
            Value::Int(row.try_get::<_, Option<i32>>(idx)?)
        } else if *ty == Type::INT8 {
            Value::BigInt(row.try_get::<_, Option<i64>>(idx)?)
        } else if *ty == Type::FLOAT4 {
            Value::Float(row.try_get::<_, Option<f32>>(idx)?)
        } else if *ty == Type::FLOAT8 {
            Value::Double(row.try_get::<_, Option<f64>>(idx)?)
        } else if *ty == Type::TEXT
            || *ty == Type::VARCHAR
            || *ty == Type::BPCHAR
            || *ty == Type::NAME
        {
            Value::String(row.try_get::<_, Option<String>>(idx)?)
        } else if *ty == Type::BYTEA {
            Value::Bytes(row.try_get::<_, Option<Vec<u8>>>(idx)?)
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            Value::Json(row.try_get::<_, Option<serde_json::Value>>(idx)?.map(Box::new))
        } else if *ty == Type::UUID {
            Value::from(row.try_get::<_, Option<uuid::Uuid>>(idx)?)
        } else if *ty == Type::DATE {
            Value::from(row.try_get::<_, Option<chrono::NaiveDate>>(idx)?)
        } else if *ty == Type::TIMESTAMP {
            Value::from(row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)?)
        } else if *ty == Type::TIMESTAMPTZ {
            Value::from(row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?)
        } else if *ty == Type::TIME {
            Value::from(row.try_get::<_, Option<chrono::NaiveTime>>(idx)?)
        } else {
            log::trace!("column {} of type {ty} kept as raw bytes", column.name());
            Value::Bytes(row.try_get::<_, Option<RawColumn>>(idx)?.map(|raw| raw.0))
        };
        values.push(value);
    }
    Ok(values)
}
