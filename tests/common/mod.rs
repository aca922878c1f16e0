//! In-process SQLite `RowExecutor` for exercising composed SQL end to end.
//!
//! sea-query's Postgres placeholders (`$1`, `$2`, ...) are valid SQLite named
//! parameters; each appears once and in order, so binding by position lines up.

#![allow(dead_code)]

use rowmap::{ExecError, RowExecutor, RowSet};
use rusqlite::types::Value as SqliteValue;
use rusqlite::Connection;
use sea_query::{Value, Values};
use std::cell::RefCell;

pub struct SqliteExecutor {
    conn: Connection,
    pub statements: RefCell<Vec<String>>,
}

impl SqliteExecutor {
    pub fn open() -> Self {
        Self {
            conn: Connection::open_in_memory().expect("Failed to open in-memory SQLite"),
            statements: RefCell::new(Vec::new()),
        }
    }

    pub fn execute_batch(&self, sql: &str) {
        self.conn.execute_batch(sql).expect("Failed to run setup SQL");
    }

    /// `trader` with `traders` rows and `trade` with `fanout` rows per trader.
    pub fn with_traders(traders: i64, fanout: i64) -> Self {
        let executor = Self::open();
        executor.execute_batch(
            "CREATE TABLE trader (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             CREATE TABLE trade (id INTEGER PRIMARY KEY, trader_id INTEGER NOT NULL, qty INTEGER NOT NULL);",
        );
        for id in 1..=traders {
            executor
                .conn
                .execute(
                    "INSERT INTO trader (id, name) VALUES (?1, ?2)",
                    rusqlite::params![id, format!("trader-{id:02}")],
                )
                .expect("Failed to insert trader");
            for n in 1..=fanout {
                executor
                    .conn
                    .execute(
                        "INSERT INTO trade (trader_id, qty) VALUES (?1, ?2)",
                        rusqlite::params![id, n * 100],
                    )
                    .expect("Failed to insert trade");
            }
        }
        executor
    }
}

fn to_sqlite(value: &Value) -> Result<SqliteValue, ExecError> {
    let converted = match value {
        Value::Bool(v) => v.map(|b| SqliteValue::Integer(i64::from(b))),
        Value::TinyInt(v) => v.map(|i| SqliteValue::Integer(i64::from(i))),
        Value::SmallInt(v) => v.map(|i| SqliteValue::Integer(i64::from(i))),
        Value::Int(v) => v.map(|i| SqliteValue::Integer(i64::from(i))),
        Value::BigInt(v) => v.map(SqliteValue::Integer),
        Value::TinyUnsigned(v) => v.map(|i| SqliteValue::Integer(i64::from(i))),
        Value::SmallUnsigned(v) => v.map(|i| SqliteValue::Integer(i64::from(i))),
        Value::Unsigned(v) => v.map(|i| SqliteValue::Integer(i64::from(i))),
        Value::BigUnsigned(v) => match v {
            Some(u) => Some(SqliteValue::Integer(
                i64::try_from(*u).map_err(|e| ExecError::Other(e.to_string()))?,
            )),
            None => None,
        },
        Value::Float(v) => v.map(|f| SqliteValue::Real(f64::from(f))),
        Value::Double(v) => v.map(SqliteValue::Real),
        Value::String(v) => v.clone().map(SqliteValue::Text),
        Value::Bytes(v) => v.clone().map(SqliteValue::Blob),
        other => return Err(ExecError::Other(format!("unsupported value {other:?}"))),
    };
    Ok(converted.unwrap_or(SqliteValue::Null))
}

fn from_sqlite(value: SqliteValue) -> Value {
    match value {
        SqliteValue::Null => Value::BigInt(None),
        SqliteValue::Integer(i) => Value::BigInt(Some(i)),
        SqliteValue::Real(f) => Value::Double(Some(f)),
        SqliteValue::Text(s) => Value::String(Some(s)),
        SqliteValue::Blob(b) => Value::Bytes(Some(b)),
    }
}

fn query_error(e: rusqlite::Error) -> ExecError {
    ExecError::QueryError(e.to_string())
}

impl RowExecutor for SqliteExecutor {
    fn query(&self, query: &str, values: &Values) -> Result<RowSet, ExecError> {
        self.statements.borrow_mut().push(query.to_string());

        let params = values
            .0
            .iter()
            .map(to_sqlite)
            .collect::<Result<Vec<_>, _>>()?;
        let mut stmt = self.conn.prepare(query).map_err(query_error)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(query_error)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(query_error)? {
            let mut decoded = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                let value: SqliteValue = row.get(idx).map_err(query_error)?;
                decoded.push(from_sqlite(value));
            }
            out.push(decoded);
        }
        Ok(RowSet::new(columns, out))
    }

    fn execute(&self, query: &str, values: &Values) -> Result<u64, ExecError> {
        self.statements.borrow_mut().push(query.to_string());

        let params = values
            .0
            .iter()
            .map(to_sqlite)
            .collect::<Result<Vec<_>, _>>()?;
        let affected = self
            .conn
            .execute(query, rusqlite::params_from_iter(params.iter()))
            .map_err(query_error)?;
        Ok(affected as u64)
    }
}
