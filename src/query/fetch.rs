//! One-shot query helpers: run a statement and scan what comes back.
//!
//! Zero rows is an ordinary outcome (`Vec::new()`, `None`), never an error.

use super::fragment::Sqlizer;
use crate::error::MapError;
use crate::executor::{RowExecutor, RowSet};
use crate::scan::{Record, RowScanner};
use crate::value::TryGetable;

/// Render `query` and run it once.
pub(crate) fn run<E: RowExecutor + ?Sized>(
    executor: &E,
    query: &impl Sqlizer,
) -> Result<RowSet, MapError> {
    let (sql, values) = query.to_fragment()?.into_parts();
    log::trace!("executing: {sql}");
    executor
        .query(&sql, &values)
        .map_err(|e| MapError::execution(e, &sql, &values))
}

/// Run a statement that returns no rows; the number of rows it affected.
pub fn execute<E: RowExecutor + ?Sized>(executor: &E, query: &impl Sqlizer) -> Result<u64, MapError> {
    let (sql, values) = query.to_fragment()?.into_parts();
    log::trace!("executing: {sql}");
    executor
        .execute(&sql, &values)
        .map_err(|e| MapError::execution(e, &sql, &values))
}

/// Every row of `query` as a `T`.
pub fn fetch_all<T: Record, E: RowExecutor + ?Sized>(
    executor: &E,
    scanner: &RowScanner,
    query: &impl Sqlizer,
) -> Result<Vec<T>, MapError> {
    let rows = run(executor, query)?;
    scanner.collect::<T>(rows)
}

/// The first row of `query` as a `T`, or `None` when there are no rows.
pub fn fetch_one<T: Record, E: RowExecutor + ?Sized>(
    executor: &E,
    scanner: &RowScanner,
    query: &impl Sqlizer,
) -> Result<Option<T>, MapError> {
    let RowSet { columns, rows } = run(executor, query)?;
    let Some(first) = rows.into_iter().next() else {
        return Ok(None);
    };
    let mapping = scanner.resolve::<T>(&columns)?;
    scanner.scan_row::<T>(&mapping, first, &mut []).map(Some)
}

/// The first column of the first row as a count; 0 without rows.
pub fn fetch_count<E: RowExecutor + ?Sized>(
    executor: &E,
    query: &impl Sqlizer,
) -> Result<u64, MapError> {
    let RowSet { columns, rows } = run(executor, query)?;
    let Some(value) = rows.into_iter().next().and_then(|row| row.into_iter().next()) else {
        return Ok(0);
    };
    u64::try_get(value).map_err(|source| MapError::Decode {
        column: columns.into_iter().next().unwrap_or_default(),
        source,
    })
}
