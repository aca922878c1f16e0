//! Error types for row mapping and query composition.
//!
//! Every failure in the crate surfaces as a [`MapError`]. Nothing here is
//! logged or retried: errors go straight back to the caller, who decides
//! whether to report them.

use crate::executor::ExecError;
use crate::value::ValueExtractionError;
use sea_query::Values;
use std::fmt;

/// Failures around custom scan targets (columns routed to caller-supplied receivers).
///
/// All of these are detected before a single row value is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomTargetError {
    /// The number of receivers does not match the number of distinct target ordinals
    ReceiverCount { expected: usize, actual: usize },
    /// Two targets were resolved onto the same result column
    DuplicatePosition { position: usize },
    /// A target ordinal does not address any supplied receiver
    InvalidOrdinal { ord: usize, receivers: usize },
    /// A declared target matched no result column
    Unconsumed { column: String },
}

impl fmt::Display for CustomTargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomTargetError::ReceiverCount { expected, actual } => {
                write!(
                    f,
                    "custom target receiver count mismatch: expected {expected}, got {actual}"
                )
            }
            CustomTargetError::DuplicatePosition { position } => {
                write!(f, "duplicate custom target position: {position}")
            }
            CustomTargetError::InvalidOrdinal { ord, receivers } => {
                write!(
                    f,
                    "invalid custom target receiver at ord {ord} ({receivers} receiver(s) supplied)"
                )
            }
            CustomTargetError::Unconsumed { column } => {
                write!(
                    f,
                    "custom scan target with row field '{column}' has no corresponding field"
                )
            }
        }
    }
}

impl std::error::Error for CustomTargetError {}

/// Crate-wide error type
#[derive(Debug)]
pub enum MapError {
    /// A query fragment could not be produced
    QueryBuild(String),
    /// Strict resolution found a result column with no record field
    MissingField { column: String },
    /// A result column matches neither a record field nor a custom target
    UnresolvedColumn { column: String },
    /// Custom scan target validation failed
    CustomTarget(CustomTargetError),
    /// A column value could not be written into its destination
    Decode {
        column: String,
        source: ValueExtractionError,
    },
    /// The executor failed; carries the statement for diagnostics
    Execution {
        source: ExecError,
        sql: String,
        values: Values,
    },
}

impl MapError {
    pub(crate) fn execution(source: ExecError, sql: &str, values: &Values) -> Self {
        MapError::Execution {
            source,
            sql: sql.to_string(),
            values: values.clone(),
        }
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::QueryBuild(msg) => write!(f, "error building SQL: {msg}"),
            MapError::MissingField { column } => {
                write!(f, "cannot find field for column {column} in returned row")
            }
            MapError::UnresolvedColumn { column } => {
                write!(f, "row field '{column}' does not match any scan target")
            }
            MapError::CustomTarget(e) => write!(f, "{e}"),
            MapError::Decode { column, source } => {
                write!(f, "cannot scan column {column}: {source}")
            }
            MapError::Execution { source, sql, values } => {
                write!(
                    f,
                    "error executing SQL: {source}\n#### SQL:\n{sql}\n#### Args:\n{:?}",
                    values.0
                )
            }
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::CustomTarget(e) => Some(e),
            MapError::Decode { source, .. } => Some(source),
            MapError::Execution { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CustomTargetError> for MapError {
    fn from(err: CustomTargetError) -> Self {
        MapError::CustomTarget(err)
    }
}
