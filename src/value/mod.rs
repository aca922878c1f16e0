//! Value conversions between Rust types and `sea_query::Value`.
//!
//! ## Traits
//!
//! - **`ValueType`** - Maps Rust types to their corresponding `sea_query::Value` variant
//! - **`TryGetable`** - Safe value extraction with error handling
//! - **`ColumnValue`** - Object-safe destination a column value is scanned into

pub mod column;
pub mod params;
pub mod try_getable;
pub mod types;

pub use column::ColumnValue;
pub use params::with_converted_params;
pub use try_getable::{TryGetable, ValueExtractionError};
pub use types::{is_null, ValueType};
