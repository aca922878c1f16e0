//! Procedural macros for rowmap
//!
//! This crate provides the `Record` derive, which generates the field
//! descriptors and index-addressed field access rows are materialized through.

mod attributes;
mod macros;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `Record` - generates `rowmap::RecordFields` and `rowmap::Record`
///
/// Field attributes:
/// - `#[column_name = "x"]` - match column `x` instead of the field name
/// - `#[column_name = "-"]` or `#[skip]` - never match this field
/// - `#[embedded]` - flatten a nested record's columns into this one
/// - `#[embedded = "addr"]` - same, with columns prefixed `addr_`
///
/// Only `pub` leaf fields are matched. Embedded records are walked whatever
/// their visibility; an `#[embedded]` field behind `Box`, `Arc`, `Rc` or
/// `Option` is recorded but never walked.
///
/// # Example
///
/// ```ignore
/// use rowmap::Record;
///
/// #[derive(Default, Record)]
/// pub struct Address {
///     pub street: String,
///     pub city: String,
/// }
///
/// #[derive(Default, Record)]
/// pub struct Person {
///     pub id: i64,
///     #[column_name = "full_name"]
///     pub name: String,
///     #[embedded = "addr"]
///     pub address: Address,
///     #[skip]
///     pub cached_score: f64,
/// }
/// ```
#[proc_macro_derive(Record, attributes(column_name, skip, embedded))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    macros::derive_record(input)
}
