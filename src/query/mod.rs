//! Query composition and execution.
//!
//! - **Fragment**: immutable SQL fragments and CTE chaining (`Fragment`, `Cte`, `chain`)
//! - **Paginate**: join-safe CTE pagination (`PaginationComposer`)
//! - **Fetch**: run a statement and scan the rows (`fetch_all`, `fetch_one`, `fetch_count`),
//!   or run a write and count affected rows (`execute`)
//! - **Table**: `[schema.]table [alias]` parsing

pub mod fetch;
pub mod fragment;
pub mod paginate;
pub mod table;

pub use fetch::{execute, fetch_all, fetch_count, fetch_one};
pub use fragment::{chain, quote_ident, to_cte, with_ctes, Cte, Fragment, Sqlizer};
pub use paginate::{
    ComposedPage, PageRequest, PaginationComposer, PaginationResult, MIN_PAGE_SIZE,
    PAGINATION_COUNT_COLUMN,
};
pub use table::TableExpr;

use sea_query::Iden;

/// A runtime identifier for sea-query statements.
///
/// ```rust
/// use rowmap::query::Ident;
/// use sea_query::{PostgresQueryBuilder, Query};
///
/// let sql = Query::select()
///     .column((Ident::new("t"), Ident::new("id")))
///     .from(Ident::new("trader"))
///     .to_string(PostgresQueryBuilder);
/// assert_eq!(sql, r#"SELECT "t"."id" FROM "trader""#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Iden for Ident {
    fn unquoted(&self) -> &str {
        &self.0
    }
}
