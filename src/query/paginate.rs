//! Join-safe pagination.
//!
//! A listing over a primary table whose filters need joins is composed as
//! three stages chained through CTEs:
//!
//! 1. `__cte_all_ids`: the primary ids that pass the filter, one row per id
//!    (grouped), each ranked with `ROW_NUMBER()` over the requested sort.
//! 2. `__cte_count`: `COUNT(*)` over those ids, so join fan-out never
//!    inflates the total.
//! 3. The terminal select: the primary table joined to the ranked ids of the
//!    requested page only, cross-joined to the count and ordered by rank.
//!    Joins the caller adds here never shrink the page.
//!
//! ```rust
//! use rowmap::query::{PageRequest, PaginationComposer};
//! use rowmap::query::Ident;
//! use sea_query::{Asterisk, Expr, ExprTrait, JoinType};
//!
//! let request = PageRequest::new("trader t", "id").sort("t.name").page(2).size(10);
//! let composed = PaginationComposer::default().compose(
//!     &request,
//!     |mut q| {
//!         q.join(
//!             JoinType::InnerJoin,
//!             Ident::new("trade"),
//!             Expr::cust("\"trade\".\"trader_id\" = \"t\".\"id\""),
//!         )
//!         .and_where(Expr::col((Ident::new("trade"), Ident::new("qty"))).gt(100));
//!         q
//!     },
//!     |mut q| {
//!         q.column((Ident::new("t"), Asterisk));
//!         q
//!     },
//! )?;
//! assert!(composed.sql.starts_with("WITH \"__cte_all_ids\" AS (SELECT \"t\".\"id\""));
//! # Ok::<(), rowmap::MapError>(())
//! ```

use super::fetch::run;
use super::fragment::{quote_ident, with_ctes, Cte, Fragment, Sqlizer};
use super::table::TableExpr;
use super::Ident;
use crate::config::RowmapConfig;
use crate::error::MapError;
use crate::executor::RowExecutor;
use crate::scan::{CustomScanTarget, Record, RowScanner, ScanOptions};
use sea_query::{Expr, JoinType, Order, Query, SelectStatement, Value, Values};

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Smallest page size served unless configured otherwise.
pub const MIN_PAGE_SIZE: u64 = 10;

/// Column carrying the total count on every terminal row.
pub const PAGINATION_COUNT_COLUMN: &str = "__pagination_count";

const ALL_IDS_CTE: &str = "__cte_all_ids";
const COUNT_CTE: &str = "__cte_count";
const IDS_ALIAS: &str = "__ids";
const RANK_COLUMN: &str = "__rn";
const COUNT_BASE_ALIAS: &str = "__count_base";

/// What to list: table, id column, sort and page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    from_table: String,
    id_column: String,
    sort: Vec<String>,
    page: u64,
    size: u64,
}

impl PageRequest {
    /// `from_table` is `table`, `table alias` or `schema.table alias`.
    pub fn new(from_table: impl Into<String>, id_column: impl Into<String>) -> Self {
        Self {
            from_table: from_table.into(),
            id_column: id_column.into(),
            sort: Vec::new(),
            page: 1,
            size: MIN_PAGE_SIZE,
        }
    }

    /// Append a raw `ORDER BY` term such as `t.name DESC`.
    pub fn sort(mut self, clause: impl Into<String>) -> Self {
        self.sort.push(clause.into());
        self
    }

    pub fn sorts<I, S>(mut self, clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort.extend(clauses.into_iter().map(Into::into));
        self
    }

    /// 1-based page number.
    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn from_table(&self) -> &str {
        &self.from_table
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn sort_clauses(&self) -> &[String] {
        &self.sort
    }

    pub fn requested_page(&self) -> u64 {
        self.page
    }

    pub fn requested_size(&self) -> u64 {
        self.size
    }
}

/// A composed, not yet executed, page query.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPage {
    pub sql: String,
    pub values: Values,
    /// Sanitized page
    pub page: u64,
    /// Sanitized size
    pub size: u64,
}

/// One page of records and the total number of primary rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

/// Builds and runs paginated listings.
#[derive(Debug, Clone)]
pub struct PaginationComposer {
    min_page_size: u64,
    scanner: RowScanner,
}

impl Default for PaginationComposer {
    fn default() -> Self {
        Self::new(MIN_PAGE_SIZE)
    }
}

impl PaginationComposer {
    pub fn new(min_page_size: u64) -> Self {
        Self {
            min_page_size,
            scanner: RowScanner::new(ScanOptions::default()),
        }
    }

    pub fn from_config(config: &RowmapConfig) -> Self {
        Self {
            min_page_size: config.pagination.min_page_size,
            scanner: RowScanner::new(ScanOptions::from_config(config)),
        }
    }

    /// Scan result rows with `scanner` instead of a default one.
    pub fn with_scanner(mut self, scanner: RowScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn min_page_size(&self) -> u64 {
        self.min_page_size
    }

    /// Page is at least 1; size is at least the minimum page size.
    pub fn sanitize(&self, page: u64, size: u64) -> (u64, u64) {
        (page.max(1), size.max(self.min_page_size))
    }

    /// Compose the three-stage query.
    ///
    /// `filter` shapes the id preselect (joins and `WHERE` clauses needed to
    /// decide which ids qualify). `primary` shapes the terminal select
    /// (columns and detail joins); it must not filter, since the id
    /// preselect has already decided which rows belong to the page.
    ///
    /// # Errors
    ///
    /// `MapError::QueryBuild` for an empty or malformed table expression or
    /// an empty id column.
    pub fn compose<F, P>(
        &self,
        request: &PageRequest,
        filter: F,
        primary: P,
    ) -> Result<ComposedPage, MapError>
    where
        F: FnOnce(SelectStatement) -> SelectStatement,
        P: FnOnce(SelectStatement) -> SelectStatement,
    {
        let table = TableExpr::parse(&request.from_table)?;
        let id = request.id_column.trim();
        if id.is_empty() {
            return Err(MapError::QueryBuild(
                "pagination id column must not be empty".to_string(),
            ));
        }
        let (page, size) = self.sanitize(request.page, request.size);
        let reference = table.reference();

        let rank = if request.sort.is_empty() {
            "ROW_NUMBER() OVER ()".to_string()
        } else {
            format!("ROW_NUMBER() OVER (ORDER BY {})", request.sort.join(", "))
        };

        let mut preselect = Query::select();
        preselect
            .column((Ident::new(reference), Ident::new(id)))
            .expr_as(Expr::cust(rank), Ident::new(RANK_COLUMN));
        table.apply_from(&mut preselect);
        let mut preselect = filter(preselect);
        preselect.group_by_col((Ident::new(reference), Ident::new(id)));

        let count = Query::select()
            .expr_as(Expr::cust("COUNT(*)"), Ident::new(PAGINATION_COUNT_COLUMN))
            .from(Ident::new(ALL_IDS_CTE))
            .to_owned();

        let page_ids = Query::select()
            .column(Ident::new(id))
            .column(Ident::new(RANK_COLUMN))
            .from(Ident::new(ALL_IDS_CTE))
            .order_by(Ident::new(RANK_COLUMN), Order::Asc)
            .limit(size)
            .offset((page - 1).saturating_mul(size))
            .to_owned();

        let mut terminal = Query::select();
        table.apply_from(&mut terminal);
        terminal.join_subquery(
            JoinType::InnerJoin,
            page_ids,
            Ident::new(IDS_ALIAS),
            Expr::cust(format!(
                "{}.{} = {}.{}",
                quote_ident(IDS_ALIAS),
                quote_ident(id),
                quote_ident(reference),
                quote_ident(id)
            )),
        );
        let mut terminal = primary(terminal);
        terminal
            .column((Ident::new(COUNT_CTE), Ident::new(PAGINATION_COUNT_COLUMN)))
            .join(JoinType::InnerJoin, Ident::new(COUNT_CTE), Expr::cust("TRUE"))
            .order_by((Ident::new(IDS_ALIAS), Ident::new(RANK_COLUMN)), Order::Asc);

        let ctes = [
            Cte::new(ALL_IDS_CTE, &preselect)?,
            Cte::new(COUNT_CTE, &count)?,
        ];
        let (sql, values) = with_ctes(&ctes, &terminal)?.into_parts();
        log::trace!("composed page {page} (size {size}) over {}: {sql}", table.table);

        Ok(ComposedPage {
            sql,
            values,
            page,
            size,
        })
    }

    /// Compose, run and scan one page.
    ///
    /// When the page is empty no row carries the count, and `total` falls
    /// back to `(page - 1) * size`.
    ///
    /// # Errors
    ///
    /// Build errors, `MapError::Execution` for executor failures, and the
    /// scanner's resolution and decode errors.
    pub fn fetch<T, E, F, P>(
        &self,
        executor: &E,
        request: &PageRequest,
        filter: F,
        primary: P,
    ) -> Result<PaginationResult<T>, MapError>
    where
        T: Record,
        E: RowExecutor + ?Sized,
        F: FnOnce(SelectStatement) -> SelectStatement,
        P: FnOnce(SelectStatement) -> SelectStatement,
    {
        let composed = self.compose(request, filter, primary)?;

        #[cfg(feature = "tracing")]
        let _span =
            tracing_helpers::paginate_span(&request.from_table, composed.page, composed.size)
                .entered();

        let fragment = Fragment::new(composed.sql, composed.values.0);
        let rows = run(executor, &fragment)?;
        let (page, size) = (composed.page, composed.size);

        if rows.is_empty() {
            let total = (page - 1).saturating_mul(size);
            log::debug!(
                "empty page {page} for {}, reporting total {total}",
                request.from_table
            );
            return Ok(PaginationResult {
                items: Vec::new(),
                total,
                page,
                size,
            });
        }

        let mapping = self.scanner.resolve_with_targets::<T>(
            &rows.columns,
            &[CustomScanTarget::new(PAGINATION_COUNT_COLUMN, 0)],
        )?;
        let mut total = 0u64;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows.rows {
            items.push(self.scanner.scan_row::<T>(&mapping, row, &mut [&mut total])?);
        }

        Ok(PaginationResult {
            items,
            total,
            page,
            size,
        })
    }

    /// Single-table listing without the CTE chain: a `COUNT(*)` over the
    /// filtered query, then the query itself sorted and sliced with
    /// `LIMIT`/`OFFSET`.
    ///
    /// `build` receives `SELECT ... FROM <table>` with no columns and adds
    /// columns and filters. Joins that fan out rows inflate the count here;
    /// use [`PaginationComposer::fetch`] for those.
    pub fn fetch_simple<T, E, B>(
        &self,
        executor: &E,
        request: &PageRequest,
        build: B,
    ) -> Result<PaginationResult<T>, MapError>
    where
        T: Record,
        E: RowExecutor + ?Sized,
        B: FnOnce(SelectStatement) -> SelectStatement,
    {
        let table = TableExpr::parse(&request.from_table)?;
        let (page, size) = self.sanitize(request.page, request.size);

        let mut base = Query::select();
        table.apply_from(&mut base);
        let base = build(base).to_fragment()?;

        let count_query = base.wrap(
            "SELECT COUNT(*) FROM (",
            &format!(") AS {}", quote_ident(COUNT_BASE_ALIAS)),
        );
        let total = super::fetch::fetch_count(executor, &count_query)?;

        let mut page_query = base;
        if !request.sort.is_empty() {
            page_query = page_query.append(&Fragment::raw(format!(
                " ORDER BY {}",
                request.sort.join(", ")
            )));
        }
        let page_query = page_query.append(&Fragment::new(
            " LIMIT $1 OFFSET $2",
            vec![
                Value::BigUnsigned(Some(size)),
                Value::BigUnsigned(Some((page - 1).saturating_mul(size))),
            ],
        ));
        let rows = run(executor, &page_query)?;
        let items = self.scanner.collect::<T>(rows)?;

        Ok(PaginationResult {
            items,
            total,
            page,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{Asterisk, ExprTrait};

    fn all_columns(mut q: SelectStatement) -> SelectStatement {
        q.column((Ident::new("t"), Asterisk));
        q
    }

    #[test]
    fn test_sanitize() {
        let composer = PaginationComposer::default();
        assert_eq!(composer.sanitize(0, 3), (1, 10));
        assert_eq!(composer.sanitize(4, 25), (4, 25));
        assert_eq!(PaginationComposer::new(5).sanitize(1, 3), (1, 5));
    }

    #[test]
    fn test_compose_shape() {
        let request = PageRequest::new("trader t", "id")
            .sort("t.name")
            .sort("t.id DESC")
            .page(2)
            .size(10);
        let composed = PaginationComposer::default()
            .compose(
                &request,
                |mut q| {
                    q.and_where(Expr::col((Ident::new("t"), Ident::new("active"))).eq(true));
                    q
                },
                all_columns,
            )
            .unwrap();

        assert_eq!(
            composed.sql,
            concat!(
                r#"WITH "__cte_all_ids" AS (SELECT "t"."id", ROW_NUMBER() OVER (ORDER BY t.name, t.id DESC) AS "__rn" FROM "trader" AS "t" WHERE "t"."active" = $1 GROUP BY "t"."id"), "#,
                r#""__cte_count" AS (SELECT COUNT(*) AS "__pagination_count" FROM "__cte_all_ids") "#,
                r#"SELECT "t".*, "__cte_count"."__pagination_count" FROM "trader" AS "t" "#,
                r#"INNER JOIN (SELECT "id", "__rn" FROM "__cte_all_ids" ORDER BY "__rn" ASC LIMIT $2 OFFSET $3) AS "__ids" ON "__ids"."id" = "t"."id" "#,
                r#"INNER JOIN "__cte_count" ON TRUE ORDER BY "__ids"."__rn" ASC"#
            )
        );
        assert_eq!(
            composed.values.0,
            vec![
                Value::Bool(Some(true)),
                Value::BigUnsigned(Some(10)),
                Value::BigUnsigned(Some(10)),
            ]
        );
        assert_eq!((composed.page, composed.size), (2, 10));
    }

    #[test]
    fn test_compose_unsorted_and_sanitized() {
        let request = PageRequest::new("trader", "id").page(0).size(3);
        let composed = PaginationComposer::default()
            .compose(&request, |q| q, all_columns)
            .unwrap();
        assert!(composed.sql.contains("ROW_NUMBER() OVER () AS \"__rn\""));
        assert!(composed.sql.contains("ON \"__ids\".\"id\" = \"trader\".\"id\""));
        assert_eq!((composed.page, composed.size), (1, 10));
        assert_eq!(
            composed.values.0,
            vec![Value::BigUnsigned(Some(10)), Value::BigUnsigned(Some(0))]
        );
    }

    #[test]
    fn test_compose_rejects_bad_input() {
        let composer = PaginationComposer::default();
        let err = composer
            .compose(&PageRequest::new("", "id"), |q| q, |q| q)
            .unwrap_err();
        assert!(matches!(err, MapError::QueryBuild(_)));

        let err = composer
            .compose(&PageRequest::new("trader", " "), |q| q, |q| q)
            .unwrap_err();
        assert!(matches!(err, MapError::QueryBuild(_)));
    }

    #[test]
    fn test_from_config() {
        let mut config = RowmapConfig::default();
        config.pagination.min_page_size = 25;
        let composer = PaginationComposer::from_config(&config);
        assert_eq!(composer.min_page_size(), 25);
        assert_eq!(composer.sanitize(1, 10), (1, 25));
    }
}
