//! # rowmap
//!
//! Row-to-record mapping with a resolution cache, and join-safe CTE
//! pagination, for PostgreSQL over `may_postgres` and `sea-query`.
//!
//! - [`RowScanner`] resolves a result set's columns against a [`Record`]
//!   type once per distinct column shape and materializes rows into records.
//! - [`query::PaginationComposer`] lists a primary table page by page with an
//!   exact total, even when filters join one-to-many tables.
//!
//! ```no_run
//! use rowmap::query::{Ident, PageRequest, PaginationComposer};
//! use rowmap::{MayPostgresExecutor, Record};
//! use sea_query::Asterisk;
//!
//! #[derive(Debug, Default, Record)]
//! pub struct Trader {
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! # fn run(client: may_postgres::Client) -> Result<(), rowmap::MapError> {
//! let executor = MayPostgresExecutor::new(client);
//! let page = PaginationComposer::default().fetch::<Trader, _, _, _>(
//!     &executor,
//!     &PageRequest::new("trader t", "id").sort("t.name").page(2),
//!     |q| q,
//!     |mut q| {
//!         q.column((Ident::new("t"), Asterisk));
//!         q
//!     },
//! )?;
//! println!("{} of {}", page.items.len(), page.total);
//! # Ok(())
//! # }
//! ```

extern crate self as rowmap;

pub mod config;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod query;
pub mod scan;
pub mod value;

pub use config::RowmapConfig;
pub use error::{CustomTargetError, MapError};
pub use executor::{ExecError, MayPostgresExecutor, RowExecutor, RowSet};
pub use scan::{
    global_cache, ColumnTag, CustomScanTarget, FieldDescriptor, FieldKind, FieldMut, FieldRef,
    MappingCache, MappingKey, NameMatch, Record, RecordDescriptor, RecordFields,
    ResolutionCache, ResolvedMapping, RowScanner, ScanOptions, Slot,
};
pub use value::{ColumnValue, TryGetable, ValueExtractionError, ValueType};

pub use rowmap_derive::Record;
