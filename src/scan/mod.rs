//! Row-to-record mapping.
//!
//! [`RowScanner`] resolves the column list of a result set against a
//! [`Record`] type once per distinct shape, caches the resolution, and then
//! materializes each row into a fresh record.
//!
//! ```rust
//! use rowmap::{Record, RowScanner, RowSet, ScanOptions};
//! use sea_query::Value;
//!
//! #[derive(Debug, Default, Record)]
//! pub struct Trader {
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! let scanner = RowScanner::new(ScanOptions::default());
//! let rows = RowSet::new(
//!     vec!["id".into(), "name".into()],
//!     vec![vec![Value::BigInt(Some(1)), Value::String(Some("acme".into()))]],
//! );
//! let traders: Vec<Trader> = scanner.collect(rows)?;
//! assert_eq!(traders[0].name, "acme");
//! # Ok::<(), rowmap::MapError>(())
//! ```

pub mod cache;
pub mod custom;
pub mod descriptor;
mod materialize;
pub mod resolve;

use crate::config::RowmapConfig;
use crate::error::MapError;
use crate::executor::RowSet;
use crate::value::ColumnValue;
use sea_query::Value;
use serde::Deserialize;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

pub use cache::{global_cache, MappingCache, MappingKey, ResolutionCache};
pub use custom::CustomScanTarget;
pub use descriptor::{
    ColumnTag, FieldDescriptor, FieldKind, FieldMut, FieldRef, Record, RecordDescriptor,
    RecordFields,
};
pub use resolve::{ResolvedMapping, Slot};

/// How field column names are compared with result column names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameMatch {
    /// Case-sensitive equality
    #[default]
    Exact,
    /// Underscores removed and case folded on both sides
    Normalized,
}

impl NameMatch {
    pub fn matches(self, field_column: &str, result_column: &str) -> bool {
        match self {
            NameMatch::Exact => field_column == result_column,
            NameMatch::Normalized => {
                let mut lhs = field_column.chars().filter(|c| *c != '_');
                let mut rhs = result_column.chars().filter(|c| *c != '_');
                loop {
                    match (lhs.next(), rhs.next()) {
                        (None, None) => return true,
                        (Some(a), Some(b)) if a.to_lowercase().eq(b.to_lowercase()) => {}
                        _ => return false,
                    }
                }
            }
        }
    }
}

/// Resolution behaviour of a [`RowScanner`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Fail when a result column has no record field
    pub strict: bool,
    pub name_match: NameMatch,
}

impl ScanOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn lax() -> Self {
        Self::default()
    }

    pub fn with_name_match(mut self, name_match: NameMatch) -> Self {
        self.name_match = name_match;
        self
    }

    pub fn from_config(config: &RowmapConfig) -> Self {
        Self {
            strict: config.scan.strict,
            name_match: config.scan.name_match,
        }
    }
}

/// Front-end over column resolution, the resolution cache and row materialization.
#[derive(Clone)]
pub struct RowScanner {
    cache: Arc<dyn MappingCache>,
    options: ScanOptions,
}

impl std::fmt::Debug for RowScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowScanner")
            .field("cached_mappings", &self.cache.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Default for RowScanner {
    fn default() -> Self {
        Self::new(ScanOptions::default())
    }
}

impl RowScanner {
    /// A scanner backed by the process-scoped cache.
    pub fn new(options: ScanOptions) -> Self {
        Self {
            cache: global_cache(),
            options,
        }
    }

    /// A scanner backed by `cache`.
    pub fn with_cache(cache: Arc<dyn MappingCache>, options: ScanOptions) -> Self {
        Self { cache, options }
    }

    pub fn options(&self) -> ScanOptions {
        self.options
    }

    pub fn cache(&self) -> &Arc<dyn MappingCache> {
        &self.cache
    }

    /// Resolve `columns` against `T`.
    ///
    /// # Errors
    ///
    /// `MissingField` in strict mode when a column has no field.
    pub fn resolve<T: Record>(&self, columns: &[String]) -> Result<Arc<ResolvedMapping>, MapError> {
        self.resolve_with_targets::<T>(columns, &[])
    }

    /// Resolve `columns` against `T`, routing the columns named by `targets`
    /// to caller-supplied receivers.
    ///
    /// # Errors
    ///
    /// `UnresolvedColumn` when a column matches neither a field nor a target,
    /// `CustomTarget` for an unconsumed or duplicated target, and
    /// `MissingField` in strict mode without targets.
    pub fn resolve_with_targets<T: Record>(
        &self,
        columns: &[String],
        targets: &[CustomScanTarget],
    ) -> Result<Arc<ResolvedMapping>, MapError> {
        let key = MappingKey::new::<T>(columns, targets, self.options.name_match);
        let mapping = match self.cache.get(&key) {
            Some(mapping) => mapping,
            None => {
                #[cfg(feature = "metrics")]
                METRICS.record_cache_miss();

                let descriptor = T::descriptor();
                let built = resolve::build(descriptor, columns, targets, self.options.name_match)?;
                let mapping = self.cache.get_or_insert(key, Arc::new(built));
                log::debug!(
                    "cached column mapping for {} over [{}]",
                    descriptor.type_name(),
                    columns.join(", ")
                );
                mapping
            }
        };

        if self.options.strict {
            if let Some(column) = mapping.first_missing() {
                return Err(MapError::MissingField {
                    column: column.to_string(),
                });
            }
        }
        Ok(mapping)
    }

    /// Materialize one row with a mapping from [`RowScanner::resolve_with_targets`].
    ///
    /// `receivers[ord]` receives the column of every target with that ordinal.
    pub fn scan_row<T: Record>(
        &self,
        mapping: &ResolvedMapping,
        values: Vec<Value>,
        receivers: &mut [&mut dyn ColumnValue],
    ) -> Result<T, MapError> {
        materialize::materialize(mapping, values, receivers)
    }

    /// Materialize every row of `rows`.
    pub fn collect<T: Record>(&self, rows: RowSet) -> Result<Vec<T>, MapError> {
        let mapping = self.resolve::<T>(&rows.columns)?;
        rows.rows
            .into_iter()
            .map(|row| self.scan_row::<T>(&mapping, row, &mut []))
            .collect()
    }
}
