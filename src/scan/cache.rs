//! Resolution cache.
//!
//! Append-only: one entry per distinct (record type, column signature,
//! custom-target signature, name matching) shape for the life of the cache.
//! Entries are never mutated or evicted.

use super::custom::{self, CustomScanTarget};
use super::resolve::ResolvedMapping;
use super::NameMatch;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Identity of one resolution shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingKey {
    type_id: TypeId,
    columns: String,
    targets: String,
    name_match: NameMatch,
}

impl MappingKey {
    pub fn new<T: 'static>(
        columns: &[String],
        targets: &[CustomScanTarget],
        name_match: NameMatch,
    ) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            columns: columns.join("\0"),
            targets: custom::signature(targets),
            name_match,
        }
    }
}

/// Storage for resolved mappings, shared by every scanner that holds it.
pub trait MappingCache: Send + Sync {
    fn get(&self, key: &MappingKey) -> Option<Arc<ResolvedMapping>>;

    /// Insert `mapping` unless the key is already present; either way return
    /// the entry the cache retains.
    fn get_or_insert(&self, key: MappingKey, mapping: Arc<ResolvedMapping>) -> Arc<ResolvedMapping>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Many-reader, single-writer `MappingCache`.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<MappingKey, Arc<ResolvedMapping>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MappingCache for ResolutionCache {
    fn get(&self, key: &MappingKey) -> Option<Arc<ResolvedMapping>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn get_or_insert(&self, key: MappingKey, mapping: Arc<ResolvedMapping>) -> Arc<ResolvedMapping> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(key).or_insert(mapping))
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

static GLOBAL_CACHE: Lazy<Arc<ResolutionCache>> = Lazy::new(|| Arc::new(ResolutionCache::new()));

/// The process-scoped cache used by [`RowScanner::new`](super::RowScanner::new).
pub fn global_cache() -> Arc<ResolutionCache> {
    Arc::clone(&GLOBAL_CACHE)
}
