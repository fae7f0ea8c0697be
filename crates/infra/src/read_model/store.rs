use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use commandcenter_core::Sku;
use commandcenter_inventory::ItemRecord;

/// Key/value store abstraction for the disposable catalog read model.
///
/// `list` returns records in stable insertion order (the catalog's listing
/// contract). Read models can be cleared and rebuilt from the event stream
/// at any time.
pub trait CatalogStore: Send + Sync {
    fn get(&self, sku: &Sku) -> Option<ItemRecord>;
    fn upsert(&self, record: ItemRecord);
    /// Remove a record from the active catalog, returning its last state.
    fn remove(&self, sku: &Sku) -> Option<ItemRecord>;
    fn list(&self) -> Vec<ItemRecord>;
    /// Drop all records (rebuild support).
    fn clear(&self);
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn get(&self, sku: &Sku) -> Option<ItemRecord> {
        (**self).get(sku)
    }

    fn upsert(&self, record: ItemRecord) {
        (**self).upsert(record)
    }

    fn remove(&self, sku: &Sku) -> Option<ItemRecord> {
        (**self).remove(sku)
    }

    fn list(&self) -> Vec<ItemRecord> {
        (**self).list()
    }

    fn clear(&self) {
        (**self).clear()
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Records with the insertion ordinal assigned on first upsert.
    records: HashMap<Sku, (u64, ItemRecord)>,
    next_ordinal: u64,
}

/// In-memory catalog store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<Inner>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn get(&self, sku: &Sku) -> Option<ItemRecord> {
        let inner = self.inner.read().ok()?;
        inner.records.get(sku).map(|(_, r)| r.clone())
    }

    fn upsert(&self, record: ItemRecord) {
        if let Ok(mut inner) = self.inner.write() {
            if let Some((_, existing)) = inner.records.get_mut(&record.sku) {
                *existing = record;
                return;
            }
            let ordinal = inner.next_ordinal;
            inner.next_ordinal += 1;
            inner.records.insert(record.sku.clone(), (ordinal, record));
        }
    }

    fn remove(&self, sku: &Sku) -> Option<ItemRecord> {
        let mut inner = self.inner.write().ok()?;
        inner.records.remove(sku).map(|(_, r)| r)
    }

    fn list(&self) -> Vec<ItemRecord> {
        let inner = match self.inner.read() {
            Ok(i) => i,
            Err(_) => return vec![],
        };

        let mut entries: Vec<(u64, ItemRecord)> = inner.records.values().cloned().collect();
        entries.sort_by_key(|(ordinal, _)| *ordinal);
        entries.into_iter().map(|(_, r)| r).collect()
    }

    fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.records.clear();
            inner.next_ordinal = 0;
        }
    }
}
