use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use thiserror::Error;

use commandcenter_core::Sku;
use commandcenter_events::EventEnvelope;
use commandcenter_inventory::{InventoryEvent, ItemRecord};

use crate::read_model::CatalogStore;

#[derive(Debug, Error)]
pub enum CatalogProjectionError {
    #[error("failed to deserialize inventory event: {0}")]
    Deserialize(String),

    #[error("stream integrity violation: {0}")]
    StreamMismatch(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Catalog projection.
///
/// Consumes published envelopes (JSON payloads) and maintains the queryable
/// catalog read model. Read models are disposable and rebuildable from the
/// event stream.
#[derive(Debug)]
pub struct CatalogProjection<S>
where
    S: CatalogStore,
{
    store: S,
    /// Per-SKU cursor to support at-least-once delivery (idempotent apply).
    cursors: RwLock<HashMap<Sku, u64>>,
}

impl<S> CatalogProjection<S>
where
    S: CatalogStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    /// Query the read model for one item.
    pub fn get(&self, sku: &Sku) -> Option<ItemRecord> {
        self.store.get(sku)
    }

    /// List the catalog in stable insertion order.
    pub fn list(&self) -> Vec<ItemRecord> {
        self.store.list()
    }

    /// Apply a published envelope into the projection.
    ///
    /// - Enforces a monotonic sequence per SKU stream
    /// - Idempotent for at-least-once delivery (replays <= cursor are ignored)
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), CatalogProjectionError> {
        let sku = envelope.sku().clone();
        let seq = envelope.sequence_number();

        if let Ok(mut cursors) = self.cursors.write() {
            let last = *cursors.get(&sku).unwrap_or(&0);

            if seq == 0 {
                return Err(CatalogProjectionError::NonMonotonicSequence { last, found: seq });
            }

            if seq <= last {
                // Duplicate or replay; safe to ignore.
                return Ok(());
            }

            if seq != last + 1 && last != 0 {
                // The first observed event may carry any positive sequence;
                // after that, increments must be strict.
                return Err(CatalogProjectionError::NonMonotonicSequence { last, found: seq });
            }

            let ev: InventoryEvent = serde_json::from_value(envelope.payload().clone())
                .map_err(|e| CatalogProjectionError::Deserialize(e.to_string()))?;

            // The payload must belong to the envelope's stream.
            let event_sku = match &ev {
                InventoryEvent::ItemCreated(e) => &e.sku,
                InventoryEvent::StockMoved(e) => &e.sku,
                InventoryEvent::DetailsUpdated(e) => &e.sku,
                InventoryEvent::ItemDeleted(e) => &e.sku,
            };
            if event_sku != &sku {
                return Err(CatalogProjectionError::StreamMismatch(
                    "event sku does not match envelope sku".to_string(),
                ));
            }

            match ev {
                InventoryEvent::ItemCreated(e) => {
                    self.store.upsert(ItemRecord {
                        sku: e.sku,
                        name: e.name,
                        description: e.description,
                        category: e.category,
                        current_stock: 0,
                        minimum_stock: e.minimum_stock,
                        cost_price_cents: e.cost_price_cents,
                        selling_price_cents: e.selling_price_cents,
                        warehouse_id: e.warehouse_id,
                        supplier_id: e.supplier_id,
                        created_at: e.occurred_at,
                        updated_at: e.occurred_at,
                    });
                }
                InventoryEvent::StockMoved(e) => match self.store.get(&e.sku) {
                    Some(mut record) => {
                        record.current_stock = e.resulting_stock;
                        record.updated_at = e.occurred_at;
                        self.store.upsert(record);
                    }
                    None => {
                        // The stream guarantees creation precedes movements;
                        // a miss here means the read model was cleared
                        // mid-stream. Replay will repair it.
                        tracing::warn!(sku = %e.sku, "stock movement for unknown catalog record");
                    }
                },
                InventoryEvent::DetailsUpdated(e) => match self.store.get(&e.sku) {
                    Some(mut record) => {
                        let p = e.patch;
                        if let Some(name) = p.name {
                            record.name = name;
                        }
                        if let Some(description) = p.description {
                            record.description = Some(description);
                        }
                        if let Some(category) = p.category {
                            record.category = Some(category);
                        }
                        if let Some(minimum_stock) = p.minimum_stock {
                            record.minimum_stock = minimum_stock;
                        }
                        if let Some(cost) = p.cost_price_cents {
                            record.cost_price_cents = cost;
                        }
                        if let Some(selling) = p.selling_price_cents {
                            record.selling_price_cents = selling;
                        }
                        if let Some(warehouse_id) = p.warehouse_id {
                            record.warehouse_id = Some(warehouse_id);
                        }
                        if let Some(supplier_id) = p.supplier_id {
                            record.supplier_id = Some(supplier_id);
                        }
                        record.updated_at = e.occurred_at;
                        self.store.upsert(record);
                    }
                    None => {
                        tracing::warn!(sku = %e.sku, "details update for unknown catalog record");
                    }
                },
                InventoryEvent::ItemDeleted(e) => {
                    // Active catalog only; the stream keeps the history.
                    let _ = self.store.remove(&e.sku);
                }
            }

            // Advance cursor after successful apply.
            cursors.insert(sku, seq);
        }

        Ok(())
    }

    /// Rebuild the read model from scratch by replaying envelopes.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), CatalogProjectionError> {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.clear();
        }
        self.store.clear();

        // Deterministic replay order: sku, then sequence.
        let mut envs: Vec<_> = envelopes.into_iter().collect();
        envs.sort_by(|a, b| {
            a.sku()
                .cmp(b.sku())
                .then(a.sequence_number().cmp(&b.sequence_number()))
        });

        for env in &envs {
            self.apply_envelope(env)?;
        }

        Ok(())
    }
}
