use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use commandcenter_core::Sku;
use commandcenter_events::{EventBus, EventEnvelope, InMemoryEventBus};
use commandcenter_infra::{
    command_dispatcher::{CommandDispatcher, DispatchError},
    event_store::InMemoryEventStore,
    import::{ImportMode, ImportRow, ImportSummary, import_rows},
    projections::CatalogProjection,
    read_model::{CatalogStore, InMemoryCatalogStore},
};
use commandcenter_inventory::{
    InventoryCommand, InventoryEvent, ItemRecord, LedgerItem, MovementRecord, ReorderPolicy,
    SeriesPoint, movement_series,
};

#[cfg(feature = "postgres")]
use commandcenter_infra::{event_store::PostgresEventStore, read_model::PostgresCatalogStore};
#[cfg(feature = "postgres")]
use sqlx::PgPool;

/// Realtime message broadcasted via SSE.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealtimeMessage {
    pub topic: String,
    pub payload: JsonValue,
}

// Type-erased dispatcher for in-memory implementations
type InMemoryDispatcher =
    CommandDispatcher<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

// Type-erased dispatcher for persistent implementations
#[cfg(feature = "postgres")]
type PersistentDispatcher =
    CommandDispatcher<Arc<PostgresEventStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

#[derive(Clone)]
pub enum AppServices {
    InMemory {
        dispatcher: Arc<InMemoryDispatcher>,
        catalog: Arc<CatalogProjection<Arc<InMemoryCatalogStore>>>,
        reorder_policy: ReorderPolicy,
        realtime_tx: broadcast::Sender<RealtimeMessage>,
    },
    #[cfg(feature = "postgres")]
    Persistent {
        dispatcher: Arc<PersistentDispatcher>,
        catalog: Arc<CatalogProjection<Arc<PostgresCatalogStore>>>,
        reorder_policy: ReorderPolicy,
        realtime_tx: broadcast::Sender<RealtimeMessage>,
    },
}

pub async fn build_services() -> AppServices {
    let reorder_policy = reorder_policy_from_env();

    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        #[cfg(feature = "postgres")]
        {
            return build_persistent_services(reorder_policy).await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
            );
            return build_in_memory_services(reorder_policy);
        }
    }

    build_in_memory_services(reorder_policy)
}

fn reorder_policy_from_env() -> ReorderPolicy {
    match std::env::var("REORDER_MULTIPLIER") {
        Ok(raw) => match raw.parse::<i64>() {
            Ok(multiplier) if multiplier > 0 => ReorderPolicy { multiplier },
            _ => {
                tracing::warn!("invalid REORDER_MULTIPLIER '{raw}', using default");
                ReorderPolicy::default()
            }
        },
        Err(_) => ReorderPolicy::default(),
    }
}

/// Background subscriber: bus -> projection -> realtime broadcast.
fn spawn_projection_subscriber<S>(
    bus: Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>,
    catalog: Arc<CatalogProjection<S>>,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
) where
    S: CatalogStore + 'static,
{
    tokio::task::spawn_blocking(move || {
        let sub = bus.subscribe();
        loop {
            match sub.recv() {
                Ok(env) => {
                    if let Err(e) = catalog.apply_envelope(&env) {
                        tracing::warn!("projection apply failed: {e}");
                        continue;
                    }

                    // Broadcast projection update (lossy; no backpressure on
                    // the command path).
                    let _ = realtime_tx.send(RealtimeMessage {
                        topic: "inventory.projection_updated".to_string(),
                        payload: serde_json::json!({
                            "kind": "projection_update",
                            "sku": env.sku().as_str(),
                            "aggregate_type": env.aggregate_type(),
                            "sequence_number": env.sequence_number(),
                        }),
                    });
                }
                Err(_) => break,
            }
        }
    });
}

fn build_in_memory_services(reorder_policy: ReorderPolicy) -> AppServices {
    // In-memory infra wiring (dev/test): store + bus + projection.
    let store = Arc::new(InMemoryEventStore::new());
    let bus: Arc<InMemoryEventBus<EventEnvelope<JsonValue>>> = Arc::new(InMemoryEventBus::new());

    let catalog_store: Arc<InMemoryCatalogStore> = Arc::new(InMemoryCatalogStore::new());
    let catalog: Arc<CatalogProjection<_>> = Arc::new(CatalogProjection::new(catalog_store));

    // Realtime channel (SSE): lossy broadcast.
    let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(256);

    spawn_projection_subscriber(bus.clone(), catalog.clone(), realtime_tx.clone());

    let dispatcher: Arc<InMemoryDispatcher> = Arc::new(CommandDispatcher::new(store, bus));
    AppServices::InMemory {
        dispatcher,
        catalog,
        reorder_policy,
        realtime_tx,
    }
}

#[cfg(feature = "postgres")]
async fn build_persistent_services(reorder_policy: ReorderPolicy) -> AppServices {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to Postgres");

    let store = Arc::new(PostgresEventStore::new(pool.clone()));
    let bus: Arc<InMemoryEventBus<EventEnvelope<JsonValue>>> = Arc::new(InMemoryEventBus::new());

    let catalog_store = Arc::new(PostgresCatalogStore::new(pool));
    let catalog: Arc<CatalogProjection<_>> = Arc::new(CatalogProjection::new(catalog_store));

    let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(256);

    spawn_projection_subscriber(bus.clone(), catalog.clone(), realtime_tx.clone());

    let dispatcher: Arc<PersistentDispatcher> = Arc::new(CommandDispatcher::new(store, bus));
    AppServices::Persistent {
        dispatcher,
        catalog,
        reorder_policy,
        realtime_tx,
    }
}

impl AppServices {
    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        match self {
            AppServices::InMemory { realtime_tx, .. } => realtime_tx,
            #[cfg(feature = "postgres")]
            AppServices::Persistent { realtime_tx, .. } => realtime_tx,
        }
    }

    pub fn reorder_policy(&self) -> ReorderPolicy {
        match self {
            AppServices::InMemory { reorder_policy, .. } => *reorder_policy,
            #[cfg(feature = "postgres")]
            AppServices::Persistent { reorder_policy, .. } => *reorder_policy,
        }
    }

    /// Dispatch a ledger command through the event-sourcing pipeline.
    pub fn dispatch(
        &self,
        sku: &Sku,
        command: InventoryCommand,
    ) -> Result<Vec<commandcenter_infra::event_store::StoredEvent>, DispatchError> {
        match self {
            AppServices::InMemory { dispatcher, .. } => dispatcher.dispatch::<LedgerItem>(
                sku,
                LedgerItem::AGGREGATE_TYPE,
                command,
                LedgerItem::empty,
            ),
            #[cfg(feature = "postgres")]
            AppServices::Persistent { dispatcher, .. } => dispatcher.dispatch::<LedgerItem>(
                sku,
                LedgerItem::AGGREGATE_TYPE,
                command,
                LedgerItem::empty,
            ),
        }
    }

    /// Rehydrate the current item state from its stream (strongly consistent
    /// with the write path; used for mutation responses).
    pub fn load_item(&self, sku: &Sku) -> Result<LedgerItem, DispatchError> {
        match self {
            AppServices::InMemory { dispatcher, .. } => {
                dispatcher.load::<LedgerItem>(sku, LedgerItem::empty)
            }
            #[cfg(feature = "postgres")]
            AppServices::Persistent { dispatcher, .. } => {
                dispatcher.load::<LedgerItem>(sku, LedgerItem::empty)
            }
        }
    }

    /// Query the catalog read model for one item.
    pub fn catalog_get(&self, sku: &Sku) -> Option<ItemRecord> {
        match self {
            AppServices::InMemory { catalog, .. } => catalog.get(sku),
            #[cfg(feature = "postgres")]
            AppServices::Persistent { catalog, .. } => catalog.get(sku),
        }
    }

    /// List the catalog read model in stable insertion order.
    pub fn catalog_list(&self) -> Vec<ItemRecord> {
        match self {
            AppServices::InMemory { catalog, .. } => catalog.list(),
            #[cfg(feature = "postgres")]
            AppServices::Persistent { catalog, .. } => catalog.list(),
        }
    }

    fn raw_history(
        &self,
        sku: &Sku,
    ) -> Result<Vec<commandcenter_infra::event_store::StoredEvent>, DispatchError> {
        match self {
            AppServices::InMemory { dispatcher, .. } => dispatcher.history(sku),
            #[cfg(feature = "postgres")]
            AppServices::Persistent { dispatcher, .. } => dispatcher.history(sku),
        }
    }

    fn audit_movements(&self, sku: &Sku) -> Result<Vec<MovementRecord>, DispatchError> {
        let history = self.raw_history(sku)?;
        if history.is_empty() {
            return Err(DispatchError::NotFound(sku.as_str().to_string()));
        }

        Ok(history
            .into_iter()
            .filter_map(|e| serde_json::from_value::<InventoryEvent>(e.payload).ok())
            .filter_map(|ev| match ev {
                InventoryEvent::StockMoved(m) => Some(MovementRecord::from(m)),
                _ => None,
            })
            .collect())
    }

    /// Chronological movement audit trail for one SKU, newest first.
    /// History survives item deletion.
    pub fn movement_history(&self, sku: &Sku, limit: usize) -> Result<Vec<MovementRecord>, DispatchError> {
        let mut movements = self.audit_movements(sku)?;
        movements.reverse();
        movements.truncate(limit);
        Ok(movements)
    }

    /// Daily net-quantity series for the forecasting collaborator.
    pub fn demand_series(&self, sku: &Sku) -> Result<Vec<SeriesPoint>, DispatchError> {
        let movements = self.audit_movements(sku)?;
        Ok(movement_series(&movements))
    }

    /// Run a bulk import batch through the ledger.
    pub fn import(&self, rows: Vec<ImportRow>, mode: ImportMode) -> ImportSummary {
        let now = chrono::Utc::now();
        match self {
            AppServices::InMemory { dispatcher, .. } => import_rows(dispatcher, rows, mode, now),
            #[cfg(feature = "postgres")]
            AppServices::Persistent { dispatcher, .. } => import_rows(dispatcher, rows, mode, now),
        }
    }
}

/// Build the SSE stream of projection-update notifications (used by `/stream`).
pub fn realtime_sse_stream(
    services: Arc<AppServices>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
