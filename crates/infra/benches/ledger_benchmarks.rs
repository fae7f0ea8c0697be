use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use commandcenter_core::Sku;
use commandcenter_events::{EventEnvelope, InMemoryEventBus};
use commandcenter_infra::command_dispatcher::CommandDispatcher;
use commandcenter_infra::event_store::InMemoryEventStore;
use commandcenter_inventory::{
    CreateItem, InventoryCommand, LedgerItem, MovementKind, RecordMovement,
};

type BenchDispatcher =
    CommandDispatcher<InMemoryEventStore, Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>>;

/// Naive CRUD simulation: direct key-value updates (no events, no history).
/// Baseline for the cost of the audited pipeline.
#[derive(Debug, Clone)]
struct NaiveCrudStore {
    inner: Arc<RwLock<HashMap<Sku, i64>>>,
}

impl NaiveCrudStore {
    fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn create(&self, sku: Sku, stock: i64) {
        self.inner.write().unwrap().insert(sku, stock);
    }

    fn adjust(&self, sku: &Sku, delta: i64) -> Result<(), ()> {
        let mut map = self.inner.write().unwrap();
        let stock = map.get_mut(sku).ok_or(())?;
        let next = *stock + delta;
        if next < 0 {
            return Err(());
        }
        *stock = next;
        Ok(())
    }
}

fn setup_dispatcher() -> BenchDispatcher {
    let store = InMemoryEventStore::new();
    let bus: Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>> =
        Arc::new(InMemoryEventBus::new());
    CommandDispatcher::new(store, bus)
}

fn create_cmd(sku: &Sku, initial_stock: i64) -> InventoryCommand {
    InventoryCommand::CreateItem(CreateItem {
        sku: sku.clone(),
        name: "Bench item".to_string(),
        description: None,
        category: Some("bench".to_string()),
        initial_stock,
        minimum_stock: 10,
        cost_price_cents: 100,
        selling_price_cents: 200,
        warehouse_id: None,
        supplier_id: None,
        occurred_at: Utc::now(),
    })
}

fn movement_cmd(sku: &Sku, delta: i64) -> InventoryCommand {
    InventoryCommand::RecordMovement(RecordMovement {
        sku: sku.clone(),
        kind: MovementKind::Adjustment,
        delta,
        reason: "bench".to_string(),
        reference: None,
        actor: None,
        occurred_at: Utc::now(),
    })
}

fn bench_movement_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_movement");
    group.throughput(Throughput::Elements(1));

    group.bench_function("event_sourced", |b| {
        let dispatcher = setup_dispatcher();
        let sku = Sku::new("BENCH-1").unwrap();
        dispatcher
            .dispatch::<LedgerItem>(&sku, LedgerItem::AGGREGATE_TYPE, create_cmd(&sku, 1_000_000), LedgerItem::empty)
            .unwrap();

        b.iter(|| {
            dispatcher
                .dispatch::<LedgerItem>(
                    &sku,
                    LedgerItem::AGGREGATE_TYPE,
                    movement_cmd(&sku, black_box(1)),
                    LedgerItem::empty,
                )
                .unwrap()
        });
    });

    group.bench_function("naive_crud_baseline", |b| {
        let store = NaiveCrudStore::new();
        let sku = Sku::new("BENCH-1").unwrap();
        store.create(sku.clone(), 1_000_000);

        b.iter(|| store.adjust(&sku, black_box(1)).unwrap());
    });

    group.finish();
}

fn bench_rehydration_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("rehydration");

    for depth in [10u64, 100, 1_000] {
        let dispatcher = setup_dispatcher();
        let sku = Sku::new("BENCH-DEEP").unwrap();
        dispatcher
            .dispatch::<LedgerItem>(&sku, LedgerItem::AGGREGATE_TYPE, create_cmd(&sku, 0), LedgerItem::empty)
            .unwrap();
        for _ in 0..depth {
            dispatcher
                .dispatch::<LedgerItem>(&sku, LedgerItem::AGGREGATE_TYPE, movement_cmd(&sku, 1), LedgerItem::empty)
                .unwrap();
        }

        group.bench_function(format!("load_{depth}_events"), |b| {
            b.iter(|| {
                dispatcher
                    .load::<LedgerItem>(black_box(&sku), LedgerItem::empty)
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_movement_dispatch, bench_rehydration_depth);
criterion_main!(benches);
