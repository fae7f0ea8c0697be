//! Bulk import: spreadsheet-shaped rows applied through the ledger.
//!
//! The upload/parsing side (CSV, Excel, encodings) belongs to the import
//! collaborator; this runner takes already-structured rows and pushes each
//! one through the normal command path. Rows fail independently — one bad
//! row never aborts the batch — and failures are accumulated per row so the
//! caller can correct and resubmit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use commandcenter_core::Sku;
use commandcenter_events::{EventBus, EventEnvelope};
use commandcenter_inventory::{
    CreateItem, InventoryCommand, ItemPatch, LedgerItem, MovementKind, RecordMovement,
    UpdateDetails,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::EventStore;

/// What to do with rows whose SKU already exists.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportMode {
    /// Existing SKUs are skipped, never overwritten (the default).
    SkipExisting,
    /// Existing SKUs get a details update plus an adjustment movement for
    /// the stock difference.
    UpdateExisting,
}

impl Default for ImportMode {
    fn default() -> Self {
        ImportMode::SkipExisting
    }
}

/// One raw import row. Numeric fields default sensibly so sparse
/// spreadsheets import cleanly; validation still happens in the domain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportRow {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default)]
    pub minimum_stock: Option<i64>,
    #[serde(default)]
    pub cost_price_cents: Option<i64>,
    #[serde(default)]
    pub selling_price_cents: Option<i64>,
    #[serde(default)]
    pub warehouse_id: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportError {
    /// Zero-based row index within the submitted batch.
    pub row: usize,
    pub sku: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
    pub errors: Vec<ImportError>,
}

enum RowOutcome {
    Imported,
    Skipped,
}

/// Apply a batch of rows through the ledger, accumulating a per-row summary.
pub fn import_rows<S, B>(
    dispatcher: &CommandDispatcher<S, B>,
    rows: Vec<ImportRow>,
    mode: ImportMode,
    now: DateTime<Utc>,
) -> ImportSummary
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    let mut summary = ImportSummary::default();

    for (idx, row) in rows.into_iter().enumerate() {
        match import_row(dispatcher, &row, mode, now) {
            Ok(RowOutcome::Imported) => summary.imported_count += 1,
            Ok(RowOutcome::Skipped) => summary.skipped_count += 1,
            Err(err) => summary.errors.push(ImportError {
                row: idx,
                sku: row.sku.clone(),
                message: err.to_string(),
            }),
        }
    }

    summary.error_count = summary.errors.len();
    summary
}

fn import_row<S, B>(
    dispatcher: &CommandDispatcher<S, B>,
    row: &ImportRow,
    mode: ImportMode,
    now: DateTime<Utc>,
) -> Result<RowOutcome, DispatchError>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    let sku = Sku::new(&row.sku).map_err(DispatchError::from)?;

    // Existence is decided against the event store, not the projection, so
    // earlier rows of the same batch are always visible.
    let current = dispatcher.load::<LedgerItem>(&sku, LedgerItem::empty)?;

    if !current.is_active() {
        let cmd = InventoryCommand::CreateItem(CreateItem {
            sku: sku.clone(),
            name: row.name.clone(),
            description: row.description.clone(),
            category: row.category.clone(),
            initial_stock: row.current_stock,
            minimum_stock: row.minimum_stock.unwrap_or(0),
            cost_price_cents: row.cost_price_cents.unwrap_or(0),
            selling_price_cents: row.selling_price_cents.unwrap_or(0),
            warehouse_id: row.warehouse_id.clone(),
            supplier_id: row.supplier_id.clone(),
            occurred_at: now,
        });
        dispatcher.dispatch::<LedgerItem>(&sku, LedgerItem::AGGREGATE_TYPE, cmd, LedgerItem::empty)?;
        return Ok(RowOutcome::Imported);
    }

    match mode {
        ImportMode::SkipExisting => Ok(RowOutcome::Skipped),
        ImportMode::UpdateExisting => {
            let patch = ItemPatch {
                name: Some(row.name.clone()),
                description: row.description.clone(),
                category: row.category.clone(),
                minimum_stock: row.minimum_stock,
                cost_price_cents: row.cost_price_cents,
                selling_price_cents: row.selling_price_cents,
                warehouse_id: row.warehouse_id.clone(),
                supplier_id: row.supplier_id.clone(),
            };
            dispatcher.dispatch::<LedgerItem>(
                &sku,
                LedgerItem::AGGREGATE_TYPE,
                InventoryCommand::UpdateDetails(UpdateDetails {
                    sku: sku.clone(),
                    patch,
                    current_stock: None,
                    occurred_at: now,
                }),
                LedgerItem::empty,
            )?;

            // Stock converges to the row's value through the ledger's only
            // legal mutation path.
            let delta = row.current_stock - current.current_stock();
            if delta != 0 {
                dispatcher.dispatch::<LedgerItem>(
                    &sku,
                    LedgerItem::AGGREGATE_TYPE,
                    InventoryCommand::RecordMovement(RecordMovement {
                        sku: sku.clone(),
                        kind: MovementKind::Adjustment,
                        delta,
                        reason: "bulk import adjustment".to_string(),
                        reference: None,
                        actor: None,
                        occurred_at: now,
                    }),
                    LedgerItem::empty,
                )?;
            }

            Ok(RowOutcome::Imported)
        }
    }
}
