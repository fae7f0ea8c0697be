use serde::Deserialize;

use commandcenter_infra::import::{ImportMode, ImportRow};
use commandcenter_inventory::{ItemRecord, MovementKind, MovementRecord};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default)]
    pub minimum_stock: i64,
    #[serde(default)]
    pub cost_price_cents: i64,
    #[serde(default)]
    pub selling_price_cents: i64,
    #[serde(default)]
    pub warehouse_id: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
}

/// Partial update of catalog details. `current_stock` is accepted by the
/// schema so the ledger can refuse it explicitly (stock changes must be
/// movements); every other field is an optional patch.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
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
    #[serde(default)]
    pub current_stock: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    pub kind: MovementKind,
    pub quantity: i64,
    pub reason: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    #[serde(default)]
    pub category: Option<String>,
    /// Derived status filter: in-stock, low-stock or out-of-stock.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub warehouse_id: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub low_stock_only: bool,
    #[serde(default)]
    pub skip: usize,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct MovementHistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub mode: ImportMode,
    pub rows: Vec<ImportRow>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn item_to_json(record: &ItemRecord) -> serde_json::Value {
    serde_json::json!({
        "sku": record.sku.as_str(),
        "name": record.name,
        "description": record.description,
        "category": record.category,
        "current_stock": record.current_stock,
        "minimum_stock": record.minimum_stock,
        "cost_price_cents": record.cost_price_cents,
        "selling_price_cents": record.selling_price_cents,
        "warehouse_id": record.warehouse_id,
        "supplier_id": record.supplier_id,
        "status": record.status().as_str(),
        "created_at": record.created_at.to_rfc3339(),
        "updated_at": record.updated_at.to_rfc3339(),
    })
}

pub fn movement_to_json(movement: &MovementRecord) -> serde_json::Value {
    serde_json::json!({
        "sku": movement.sku.as_str(),
        "kind": movement.kind.as_str(),
        "delta": movement.delta,
        "resulting_stock": movement.resulting_stock,
        "reason": movement.reason,
        "reference": movement.reference,
        "actor": movement.actor,
        "occurred_at": movement.occurred_at.to_rfc3339(),
    })
}
