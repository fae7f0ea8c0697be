use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;

use commandcenter_core::Sku;
use commandcenter_inventory::{
    CreateItem, DeleteItem, InventoryCommand, InventoryEvent, ItemFilter, ItemPatch,
    RecordMovement, UpdateDetails,
};

use crate::app::routes::{import, reports};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/:sku",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route(
            "/items/:sku/movements",
            get(list_movements).post(record_movement),
        )
        .route("/reports/low-stock", get(reports::low_stock))
        .route("/reports/duplicates", get(reports::duplicates))
        .route("/reports/quality", get(reports::quality))
        .route("/summary", get(reports::summary))
        .route("/categories", get(reports::categories_list))
        .route("/import", post(import::run_import))
}

fn parse_sku(raw: &str) -> Result<Sku, axum::response::Response> {
    Sku::new(raw)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_sku", e.to_string()))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListItemsQuery>,
) -> axum::response::Response {
    let status = match query.status.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(s) => Some(s),
            Err(e) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_status",
                    format!("{e}"),
                );
            }
        },
        None => None,
    };

    let filter = ItemFilter {
        category: query.category,
        status,
        search: query.search,
        warehouse_id: query.warehouse_id,
        supplier_id: query.supplier_id,
        low_stock_only: query.low_stock_only,
        skip: query.skip,
        limit: query.limit,
    };

    let items: Vec<serde_json::Value> = filter
        .apply(services.catalog_list())
        .iter()
        .map(dto::item_to_json)
        .collect();

    errors::json_ok(serde_json::Value::Array(items))
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
) -> axum::response::Response {
    let sku = match parse_sku(&sku) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services.catalog_get(&sku) {
        Some(record) => errors::json_ok(dto::item_to_json(&record)),
        None => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("sku not found: {sku}"),
        ),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    let sku = match parse_sku(&body.sku) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let cmd = InventoryCommand::CreateItem(CreateItem {
        sku: sku.clone(),
        name: body.name,
        description: body.description,
        category: body.category,
        initial_stock: body.current_stock,
        minimum_stock: body.minimum_stock,
        cost_price_cents: body.cost_price_cents,
        selling_price_cents: body.selling_price_cents,
        warehouse_id: body.warehouse_id,
        supplier_id: body.supplier_id,
        occurred_at: Utc::now(),
    });

    if let Err(e) = services.dispatch(&sku, cmd) {
        return errors::dispatch_error_to_response(e);
    }

    // Respond from a post-commit rehydration: read-your-write even while
    // the projection catches up.
    item_response(&services, &sku, errors::json_created)
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
    Json(body): Json<dto::UpdateItemRequest>,
) -> axum::response::Response {
    let sku = match parse_sku(&sku) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let cmd = InventoryCommand::UpdateDetails(UpdateDetails {
        sku: sku.clone(),
        patch: ItemPatch {
            name: body.name,
            description: body.description,
            category: body.category,
            minimum_stock: body.minimum_stock,
            cost_price_cents: body.cost_price_cents,
            selling_price_cents: body.selling_price_cents,
            warehouse_id: body.warehouse_id,
            supplier_id: body.supplier_id,
        },
        current_stock: body.current_stock,
        occurred_at: Utc::now(),
    });

    if let Err(e) = services.dispatch(&sku, cmd) {
        return errors::dispatch_error_to_response(e);
    }

    item_response(&services, &sku, errors::json_ok)
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
) -> axum::response::Response {
    let sku = match parse_sku(&sku) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    // Snapshot before deleting: the response confirms what was removed.
    let snapshot = match services.load_item(&sku) {
        Ok(item) => item.record(),
        Err(e) => return errors::dispatch_error_to_response(e),
    };
    let Some(snapshot) = snapshot else {
        return errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("sku not found: {sku}"),
        );
    };

    let cmd = InventoryCommand::DeleteItem(DeleteItem {
        sku: sku.clone(),
        occurred_at: Utc::now(),
    });
    if let Err(e) = services.dispatch(&sku, cmd) {
        return errors::dispatch_error_to_response(e);
    }

    errors::json_ok(serde_json::json!({
        "deleted": true,
        "item": dto::item_to_json(&snapshot),
    }))
}

pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
    Json(body): Json<dto::RecordMovementRequest>,
) -> axum::response::Response {
    let sku = match parse_sku(&sku) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let cmd = InventoryCommand::RecordMovement(RecordMovement {
        sku: sku.clone(),
        kind: body.kind,
        delta: body.kind.signed_delta(body.quantity),
        reason: body.reason,
        reference: body.reference,
        actor: body.actor,
        occurred_at: Utc::now(),
    });

    let committed = match services.dispatch(&sku, cmd) {
        Ok(c) => c,
        Err(e) => return errors::dispatch_error_to_response(e),
    };

    // The committed event is the audit record for this movement.
    let movement = committed
        .iter()
        .rev()
        .filter_map(|e| serde_json::from_value::<InventoryEvent>(e.payload.clone()).ok())
        .find_map(|ev| match ev {
            InventoryEvent::StockMoved(m) => Some(commandcenter_inventory::MovementRecord::from(m)),
            _ => None,
        });

    let item = match services.load_item(&sku) {
        Ok(item) => item.record(),
        Err(e) => return errors::dispatch_error_to_response(e),
    };
    let Some(item) = item else {
        return errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "item disappeared after movement",
        );
    };

    errors::json_ok(serde_json::json!({
        "item": dto::item_to_json(&item),
        "movement": movement.as_ref().map(dto::movement_to_json),
    }))
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
    Query(query): Query<dto::MovementHistoryQuery>,
) -> axum::response::Response {
    let sku = match parse_sku(&sku) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let limit = query.limit.unwrap_or(50).min(500);

    match services.movement_history(&sku, limit) {
        Ok(movements) => errors::json_ok(serde_json::Value::Array(
            movements.iter().map(dto::movement_to_json).collect(),
        )),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// Shared "respond with the item's current state" tail for mutations.
fn item_response(
    services: &AppServices,
    sku: &Sku,
    into_response: fn(serde_json::Value) -> axum::response::Response,
) -> axum::response::Response {
    match services.load_item(sku) {
        Ok(item) => match item.record() {
            Some(record) => into_response(dto::item_to_json(&record)),
            None => errors::json_error(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("sku not found: {sku}"),
            ),
        },
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
