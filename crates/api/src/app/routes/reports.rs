use std::sync::Arc;

use axum::extract::Extension;

use commandcenter_inventory::reports;

use crate::app::errors;
use crate::app::services::AppServices;

/// Items at or below their reorder threshold with suggested quantities.
pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let items = services.catalog_list();
    let suggestions = reports::low_stock_report(&items, &services.reorder_policy());

    errors::json_ok(serde_json::json!({
        "count": suggestions.len(),
        "suggestions": suggestions,
    }))
}

/// Duplicate candidates for manual review (detection only, no merging).
pub async fn duplicates(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let items = services.catalog_list();
    let groups = reports::find_duplicates(&items);

    errors::json_ok(serde_json::json!({
        "total_items_analyzed": items.len(),
        "group_count": groups.len(),
        "groups": groups,
    }))
}

pub async fn quality(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let items = services.catalog_list();

    errors::json_ok(serde_json::json!({
        "score": reports::data_quality_score(&items),
        "total_items": items.len(),
    }))
}

pub async fn summary(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let items = services.catalog_list();
    let summary = reports::catalog_summary(&items);

    errors::json_ok(serde_json::to_value(summary).unwrap_or_default())
}

pub async fn categories_list(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let items = services.catalog_list();

    errors::json_ok(serde_json::json!({
        "categories": reports::categories(&items),
    }))
}
