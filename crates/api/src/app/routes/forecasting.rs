use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};

use commandcenter_core::Sku;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/series/:sku", get(series))
}

/// Chronological daily net-quantity series for one SKU — the input handed
/// to the external forecasting engine. The ledger does not interpret or
/// validate what the engine returns.
pub async fn series(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
) -> axum::response::Response {
    let sku = match Sku::new(&sku) {
        Ok(s) => s,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_sku", e.to_string()),
    };

    match services.demand_series(&sku) {
        Ok(series) => errors::json_ok(serde_json::json!({
            "sku": sku.as_str(),
            "series": series,
        })),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
