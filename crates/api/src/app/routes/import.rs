use std::sync::Arc;

use axum::{Json, extract::Extension};

use crate::app::dto::ImportRequest;
use crate::app::errors;
use crate::app::services::AppServices;

/// Bulk import: already-parsed rows from the upload collaborator are pushed
/// through the ledger one by one; each row succeeds or fails independently.
pub async fn run_import(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ImportRequest>,
) -> axum::response::Response {
    let summary = services.import(body.rows, body.mode);

    errors::json_ok(serde_json::to_value(summary).unwrap_or_default())
}
