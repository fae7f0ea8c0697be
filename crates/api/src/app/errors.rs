use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use commandcenter_infra::command_dispatcher::DispatchError;

/// Success envelope: `{"status":"ok","data":...}`.
pub fn json_ok(data: serde_json::Value) -> axum::response::Response {
    (StatusCode::OK, Json(json!({ "status": "ok", "data": data }))).into_response()
}

/// Success envelope with 201 Created.
pub fn json_created(data: serde_json::Value) -> axum::response::Response {
    (StatusCode::CREATED, Json(json!({ "status": "ok", "data": data }))).into_response()
}

/// Error envelope: `{"status":"error","error":<kind>,"message":...}`.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "status": "error",
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    match err {
        DispatchError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DispatchError::InvalidSku(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_sku", msg),
        DispatchError::DuplicateSku(sku) => json_error(
            StatusCode::CONFLICT,
            "duplicate_sku",
            format!("sku already exists: {sku}"),
        ),
        DispatchError::NotFound(sku) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("sku not found: {sku}"),
        ),
        DispatchError::InsufficientStock { sku, current, delta } => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "insufficient_stock",
            format!("insufficient stock for {sku}: current {current}, delta {delta}"),
        ),
        DispatchError::InvalidOperation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_operation", msg)
        }
        DispatchError::Deserialize(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "deserialize_error", msg)
        }
        DispatchError::StreamMismatch(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "stream_error", msg)
        }
        DispatchError::Store(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            format!("{e:?}"),
        ),
        DispatchError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
    }
}
