use axum::{Router, routing::get};

pub mod forecasting;
pub mod import;
pub mod inventory;
pub mod reports;
pub mod system;

/// Router for all service endpoints. `/health` is registered separately in
/// `build_app` so it works before the service extension layer.
pub fn router() -> Router {
    Router::new()
        .route("/stream", get(system::stream))
        .nest("/inventory", inventory::router())
        .nest("/forecasting", forecasting::router())
}
