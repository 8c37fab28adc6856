//! Health check endpoint

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::services::OrderQueryService;

pub async fn health_check<Tx: Send + 'static>(
    State(orders): State<Arc<OrderQueryService<Tx>>>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "cached_orders": orders.cached_count(),
    }))
}
