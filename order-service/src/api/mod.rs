//! HTTP query interface

pub mod health;
pub mod orders;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use shared::error::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::OrderQueryService;

/// Create the query router
pub fn create_router<Tx: Send + 'static>(orders: Arc<OrderQueryService<Tx>>) -> Router {
    Router::new()
        .route("/health", get(health::health_check::<Tx>))
        .route(
            "/order/{order_uid}",
            get(orders::get_order::<Tx>).fallback(orders::method_not_allowed),
        )
        .fallback(not_found)
        .with_state(orders)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> AppError {
    AppError::not_found("Route")
}
