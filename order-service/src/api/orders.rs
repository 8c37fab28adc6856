//! Order query endpoint

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use shared::error::AppError;

use crate::error::OrderError;
use crate::services::OrderQueryService;

/// GET /order/{order_uid} - full assembled aggregate
pub async fn get_order<Tx: Send + 'static>(
    State(orders): State<Arc<OrderQueryService<Tx>>>,
    Path(order_uid): Path<String>,
) -> Result<Response, OrderError> {
    let order = orders.get_order_by_id(&order_uid).await?;
    Ok(Json(order.as_ref()).into_response())
}

/// Any other method on an order path
pub async fn method_not_allowed() -> impl IntoResponse {
    ([(header::ALLOW, "GET")], AppError::method_not_allowed())
}
