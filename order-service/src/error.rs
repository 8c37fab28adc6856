//! Service-layer error type
//!
//! `OrderError` sits between the repository layer (`RepoError`, `sqlx::Error`,
//! `BoxError`) and the API boundary (`AppError`), so use cases propagate with `?`
//! and handlers convert once.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::db::{BoxError, RepoError};

#[derive(Debug, Error)]
pub enum OrderError {
    /// Root order absent
    #[error("order {0} not found")]
    NotFound(String),

    /// Duplicate ingestion; the pipeline treats it as already applied
    #[error("order {0} already exists")]
    AlreadyExists(String),

    /// Any infrastructure failure (connection, query, commit, incomplete aggregate)
    #[error("store error: {0}")]
    Store(BoxError),
}

impl From<RepoError> for OrderError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(what) => OrderError::NotFound(what),
            // Duplicates on child rows are not idempotency hits
            RepoError::Duplicate(msg) => OrderError::Store(msg.into()),
            RepoError::Database(err) => OrderError::Store(err),
        }
    }
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        OrderError::Store(e.into())
    }
}

impl From<BoxError> for OrderError {
    fn from(e: BoxError) -> Self {
        OrderError::Store(e)
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(order_uid) => AppError::order_not_found(order_uid),
            OrderError::AlreadyExists(order_uid) => {
                AppError::new(ErrorCode::OrderAlreadyExists).with_detail("order_uid", order_uid)
            }
            OrderError::Store(err) => {
                tracing::error!(error = %err, "Order store error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
