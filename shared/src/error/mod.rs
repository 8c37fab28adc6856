//! Unified error system for the order service
//!
//! - [`ErrorCode`]: numeric codes clients match on
//! - [`AppError`]: code, message and optional structured details
//! - [`ApiResponse`]: the JSON error body rendered at the HTTP boundary
//!
//! Codes below 1000 are general, 4xxx belong to orders, 9xxx are system failures.
//!
//! ```
//! use shared::error::{ApiResponse, AppError};
//!
//! let err = AppError::order_not_found("abc-1");
//! let body = ApiResponse::error(&err);
//! assert_eq!(body.code, 4001);
//! ```

mod codes;
mod http;
mod types;

pub use codes::ErrorCode;
pub use types::{ApiResponse, AppError};
