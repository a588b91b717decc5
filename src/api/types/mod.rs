//! Request and response types shared by the HTTP handlers

pub mod error;
pub mod extract;

pub use error::{ApiError, ApiErrorResponse};
pub use extract::{Json, Query};
