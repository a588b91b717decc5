//! Security headers and request validation

use axum::{
    body::Body,
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::types::ApiError;

/// Maximum request body size (1 MB)
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Adds security headers to every response
///
/// Routes that chose a caching strategy keep their `Cache-Control`; everything
/// else is marked as not storable.
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    if let Err(rejection) = validate_request_security(request.uri().path()) {
        return rejection.into_response();
    }

    let content_length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Err(rejection) = validate_content_length(content_length) {
        return rejection.into_response();
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );

    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        );
    }

    response
}

/// Reject declared bodies above [`MAX_BODY_SIZE`]
pub fn validate_content_length(content_length: Option<usize>) -> Result<(), ApiError> {
    match content_length {
        Some(len) if len > MAX_BODY_SIZE => Err(ApiError::payload_too_large(format!(
            "Request body too large: {} bytes (max: {} bytes)",
            len, MAX_BODY_SIZE
        ))),
        _ => Ok(()),
    }
}

/// Reject path traversal attempts and null bytes
pub fn validate_request_security(path: &str) -> Result<(), ApiError> {
    if path.contains("..") || path.contains("//") {
        return Err(ApiError::bad_request("Invalid path: path traversal detected"));
    }

    if path.contains('\0') {
        return Err(ApiError::bad_request(
            "Invalid request: prohibited characters",
        ));
    }

    Ok(())
}
