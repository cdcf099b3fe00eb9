//! HTTP request handlers for the Kairos API.

pub mod health;
pub mod places;
pub mod system;
pub mod weather;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use kairos_common::{ErrorKind, ExceptionResponse, KairosError, KairosResult};

/// Count a request against its endpoint label.
pub(crate) fn record_request(endpoint: &'static str) {
    metrics::counter!("kairos_requests_total", "endpoint" => endpoint).increment(1);
}

/// Serialize `body` as a JSON response.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_string(body) {
        Ok(json) => (status, [(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ExceptionResponse::internal_error("Internal server error"),
            )
        }
    }
}

/// Create a JSON error response.
pub fn error_response(status: StatusCode, exc: ExceptionResponse) -> Response {
    let json = serde_json::to_string(&exc).unwrap_or_default();
    (status, [(header::CONTENT_TYPE, "application/json")], json).into_response()
}

/// Map a domain error to its HTTP response.
///
/// Internal errors are logged with their full text; the client only sees
/// the generic message.
pub fn kairos_error_response(endpoint: &'static str, err: &KairosError) -> Response {
    let kind = err.kind();
    match kind {
        ErrorKind::Internal => tracing::error!(endpoint, error = %err, "Request failed"),
        _ => tracing::debug!(endpoint, error = %err, "Request rejected"),
    }
    metrics::counter!(
        "kairos_request_errors_total",
        "endpoint" => endpoint,
        "kind" => kind.as_str()
    )
    .increment(1);

    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, ExceptionResponse::from(err))
}

/// 200 with the body on success, the mapped error otherwise.
pub(crate) fn respond<T: Serialize>(endpoint: &'static str, result: KairosResult<T>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, &body),
        Err(e) => kairos_error_response(endpoint, &e),
    }
}

/// Parse an optional numeric query value, rejecting garbage.
pub(crate) fn parse_f64(param: &str, raw: &str) -> KairosResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| KairosError::invalid(param, format!("'{}' is not a number", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let response = kairos_error_response("test", &KairosError::LocationNotFound("x".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = kairos_error_response("test", &KairosError::DatabaseError("x".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = kairos_error_response("test", &KairosError::invalid("lat", "bad"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64("lat", " 37.98 ").unwrap(), 37.98);
        assert!(parse_f64("lat", "north").is_err());
        assert!(parse_f64("lat", "NaN").is_err());
    }
}
