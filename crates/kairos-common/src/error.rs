//! Error types for Kairos services.

use thiserror::Error;

/// Result type alias using KairosError.
pub type KairosResult<T> = Result<T, KairosError>;

/// Coarse classification used for HTTP mapping and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Primary error type for Kairos operations.
#[derive(Debug, Error)]
pub enum KairosError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Lookup Errors ===
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("No forecast data available: {0}")]
    NoForecastData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // === Infrastructure Errors ===
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl KairosError {
    /// Shorthand for an invalid parameter error.
    pub fn invalid(param: impl Into<String>, message: impl Into<String>) -> Self {
        KairosError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            KairosError::MissingParameter(_) | KairosError::InvalidParameter { .. } => {
                ErrorKind::BadRequest
            }

            KairosError::LocationNotFound(_)
            | KairosError::NoForecastData(_)
            | KairosError::NotFound(_) => ErrorKind::NotFound,

            KairosError::DatabaseError(_) | KairosError::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Message that is safe to hand to clients.
    ///
    /// Internal errors carry driver or I/O text that must stay in the logs.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<std::io::Error> for KairosError {
    fn from(err: std::io::Error) -> Self {
        KairosError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for KairosError {
    fn from(err: serde_json::Error) -> Self {
        KairosError::InternalError(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(KairosError::MissingParameter("city".into()).http_status_code(), 400);
        assert_eq!(KairosError::invalid("lat", "not a number").http_status_code(), 400);
        assert_eq!(KairosError::LocationNotFound("Atlantis".into()).http_status_code(), 404);
        assert_eq!(KairosError::NoForecastData("cell 4".into()).http_status_code(), 404);
        assert_eq!(KairosError::DatabaseError("boom".into()).http_status_code(), 500);
    }

    #[test]
    fn test_public_message_hides_database_text() {
        let err = KairosError::DatabaseError(
            "error returned from database: relation \"icon_cells\" does not exist".into(),
        );
        let message = err.public_message();
        assert_eq!(message, "Internal server error");
        assert!(!message.contains("icon_cells"));
    }

    #[test]
    fn test_public_message_keeps_client_errors() {
        let err = KairosError::LocationNotFound("Atlantis".into());
        assert_eq!(err.public_message(), "Location not found: Atlantis");
    }
}
