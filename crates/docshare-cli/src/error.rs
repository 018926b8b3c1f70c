//! Error types and API error codes

use crate::middleware::current_request_id;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docshare_core::CoreError;
use serde_json::json;
use thiserror::Error;

/// Stable error codes returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Expired,
    InvalidPasscode,
    BlobNotFound,
    PayloadTooLarge,
    StorageWriteError,
    UploadFailed,
    DecryptionFailed,
    InvalidRequest,
    InternalError,
}

impl ErrorCode {
    /// Get the error code string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::Expired => "Expired",
            Self::InvalidPasscode => "InvalidPasscode",
            Self::BlobNotFound => "BlobNotFound",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::StorageWriteError => "StorageWriteError",
            Self::UploadFailed => "UploadFailed",
            Self::DecryptionFailed => "DecryptionFailed",
            Self::InvalidRequest => "InvalidRequest",
            Self::InternalError => "InternalError",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::BlobNotFound => StatusCode::NOT_FOUND,
            Self::Expired => StatusCode::GONE,
            Self::InvalidPasscode => StatusCode::FORBIDDEN,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::StorageWriteError
            | Self::UploadFailed
            | Self::DecryptionFailed
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the detail of this error may be shown to clients
    pub fn is_client_facing(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Api { code: ErrorCode, message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    /// Create an error with an explicit code
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for a malformed request
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Get the error code
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Api { code, .. } => *code,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::Core(e) => match e {
                CoreError::NotFound(_) => ErrorCode::NotFound,
                CoreError::Expired(_) => ErrorCode::Expired,
                CoreError::InvalidPasscode => ErrorCode::InvalidPasscode,
                CoreError::BlobNotFound(_) => ErrorCode::BlobNotFound,
                CoreError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
                CoreError::StorageWrite(_) => ErrorCode::StorageWriteError,
                CoreError::UploadFailed(_) => ErrorCode::UploadFailed,
                CoreError::Decryption(_) => ErrorCode::DecryptionFailed,
                CoreError::InvalidRequest(_) => ErrorCode::InvalidRequest,
                _ => ErrorCode::InternalError,
            },
        }
    }

    /// Message shown to clients. Server faults never expose their detail.
    pub fn public_message(&self) -> String {
        let code = self.error_code();
        if code.is_client_facing() {
            return match self {
                Self::Core(CoreError::NotFound(_)) => "Document not found".to_string(),
                Self::Core(CoreError::Expired(_)) => "Document has expired".to_string(),
                Self::Core(CoreError::InvalidPasscode) => "Invalid passcode".to_string(),
                Self::Core(CoreError::BlobNotFound(_)) => {
                    "File not found in storage".to_string()
                }
                other => other.to_string(),
            };
        }
        match code {
            ErrorCode::StorageWriteError => "Failed to store file".to_string(),
            ErrorCode::UploadFailed => "Upload failed".to_string(),
            ErrorCode::DecryptionFailed => "Failed to retrieve file".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl ApiError {
    fn from_rejection(status: StatusCode, body: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(ErrorCode::PayloadTooLarge, body)
        } else {
            Self::invalid_request(body)
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let status = code.status_code();
        let request_id = current_request_id();

        if status.is_server_error() {
            tracing::error!(code = code.as_str(), request_id = %request_id, error = %self, "Request failed");
        }

        let message = self.public_message();
        let body = json!({
            "error": {
                "code": code.as_str(),
                "message": message,
                "request_id": request_id,
            },
            "detail": message,
        });

        (
            status,
            [("x-docshare-error-code", code.as_str())],
            Json(body),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CoreError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(CoreError::BlobNotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(CoreError::Expired("x".into()), StatusCode::GONE)]
    #[case(CoreError::InvalidPasscode, StatusCode::FORBIDDEN)]
    #[case(CoreError::PayloadTooLarge { size: 2, max: 1 }, StatusCode::PAYLOAD_TOO_LARGE)]
    #[case(CoreError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST)]
    #[case(CoreError::StorageWrite("disk".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(CoreError::UploadFailed("db".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(CoreError::Decryption("tag".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_mapping(#[case] err: CoreError, #[case] status: StatusCode) {
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), status);
        assert!(response.headers().contains_key("x-docshare-error-code"));
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = ApiError::from(CoreError::UploadFailed("database is locked at /var/db".into()));
        assert_eq!(err.public_message(), "Upload failed");

        let err = ApiError::Internal("secret path".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_client_messages() {
        let err = ApiError::from(CoreError::Expired("id".into()));
        assert_eq!(err.public_message(), "Document has expired");
        let err = ApiError::invalid_request("passcode is required");
        assert_eq!(err.public_message(), "passcode is required");
        assert_eq!(err.error_code(), ErrorCode::InvalidRequest);
    }
}
