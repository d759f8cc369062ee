pub mod chat_handler;
pub mod document_handler;
pub mod health_handler;
pub mod sse_handler;
pub mod store_handler;

pub use chat_handler::ChatHandler;
pub use document_handler::DocumentHandler;
pub use health_handler::HealthHandler;
pub use sse_handler::SseHandler;
pub use store_handler::StoreHandler;

use axum::{Json, http::StatusCode};
use tracing::{error, warn};

use crate::application::use_cases::UseCaseError;
use crate::presentation::http::dto::ApiResponse;

/// Error envelope for a failed use case.
pub(crate) fn failure<T>(error: UseCaseError) -> (StatusCode, Json<ApiResponse<T>>) {
    let (status, code) = match &error {
        UseCaseError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
        UseCaseError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        UseCaseError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        UseCaseError::RepositoryError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR"),
        UseCaseError::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        UseCaseError::DispatchError(_) => (StatusCode::SERVICE_UNAVAILABLE, "DISPATCH_FAILED"),
    };
    if status.is_server_error() {
        error!(code, error = %error, "Request failed");
    } else {
        warn!(code, error = %error, "Request rejected");
    }
    (
        status,
        Json(ApiResponse::error(code.to_string(), error.to_string(), None)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_status_codes() {
        let (status, body) =
            failure::<()>(UseCaseError::Conflict("chat is busy".to_string()));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.0.error.as_ref().unwrap().code, "CONFLICT");
        assert!(!body.0.success);

        let (status, _) = failure::<()>(UseCaseError::NotFound("Store x".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
