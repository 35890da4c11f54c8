use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use encore_core::AppError;
use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SoldOut(_)
            | AppError::ConcertCancelled(_)
            | AppError::DuplicateActive(_)
            | AppError::AlreadyCancelled(_) => StatusCode::CONFLICT,
            AppError::NotOwner(_) => StatusCode::FORBIDDEN,
            // Retries already ran inside the service; asking the client to
            // try again later is the honest answer.
            AppError::Conflict(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ReconciliationRequired(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let payload = Json(ErrorResponse {
            message: self.0.to_string(),
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
