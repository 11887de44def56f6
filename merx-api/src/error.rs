use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use merx_order::OrderError;
use merx_payment::PaymentError;

#[derive(Debug)]
pub enum AppError {
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    UpstreamError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    pub fn from_order(err: OrderError) -> Self {
        match err {
            OrderError::InvalidQuantity(_) | OrderError::NoValidItems => {
                AppError::ValidationError(err.to_string())
            }
            OrderError::UnknownAccount(_) => AppError::AuthorizationError(err.to_string()),
            OrderError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            OrderError::InvalidTransition { .. } => AppError::ConflictError(err.to_string()),
            OrderError::Upstream(_) => AppError::UpstreamError(err.to_string()),
            OrderError::Storage(_) => AppError::InternalServerError(err.to_string()),
        }
    }

    pub fn from_payment(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature | PaymentError::MalformedPayload(_) => {
                AppError::ValidationError(err.to_string())
            }
            PaymentError::UnknownTransaction(_) => AppError::NotFoundError(err.to_string()),
            PaymentError::StatusConflict { .. } => AppError::ConflictError(err.to_string()),
            PaymentError::Provider(_) | PaymentError::Upstream(_) => {
                AppError::UpstreamError(err.to_string())
            }
            PaymentError::Storage(_) => AppError::InternalServerError(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UpstreamError(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
