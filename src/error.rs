use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::dto::MessageResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Login failed")]
    Unauthorized,

    #[error("Invalid request body")]
    BadRequest,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Login failed"),
            ApiError::BadRequest => (StatusCode::BAD_REQUEST, "Invalid request body"),
            ApiError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        (status, Json(MessageResponse { message })).into_response()
    }
}
