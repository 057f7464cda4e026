use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse},
        services::check_credentials,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "malformed login body");
        ApiError::BadRequest
    })?;

    match check_credentials(&state, &payload.email, &payload.password).await? {
        Some(user) => {
            info!(user_id = user.id, email = %payload.email, role = %user.role, "user logged in");
            Ok(Json(LoginResponse::success(user)))
        }
        None => {
            warn!(email = %payload.email, "login failed");
            Err(ApiError::Unauthorized)
        }
    }
}
