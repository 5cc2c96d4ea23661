use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::services;
use crate::state::AppState;

use super::require_field;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    require_field(&payload.user_id, "user_id", 255)?;

    let mut conn = state.db()?;
    let token = services::auth::issue_token(&mut conn, &state.jwt, &payload.user_id)?;

    Ok(Json(LoginResponse {
        token,
        user_id: payload.user_id,
    }))
}
