use std::time::Duration;

use axum::{
    middleware,
    routing::{get, head, post},
    Router,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::{
    auth::{AdminContext, AuthContext},
    error::AppError,
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod prs;
pub mod stats;
pub mod teams;
pub mod users;

/// Per-request deadline enforced for every endpoint.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(300);

pub fn create_router(state: AppState) -> Router<()> {
    let protected_routes = Router::new()
        .route("/team/add", post(teams::create_team))
        .route("/team/get", get(teams::get_team))
        .route("/users/getReview", get(users::get_review))
        .route("/pullRequest/create", post(prs::create_pr))
        .route("/pullRequest/merge", post(prs::merge_pr))
        .route("/pullRequest/reassign", post(prs::reassign_reviewer))
        .layer(middleware::from_extractor_with_state::<AuthContext, _>(
            state.clone(),
        ));

    let admin_routes = Router::new()
        .route("/users/setIsActive", post(users::set_is_active))
        .route("/users/batchDeactivateTeam", post(users::batch_deactivate_team))
        .route("/users/batchDeactivateUsers", post(users::batch_deactivate_users))
        .route("/admin/users", get(users::list_all_users))
        .route("/admin/teams", get(teams::list_all_teams))
        .route("/statistics", get(stats::get_statistics))
        .layer(middleware::from_extractor_with_state::<AdminContext, _>(
            state.clone(),
        ));

    Router::new()
        .route("/health", head(health::health_check))
        .route("/auth/login", post(auth::login))
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}

/// Rejects empty (after trimming) and oversize id-like fields.
pub(crate) fn require_field(value: &str, name: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{name} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::bad_request(format!(
            "{name} must be at most {max_len} characters"
        )));
    }
    Ok(())
}
