use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{PullRequestShort, User};
use crate::repo;
use crate::services::{self, batch::BatchOutcome};
use crate::state::AppState;

use super::require_field;

#[derive(Deserialize)]
pub struct ReviewQuery {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct SetUserActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct BatchDeactivateTeamRequest {
    pub team_name: String,
}

#[derive(Deserialize)]
pub struct BatchDeactivateUsersRequest {
    pub user_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct UserDto {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            team_name: user.team_name,
            is_active: user.is_active,
        }
    }
}

#[derive(Serialize)]
pub struct PrShortDto {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

impl From<PullRequestShort> for PrShortDto {
    fn from(pr: PullRequestShort) -> Self {
        Self {
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.pull_request_name,
            author_id: pr.author_id,
            status: pr.status,
        }
    }
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: UserDto,
}

#[derive(Serialize)]
pub struct AllUsersResponse {
    pub users: Vec<UserDto>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct UserReviewsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PrShortDto>,
}

#[derive(Serialize)]
pub struct PrReassignmentInfo {
    pub pull_request_id: String,
    pub old_reviewers: Vec<String>,
    pub new_reviewers: Vec<String>,
}

#[derive(Serialize)]
pub struct BatchDeactivateResponse {
    pub deactivated_users: Vec<String>,
    pub reassigned_prs: Vec<PrReassignmentInfo>,
    pub skipped_users: Vec<String>,
    pub total_deactivated: usize,
    pub total_prs_reassigned: usize,
    pub processing_time_ms: u64,
}

impl From<BatchOutcome> for BatchDeactivateResponse {
    fn from(outcome: BatchOutcome) -> Self {
        let reassigned_prs: Vec<PrReassignmentInfo> = outcome
            .reassigned_prs
            .into_iter()
            .map(|pr| PrReassignmentInfo {
                pull_request_id: pr.pull_request_id,
                old_reviewers: pr.old_reviewers,
                new_reviewers: pr.new_reviewers,
            })
            .collect();

        Self {
            total_deactivated: outcome.deactivated_users.len(),
            total_prs_reassigned: reassigned_prs.len(),
            deactivated_users: outcome.deactivated_users,
            reassigned_prs,
            skipped_users: outcome.skipped_users,
            processing_time_ms: outcome.processing_time.as_millis() as u64,
        }
    }
}

pub async fn get_review(
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
) -> AppResult<Json<UserReviewsResponse>> {
    require_field(&query.user_id, "user_id", 255)?;

    let mut conn = state.db()?;
    let pull_requests = services::prs::user_reviews(&mut conn, &query.user_id)?
        .into_iter()
        .map(PrShortDto::from)
        .collect();

    Ok(Json(UserReviewsResponse {
        user_id: query.user_id,
        pull_requests,
    }))
}

pub async fn set_is_active(
    State(state): State<AppState>,
    Json(payload): Json<SetUserActiveRequest>,
) -> AppResult<Json<UserResponse>> {
    require_field(&payload.user_id, "user_id", 255)?;

    let mut conn = state.db()?;
    let user = services::users::set_user_active(&mut conn, &payload.user_id, payload.is_active)?;

    Ok(Json(UserResponse {
        user: UserDto::from(user),
    }))
}

pub async fn batch_deactivate_team(
    State(state): State<AppState>,
    Json(payload): Json<BatchDeactivateTeamRequest>,
) -> AppResult<Json<BatchDeactivateResponse>> {
    require_field(&payload.team_name, "team_name", 255)?;

    let outcome = services::batch::batch_deactivate_team(&state, &payload.team_name).await?;
    Ok(Json(BatchDeactivateResponse::from(outcome)))
}

pub async fn batch_deactivate_users(
    State(state): State<AppState>,
    Json(payload): Json<BatchDeactivateUsersRequest>,
) -> AppResult<Json<BatchDeactivateResponse>> {
    if payload.user_ids.is_empty() {
        return Err(AppError::bad_request("user_ids must not be empty"));
    }
    for user_id in &payload.user_ids {
        require_field(user_id, "user_id", 255)?;
    }

    let outcome = services::batch::batch_deactivate_users(&state, payload.user_ids).await?;
    Ok(Json(BatchDeactivateResponse::from(outcome)))
}

pub async fn list_all_users(State(state): State<AppState>) -> AppResult<Json<AllUsersResponse>> {
    let mut conn = state.db()?;
    let users: Vec<UserDto> = repo::users::all_users(&mut conn)?
        .into_iter()
        .map(UserDto::from)
        .collect();

    let count = users.len();
    Ok(Json(AllUsersResponse { users, count }))
}
