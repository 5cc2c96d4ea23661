use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::PullRequest;
use crate::services;
use crate::state::AppState;

use super::require_field;

#[derive(Deserialize)]
pub struct CreatePrRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Deserialize)]
pub struct MergePrRequest {
    pub pull_request_id: String,
}

#[derive(Deserialize)]
pub struct ReassignPrRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

#[derive(Serialize)]
pub struct PrDto {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
    pub assigned_reviewers: Vec<String>,
    pub created_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<NaiveDateTime>,
}

impl From<PullRequest> for PrDto {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.pull_request_name,
            author_id: pr.author_id,
            status: pr.status,
            assigned_reviewers: pr.assigned_reviewers,
            created_at: pr.created_at,
            merged_at: pr.merged_at,
        }
    }
}

#[derive(Serialize)]
pub struct PrResponse {
    pub pr: PrDto,
}

#[derive(Serialize)]
pub struct ReassignResponse {
    pub replaced_by: String,
    pub pr: PrDto,
}

pub async fn create_pr(
    State(state): State<AppState>,
    Json(payload): Json<CreatePrRequest>,
) -> AppResult<(StatusCode, Json<PrResponse>)> {
    require_field(&payload.pull_request_id, "pull_request_id", 255)?;
    require_field(&payload.pull_request_name, "pull_request_name", 500)?;
    require_field(&payload.author_id, "author_id", 255)?;

    let mut conn = state.db()?;
    let mut rng = rand::thread_rng();
    let pr = services::prs::create_pr(
        &mut conn,
        &mut rng,
        &payload.pull_request_id,
        &payload.pull_request_name,
        &payload.author_id,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(PrResponse { pr: PrDto::from(pr) }),
    ))
}

pub async fn merge_pr(
    State(state): State<AppState>,
    Json(payload): Json<MergePrRequest>,
) -> AppResult<Json<PrResponse>> {
    require_field(&payload.pull_request_id, "pull_request_id", 255)?;

    let mut conn = state.db()?;
    let pr = services::prs::merge_pr(&mut conn, &payload.pull_request_id)?;

    Ok(Json(PrResponse { pr: PrDto::from(pr) }))
}

pub async fn reassign_reviewer(
    State(state): State<AppState>,
    Json(payload): Json<ReassignPrRequest>,
) -> AppResult<Json<ReassignResponse>> {
    require_field(&payload.pull_request_id, "pull_request_id", 255)?;
    require_field(&payload.old_user_id, "old_user_id", 255)?;

    let mut conn = state.db()?;
    let mut rng = rand::thread_rng();
    let (replaced_by, pr) = services::prs::reassign_reviewer(
        &mut conn,
        &mut rng,
        &payload.pull_request_id,
        &payload.old_user_id,
    )?;

    Ok(Json(ReassignResponse {
        replaced_by,
        pr: PrDto::from(pr),
    }))
}
