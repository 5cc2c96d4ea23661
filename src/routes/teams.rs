use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::TeamWithMembers;
use crate::repo;
use crate::services::{self, teams::NewTeamMember};
use crate::state::AppState;

use super::require_field;

#[derive(Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: String,
    pub members: Vec<TeamMemberInput>,
}

#[derive(Deserialize)]
pub struct TeamMemberInput {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct GetTeamQuery {
    pub team_name: String,
}

#[derive(Serialize)]
pub struct TeamMemberDto {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

#[derive(Serialize)]
pub struct TeamDto {
    pub team_name: String,
    pub members: Vec<TeamMemberDto>,
}

impl From<TeamWithMembers> for TeamDto {
    fn from(team: TeamWithMembers) -> Self {
        Self {
            team_name: team.team_name,
            members: team
                .members
                .into_iter()
                .map(|member| TeamMemberDto {
                    user_id: member.user_id,
                    username: member.username,
                    is_active: member.is_active,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct TeamResponse {
    pub team: TeamDto,
}

#[derive(Serialize)]
pub struct AllTeamsResponse {
    pub teams: Vec<TeamDto>,
    pub count: usize,
}

pub async fn create_team(
    State(state): State<AppState>,
    Json(payload): Json<CreateTeamRequest>,
) -> AppResult<(StatusCode, Json<TeamResponse>)> {
    require_field(&payload.team_name, "team_name", 255)?;
    if payload.members.is_empty() {
        return Err(AppError::bad_request("team must have at least one member"));
    }
    for member in &payload.members {
        require_field(&member.user_id, "user_id", 255)?;
        require_field(&member.username, "username", 255)?;
    }

    let members: Vec<NewTeamMember> = payload
        .members
        .iter()
        .map(|member| NewTeamMember {
            user_id: member.user_id.clone(),
            username: member.username.clone(),
            is_active: member.is_active,
        })
        .collect();

    let mut conn = state.db()?;
    let team = services::teams::create_team(&mut conn, &payload.team_name, &members)?;

    Ok((
        StatusCode::CREATED,
        Json(TeamResponse {
            team: TeamDto::from(team),
        }),
    ))
}

pub async fn get_team(
    State(state): State<AppState>,
    Query(query): Query<GetTeamQuery>,
) -> AppResult<Json<TeamDto>> {
    require_field(&query.team_name, "team_name", 255)?;

    let mut conn = state.db()?;
    let team = services::teams::get_team(&mut conn, &query.team_name)?;

    Ok(Json(TeamDto::from(team)))
}

pub async fn list_all_teams(State(state): State<AppState>) -> AppResult<Json<AllTeamsResponse>> {
    let mut conn = state.db()?;
    let teams: Vec<TeamDto> = repo::teams::all_teams(&mut conn)?
        .into_iter()
        .map(TeamDto::from)
        .collect();

    let count = teams.len();
    Ok(Json(AllTeamsResponse { teams, count }))
}
