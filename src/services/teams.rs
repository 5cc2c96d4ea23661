use std::collections::HashSet;

use diesel::pg::PgConnection;
use diesel::Connection;

use crate::error::{AppError, AppResult};
use crate::models::{TeamWithMembers, UpsertUser};
use crate::repo;

#[derive(Debug, Clone)]
pub struct NewTeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

pub fn create_team(
    conn: &mut PgConnection,
    team_name: &str,
    members: &[NewTeamMember],
) -> AppResult<TeamWithMembers> {
    let mut seen: HashSet<&str> = HashSet::new();
    for member in members {
        if !seen.insert(member.user_id.as_str()) {
            return Err(AppError::bad_request(format!(
                "duplicate user_id in team members: {}",
                member.user_id
            )));
        }
    }

    if repo::teams::team_exists(conn, team_name)? {
        return Err(AppError::team_exists());
    }

    conn.transaction(|conn| {
        repo::teams::create_team(conn, team_name)?;
        for member in members {
            repo::users::upsert_user(
                conn,
                &UpsertUser {
                    user_id: member.user_id.clone(),
                    username: member.username.clone(),
                    team_name: team_name.to_string(),
                    is_active: member.is_active,
                },
            )?;
        }
        diesel::QueryResult::Ok(())
    })?;

    repo::teams::team_with_members(conn, team_name)?
        .ok_or_else(|| AppError::internal("team missing after insert"))
}

pub fn get_team(conn: &mut PgConnection, team_name: &str) -> AppResult<TeamWithMembers> {
    repo::teams::team_with_members(conn, team_name)?
        .ok_or_else(|| AppError::not_found("team not found"))
}
