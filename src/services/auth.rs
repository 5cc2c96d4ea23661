use chrono::{Duration, Utc};
use diesel::pg::PgConnection;

use crate::auth::jwt::{JwtService, TOKEN_TTL_DAYS};
use crate::error::{AppError, AppResult};
use crate::models::TEAM_ADMINS;
use crate::repo;

/// The caller's identity as every operation sees it.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub is_admin: bool,
}

/// Issues a JWT for an active user, reusing the latest unexpired token
/// already stored for them.
pub fn issue_token(conn: &mut PgConnection, jwt: &JwtService, user_id: &str) -> AppResult<String> {
    let user = repo::users::user_by_id(conn, user_id)?
        .ok_or_else(|| AppError::not_found("user not found"))?;
    if !user.is_active {
        return Err(AppError::forbidden("user is not active"));
    }

    if let Some(existing) = repo::tokens::latest_valid_token(conn, user_id)? {
        return Ok(existing.token);
    }

    let token = jwt.generate_token(user_id)?;
    let expires_at = (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).naive_utc();
    repo::tokens::save_token(conn, user_id, &token, expires_at)?;

    Ok(token)
}

/// Validates a bearer token: signature, presence in the store, claim
/// consistency, and that the user still exists and is active.
pub fn authenticate(
    conn: &mut PgConnection,
    jwt: &JwtService,
    token: &str,
) -> AppResult<AuthContext> {
    let claims = jwt
        .verify_token(token)
        .map_err(|_| AppError::unauthorized("invalid or expired token"))?;

    let stored_user_id = repo::tokens::user_id_for_token(conn, token)?
        .ok_or_else(|| AppError::unauthorized("invalid or expired token"))?;
    if stored_user_id != claims.sub {
        return Err(AppError::unauthorized("invalid or expired token"));
    }

    let user = repo::users::user_by_id(conn, &stored_user_id)?
        .ok_or_else(|| AppError::unauthorized("invalid or expired token"))?;
    if !user.is_active {
        return Err(AppError::unauthorized("user is not active"));
    }

    Ok(AuthContext {
        user_id: user.user_id,
        is_admin: user.team_name == TEAM_ADMINS,
    })
}
