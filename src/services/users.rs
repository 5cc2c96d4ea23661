use diesel::pg::PgConnection;

use crate::error::{AppError, AppResult};
use crate::models::{User, TEAM_ADMINS};
use crate::repo;

pub fn set_user_active(
    conn: &mut PgConnection,
    user_id: &str,
    is_active: bool,
) -> AppResult<User> {
    let user = repo::users::user_by_id(conn, user_id)?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    if user.team_name == TEAM_ADMINS && !is_active {
        return Err(AppError::forbidden("cannot deactivate admin users"));
    }

    repo::users::set_user_active(conn, user_id, is_active)?;

    repo::users::user_by_id(conn, user_id)?
        .ok_or_else(|| AppError::internal("user missing after update"))
}
