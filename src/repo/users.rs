use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{UpsertUser, User, TEAM_ADMINS};
use crate::schema::users;

pub fn upsert_user(conn: &mut PgConnection, user: &UpsertUser) -> QueryResult<()> {
    diesel::insert_into(users::table)
        .values(user)
        .on_conflict(users::user_id)
        .do_update()
        .set((
            users::username.eq(&user.username),
            users::team_name.eq(&user.team_name),
            users::is_active.eq(user.is_active),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    Ok(())
}

pub fn user_by_id(conn: &mut PgConnection, user_id: &str) -> QueryResult<Option<User>> {
    users::table.find(user_id).first(conn).optional()
}

pub fn set_user_active(
    conn: &mut PgConnection,
    user_id: &str,
    is_active: bool,
) -> QueryResult<usize> {
    diesel::update(users::table.find(user_id))
        .set((
            users::is_active.eq(is_active),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)
}

/// Active members of a team excluding one user, ordered by user id so
/// candidate scans are stable across calls.
pub fn active_teammates(
    conn: &mut PgConnection,
    team_name: &str,
    exclude_user_id: &str,
) -> QueryResult<Vec<User>> {
    users::table
        .filter(users::team_name.eq(team_name))
        .filter(users::is_active.eq(true))
        .filter(users::user_id.ne(exclude_user_id))
        .order(users::user_id.asc())
        .load(conn)
}

pub fn all_users(conn: &mut PgConnection) -> QueryResult<Vec<User>> {
    users::table
        .order((users::team_name.asc(), users::username.asc()))
        .load(conn)
}

/// Flips `is_active` to false for every listed user that is currently
/// active and not an admin, returning the ids actually flipped. The
/// returned set is the authoritative victim set for batch reassignment.
pub fn bulk_deactivate(conn: &mut PgConnection, user_ids: &[String]) -> QueryResult<Vec<String>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    diesel::update(
        users::table
            .filter(users::user_id.eq_any(user_ids))
            .filter(users::team_name.ne(TEAM_ADMINS))
            .filter(users::is_active.eq(true)),
    )
    .set((
        users::is_active.eq(false),
        users::updated_at.eq(Utc::now().naive_utc()),
    ))
    .returning(users::user_id)
    .get_results(conn)
}

pub fn team_member_ids(conn: &mut PgConnection, team_name: &str) -> QueryResult<Vec<String>> {
    users::table
        .filter(users::team_name.eq(team_name))
        .filter(users::team_name.ne(TEAM_ADMINS))
        .order(users::user_id.asc())
        .select(users::user_id)
        .load(conn)
}
