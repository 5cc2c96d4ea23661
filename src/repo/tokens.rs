use chrono::{NaiveDateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{AuthToken, NewAuthToken};
use crate::schema::auth_tokens;

pub fn save_token(
    conn: &mut PgConnection,
    user_id: &str,
    token: &str,
    expires_at: NaiveDateTime,
) -> QueryResult<()> {
    diesel::insert_into(auth_tokens::table)
        .values(&NewAuthToken {
            user_id: user_id.to_string(),
            token: token.to_string(),
            expires_at,
        })
        .execute(conn)?;
    Ok(())
}

/// Most recent unexpired token for a user, if any. Login reuses it
/// instead of minting a new one.
pub fn latest_valid_token(
    conn: &mut PgConnection,
    user_id: &str,
) -> QueryResult<Option<AuthToken>> {
    auth_tokens::table
        .filter(auth_tokens::user_id.eq(user_id))
        .filter(auth_tokens::expires_at.gt(Utc::now().naive_utc()))
        .order(auth_tokens::created_at.desc())
        .first(conn)
        .optional()
}

pub fn user_id_for_token(conn: &mut PgConnection, token: &str) -> QueryResult<Option<String>> {
    auth_tokens::table
        .filter(auth_tokens::token.eq(token))
        .filter(auth_tokens::expires_at.gt(Utc::now().naive_utc()))
        .select(auth_tokens::user_id)
        .first(conn)
        .optional()
}
