use std::collections::HashMap;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;

use crate::models::{STATUS_MERGED, STATUS_OPEN};
use crate::schema::{pr_reviewers, pull_requests, teams, users};

#[derive(Debug, Serialize)]
pub struct Statistics {
    pub user_assignments: Vec<UserAssignmentStat>,
    pub total_prs: i64,
    pub open_prs: i64,
    pub merged_prs: i64,
    pub total_users: i64,
    pub active_users: i64,
    pub total_teams: i64,
}

#[derive(Debug, Serialize)]
pub struct UserAssignmentStat {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub total_assignments: i64,
    pub open_assignments: i64,
    pub merged_assignments: i64,
}

pub fn collect_statistics(conn: &mut PgConnection) -> QueryResult<Statistics> {
    let total_prs: i64 = pull_requests::table.count().get_result(conn)?;
    let open_prs: i64 = pull_requests::table
        .filter(pull_requests::status.eq(STATUS_OPEN))
        .count()
        .get_result(conn)?;
    let merged_prs: i64 = pull_requests::table
        .filter(pull_requests::status.eq(STATUS_MERGED))
        .count()
        .get_result(conn)?;
    let total_users: i64 = users::table.count().get_result(conn)?;
    let active_users: i64 = users::table
        .filter(users::is_active.eq(true))
        .count()
        .get_result(conn)?;
    let total_teams: i64 = teams::table.count().get_result(conn)?;

    let user_assignments = collect_user_assignments(conn)?;

    Ok(Statistics {
        user_assignments,
        total_prs,
        open_prs,
        merged_prs,
        total_users,
        active_users,
        total_teams,
    })
}

/// Per-user assignment counts, users with at least one assignment only,
/// busiest reviewers first.
fn collect_user_assignments(conn: &mut PgConnection) -> QueryResult<Vec<UserAssignmentStat>> {
    let rows: Vec<(String, String)> = pr_reviewers::table
        .inner_join(pull_requests::table)
        .select((pr_reviewers::user_id, pull_requests::status))
        .load(conn)?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    struct Tally {
        total: i64,
        open: i64,
        merged: i64,
    }

    let mut tallies: HashMap<String, Tally> = HashMap::new();
    for (user_id, status) in rows {
        let tally = tallies.entry(user_id).or_insert(Tally {
            total: 0,
            open: 0,
            merged: 0,
        });
        tally.total += 1;
        match status.as_str() {
            STATUS_OPEN => tally.open += 1,
            STATUS_MERGED => tally.merged += 1,
            _ => {}
        }
    }

    let reviewer_ids: Vec<String> = tallies.keys().cloned().collect();
    let identities: Vec<(String, String, String)> = users::table
        .filter(users::user_id.eq_any(&reviewer_ids))
        .select((users::user_id, users::username, users::team_name))
        .load(conn)?;

    let mut result: Vec<UserAssignmentStat> = identities
        .into_iter()
        .filter_map(|(user_id, username, team_name)| {
            tallies.get(&user_id).map(|tally| UserAssignmentStat {
                user_id: user_id.clone(),
                username,
                team_name,
                total_assignments: tally.total,
                open_assignments: tally.open,
                merged_assignments: tally.merged,
            })
        })
        .collect();

    result.sort_by(|a, b| {
        b.total_assignments
            .cmp(&a.total_assignments)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    Ok(result)
}
