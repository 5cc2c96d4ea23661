use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{
    NewPullRequest, NewReviewerEdge, PullRequest, PullRequestRow, PullRequestShort, STATUS_MERGED,
    STATUS_OPEN,
};
use crate::schema::{pr_reviewers, pull_requests, users};

/// Author, team, and current reviewer set of one PR, as needed by the
/// batch planner.
#[derive(Debug, Clone)]
pub struct PrMeta {
    pub author_id: String,
    pub team_name: String,
    pub reviewers: Vec<String>,
}

/// Inserts the PR and its reviewer edges in a single transaction.
pub fn create_pr_with_reviewers(
    conn: &mut PgConnection,
    pr: &NewPullRequest,
    reviewer_ids: &[String],
) -> QueryResult<()> {
    conn.transaction(|conn| {
        diesel::insert_into(pull_requests::table)
            .values(pr)
            .execute(conn)?;

        if !reviewer_ids.is_empty() {
            let edges: Vec<NewReviewerEdge> = reviewer_ids
                .iter()
                .map(|user_id| NewReviewerEdge {
                    pull_request_id: pr.pull_request_id.clone(),
                    user_id: user_id.clone(),
                })
                .collect();
            diesel::insert_into(pr_reviewers::table)
                .values(&edges)
                .execute(conn)?;
        }

        Ok(())
    })
}

pub fn pr_exists(conn: &mut PgConnection, pr_id: &str) -> QueryResult<bool> {
    diesel::select(exists(
        pull_requests::table.filter(pull_requests::pull_request_id.eq(pr_id)),
    ))
    .get_result(conn)
}

pub fn pr_by_id(conn: &mut PgConnection, pr_id: &str) -> QueryResult<Option<PullRequest>> {
    let row: Option<PullRequestRow> = pull_requests::table.find(pr_id).first(conn).optional()?;
    let Some(row) = row else {
        return Ok(None);
    };

    let reviewers = reviewers_of(conn, pr_id)?;
    Ok(Some(PullRequest {
        pull_request_id: row.pull_request_id,
        pull_request_name: row.pull_request_name,
        author_id: row.author_id,
        status: row.status,
        assigned_reviewers: reviewers,
        created_at: row.created_at,
        merged_at: row.merged_at,
    }))
}

/// Conditional merge: only an OPEN PR is updated, so a second call is a
/// no-op that leaves `merged_at` untouched.
pub fn merge_pr(conn: &mut PgConnection, pr_id: &str) -> QueryResult<usize> {
    diesel::update(
        pull_requests::table
            .filter(pull_requests::pull_request_id.eq(pr_id))
            .filter(pull_requests::status.eq(STATUS_OPEN)),
    )
    .set((
        pull_requests::status.eq(STATUS_MERGED),
        pull_requests::merged_at.eq(Some(Utc::now().naive_utc())),
    ))
    .execute(conn)
}

pub fn is_reviewer_assigned(
    conn: &mut PgConnection,
    pr_id: &str,
    user_id: &str,
) -> QueryResult<bool> {
    diesel::select(exists(
        pr_reviewers::table
            .filter(pr_reviewers::pull_request_id.eq(pr_id))
            .filter(pr_reviewers::user_id.eq(user_id)),
    ))
    .get_result(conn)
}

/// Rewrites a single reviewer edge by its (pr, old user) pair.
pub fn reassign_reviewer(
    conn: &mut PgConnection,
    pr_id: &str,
    old_user_id: &str,
    new_user_id: &str,
) -> QueryResult<usize> {
    diesel::update(
        pr_reviewers::table
            .filter(pr_reviewers::pull_request_id.eq(pr_id))
            .filter(pr_reviewers::user_id.eq(old_user_id)),
    )
    .set(pr_reviewers::user_id.eq(new_user_id))
    .execute(conn)
}

pub fn prs_by_reviewer(
    conn: &mut PgConnection,
    user_id: &str,
) -> QueryResult<Vec<PullRequestShort>> {
    pull_requests::table
        .inner_join(pr_reviewers::table)
        .filter(pr_reviewers::user_id.eq(user_id))
        .order(pull_requests::created_at.desc())
        .select((
            pull_requests::pull_request_id,
            pull_requests::pull_request_name,
            pull_requests::author_id,
            pull_requests::status,
        ))
        .load(conn)
}

/// All OPEN PRs that have at least one of the given users as a reviewer,
/// keyed by PR id with the matching reviewer ids.
pub fn open_prs_by_reviewers(
    conn: &mut PgConnection,
    user_ids: &[String],
) -> QueryResult<HashMap<String, Vec<String>>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(String, String)> = pull_requests::table
        .inner_join(pr_reviewers::table)
        .filter(pull_requests::status.eq(STATUS_OPEN))
        .filter(pr_reviewers::user_id.eq_any(user_ids))
        .order((
            pull_requests::pull_request_id.asc(),
            pr_reviewers::user_id.asc(),
        ))
        .select((pull_requests::pull_request_id, pr_reviewers::user_id))
        .load(conn)?;

    let mut result: HashMap<String, Vec<String>> = HashMap::new();
    for (pr_id, reviewer_id) in rows {
        result.entry(pr_id).or_default().push(reviewer_id);
    }
    Ok(result)
}

pub fn pr_meta(conn: &mut PgConnection, pr_id: &str) -> QueryResult<Option<PrMeta>> {
    let row: Option<(String, String)> = pull_requests::table
        .inner_join(users::table)
        .filter(pull_requests::pull_request_id.eq(pr_id))
        .select((pull_requests::author_id, users::team_name))
        .first(conn)
        .optional()?;
    let Some((author_id, team_name)) = row else {
        return Ok(None);
    };

    let reviewers = reviewers_of(conn, pr_id)?;
    Ok(Some(PrMeta {
        author_id,
        team_name,
        reviewers,
    }))
}

/// Applies a whole batch of edge rewrites in one transaction. A rewrite
/// whose target edge already exists for the PR is skipped, so a
/// concurrent reassign cannot produce a duplicate reviewer.
pub fn batch_reassign(
    conn: &mut PgConnection,
    reassignments: &BTreeMap<String, Vec<(String, String)>>,
) -> QueryResult<()> {
    if reassignments.is_empty() {
        return Ok(());
    }

    conn.transaction(|conn| {
        for (pr_id, replacements) in reassignments {
            for (old_user_id, new_user_id) in replacements {
                let taken: bool = diesel::select(exists(
                    pr_reviewers::table
                        .filter(pr_reviewers::pull_request_id.eq(pr_id))
                        .filter(pr_reviewers::user_id.eq(new_user_id)),
                ))
                .get_result(conn)?;
                if taken {
                    continue;
                }

                diesel::update(
                    pr_reviewers::table
                        .filter(pr_reviewers::pull_request_id.eq(pr_id))
                        .filter(pr_reviewers::user_id.eq(old_user_id)),
                )
                .set(pr_reviewers::user_id.eq(new_user_id))
                .execute(conn)?;
            }
        }
        Ok(())
    })
}

fn reviewers_of(conn: &mut PgConnection, pr_id: &str) -> QueryResult<Vec<String>> {
    pr_reviewers::table
        .filter(pr_reviewers::pull_request_id.eq(pr_id))
        .order(pr_reviewers::user_id.asc())
        .select(pr_reviewers::user_id)
        .load(conn)
}
