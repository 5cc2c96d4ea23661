use std::collections::HashSet;

use diesel::pg::PgConnection;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{AppError, AppResult};
use crate::models::{NewPullRequest, PullRequest, PullRequestShort, STATUS_MERGED, STATUS_OPEN};
use crate::repo;
use crate::selection;

/// A PR never carries more than this many reviewers.
pub const MAX_REVIEWERS: usize = 2;

pub fn create_pr<R: Rng + ?Sized>(
    conn: &mut PgConnection,
    rng: &mut R,
    pr_id: &str,
    pr_name: &str,
    author_id: &str,
) -> AppResult<PullRequest> {
    if repo::prs::pr_exists(conn, pr_id)? {
        return Err(AppError::pr_exists());
    }

    let author = repo::users::user_by_id(conn, author_id)?
        .ok_or_else(|| AppError::not_found("author not found"))?;
    if !author.is_active {
        return Err(AppError::author_inactive());
    }

    let teammates = repo::users::active_teammates(conn, &author.team_name, &author.user_id)?;
    let candidate_ids: Vec<String> = teammates.into_iter().map(|user| user.user_id).collect();
    let reviewers = selection::pick_reviewers(rng, &candidate_ids, MAX_REVIEWERS, &HashSet::new());

    let new_pr = NewPullRequest {
        pull_request_id: pr_id.to_string(),
        pull_request_name: pr_name.to_string(),
        author_id: author_id.to_string(),
        status: STATUS_OPEN.to_string(),
    };
    repo::prs::create_pr_with_reviewers(conn, &new_pr, &reviewers)?;

    repo::prs::pr_by_id(conn, pr_id)?
        .ok_or_else(|| AppError::internal("pull request missing after insert"))
}

/// Idempotent: a PR that is already merged is returned as-is, without
/// touching `merged_at`.
pub fn merge_pr(conn: &mut PgConnection, pr_id: &str) -> AppResult<PullRequest> {
    let pr = repo::prs::pr_by_id(conn, pr_id)?
        .ok_or_else(|| AppError::not_found("pull request not found"))?;

    if pr.status == STATUS_MERGED {
        return Ok(pr);
    }

    repo::prs::merge_pr(conn, pr_id)?;

    repo::prs::pr_by_id(conn, pr_id)?
        .ok_or_else(|| AppError::internal("pull request missing after merge"))
}

pub fn reassign_reviewer<R: Rng + ?Sized>(
    conn: &mut PgConnection,
    rng: &mut R,
    pr_id: &str,
    old_user_id: &str,
) -> AppResult<(String, PullRequest)> {
    let pr = repo::prs::pr_by_id(conn, pr_id)?
        .ok_or_else(|| AppError::not_found("pull request not found"))?;

    if pr.status == STATUS_MERGED {
        return Err(AppError::pr_merged());
    }

    if !repo::prs::is_reviewer_assigned(conn, pr_id, old_user_id)? {
        return Err(AppError::not_assigned());
    }

    let old_user = repo::users::user_by_id(conn, old_user_id)?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let teammates = repo::users::active_teammates(conn, &old_user.team_name, old_user_id)?;
    let current: HashSet<String> = pr.assigned_reviewers.iter().cloned().collect();
    let candidates: Vec<String> = teammates
        .into_iter()
        .map(|user| user.user_id)
        .filter(|id| !current.contains(id) && *id != pr.author_id)
        .collect();

    let new_user_id = candidates
        .choose(rng)
        .cloned()
        .ok_or_else(AppError::no_candidate)?;

    let rewritten = repo::prs::reassign_reviewer(conn, pr_id, old_user_id, &new_user_id)?;
    if rewritten == 0 {
        // The edge vanished between the check and the rewrite.
        return Err(AppError::not_assigned());
    }

    let updated = repo::prs::pr_by_id(conn, pr_id)?
        .ok_or_else(|| AppError::internal("pull request missing after reassign"))?;
    Ok((new_user_id, updated))
}

pub fn user_reviews(conn: &mut PgConnection, user_id: &str) -> AppResult<Vec<PullRequestShort>> {
    Ok(repo::prs::prs_by_reviewer(conn, user_id)?)
}
