use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use diesel::pg::PgConnection;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::TEAM_ADMINS;
use crate::repo;
use crate::state::AppState;

#[derive(Debug)]
pub struct BatchOutcome {
    pub deactivated_users: Vec<String>,
    pub skipped_users: Vec<String>,
    pub reassigned_prs: Vec<PrReassignment>,
    pub processing_time: Duration,
}

#[derive(Debug, Clone)]
pub struct PrReassignment {
    pub pull_request_id: String,
    pub old_reviewers: Vec<String>,
    pub new_reviewers: Vec<String>,
}

/// Per-PR state gathered by the fan-out fetch, consumed by the planner.
#[derive(Debug, Clone)]
struct ReassignmentTask {
    pr_id: String,
    author_id: String,
    team_name: String,
    deactivated_reviewers: Vec<String>,
    current_reviewers: Vec<String>,
}

/// Deactivates every non-admin member of a team and rebalances their
/// open reviews. The admin team itself is refused outright.
pub async fn batch_deactivate_team(state: &AppState, team_name: &str) -> AppResult<BatchOutcome> {
    let started = Instant::now();

    if team_name == TEAM_ADMINS {
        return Err(AppError::forbidden("cannot deactivate admin team"));
    }

    let team = team_name.to_string();
    let member_ids =
        with_conn(state, move |conn| {
            Ok(repo::users::team_member_ids(conn, &team)?)
        })
        .await?;

    if member_ids.is_empty() {
        return Ok(BatchOutcome {
            deactivated_users: Vec::new(),
            skipped_users: Vec::new(),
            reassigned_prs: Vec::new(),
            processing_time: started.elapsed(),
        });
    }

    deactivate_and_reassign(state, member_ids, started).await
}

pub async fn batch_deactivate_users(
    state: &AppState,
    user_ids: Vec<String>,
) -> AppResult<BatchOutcome> {
    deactivate_and_reassign(state, user_ids, Instant::now()).await
}

async fn deactivate_and_reassign(
    state: &AppState,
    user_ids: Vec<String>,
    started: Instant,
) -> AppResult<BatchOutcome> {
    let user_ids = dedup_preserving_order(user_ids);

    // Collect the open PRs the victims touch, then flip the flags. The
    // RETURNING set of the update is the authoritative victim set; only
    // those ids may have their edges rewritten.
    let ids = user_ids.clone();
    let (open_prs, deactivated) = with_conn(state, move |conn| {
        let open_prs = repo::prs::open_prs_by_reviewers(conn, &ids)?;
        let deactivated = repo::users::bulk_deactivate(conn, &ids)?;
        Ok((open_prs, deactivated))
    })
    .await?;

    let victim_set: HashSet<String> = deactivated.iter().cloned().collect();
    let skipped_users: Vec<String> = user_ids
        .iter()
        .filter(|id| !victim_set.contains(*id))
        .cloned()
        .collect();

    let mut targets: Vec<(String, Vec<String>)> = open_prs
        .into_iter()
        .filter_map(|(pr_id, reviewers)| {
            let victims: Vec<String> = reviewers
                .into_iter()
                .filter(|id| victim_set.contains(id))
                .collect();
            (!victims.is_empty()).then_some((pr_id, victims))
        })
        .collect();
    targets.sort_by(|a, b| a.0.cmp(&b.0));

    if targets.is_empty() {
        return Ok(BatchOutcome {
            deactivated_users: deactivated,
            skipped_users,
            reassigned_prs: Vec::new(),
            processing_time: started.elapsed(),
        });
    }

    let tasks = fetch_tasks(state, targets).await?;
    let plan = plan_and_apply(state, tasks, victim_set).await?;

    let reassigned_prs = plan
        .into_iter()
        .map(|(pr_id, replacements)| {
            let (old_reviewers, new_reviewers): (Vec<String>, Vec<String>) =
                replacements.into_iter().unzip();
            PrReassignment {
                pull_request_id: pr_id,
                old_reviewers,
                new_reviewers,
            }
        })
        .collect();

    Ok(BatchOutcome {
        deactivated_users: deactivated,
        skipped_users,
        reassigned_prs,
        processing_time: started.elapsed(),
    })
}

/// Fetches author, team, and the current reviewer set for each affected
/// PR in parallel, bounded by the configured fan-out limit. The first
/// failure aborts the whole batch.
async fn fetch_tasks(
    state: &AppState,
    targets: Vec<(String, Vec<String>)>,
) -> AppResult<Vec<ReassignmentTask>> {
    let semaphore = Arc::new(Semaphore::new(state.config.batch_fanout_limit.max(1)));
    let mut join_set = JoinSet::new();

    for (pr_id, victims) in targets {
        let semaphore = semaphore.clone();
        let pool = state.pool.clone();
        join_set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|err| AppError::internal(format!("fan-out semaphore closed: {err}")))?;

            task::spawn_blocking(move || {
                let mut conn = pool
                    .get()
                    .map_err(|err| AppError::internal(format!("database pool error: {err}")))?;
                let meta = repo::prs::pr_meta(&mut conn, &pr_id)?.ok_or_else(|| {
                    AppError::internal(format!("pull request {pr_id} missing during batch"))
                })?;
                Ok(ReassignmentTask {
                    pr_id,
                    author_id: meta.author_id,
                    team_name: meta.team_name,
                    deactivated_reviewers: victims,
                    current_reviewers: meta.reviewers,
                })
            })
            .await
            .map_err(|err| AppError::internal(format!("fan-out task panicked: {err}")))?
        });
    }

    let mut tasks = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Ok(fetched)) => tasks.push(fetched),
            Ok(Err(err)) => {
                join_set.abort_all();
                return Err(err);
            }
            Err(err) => {
                join_set.abort_all();
                return Err(AppError::internal(format!("fan-out task failed: {err}")));
            }
        }
    }

    tasks.sort_by(|a, b| a.pr_id.cmp(&b.pr_id));
    Ok(tasks)
}

/// Plans replacements sequentially over the fetched tasks, then applies
/// all edge rewrites in one transaction. Planning is best-effort: a PR
/// whose team lookup fails, or a victim with no eligible candidate, is
/// skipped without failing the batch.
async fn plan_and_apply(
    state: &AppState,
    tasks: Vec<ReassignmentTask>,
    victim_set: HashSet<String>,
) -> AppResult<BTreeMap<String, Vec<(String, String)>>> {
    with_conn(state, move |conn| {
        let mut plan: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();

        for task in &tasks {
            let members =
                match repo::users::active_teammates(conn, &task.team_name, &task.author_id) {
                    Ok(members) => members,
                    Err(err) => {
                        warn!(pr_id = %task.pr_id, error = %err, "skipping PR: failed to load team members");
                        continue;
                    }
                };
            let candidates: Vec<String> =
                members.into_iter().map(|user| user.user_id).collect();

            let replacements = plan_for_pr(
                &candidates,
                &task.current_reviewers,
                &task.deactivated_reviewers,
                &victim_set,
            );
            if !replacements.is_empty() {
                plan.insert(task.pr_id.clone(), replacements);
            }
        }

        if !plan.is_empty() {
            repo::prs::batch_reassign(conn, &plan)?;
        }
        Ok(plan)
    })
    .await
}

/// Chooses a replacement for each deactivated reviewer of one PR. The
/// live reviewer set grows as replacements are committed so the same
/// candidate is never picked twice for the same PR; a victim with no
/// eligible candidate keeps its slot empty.
fn plan_for_pr(
    candidates: &[String],
    current_reviewers: &[String],
    deactivated_reviewers: &[String],
    victim_set: &HashSet<String>,
) -> Vec<(String, String)> {
    let mut live: HashSet<String> = current_reviewers.iter().cloned().collect();
    let mut replacements = Vec::new();

    for old_id in deactivated_reviewers {
        if !live.contains(old_id) {
            continue;
        }

        let replacement = candidates
            .iter()
            .find(|id| !live.contains(*id) && !victim_set.contains(*id));
        let Some(new_id) = replacement else {
            continue;
        };

        live.insert(new_id.clone());
        replacements.push((old_id.clone(), new_id.clone()));
    }

    replacements
}

fn dedup_preserving_order(user_ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    user_ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

async fn with_conn<T, F>(state: &AppState, f: F) -> AppResult<T>
where
    F: FnOnce(&mut PgConnection) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = state.pool.clone();
    task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|err| AppError::internal(format!("database pool error: {err}")))?;
        f(&mut conn)
    })
    .await
    .map_err(|err| AppError::internal(format!("database task panicked: {err}")))?
}
