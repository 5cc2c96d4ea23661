use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::*;

pub const STATUS_OPEN: &str = "OPEN";
pub const STATUS_MERGED: &str = "MERGED";

/// Members of this team are administrators and can never be deactivated.
pub const TEAM_ADMINS: &str = "admins";

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(primary_key(user_id))]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct UpsertUser {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = teams)]
#[diesel(primary_key(team_name))]
pub struct Team {
    pub team_name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = teams)]
pub struct NewTeam {
    pub team_name: String,
}

#[derive(Debug, Clone, Queryable)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct TeamWithMembers {
    pub team_name: String,
    pub created_at: NaiveDateTime,
    pub members: Vec<TeamMember>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = pull_requests)]
#[diesel(primary_key(pull_request_id))]
pub struct PullRequestRow {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub merged_at: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pull_requests)]
pub struct NewPullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

/// A pull request together with its currently assigned reviewer ids.
#[derive(Debug, Clone)]
pub struct PullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
    pub assigned_reviewers: Vec<String>,
    pub created_at: NaiveDateTime,
    pub merged_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Queryable)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pr_reviewers)]
pub struct NewReviewerEdge {
    pub pull_request_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = auth_tokens)]
pub struct AuthToken {
    pub id: i64,
    pub user_id: String,
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = auth_tokens)]
pub struct NewAuthToken {
    pub user_id: String,
    pub token: String,
    pub expires_at: NaiveDateTime,
}
