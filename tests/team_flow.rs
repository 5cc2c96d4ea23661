mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, error_code, read_json, TestApp};
use serde::Deserialize;

#[derive(Deserialize)]
struct TeamDto {
    team_name: String,
    members: Vec<TeamMemberDto>,
}

#[derive(Deserialize)]
struct TeamMemberDto {
    user_id: String,
    username: String,
    is_active: bool,
}

#[derive(Deserialize)]
struct TeamResponse {
    team: TeamDto,
}

#[derive(Deserialize)]
struct AllTeamsResponse {
    teams: Vec<TeamDto>,
    count: usize,
}

#[tokio::test]
async fn create_and_get_team_flow() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.admin_token().await?;

    let response = app
        .post_json(
            "/team/add",
            &serde_json::json!({
                "team_name": "backend",
                "members": [
                    { "user_id": "u1", "username": "Alice", "is_active": true },
                    { "user_id": "u2", "username": "Bob", "is_active": true },
                ],
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: TeamResponse = read_json(response).await?;
    assert_eq!(created.team.team_name, "backend");
    assert_eq!(created.team.members.len(), 2);
    assert!(created.team.members.iter().all(|m| m.is_active));
    assert!(created.team.members.iter().any(|m| m.user_id == "u1"));
    assert!(created.team.members.iter().any(|m| m.user_id == "u2"));

    let response = app.get("/team/get?team_name=backend", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: TeamDto = read_json(response).await?;
    assert_eq!(fetched.team_name, "backend");
    let usernames: Vec<&str> = fetched
        .members
        .iter()
        .map(|m| m.username.as_str())
        .collect();
    assert_eq!(usernames, vec!["Alice", "Bob"]);

    let response = app.get("/admin/teams", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let all: AllTeamsResponse = read_json(response).await?;
    assert_eq!(all.count, 2);
    assert!(all.teams.iter().any(|t| t.team_name == "admins"));
    assert!(all.teams.iter().any(|t| t.team_name == "backend"));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn duplicate_team_is_rejected() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.admin_token().await?;

    app.create_team(&token, "backend", &["u1"]).await?;

    let response = app
        .post_json(
            "/team/add",
            &serde_json::json!({
                "team_name": "backend",
                "members": [{ "user_id": "u9", "username": "Nine", "is_active": true }],
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(response).await?, "TEAM_EXISTS");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn duplicate_member_ids_are_rejected() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.admin_token().await?;

    let response = app
        .post_json(
            "/team/add",
            &serde_json::json!({
                "team_name": "backend",
                "members": [
                    { "user_id": "u1", "username": "Alice", "is_active": true },
                    { "user_id": "u1", "username": "Alice again", "is_active": true },
                ],
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn team_requires_at_least_one_member() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.admin_token().await?;

    let response = app
        .post_json(
            "/team/add",
            &serde_json::json!({ "team_name": "backend", "members": [] }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn unknown_team_returns_not_found() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.admin_token().await?;

    let response = app.get("/team/get?team_name=ghosts", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(response).await?, "NOT_FOUND");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn non_admin_cannot_use_admin_endpoints() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let admin = app.admin_token().await?;

    app.create_team(&admin, "backend", &["u1"]).await?;
    let member_token = app.login("u1").await?;

    let response = app.get("/admin/teams", Some(&member_token)).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post_json(
            "/users/batchDeactivateUsers",
            &serde_json::json!({ "user_ids": ["u1"] }),
            Some(&member_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn protected_endpoints_require_a_token() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let response = app
        .post_json(
            "/team/add",
            &serde_json::json!({
                "team_name": "backend",
                "members": [{ "user_id": "u1", "username": "Alice", "is_active": true }],
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn login_is_refused_for_unknown_users() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let response = app
        .post_json(
            "/auth/login",
            &serde_json::json!({ "user_id": "nobody" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn login_is_refused_for_inactive_users() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.admin_token().await?;

    app.create_team(&token, "backend", &["u1"]).await?;
    let response = app
        .post_json(
            "/users/setIsActive",
            &serde_json::json!({ "user_id": "u1", "is_active": false }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_json("/auth/login", &serde_json::json!({ "user_id": "u1" }), None)
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn login_reuses_unexpired_tokens() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    app.seed_admin().await?;

    let first = app.login("admin").await?;
    let second = app.login("admin").await?;
    assert_eq!(first, second);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let response = app.head("/health").await?;
    assert_eq!(response.status(), StatusCode::OK);

    app.cleanup().await?;
    Ok(())
}
