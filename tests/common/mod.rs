use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use reviewer_backend::auth::jwt::JwtService;
use reviewer_backend::config::AppConfig;
use reviewer_backend::db::{self, PgPool};
use reviewer_backend::routes;
use reviewer_backend::state::AppState;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("TEST_DATABASE_URL")
            .context("TEST_DATABASE_URL must be set for integration tests")?;

        let config = AppConfig {
            port: 0,
            postgres_host: "127.0.0.1".to_string(),
            postgres_port: 5432,
            postgres_user: "test".to_string(),
            postgres_password: "test".to_string(),
            postgres_db: "test".to_string(),
            postgres_ssl_mode: "disable".to_string(),
            db_max_conns: db::DEFAULT_MAX_CONNS,
            db_min_conns: 1,
            db_max_conn_lifetime: Duration::from_secs(3600),
            db_max_conn_idle_time: Duration::from_secs(1800),
            db_health_check_period: Duration::from_secs(60),
            jwt_secret: "test-secret".to_string(),
            batch_fanout_limit: 4,
        };

        let pool = db::init_pool(&database_url, 8)?;
        prepare_database(&pool).await?;

        let jwt = JwtService::from_config(&config);
        let state = AppState::new(pool, config, jwt);
        let router = routes::create_router(state.clone());

        Ok(Self { state, router })
    }

    pub async fn cleanup(&self) -> Result<()> {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get cleanup connection: {err}"))?;
            truncate_all(&mut conn)?;
            Ok(())
        })
        .await
        .context("cleanup task panicked")?
    }

    /// Inserts the reserved admin team plus an `admin` user directly in
    /// the database; everything else is seeded through the API.
    pub async fn seed_admin(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.batch_execute(
                "INSERT INTO teams (team_name) VALUES ('admins') ON CONFLICT DO NOTHING;
                 INSERT INTO users (user_id, username, team_name, is_active)
                 VALUES ('admin', 'Admin', 'admins', TRUE)
                 ON CONFLICT (user_id) DO NOTHING;",
            )
            .context("failed to seed admin")?;
            Ok(())
        })
        .await
    }

    pub async fn login(&self, user_id: &str) -> Result<String> {
        let response = self
            .post_json(
                "/auth/login",
                &serde_json::json!({ "user_id": user_id }),
                None,
            )
            .await?;
        anyhow::ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        #[derive(serde::Deserialize)]
        struct LoginResponse {
            token: String,
        }
        let parsed: LoginResponse = read_json(response).await?;
        Ok(parsed.token)
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.seed_admin().await?;
        self.login("admin").await
    }

    /// Creates a team through the API with every member active.
    #[allow(dead_code)]
    pub async fn create_team(
        &self,
        token: &str,
        team_name: &str,
        member_ids: &[&str],
    ) -> Result<()> {
        let members: Vec<serde_json::Value> = member_ids
            .iter()
            .map(|id| {
                serde_json::json!({
                    "user_id": id,
                    "username": format!("User {id}"),
                    "is_active": true,
                })
            })
            .collect();

        let response = self
            .post_json(
                "/team/add",
                &serde_json::json!({ "team_name": team_name, "members": members }),
                Some(token),
            )
            .await?;
        anyhow::ensure!(
            response.status() == StatusCode::CREATED,
            "create_team failed with status {}",
            response.status()
        );
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn create_pr(
        &self,
        token: &str,
        pr_id: &str,
        pr_name: &str,
        author_id: &str,
    ) -> Result<Response<Body>> {
        self.post_json(
            "/pullRequest/create",
            &serde_json::json!({
                "pull_request_id": pr_id,
                "pull_request_name": pr_name,
                "author_id": author_id,
            }),
            Some(token),
        )
        .await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn head(&self, path: &str) -> Result<Response<Body>> {
        let request = Request::builder()
            .method(Method::HEAD)
            .uri(path)
            .body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }

    #[allow(dead_code)]
    pub async fn user_is_active(&self, user_id: &str) -> Result<bool> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            use reviewer_backend::schema::users::dsl;
            dsl::users
                .find(&user_id)
                .select(dsl::is_active)
                .first(conn)
                .context("failed to load user")
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn reviewers_of(&self, pr_id: &str) -> Result<Vec<String>> {
        let pr_id = pr_id.to_string();
        self.with_conn(move |conn| {
            use reviewer_backend::schema::pr_reviewers::dsl;
            dsl::pr_reviewers
                .filter(dsl::pull_request_id.eq(&pr_id))
                .order(dsl::user_id.asc())
                .select(dsl::user_id)
                .load(conn)
                .context("failed to load reviewers")
        })
        .await
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> Result<T> {
    let bytes = body_to_vec(response.into_body()).await?;
    serde_json::from_slice(&bytes)
        .map_err(|err| anyhow!("failed to decode response body: {err}"))
}

#[derive(Debug, serde::Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[allow(dead_code)]
#[derive(Debug, serde::Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[allow(dead_code)]
pub async fn error_code(response: Response<Body>) -> Result<String> {
    let body: ErrorBody = read_json(response).await?;
    Ok(body.error.code)
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE pr_reviewers, auth_tokens, pull_requests, users, teams CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
