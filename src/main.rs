use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use reviewer_backend::{
    auth::jwt::JwtService, config::AppConfig, db, routes, state::AppState,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        port = config.port,
        database_url = %config.redacted_database_url(),
        max_conns = config.db_max_conns,
        batch_fanout_limit = config.batch_fanout_limit,
        "loaded configuration"
    );

    let pool = db::init_pool_from_config(&config)?;
    run_migrations(&pool)?;
    tracing::info!("database ready");

    let jwt = JwtService::from_config(&config);
    let port = config.port;
    let state = AppState::new(pool, config, jwt);
    let router = routes::create_router(state);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(%port, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn run_migrations(pool: &db::PgPool) -> anyhow::Result<()> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow::anyhow!("failed to run migrations: {err}"))?;
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        tracing::info!("received shutdown signal");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
