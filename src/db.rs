use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

use crate::config::AppConfig;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub const DEFAULT_MAX_CONNS: u32 = 25;
pub const DEFAULT_MIN_CONNS: u32 = 5;

pub fn init_pool(database_url: &str, max_size: u32) -> anyhow::Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size.max(1))
        .connection_timeout(Duration::from_secs(10))
        .build(manager)?;
    Ok(pool)
}

pub fn init_pool_from_config(config: &AppConfig) -> anyhow::Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(config.database_url());
    let pool = Pool::builder()
        .max_size(config.db_max_conns.max(1))
        .min_idle(Some(config.db_min_conns.min(config.db_max_conns)))
        .max_lifetime(Some(config.db_max_conn_lifetime))
        .idle_timeout(Some(config.db_max_conn_idle_time))
        .connection_timeout(Duration::from_secs(10))
        .build(manager)?;
    Ok(pool)
}
