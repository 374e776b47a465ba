use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use shared_config::AppConfig;

/// Shared application state handed to every cell router.
///
/// The pool is the single store handle for the whole process; components
/// receive it by injection, never through a global.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self, sqlx::Error> {
        let pool = connect(&config).await?;
        Ok(Self { pool, config })
    }
}

pub async fn connect(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await?;

    info!("Connected to Postgres ({} max connections)", config.max_db_connections);
    Ok(pool)
}
