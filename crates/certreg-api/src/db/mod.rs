//! # Database Persistence Layer
//!
//! Postgres persistence for the ledger journal via SQLx.
//!
//! The database is **optional**. With a connection string the service
//! appends every committed journal entry to `ledger_journal` and rebuilds
//! the ledger from it on startup. Without one the ledger lives in memory and
//! is lost on restart.
//!
//! Only the journal is stored. Admins and certificates are derived state.

pub mod journal;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the connection pool and run migrations.
///
/// Returns `None` when no URL is configured (in-memory mode).
/// Returns `Err` when a URL is configured but connecting or migrating fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::warn!(
            "DATABASE_URL not set, running in-memory only mode. \
             The ledger will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
