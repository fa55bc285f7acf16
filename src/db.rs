// src/db.rs
use crate::error::AppResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub async fn create_db_pool() -> AppResult<SqlitePool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    tracing::info!("Connecting to database: {}", database_url);

    // Create the file if it does not exist yet; busy timeout covers
    // concurrent writers against the same thesis.
    let options = SqliteConnectOptions::from_str(&database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations complete.");

    Ok(pool)
}

#[cfg(test)]
pub async fn create_test_pool() -> SqlitePool {
    // A single connection keeps the in-memory database alive and shared for
    // the whole test; more connections would each get their own empty db.
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("in-memory connect options");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations on test pool");

    pool
}
