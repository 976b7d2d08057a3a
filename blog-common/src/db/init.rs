//! Database initialization
//!
//! Opens (or creates) the SQLite file, applies connection pragmas and makes
//! sure the three blog tables exist before any service touches them.

use crate::config::DatabaseConfig;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path, config: &DatabaseConfig) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Per-connection pragmas
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Idempotent - safe to call on every startup
    create_schema_version_table(&pool).await?;
    create_post_table(&pool).await?;
    create_tag_table(&pool).await?;
    create_post_tag_table(&pool).await?;

    crate::db::migrations::run_migrations(&pool).await?;

    info!(
        "Database ready (busy timeout {} ms, max {} connections)",
        config.busy_timeout_ms, config.max_connections
    );

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the post table
///
/// `created_at` and `published_at` hold UTC microseconds since the epoch;
/// a NULL `published_at` marks a draft.
pub async fn create_post_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS post (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            summary TEXT NOT NULL,
            original_content TEXT NOT NULL,
            html_content TEXT NOT NULL,
            friendly_url TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            published_at INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_post_created_at ON post(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the tag table (the flat universe of known tag names)
pub async fn create_tag_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tag (
            name TEXT PRIMARY KEY
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the post_tag linking table
pub async fn create_post_tag_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS post_tag (
            post_id TEXT NOT NULL REFERENCES post(id) ON DELETE CASCADE,
            tag_name TEXT NOT NULL REFERENCES tag(name),
            PRIMARY KEY (post_id, tag_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_post_tag_tag_name ON post_tag(tag_name)")
        .execute(pool)
        .await?;

    Ok(())
}
