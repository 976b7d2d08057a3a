//! Database schema migrations
//!
//! Versioned, idempotent upgrades applied after the base tables exist.
//! Never modify an existing migration; add a new one and bump
//! `CURRENT_SCHEMA_VERSION`.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Get current schema version from database
///
/// Returns 0 if schema_version has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        if !migrate_v1(pool).await? {
            warn!("Migration v1 left pending; it is retried on next startup");
            return Ok(());
        }
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    Ok(())
}

/// Migration v1: UNIQUE index on post.friendly_url
///
/// Databases written before the index existed may already hold duplicate
/// slugs. Until they are resolved a plain index is kept and `false` is
/// returned, so the version is not recorded and the UNIQUE index is attempted
/// again on every startup.
async fn migrate_v1(pool: &SqlitePool) -> Result<bool> {
    let duplicates: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM (
            SELECT friendly_url FROM post GROUP BY friendly_url HAVING COUNT(*) > 1
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if duplicates > 0 {
        warn!(
            "Migration v1: {} friendly URLs are shared by several posts; \
             index idx_post_friendly_url stays without UNIQUE until they are resolved",
            duplicates
        );
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_post_friendly_url ON post(friendly_url)")
            .execute(pool)
            .await?;
        return Ok(false);
    }

    // Replaces the plain index left behind by an earlier deferred run
    let mut tx = pool.begin().await?;
    sqlx::query("DROP INDEX IF EXISTS idx_post_friendly_url")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE UNIQUE INDEX idx_post_friendly_url ON post(friendly_url)")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    info!("Migration v1: Added UNIQUE index on post.friendly_url");

    Ok(true)
}
