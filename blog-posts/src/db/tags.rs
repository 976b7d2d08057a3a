//! Tag database operations
//!
//! The tag table is a flat, deduplicated universe of names. Rows are added
//! lazily when a post first references a name and are never deleted.

use blog_common::Result;
use sqlx::SqliteConnection;
use std::collections::BTreeSet;

/// All known tag names
pub async fn find_all_tags(conn: &mut SqliteConnection) -> Result<BTreeSet<String>> {
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM tag")
        .fetch_all(&mut *conn)
        .await?;

    Ok(names.into_iter().collect())
}

/// Insert tag names
///
/// Names that already exist are ignored, so calling this with an
/// unfiltered set is harmless.
pub async fn insert_tags(conn: &mut SqliteConnection, names: &BTreeSet<String>) -> Result<()> {
    for name in names {
        sqlx::query("INSERT OR IGNORE INTO tag (name) VALUES (?)")
            .bind(name)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
