//! Post-tag association database operations

use super::{placeholders, MAX_IDS_PER_QUERY};
use blog_common::{uuid_utils, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::collections::BTreeSet;
use uuid::Uuid;

/// "Post `post_id` is tagged `tag_name`"
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PostTag {
    pub post_id: Uuid,
    pub tag_name: String,
}

impl PostTag {
    pub fn new(post_id: Uuid, tag_name: impl Into<String>) -> Self {
        Self {
            post_id,
            tag_name: tag_name.into(),
        }
    }
}

fn post_tag_from_row(row: &SqliteRow) -> Result<PostTag> {
    let post_id: String = row.try_get("post_id")?;
    Ok(PostTag {
        post_id: uuid_utils::parse_stored("post_tag.post_id", &post_id)?,
        tag_name: row.try_get("tag_name")?,
    })
}

/// Associations for any of the given posts
pub async fn find_post_tags_by_post_ids(
    conn: &mut SqliteConnection,
    post_ids: &BTreeSet<Uuid>,
) -> Result<Vec<PostTag>> {
    let ids: Vec<String> = post_ids.iter().map(Uuid::to_string).collect();
    let mut post_tags = Vec::new();

    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let sql = format!(
            "SELECT post_id, tag_name FROM post_tag WHERE post_id IN ({})",
            placeholders(chunk.len())
        );
        let mut query = sqlx::query(&sql);
        for id in chunk {
            query = query.bind(id);
        }

        for row in query.fetch_all(&mut *conn).await? {
            post_tags.push(post_tag_from_row(&row)?);
        }
    }

    Ok(post_tags)
}

/// Associations carrying `tag_name`
pub async fn find_post_tags_by_tag_name(
    conn: &mut SqliteConnection,
    tag_name: &str,
) -> Result<Vec<PostTag>> {
    let rows = sqlx::query("SELECT post_id, tag_name FROM post_tag WHERE tag_name = ?")
        .bind(tag_name)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(post_tag_from_row).collect()
}

/// Insert associations; the caller guarantees no duplicates within one call
pub async fn insert_post_tags(conn: &mut SqliteConnection, post_tags: &[PostTag]) -> Result<()> {
    for post_tag in post_tags {
        sqlx::query("INSERT INTO post_tag (post_id, tag_name) VALUES (?, ?)")
            .bind(post_tag.post_id.to_string())
            .bind(&post_tag.tag_name)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Remove every association of a post, returning how many rows went
pub async fn delete_post_tags(conn: &mut SqliteConnection, post_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM post_tag WHERE post_id = ?")
        .bind(post_id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
