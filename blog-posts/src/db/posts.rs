//! Post database operations
//!
//! Friendly-URL uniqueness is the service's invariant. Lookups by friendly
//! URL therefore return every match rather than assuming at most one.

use super::{placeholders, MAX_IDS_PER_QUERY};
use blog_common::{time, uuid_utils, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::collections::BTreeSet;
use uuid::Uuid;

const POST_COLUMNS: &str =
    "id, title, summary, original_content, html_content, friendly_url, created_at, published_at";

/// Post row as stored, without tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub original_content: String,
    pub html_content: String,
    pub friendly_url: String,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

fn post_from_row(row: &SqliteRow) -> Result<PostRecord> {
    let id: String = row.try_get("id")?;
    let created_at: i64 = row.try_get("created_at")?;
    let published_at: Option<i64> = row.try_get("published_at")?;

    Ok(PostRecord {
        id: uuid_utils::parse_stored("post.id", &id)?,
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        original_content: row.try_get("original_content")?,
        html_content: row.try_get("html_content")?,
        friendly_url: row.try_get("friendly_url")?,
        created_at: time::from_micros("post.created_at", created_at)?,
        published_at: published_at
            .map(|micros| time::from_micros("post.published_at", micros))
            .transpose()?,
    })
}

/// Load post by id
pub async fn find_post_by_id(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<PostRecord>> {
    let sql = format!("SELECT {} FROM post WHERE id = ?", POST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(post_from_row).transpose()
}

/// Load every post using `friendly_url`
pub async fn find_posts_by_friendly_url(
    conn: &mut SqliteConnection,
    friendly_url: &str,
) -> Result<Vec<PostRecord>> {
    let sql = format!("SELECT {} FROM post WHERE friendly_url = ?", POST_COLUMNS);
    let rows = sqlx::query(&sql)
        .bind(friendly_url)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(post_from_row).collect()
}

/// Insert a new post row
pub async fn insert_post(conn: &mut SqliteConnection, post: &PostRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO post (
            id, title, summary, original_content, html_content,
            friendly_url, created_at, published_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.id.to_string())
    .bind(&post.title)
    .bind(&post.summary)
    .bind(&post.original_content)
    .bind(&post.html_content)
    .bind(&post.friendly_url)
    .bind(time::to_micros(post.created_at))
    .bind(post.published_at.map(time::to_micros))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Replace the mutable columns of a post
///
/// `id` and `created_at` are never written. Returns the number of rows
/// changed (0 when the id does not exist).
pub async fn update_post(conn: &mut SqliteConnection, post: &PostRecord) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE post SET
            published_at = ?,
            title = ?,
            summary = ?,
            original_content = ?,
            html_content = ?,
            friendly_url = ?
        WHERE id = ?
        "#,
    )
    .bind(post.published_at.map(time::to_micros))
    .bind(&post.title)
    .bind(&post.summary)
    .bind(&post.original_content)
    .bind(&post.html_content)
    .bind(&post.friendly_url)
    .bind(post.id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Search posts, newest first
///
/// With `fetch_unpublished` false only rows with a `published_at` are
/// returned. `restrict_to_ids` limits the result to those ids; an empty set
/// short-circuits to an empty result without querying. Rows created in the
/// same microsecond fall back to insertion order, newest first.
pub async fn search_posts(
    conn: &mut SqliteConnection,
    fetch_unpublished: bool,
    restrict_to_ids: Option<&BTreeSet<Uuid>>,
) -> Result<Vec<PostRecord>> {
    let Some(restrict_to_ids) = restrict_to_ids else {
        let rows = sqlx::query(&search_sql(fetch_unpublished, 0))
            .fetch_all(&mut *conn)
            .await?;
        return rows.iter().map(post_from_row).collect();
    };

    let ids: Vec<String> = restrict_to_ids.iter().map(Uuid::to_string).collect();
    let mut matches: Vec<(i64, PostRecord)> = Vec::new();

    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let sql = search_sql(fetch_unpublished, chunk.len());
        let mut query = sqlx::query(&sql);
        for id in chunk {
            query = query.bind(id);
        }

        for row in query.fetch_all(&mut *conn).await? {
            let rowid: i64 = row.try_get("rowid")?;
            matches.push((rowid, post_from_row(&row)?));
        }
    }

    // Chunks are each ordered; restore the global order across them
    matches.sort_by(|(rowid_a, a), (rowid_b, b)| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| rowid_b.cmp(rowid_a))
    });

    Ok(matches.into_iter().map(|(_, record)| record).collect())
}

/// SELECT for `search_posts`, with an `id IN (...)` of `id_count` placeholders when non-zero
fn search_sql(fetch_unpublished: bool, id_count: usize) -> String {
    let mut conditions = Vec::new();

    if !fetch_unpublished {
        conditions.push("published_at IS NOT NULL".to_string());
    }
    if id_count > 0 {
        conditions.push(format!("id IN ({})", placeholders(id_count)));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    format!(
        "SELECT rowid, {} FROM post {} ORDER BY created_at DESC, rowid DESC",
        POST_COLUMNS, where_clause
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use chrono::Duration;

    fn record(friendly_url: &str, created_at: DateTime<Utc>, published: bool) -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            title: format!("title {}", friendly_url),
            summary: "summary".to_string(),
            original_content: "content".to_string(),
            html_content: "<p>content</p>\n".to_string(),
            friendly_url: friendly_url.to_string(),
            created_at,
            published_at: published.then_some(created_at),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let (_dir, pool) = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let post = record("first", time::now(), false);

        insert_post(&mut conn, &post).await.unwrap();

        let loaded = find_post_by_id(&mut conn, post.id).await.unwrap();
        assert_eq!(loaded, Some(post));
        assert_eq!(find_post_by_id(&mut conn, Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_by_friendly_url() {
        let (_dir, pool) = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let post = record("slug", time::now(), false);
        insert_post(&mut conn, &post).await.unwrap();

        let found = find_posts_by_friendly_url(&mut conn, "slug").await.unwrap();
        assert_eq!(found, vec![post]);
        assert!(find_posts_by_friendly_url(&mut conn, "other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_leaves_created_at_alone() {
        let (_dir, pool) = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let post = record("before", time::now(), false);
        insert_post(&mut conn, &post).await.unwrap();

        let changed = PostRecord {
            title: "new title".to_string(),
            friendly_url: "after".to_string(),
            created_at: post.created_at + Duration::days(1),
            published_at: Some(time::now()),
            ..post.clone()
        };
        assert_eq!(update_post(&mut conn, &changed).await.unwrap(), 1);

        let loaded = find_post_by_id(&mut conn, post.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "new title");
        assert_eq!(loaded.friendly_url, "after");
        assert_eq!(loaded.published_at, changed.published_at);
        assert_eq!(loaded.created_at, post.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_row_changes_nothing() {
        let (_dir, pool) = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let ghost = record("ghost", time::now(), false);
        assert_eq!(update_post(&mut conn, &ghost).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_filters_and_orders() {
        let (_dir, pool) = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let base = time::now();
        let old_published = record("old", base - Duration::hours(2), true);
        let draft = record("draft", base - Duration::hours(1), false);
        let new_published = record("new", base, true);
        for post in [&draft, &new_published, &old_published] {
            insert_post(&mut conn, post).await.unwrap();
        }

        let published = search_posts(&mut conn, false, None).await.unwrap();
        assert_eq!(published, vec![new_published.clone(), old_published.clone()]);

        let all = search_posts(&mut conn, true, None).await.unwrap();
        assert_eq!(all, vec![new_published.clone(), draft.clone(), old_published.clone()]);

        let ids: BTreeSet<Uuid> = [draft.id, old_published.id].into_iter().collect();
        let restricted = search_posts(&mut conn, true, Some(&ids)).await.unwrap();
        assert_eq!(restricted, vec![draft, old_published]);
    }

    #[tokio::test]
    async fn test_search_with_empty_restriction_is_empty() {
        let (_dir, pool) = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        insert_post(&mut conn, &record("x", time::now(), true)).await.unwrap();

        let result = search_posts(&mut conn, true, Some(&BTreeSet::new())).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_search_same_timestamp_newest_insert_first() {
        let (_dir, pool) = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let at = time::now();
        let first = record("first", at, true);
        let second = record("second", at, true);
        insert_post(&mut conn, &first).await.unwrap();
        insert_post(&mut conn, &second).await.unwrap();

        let result = search_posts(&mut conn, false, None).await.unwrap();
        assert_eq!(result, vec![second, first]);
    }

    #[tokio::test]
    async fn test_search_restricted_to_more_ids_than_one_statement_binds() {
        let (_dir, pool) = test_pool().await;
        let mut tx = pool.begin().await.unwrap();
        let base = time::now();
        for i in 0..1200i64 {
            // Pairs share a timestamp so the rowid tiebreak spans chunk boundaries
            let post = record(&format!("post-{}", i), base - Duration::seconds(i / 2), i % 3 != 0);
            insert_post(&mut *tx, &post).await.unwrap();
        }
        tx.commit().await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let unrestricted = search_posts(&mut conn, false, None).await.unwrap();
        assert_eq!(unrestricted.len(), 800);

        let mut ids: BTreeSet<Uuid> = unrestricted.iter().map(|p| p.id).collect();
        ids.extend((0..33_000).map(|_| Uuid::new_v4()));

        let restricted = search_posts(&mut conn, false, Some(&ids)).await.unwrap();
        assert_eq!(restricted, unrestricted);
    }
}
