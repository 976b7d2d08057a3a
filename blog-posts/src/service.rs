//! Post service
//!
//! Validates input and coordinates the post, tag and post-tag stores. Each
//! mutating operation follows the same shape:
//!
//! 1. Validate (no database access)
//! 2. Begin an immediate (write-locking) transaction
//! 3. Read, check, write through the stores on the transaction connection
//! 4. Commit
//!
//! Any early return drops the transaction, which rolls it back, so a post
//! row and its association rows are only ever visible together.
//!
//! Write transactions start with `BEGIN IMMEDIATE`, so concurrent writers
//! queue on the connection busy timeout instead of failing when a read lock
//! cannot be upgraded. A writer therefore sees every slug committed before it
//! started. The UNIQUE index on `post.friendly_url` remains as a backstop and
//! its constraint error is reported as `FriendlyUrlNotUnique`.

use crate::db::post_tags::{self, PostTag};
use crate::db::posts::{self, PostRecord};
use crate::db::tags;
use crate::error::{PostError, PublishPostError, UnpublishPostError};
use crate::markdown::MarkdownRenderer;
use crate::models::{normalize_tags, Post, PostInput, SearchQuery};
use crate::validation::PostValidator;
use blog_common::{time, uuid_utils, Error, Result};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Post lifecycle and search operations
#[derive(Debug, Clone)]
pub struct PostService {
    pool: SqlitePool,
    renderer: MarkdownRenderer,
    validator: PostValidator,
}

impl PostService {
    /// Create a service with the default renderer and validator
    pub fn new(pool: SqlitePool) -> Result<Self> {
        let validator = PostValidator::new()
            .map_err(|e| Error::Internal(format!("Friendly URL pattern failed to compile: {}", e)))?;
        Ok(Self::with_components(pool, MarkdownRenderer::default(), validator))
    }

    pub fn with_components(
        pool: SqlitePool,
        renderer: MarkdownRenderer,
        validator: PostValidator,
    ) -> Self {
        Self {
            pool,
            renderer,
            validator,
        }
    }

    /// Create a new, unpublished post
    pub async fn create_post(&self, input: &PostInput) -> std::result::Result<Post, PostError> {
        self.validate(input)?;

        let mut tx = self.begin_write().await?;

        let existing = posts::find_posts_by_friendly_url(&mut *tx, &input.friendly_url).await?;
        if !existing.is_empty() {
            warn!(friendly_url = %input.friendly_url, "Create rejected: friendly URL is not unique");
            return Err(PostError::FriendlyUrlNotUnique);
        }

        let tags = store_new_tags(&mut *tx, &input.tags).await?;

        let record = PostRecord {
            id: uuid_utils::generate(),
            title: input.title.clone(),
            summary: input.summary.clone(),
            original_content: input.content.clone(),
            html_content: self.renderer.render(&input.content),
            friendly_url: input.friendly_url.clone(),
            created_at: time::now(),
            published_at: None,
        };

        posts::insert_post(&mut *tx, &record)
            .await
            .map_err(slug_conflict_or_storage)?;
        store_post_associations(&mut *tx, record.id, &tags).await?;

        tx.commit().await?;

        info!(
            post_id = %record.id,
            friendly_url = %record.friendly_url,
            tag_count = tags.len(),
            "Created post"
        );

        Ok(Post::from_record(record, tags))
    }

    /// Replace a post's content fields and its whole tag set
    ///
    /// `id`, `created_at` and `published_at` are left untouched.
    pub async fn update_post(
        &self,
        post_id: Uuid,
        input: &PostInput,
    ) -> std::result::Result<Post, PostError> {
        self.validate(input)?;

        let mut tx = self.begin_write().await?;

        let tags = store_new_tags(&mut *tx, &input.tags).await?;

        let Some(current) = posts::find_post_by_id(&mut *tx, post_id).await? else {
            warn!(post_id = %post_id, "Update rejected: post not found");
            return Err(PostError::PostNotFound(post_id));
        };

        let collision = posts::find_posts_by_friendly_url(&mut *tx, &input.friendly_url)
            .await?
            .iter()
            .any(|other| other.id != post_id);
        if collision {
            warn!(
                post_id = %post_id,
                friendly_url = %input.friendly_url,
                "Update rejected: friendly URL is not unique"
            );
            return Err(PostError::FriendlyUrlNotUnique);
        }

        let record = PostRecord {
            title: input.title.clone(),
            summary: input.summary.clone(),
            original_content: input.content.clone(),
            html_content: self.renderer.render(&input.content),
            friendly_url: input.friendly_url.clone(),
            ..current
        };

        posts::update_post(&mut *tx, &record)
            .await
            .map_err(slug_conflict_or_storage)?;
        let removed = post_tags::delete_post_tags(&mut *tx, post_id).await?;
        store_post_associations(&mut *tx, post_id, &tags).await?;

        tx.commit().await?;

        info!(
            post_id = %post_id,
            friendly_url = %record.friendly_url,
            tags_removed = removed,
            tag_count = tags.len(),
            "Updated post"
        );

        Ok(Post::from_record(record, tags))
    }

    /// Unpublished -> Published
    pub async fn publish_post(&self, post_id: Uuid) -> std::result::Result<(), PublishPostError> {
        let mut tx = self.begin_write().await?;

        let Some(post) = posts::find_post_by_id(&mut *tx, post_id).await? else {
            return Err(PublishPostError::PostNotFound(post_id));
        };
        if post.published_at.is_some() {
            warn!(post_id = %post_id, "Publish rejected: already published");
            return Err(PublishPostError::PostAlreadyPublished(post_id));
        }

        let published_at = time::now();
        posts::update_post(
            &mut *tx,
            &PostRecord {
                published_at: Some(published_at),
                ..post
            },
        )
        .await?;

        tx.commit().await?;

        info!(post_id = %post_id, published_at = %published_at, "Published post");
        Ok(())
    }

    /// Published -> Unpublished
    pub async fn unpublish_post(&self, post_id: Uuid) -> std::result::Result<(), UnpublishPostError> {
        let mut tx = self.begin_write().await?;

        let Some(post) = posts::find_post_by_id(&mut *tx, post_id).await? else {
            return Err(UnpublishPostError::PostNotFound(post_id));
        };
        if post.published_at.is_none() {
            warn!(post_id = %post_id, "Unpublish rejected: already unpublished");
            return Err(UnpublishPostError::PostAlreadyUnpublished(post_id));
        }

        posts::update_post(
            &mut *tx,
            &PostRecord {
                published_at: None,
                ..post
            },
        )
        .await?;

        tx.commit().await?;

        info!(post_id = %post_id, "Unpublished post");
        Ok(())
    }

    /// Search posts, newest first
    ///
    /// A tag filter that matches no post returns an empty list without
    /// querying the post table.
    pub async fn search_posts(&self, query: &SearchQuery) -> Result<Vec<Post>> {
        let mut conn = self.pool.acquire().await?;

        let restrict_to_ids = match &query.tag_name {
            Some(tag_name) => {
                let ids: BTreeSet<Uuid> =
                    post_tags::find_post_tags_by_tag_name(&mut conn, &tag_name.to_lowercase())
                        .await?
                        .into_iter()
                        .map(|pt| pt.post_id)
                        .collect();
                if ids.is_empty() {
                    debug!(tag = %tag_name, "No posts carry tag");
                    return Ok(Vec::new());
                }
                Some(ids)
            }
            None => None,
        };

        let records =
            posts::search_posts(&mut conn, query.fetch_unpublished, restrict_to_ids.as_ref())
                .await?;
        let result = assemble_posts(&mut conn, records).await?;

        debug!(
            fetch_unpublished = query.fetch_unpublished,
            tag = ?query.tag_name,
            count = result.len(),
            "Searched posts"
        );

        Ok(result)
    }

    /// Load one post with its tags
    pub async fn find_by_id(&self, post_id: Uuid) -> Result<Option<Post>> {
        let mut conn = self.pool.acquire().await?;

        let Some(record) = posts::find_post_by_id(&mut conn, post_id).await? else {
            return Ok(None);
        };
        Ok(assemble_posts(&mut conn, vec![record]).await?.pop())
    }

    /// The published post at `friendly_url`, as a public post page shows it
    pub async fn find_published_by_friendly_url(&self, friendly_url: &str) -> Result<Option<Post>> {
        let mut conn = self.pool.acquire().await?;

        let published: Vec<PostRecord> = posts::find_posts_by_friendly_url(&mut conn, friendly_url)
            .await?
            .into_iter()
            .filter(|p| p.published_at.is_some())
            .take(1)
            .collect();

        Ok(assemble_posts(&mut conn, published).await?.pop())
    }

    /// Every known tag name
    pub async fn list_tags(&self) -> Result<BTreeSet<String>> {
        let mut conn = self.pool.acquire().await?;
        tags::find_all_tags(&mut conn).await
    }

    /// Transaction holding the database write lock from its first statement
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    fn validate(&self, input: &PostInput) -> std::result::Result<(), PostError> {
        self.validator.validate(input).map_err(|e| {
            warn!(reason = %e, field = ?e.field(), "Validation failed");
            e
        })
    }
}

/// Insert the requested tags that are not yet known; returns the normalized set
async fn store_new_tags(
    conn: &mut SqliteConnection,
    requested: &BTreeSet<String>,
) -> Result<BTreeSet<String>> {
    let tags = normalize_tags(requested);
    let known = tags::find_all_tags(&mut *conn).await?;

    let new_tags: BTreeSet<String> = tags.difference(&known).cloned().collect();
    if !new_tags.is_empty() {
        debug!(new_tags = ?new_tags, "Storing new tags");
        tags::insert_tags(&mut *conn, &new_tags).await?;
    }

    Ok(tags)
}

async fn store_post_associations(
    conn: &mut SqliteConnection,
    post_id: Uuid,
    tags: &BTreeSet<String>,
) -> Result<()> {
    let post_tags: Vec<PostTag> = tags.iter().map(|t| PostTag::new(post_id, t.as_str())).collect();
    post_tags::insert_post_tags(conn, &post_tags).await
}

/// Join tags onto post rows with one association lookup, keeping row order
async fn assemble_posts(conn: &mut SqliteConnection, records: Vec<PostRecord>) -> Result<Vec<Post>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let ids: BTreeSet<Uuid> = records.iter().map(|r| r.id).collect();
    let mut tags_by_post: HashMap<Uuid, BTreeSet<String>> = HashMap::new();
    for post_tag in post_tags::find_post_tags_by_post_ids(conn, &ids).await? {
        tags_by_post
            .entry(post_tag.post_id)
            .or_default()
            .insert(post_tag.tag_name);
    }

    Ok(records
        .into_iter()
        .map(|record| {
            let tags = tags_by_post.remove(&record.id).unwrap_or_default();
            Post::from_record(record, tags)
        })
        .collect())
}

/// A UNIQUE violation on friendly_url means a concurrent writer won the slug
fn slug_conflict_or_storage(err: Error) -> PostError {
    if err.is_unique_violation_on("friendly_url") {
        warn!("Friendly URL claimed concurrently: {}", err);
        PostError::FriendlyUrlNotUnique
    } else {
        PostError::Storage(err)
    }
}
