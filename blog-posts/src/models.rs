//! Post domain types

use crate::db::posts::PostRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A post together with its resolved tag set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    /// Markdown source as entered
    pub original_content: String,
    /// HTML rendered from `original_content` when it was last written
    pub html_content: String,
    pub friendly_url: String,
    pub created_at: DateTime<Utc>,
    /// `None` while the post is a draft
    pub published_at: Option<DateTime<Utc>>,
    pub tags: BTreeSet<String>,
}

impl Post {
    pub fn from_record(record: PostRecord, tags: BTreeSet<String>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            summary: record.summary,
            original_content: record.original_content,
            html_content: record.html_content,
            friendly_url: record.friendly_url,
            created_at: record.created_at,
            published_at: record.published_at,
            tags,
        }
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

/// Input for creating or updating a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub title: String,
    pub summary: String,
    /// Markdown source
    pub content: String,
    pub friendly_url: String,
    pub tags: BTreeSet<String>,
}

/// Prefills an edit form from an existing post
impl From<&Post> for PostInput {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            summary: post.summary.clone(),
            content: post.original_content.clone(),
            friendly_url: post.friendly_url.clone(),
            tags: post.tags.clone(),
        }
    }
}

/// Post search filter
///
/// The default query returns published posts with any tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Include drafts alongside published posts
    pub fetch_unpublished: bool,
    /// Only posts carrying this tag
    pub tag_name: Option<String>,
}

impl SearchQuery {
    /// Published and unpublished posts, as the admin list shows them
    pub fn all() -> Self {
        Self {
            fetch_unpublished: true,
            tag_name: None,
        }
    }

    /// Published posts carrying `tag_name`
    pub fn tagged(tag_name: impl Into<String>) -> Self {
        Self {
            fetch_unpublished: false,
            tag_name: Some(tag_name.into()),
        }
    }
}

/// Normalize tag names the way they are stored (lowercase)
pub fn normalize_tags<'a, I>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    tags.into_iter().map(|t| t.to_lowercase()).collect()
}
