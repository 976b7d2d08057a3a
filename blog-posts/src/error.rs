//! Error types for post operations
//!
//! Domain outcomes (bad input, slug conflicts, state conflicts) are ordinary
//! variants; anything the storage layer raises arrives as `Storage`.

use thiserror::Error;
use uuid::Uuid;

/// Create/update post error
///
/// Validation variants are listed in the order they are checked.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("Invalid title.")]
    InvalidTitle,

    #[error("Invalid summary.")]
    InvalidSummary,

    #[error("Invalid content.")]
    InvalidContent,

    #[error("Invalid friendly URL.")]
    InvalidFriendlyUrl,

    #[error("Invalid tags.")]
    InvalidTags,

    /// Another post already uses the requested friendly URL
    #[error("Friendly URL is not unique.")]
    FriendlyUrlNotUnique,

    /// Update targeted an id with no post behind it
    #[error("Post not found: {0}")]
    PostNotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] blog_common::Error),
}

impl PostError {
    /// Input field the error belongs to, for field-level display
    pub fn field(&self) -> Option<&'static str> {
        match self {
            PostError::InvalidTitle => Some("title"),
            PostError::InvalidSummary => Some("summary"),
            PostError::InvalidContent => Some("content"),
            PostError::InvalidFriendlyUrl | PostError::FriendlyUrlNotUnique => Some("friendlyUrl"),
            PostError::InvalidTags => Some("tags"),
            PostError::PostNotFound(_) | PostError::Storage(_) => None,
        }
    }
}

impl From<sqlx::Error> for PostError {
    fn from(err: sqlx::Error) -> Self {
        PostError::Storage(err.into())
    }
}

/// Publish post error
#[derive(Debug, Error)]
pub enum PublishPostError {
    #[error("Post not found: {0}")]
    PostNotFound(Uuid),

    #[error("Post '{0}' is already published.")]
    PostAlreadyPublished(Uuid),

    #[error(transparent)]
    Storage(#[from] blog_common::Error),
}

impl From<sqlx::Error> for PublishPostError {
    fn from(err: sqlx::Error) -> Self {
        PublishPostError::Storage(err.into())
    }
}

/// Unpublish post error
#[derive(Debug, Error)]
pub enum UnpublishPostError {
    #[error("Post not found: {0}")]
    PostNotFound(Uuid),

    #[error("Post '{0}' is already unpublished.")]
    PostAlreadyUnpublished(Uuid),

    #[error(transparent)]
    Storage(#[from] blog_common::Error),
}

impl From<sqlx::Error> for UnpublishPostError {
    fn from(err: sqlx::Error) -> Self {
        UnpublishPostError::Storage(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_mapping() {
        assert_eq!(PostError::InvalidTitle.field(), Some("title"));
        assert_eq!(PostError::InvalidSummary.field(), Some("summary"));
        assert_eq!(PostError::InvalidContent.field(), Some("content"));
        assert_eq!(PostError::InvalidFriendlyUrl.field(), Some("friendlyUrl"));
        assert_eq!(PostError::FriendlyUrlNotUnique.field(), Some("friendlyUrl"));
        assert_eq!(PostError::InvalidTags.field(), Some("tags"));
        assert_eq!(PostError::PostNotFound(Uuid::nil()).field(), None);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(PostError::FriendlyUrlNotUnique.to_string(), "Friendly URL is not unique.");
        assert_eq!(
            PublishPostError::PostAlreadyPublished(Uuid::nil()).to_string(),
            "Post '00000000-0000-0000-0000-000000000000' is already published."
        );
    }

    #[test]
    fn test_sqlx_error_is_storage() {
        let err = PostError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, PostError::Storage(blog_common::Error::Database(_))));
    }
}
