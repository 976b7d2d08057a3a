//! blog-posts library - post and tag lifecycle for the blog
//!
//! Owns the post/tag data model and the operations that mutate and query it:
//! create, update, publish/unpublish and search. Every mutating operation
//! runs inside one SQLite transaction so a post row and its tag association
//! rows are never observed half-written.

pub mod db;
pub mod error;
pub mod markdown;
pub mod models;
pub mod service;
pub mod validation;

pub use error::{PostError, PublishPostError, UnpublishPostError};
pub use markdown::MarkdownRenderer;
pub use models::{Post, PostInput, SearchQuery};
pub use service::PostService;
pub use validation::PostValidator;
