//! Post input validation
//!
//! Rules are checked in a fixed order and the first failure wins:
//! title, summary, content, friendly URL, tags.

use crate::error::PostError;
use crate::models::PostInput;
use regex::Regex;

pub const MAX_TITLE_LEN: usize = 500;
pub const MAX_SUMMARY_LEN: usize = 1000;
pub const MAX_CONTENT_LEN: usize = 100_000;

/// Lowercase letters, digits and hyphens, 1 to 100 characters
pub const FRIENDLY_URL_PATTERN: &str = r"^[a-z0-9-]{1,100}$";

/// Validator holding the compiled friendly-URL pattern
#[derive(Debug, Clone)]
pub struct PostValidator {
    friendly_url: Regex,
}

impl PostValidator {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            friendly_url: Regex::new(FRIENDLY_URL_PATTERN)?,
        })
    }

    /// Check every rule, returning the first violated one
    pub fn validate(&self, input: &PostInput) -> Result<(), PostError> {
        if !is_valid_text(&input.title, MAX_TITLE_LEN) {
            return Err(PostError::InvalidTitle);
        }
        if !is_valid_text(&input.summary, MAX_SUMMARY_LEN) {
            return Err(PostError::InvalidSummary);
        }
        if !is_valid_text(&input.content, MAX_CONTENT_LEN) {
            return Err(PostError::InvalidContent);
        }
        if !self.is_valid_friendly_url(&input.friendly_url) {
            return Err(PostError::InvalidFriendlyUrl);
        }
        if input.tags.is_empty() || input.tags.iter().any(|t| is_blank(t)) {
            return Err(PostError::InvalidTags);
        }
        Ok(())
    }

    pub fn is_valid_friendly_url(&self, friendly_url: &str) -> bool {
        !is_blank(friendly_url) && self.friendly_url.is_match(friendly_url)
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Non-blank and at most `max_len` characters
fn is_valid_text(value: &str, max_len: usize) -> bool {
    !is_blank(value) && value.chars().count() <= max_len
}
