//! Database access for posts, tags and their associations
//!
//! Store functions take `&mut SqliteConnection` so the same query runs on a
//! pooled connection for reads or inside a transaction (`&mut *tx`) for
//! writes. None of them begin or commit transactions themselves.

pub mod post_tags;
pub mod posts;
pub mod tags;

/// Upper bound on ids bound into one `IN (...)` clause
///
/// SQLite rejects statements with more host parameters than its compile-time
/// limit, so id sets are queried in chunks of this size.
pub(crate) const MAX_IDS_PER_QUERY: usize = 500;

/// `?, ?, ?` placeholder list for an `IN (...)` clause
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
