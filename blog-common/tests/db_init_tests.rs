//! Tests for database initialization and schema migrations

use blog_common::config::DatabaseConfig;
use blog_common::db::{get_schema_version, init_database, run_migrations};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("blog.db");

    let result = init_database(&db_path, &DatabaseConfig::default()).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("blog.db");

    let pool1 = init_database(&db_path, &DatabaseConfig::default()).await;
    assert!(pool1.is_ok());
    drop(pool1);

    // Second open must not re-run migrations or fail on existing tables
    let pool2 = init_database(&db_path, &DatabaseConfig::default()).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_blog_tables_created() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("blog.db"), &DatabaseConfig::default())
        .await
        .unwrap();

    for table in ["post", "tag", "post_tag", "schema_version"] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists, "table {} missing", table);
    }
}

#[tokio::test]
async fn test_schema_version_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("blog.db"), &DatabaseConfig::default())
        .await
        .unwrap();

    assert_eq!(get_schema_version(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn test_friendly_url_is_unique_in_storage() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("blog.db"), &DatabaseConfig::default())
        .await
        .unwrap();

    let insert = "INSERT INTO post (id, title, summary, original_content, html_content, \
                  friendly_url, created_at) VALUES (?, 't', 's', 'c', '<p>c</p>', 'same-url', 0)";

    sqlx::query(insert).bind("a").execute(&pool).await.unwrap();
    let err = sqlx::query(insert).bind("b").execute(&pool).await.unwrap_err();

    let err = blog_common::Error::from(err);
    assert!(
        err.is_unique_violation_on("friendly_url"),
        "expected unique violation, got {:?}",
        err
    );
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("blog.db"), &DatabaseConfig::default())
        .await
        .unwrap();

    let result = sqlx::query("INSERT INTO post_tag (post_id, tag_name) VALUES ('missing', 'rust')")
        .execute(&pool)
        .await;

    assert!(result.is_err(), "post_tag row without post/tag should be rejected");
}

#[tokio::test]
async fn test_unique_index_retried_once_duplicates_are_resolved() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("blog.db"), &DatabaseConfig::default())
        .await
        .unwrap();

    // Roll back to a database written before the UNIQUE index existed
    sqlx::query("DROP INDEX idx_post_friendly_url").execute(&pool).await.unwrap();
    sqlx::query("DELETE FROM schema_version").execute(&pool).await.unwrap();

    let insert = "INSERT INTO post (id, title, summary, original_content, html_content, \
                  friendly_url, created_at) VALUES (?, 't', 's', 'c', '<p>c</p>', 'same-url', 0)";
    sqlx::query(insert).bind("a").execute(&pool).await.unwrap();
    sqlx::query(insert).bind("b").execute(&pool).await.unwrap();

    run_migrations(&pool).await.unwrap();
    assert_eq!(get_schema_version(&pool).await.unwrap(), 0);

    sqlx::query("DELETE FROM post WHERE id = 'b'").execute(&pool).await.unwrap();
    run_migrations(&pool).await.unwrap();
    assert_eq!(get_schema_version(&pool).await.unwrap(), 1);

    let err = sqlx::query(insert).bind("c").execute(&pool).await.unwrap_err();
    assert!(blog_common::Error::from(err).is_unique_violation_on("friendly_url"));
}
