//! SqlArtistStore against an in-memory SQLite database.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use follower_sync::{ArtistStore, SqlArtistStore};

const SCHEMA: &str = r#"
CREATE TABLE artists (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    instagram_url TEXT,
    followers_instagram INTEGER,
    social_stats_updated_at TIMESTAMP,
    updated_at TIMESTAMP
)
"#;

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
}

async fn sqlite_store() -> (SqlitePool, SqlArtistStore) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");
    sqlx::query(SCHEMA)
        .execute(&pool)
        .await
        .expect("Failed to create artists table");
    (pool.clone(), SqlArtistStore::sqlite(pool))
}

async fn insert(
    pool: &SqlitePool,
    id: i64,
    url: Option<&str>,
    refreshed: Option<DateTime<Utc>>,
) {
    sqlx::query(
        "INSERT INTO artists (id, name, instagram_url, followers_instagram, social_stats_updated_at, updated_at) \
         VALUES (?, ?, ?, NULL, ?, ?)",
    )
    .bind(id)
    .bind(format!("Artist {id}"))
    .bind(url)
    .bind(refreshed)
    .bind(at(1))
    .execute(pool)
    .await
    .expect("Failed to insert artist");
}

/// Row whose refresh time is stored the way the upstream app writes it.
async fn insert_text(pool: &SqlitePool, id: i64, url: &str, refreshed: &str) {
    sqlx::query(
        "INSERT INTO artists (id, name, instagram_url, followers_instagram, social_stats_updated_at, updated_at) \
         VALUES (?, ?, ?, NULL, ?, ?)",
    )
    .bind(id)
    .bind(format!("Artist {id}"))
    .bind(url)
    .bind(refreshed)
    .bind(refreshed)
    .execute(pool)
    .await
    .expect("Failed to insert artist");
}

/// Rows 1..=8 covering every eligibility case. Cutoff used below is day 10.
async fn seed(pool: &SqlitePool) {
    insert(pool, 1, Some("@fresh"), Some(at(20))).await;
    insert(pool, 2, Some("@stale_newer"), Some(at(5))).await;
    insert(pool, 3, Some("@never_a"), None).await;
    insert(pool, 4, None, None).await;
    insert(pool, 5, Some(""), None).await;
    insert(pool, 6, Some("@stale_older"), Some(at(2))).await;
    insert(pool, 7, Some("@never_b"), None).await;
    insert(pool, 8, Some("@at_cutoff"), Some(at(10))).await;
}

#[tokio::test]
async fn selects_due_artists_stalest_first() {
    let (pool, store) = sqlite_store().await;
    seed(&pool).await;

    let rows = store.select_candidates(at(10), 0).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    // Never refreshed (by id), then oldest refresh first. Fresh, empty,
    // missing and exactly-at-cutoff rows are excluded.
    assert_eq!(ids, vec![3, 7, 6, 2]);
    for row in &rows {
        if let Some(refreshed) = row.social_stats_updated_at {
            assert!(refreshed < at(10));
        }
    }
    assert_eq!(rows[0].name, "Artist 3");
    assert_eq!(rows[0].profile_url.as_deref(), Some("@never_a"));
    assert_eq!(rows[2].social_stats_updated_at, Some(at(2)));
}

#[tokio::test]
async fn limit_keeps_the_stalest() {
    let (pool, store) = sqlite_store().await;
    seed(&pool).await;

    let rows = store.select_candidates(at(10), 3).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 7, 6]);
}

#[tokio::test]
async fn apply_refresh_sets_all_three_fields() {
    let (pool, store) = sqlite_store().await;
    seed(&pool).await;

    let now = at(15);
    store.apply_refresh(3, 1500, now).await.unwrap();

    let (followers, refreshed, updated): (Option<i64>, Option<DateTime<Utc>>, Option<DateTime<Utc>>) =
        sqlx::query_as(
            "SELECT followers_instagram, social_stats_updated_at, updated_at FROM artists WHERE id = ?",
        )
        .bind(3_i64)
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(followers, Some(1500));
    assert_eq!(refreshed, Some(now));
    assert_eq!(updated, Some(now));

    // Refreshed after the cutoff, so no longer a candidate.
    let ids: Vec<i64> = store
        .select_candidates(at(10), 0)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert!(!ids.contains(&3));
}

#[tokio::test]
async fn apply_refresh_is_idempotent() {
    let (pool, store) = sqlite_store().await;
    seed(&pool).await;

    store.apply_refresh(2, 980, at(15)).await.unwrap();
    let first: (i64, DateTime<Utc>) = sqlx::query_as(
        "SELECT followers_instagram, social_stats_updated_at FROM artists WHERE id = 2",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    store.apply_refresh(2, 980, at(15)).await.unwrap();
    let second: (i64, DateTime<Utc>) = sqlx::query_as(
        "SELECT followers_instagram, social_stats_updated_at FROM artists WHERE id = 2",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, (980, at(15)));
}

#[tokio::test]
async fn apply_refresh_leaves_other_rows_alone() {
    let (pool, store) = sqlite_store().await;
    seed(&pool).await;

    store.apply_refresh(6, 42, at(15)).await.unwrap();

    let untouched: Vec<(i64, Option<i64>)> =
        sqlx::query_as("SELECT id, followers_instagram FROM artists WHERE id <> 6 ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert!(untouched.iter().all(|(_, followers)| followers.is_none()));
}

#[tokio::test]
async fn plain_text_refresh_after_cutoff_is_not_due() {
    let (pool, store) = sqlite_store().await;
    insert_text(&pool, 1, "@later_that_day", "2024-03-10 18:00:00").await;
    insert_text(&pool, 2, "@earlier_that_day", "2024-03-10 06:00:00").await;

    let ids: Vec<i64> = store
        .select_candidates(at(10), 0)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![2]);
}

#[tokio::test]
async fn mixed_timestamp_layouts_sort_chronologically() {
    let (pool, store) = sqlite_store().await;
    // Same day: 18:00 as plain text, 12:00 as RFC 3339.
    insert_text(&pool, 1, "@evening", "2024-03-03 18:00:00").await;
    insert(&pool, 2, Some("@noon"), Some(at(3))).await;

    let ids: Vec<i64> = store
        .select_candidates(at(10), 0)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn apply_refresh_writes_upstream_timestamp_layout() {
    let (pool, store) = sqlite_store().await;
    seed(&pool).await;

    store.apply_refresh(3, 1500, at(15)).await.unwrap();

    let (refreshed, updated): (String, String) = sqlx::query_as(
        "SELECT social_stats_updated_at, updated_at FROM artists WHERE id = 3",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(refreshed, "2024-03-15 12:00:00");
    assert_eq!(updated, "2024-03-15 12:00:00");
}

#[tokio::test]
async fn connect_rejects_unknown_scheme() {
    let err = SqlArtistStore::connect("mssql://localhost/artists")
        .await
        .err()
        .expect("mssql should be rejected");
    assert!(matches!(err, follower_sync::SyncError::UnsupportedStore(_)));
}
