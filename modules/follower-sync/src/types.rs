use chrono::{DateTime, Utc};

/// A row from the upstream `artists` table, aliased to logical names.
///
/// Owned by the main application. This crate only ever writes
/// `follower_count`, `social_stats_updated_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ArtistRecord {
    pub id: i64,
    pub name: String,
    pub profile_url: Option<String>,
    pub follower_count: Option<i64>,
    /// Set iff at least one refresh has succeeded.
    pub social_stats_updated_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Counters for one profile at the moment it was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSnapshot {
    pub follower_count: u64,
    pub following_count: u64,
    pub post_count: u64,
}
