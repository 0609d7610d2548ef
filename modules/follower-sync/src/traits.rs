// Trait seams for the refresh controller.
//
// ArtistStore — candidate selection plus the single-row follower write.
// ProfileResolver — handle → public counters, with typed failures.
//
// Both have in-memory mocks in `testing` so the controller runs without a
// database or network.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use instagram_client::{InstagramClient, InstagramError};
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::types::{ArtistRecord, ProfileSnapshot};

// ---------------------------------------------------------------------------
// ArtistStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ArtistStore: Send + Sync {
    /// Artists with a profile reference whose stats are missing or older than
    /// `stale_before`, never-refreshed first, then oldest, then by id.
    /// `limit == 0` means no cap.
    async fn select_candidates(
        &self,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ArtistRecord>>;

    /// Write the follower count and stamp both timestamps with `now`.
    /// One row, one statement, committed before returning.
    async fn apply_refresh(&self, id: i64, follower_count: i64, now: DateTime<Utc>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// ProfileResolver
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProfileResolver: Send + Sync {
    /// One remote lookup. No caching between calls.
    async fn resolve(&self, handle: &str) -> std::result::Result<ProfileSnapshot, ResolveError>;
}

#[async_trait]
impl ProfileResolver for InstagramClient {
    async fn resolve(&self, handle: &str) -> std::result::Result<ProfileSnapshot, ResolveError> {
        let profile = self.profile(handle).await.map_err(ResolveError::from)?;
        debug!(
            handle,
            followers = profile.followers,
            following = profile.following,
            posts = profile.posts,
            "Resolved Instagram profile"
        );
        Ok(ProfileSnapshot {
            follower_count: profile.followers,
            following_count: profile.following,
            post_count: profile.posts,
        })
    }
}

impl From<InstagramError> for ResolveError {
    fn from(err: InstagramError) -> Self {
        match err {
            InstagramError::NotFound(username) => ResolveError::NotFound(username),
            limited if limited.is_rate_limited() => {
                ResolveError::RateLimited(limited.to_string())
            }
            other => ResolveError::Transient(other.to_string()),
        }
    }
}
