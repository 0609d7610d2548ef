// Test mocks for the refresh controller.
//
// Two mocks matching the two trait boundaries:
// - MockArtistStore (ArtistStore) — fixed candidate list, records writes
// - ScriptedResolver (ProfileResolver) — per-handle queue of responses
//
// Plus `artist()` for building candidate rows.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{ResolveError, Result, SyncError};
use crate::traits::{ArtistStore, ProfileResolver};
use crate::types::{ArtistRecord, ProfileSnapshot};

/// A never-refreshed artist with the given profile reference.
pub fn artist(id: i64, name: &str, profile_url: &str) -> ArtistRecord {
    ArtistRecord {
        id,
        name: name.to_string(),
        profile_url: Some(profile_url.to_string()),
        follower_count: None,
        social_stats_updated_at: None,
        updated_at: None,
    }
}

pub fn snapshot(followers: u64) -> ProfileSnapshot {
    ProfileSnapshot {
        follower_count: followers,
        following_count: 0,
        post_count: 0,
    }
}

// ---------------------------------------------------------------------------
// MockArtistStore
// ---------------------------------------------------------------------------

/// One call to `apply_refresh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub id: i64,
    pub follower_count: i64,
    pub at: DateTime<Utc>,
}

/// Returns its candidates in insertion order (truncated to `limit`) and
/// records every write. Writes to ids in `failing_writes` return an error.
pub struct MockArtistStore {
    candidates: Vec<ArtistRecord>,
    failing_writes: HashSet<i64>,
    fail_select: bool,
    writes: Mutex<Vec<RecordedWrite>>,
    cutoffs: Mutex<Vec<DateTime<Utc>>>,
}

impl MockArtistStore {
    pub fn new(candidates: Vec<ArtistRecord>) -> Self {
        Self {
            candidates,
            failing_writes: HashSet::new(),
            fail_select: false,
            writes: Mutex::new(Vec::new()),
            cutoffs: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_write_for(mut self, id: i64) -> Self {
        self.failing_writes.insert(id);
        self
    }

    pub fn fail_select(mut self) -> Self {
        self.fail_select = true;
        self
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// Every `stale_before` the controller asked for.
    pub fn cutoffs(&self) -> Vec<DateTime<Utc>> {
        self.cutoffs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtistStore for MockArtistStore {
    async fn select_candidates(
        &self,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ArtistRecord>> {
        self.cutoffs.lock().unwrap().push(stale_before);
        if self.fail_select {
            return Err(SyncError::Database(sqlx::Error::PoolClosed));
        }
        let mut rows = self.candidates.clone();
        if limit > 0 {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn apply_refresh(&self, id: i64, follower_count: i64, now: DateTime<Utc>) -> Result<()> {
        if self.failing_writes.contains(&id) {
            return Err(SyncError::Database(sqlx::Error::PoolTimedOut));
        }
        self.writes.lock().unwrap().push(RecordedWrite {
            id,
            follower_count,
            at: now,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedResolver
// ---------------------------------------------------------------------------

type Response = std::result::Result<ProfileSnapshot, ResolveError>;

/// Pops the next scripted response for a handle on every call.
/// Unscripted handles (or exhausted queues) fail as `Transient`.
pub struct ScriptedResolver {
    responses: Mutex<HashMap<String, VecDeque<Response>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on(self, handle: &str, response: Response) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(handle.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn followers(self, handle: &str, followers: u64) -> Self {
        self.on(handle, Ok(snapshot(followers)))
    }

    pub fn rate_limited(self, handle: &str) -> Self {
        self.on(
            handle,
            Err(ResolveError::RateLimited("429 Too Many Requests".to_string())),
        )
    }

    pub fn not_found(self, handle: &str) -> Self {
        self.on(handle, Err(ResolveError::NotFound(handle.to_string())))
    }

    pub fn transient(self, handle: &str) -> Self {
        self.on(
            handle,
            Err(ResolveError::Transient("connection reset".to_string())),
        )
    }

    /// Handles in the order they were resolved.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for ScriptedResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileResolver for ScriptedResolver {
    async fn resolve(&self, handle: &str) -> Response {
        self.calls.lock().unwrap().push(handle.to_string());
        self.responses
            .lock()
            .unwrap()
            .get_mut(handle)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(ResolveError::Transient(format!("no response for {handle}"))))
    }
}
