//! One refresh pass over the artists whose follower counts are due.
//!
//! Strictly sequential: select candidates, then for each one extract the
//! handle, resolve the profile (retrying once after a cooldown when rate
//! limited), write the result, and pause a random interval before the next
//! request. Per-artist failures are logged and counted, never propagated.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::RefreshOptions;
use crate::error::{ResolveError, Result};
use crate::handle::extract_handle;
use crate::stats::{Outcome, RunStats};
use crate::traits::{ArtistStore, ProfileResolver};
use crate::types::{ArtistRecord, ProfileSnapshot};

/// How many candidates a dry run lists before summarizing the rest.
pub const DRY_RUN_PREVIEW: usize = 20;

pub struct Refresher<'a> {
    store: &'a dyn ArtistStore,
    resolver: &'a dyn ProfileResolver,
    options: RefreshOptions,
}

impl<'a> Refresher<'a> {
    pub fn new(
        store: &'a dyn ArtistStore,
        resolver: &'a dyn ProfileResolver,
        options: RefreshOptions,
    ) -> Self {
        Self {
            store,
            resolver,
            options,
        }
    }

    /// Run the pass. Only candidate selection can fail the run.
    pub async fn run(&self) -> Result<RunStats> {
        let started = Instant::now();
        let stale_before = Utc::now()
            .checked_sub_signed(self.options.stale_after)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let candidates = self
            .store
            .select_candidates(stale_before, self.options.limit)
            .await?;
        info!(
            count = candidates.len(),
            stale_before = %stale_before,
            limit = self.options.limit,
            "Selected artists for follower refresh"
        );

        if self.options.dry_run {
            info!("Dry run: no profile requests or writes will be made");
            for line in dry_run_report(&candidates) {
                info!("{line}");
            }
            return Ok(RunStats {
                total: candidates.len() as u32,
                ..RunStats::default()
            });
        }

        let mut stats = RunStats::default();
        for (i, artist) in candidates.iter().enumerate() {
            let outcome = self.refresh_artist(artist).await;
            stats.record(outcome);

            let is_last = i + 1 == candidates.len();
            if !is_last && outcome != Outcome::Skipped {
                self.pace().await;
            }
        }

        info!(
            updated = stats.updated,
            errors = stats.errors,
            skipped = stats.skipped,
            total = stats.total,
            elapsed_secs = started.elapsed().as_secs(),
            "Follower refresh complete: {stats}"
        );
        Ok(stats)
    }

    async fn refresh_artist(&self, artist: &ArtistRecord) -> Outcome {
        let raw = artist.profile_url.as_deref().unwrap_or_default();
        let Some(handle) = extract_handle(raw) else {
            info!(
                artist = %artist.name,
                artist_id = artist.id,
                profile_url = raw,
                "Skipping: no Instagram handle in profile URL"
            );
            return Outcome::Skipped;
        };

        match self.resolver.resolve(&handle).await {
            Ok(snapshot) => self.persist(artist, &handle, snapshot, false).await,
            Err(ResolveError::NotFound(_)) => {
                warn!(
                    artist = %artist.name,
                    artist_id = artist.id,
                    handle = %handle,
                    "Instagram profile not found"
                );
                Outcome::Failed
            }
            Err(ResolveError::RateLimited(reason)) => {
                let cooldown = self.options.rate_limit_cooldown;
                warn!(
                    artist = %artist.name,
                    handle = %handle,
                    cooldown_secs = cooldown.as_secs(),
                    reason = %reason,
                    "Rate limited, cooling down before one retry"
                );
                tokio::time::sleep(cooldown).await;

                match self.resolver.resolve(&handle).await {
                    Ok(snapshot) => self.persist(artist, &handle, snapshot, true).await,
                    Err(e) => {
                        error!(
                            artist = %artist.name,
                            artist_id = artist.id,
                            handle = %handle,
                            error = %e,
                            "Retry after rate-limit cooldown failed"
                        );
                        Outcome::Failed
                    }
                }
            }
            Err(ResolveError::Transient(reason)) => {
                error!(
                    artist = %artist.name,
                    artist_id = artist.id,
                    handle = %handle,
                    error = %reason,
                    "Failed to fetch Instagram profile"
                );
                Outcome::Failed
            }
        }
    }

    async fn persist(
        &self,
        artist: &ArtistRecord,
        handle: &str,
        snapshot: ProfileSnapshot,
        retried: bool,
    ) -> Outcome {
        let followers = i64::try_from(snapshot.follower_count).unwrap_or(i64::MAX);

        match self.store.apply_refresh(artist.id, followers, Utc::now()).await {
            Ok(()) => {
                if retried {
                    info!(
                        artist = %artist.name,
                        handle,
                        followers,
                        "Updated after rate-limit retry"
                    );
                } else {
                    info!(artist = %artist.name, handle, followers, "Updated follower count");
                }
                Outcome::Updated {
                    followers: snapshot.follower_count,
                    retried,
                }
            }
            Err(e) => {
                error!(
                    artist = %artist.name,
                    artist_id = artist.id,
                    handle,
                    error = %e,
                    "Failed to write follower count"
                );
                Outcome::Failed
            }
        }
    }

    async fn pace(&self) {
        let delay = pacing_delay(self.options.delay_min, self.options.delay_max);
        debug!(delay_secs = delay.as_secs_f64(), "Pausing before next artist");
        tokio::time::sleep(delay).await;
    }
}

/// Uniform pause in `[min, max]` at millisecond resolution.
pub fn pacing_delay(min: Duration, max: Duration) -> Duration {
    let min_ms = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    if min_ms >= max_ms {
        return min;
    }
    Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
}

/// Lines a dry run prints: name and handle for the first candidates, then a
/// count of the rest.
pub fn dry_run_report(candidates: &[ArtistRecord]) -> Vec<String> {
    let mut lines: Vec<String> = candidates
        .iter()
        .take(DRY_RUN_PREVIEW)
        .map(|artist| {
            let raw = artist.profile_url.as_deref().unwrap_or_default();
            match extract_handle(raw) {
                Some(handle) => format!("  {} → @{}", artist.name, handle),
                None => format!("  {} → unresolvable ({})", artist.name, raw),
            }
        })
        .collect();

    if candidates.len() > DRY_RUN_PREVIEW {
        lines.push(format!(
            "  ... and {} more",
            candidates.len() - DRY_RUN_PREVIEW
        ));
    }
    lines
}
