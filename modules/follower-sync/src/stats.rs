/// Per-run counters. Created at the start of a run, reported once at the end.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub updated: u32,
    pub errors: u32,
    pub skipped: u32,
    pub total: u32,
}

/// Terminal state of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Follower count written. `retried` is true when it took the cooldown retry.
    Updated { followers: u64, retried: bool },
    /// No usable handle in the stored URL.
    Skipped,
    /// Not found, rate limited twice, transient failure, or the write failed.
    Failed,
}

impl RunStats {
    pub fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Updated { .. } => self.updated += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.errors += 1,
        }
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "updated={} errors={} skipped={} total={}",
            self.updated, self.errors, self.skipped, self.total
        )
    }
}
