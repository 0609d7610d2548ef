pub mod config;
pub mod error;
pub mod handle;
pub mod refresh;
pub mod stats;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod types;

pub use config::{AppConfig, RefreshOptions};
pub use error::{ResolveError, Result, SyncError};
pub use handle::extract_handle;
pub use refresh::Refresher;
pub use stats::{Outcome, RunStats};
pub use store::{Dialect, SqlArtistStore};
pub use traits::{ArtistStore, ProfileResolver};
pub use types::{ArtistRecord, ProfileSnapshot};
