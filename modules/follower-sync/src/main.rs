use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use follower_sync::{AppConfig, RefreshOptions, Refresher, SqlArtistStore};
use instagram_client::{InstagramClient, DEFAULT_APP_ID, DEFAULT_BASE_URL};

#[derive(Parser)]
#[command(
    name = "follower-sync",
    about = "Refresh Instagram follower counts for artists with stale stats"
)]
struct Cli {
    /// Minimum pause between profile requests, in seconds
    #[arg(long, default_value_t = 10)]
    delay_min: u64,

    /// Maximum pause between profile requests, in seconds
    #[arg(long, default_value_t = 30)]
    delay_max: u64,

    /// Process at most this many artists (0 = all due artists)
    #[arg(long, default_value_t = 0)]
    limit: usize,

    /// Refresh artists whose stats are older than this many days
    #[arg(long, default_value_t = 7)]
    stale_days: i64,

    /// Show which handles would be fetched without calling Instagram or writing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let options = RefreshOptions::new(
        cli.delay_min,
        cli.delay_max,
        cli.limit,
        cli.stale_days,
        cli.dry_run,
    )?;

    let config = AppConfig::from_env()?;

    let client = InstagramClient::with_options(
        config.instagram_base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        config.instagram_app_id.as_deref().unwrap_or(DEFAULT_APP_ID),
    )
    .context("Failed to build Instagram client")?;

    let store = SqlArtistStore::connect(&config.database_url)
        .await
        .context("Failed to connect to artist store")?;

    info!(
        dialect = ?store.dialect(),
        delay_min = cli.delay_min,
        delay_max = cli.delay_max,
        limit = cli.limit,
        stale_days = cli.stale_days,
        dry_run = cli.dry_run,
        "Starting follower refresh"
    );

    let result = Refresher::new(&store, &client, options).run().await;
    store.close().await;

    result.context("Follower refresh aborted")?;
    Ok(())
}
