// SQL persistence for the upstream `artists` table.
//
// The controller only sees `ArtistStore`. Everything that differs between
// drivers (placeholders, null ordering, column casts) lives in `Dialect`.
//
// SQLite has no timestamp type. The upstream app writes `Y-m-d H:i:s` UTC
// text, so this store writes the same and compares through `datetime()`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{info, warn};

use crate::error::{Result, SyncError};
use crate::traits::ArtistStore;
use crate::types::ArtistRecord;

/// SQL flavour of the configured store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Pick the dialect from a `DATABASE_URL` scheme.
    pub fn from_url(database_url: &str) -> Result<Self> {
        let scheme = database_url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_lowercase())
            .unwrap_or_default();

        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "" => Err(SyncError::UnsupportedStore(
                "DATABASE_URL has no scheme".to_string(),
            )),
            other => Err(SyncError::UnsupportedStore(format!(
                "no dialect for scheme '{other}' (expected postgres, mysql or sqlite)"
            ))),
        }
    }

    fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${n}"),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Columns aliased to `ArtistRecord` fields, cast where the driver is
    /// strict about integer width or timestamp zone.
    fn record_columns(self) -> &'static str {
        match self {
            Dialect::Postgres => {
                "id::bigint AS id, \
                 COALESCE(name, '') AS name, \
                 instagram_url AS profile_url, \
                 followers_instagram::bigint AS follower_count, \
                 social_stats_updated_at::timestamptz AS social_stats_updated_at, \
                 updated_at::timestamptz AS updated_at"
            }
            Dialect::MySql => {
                "CAST(id AS SIGNED) AS id, \
                 COALESCE(name, '') AS name, \
                 instagram_url AS profile_url, \
                 CAST(followers_instagram AS SIGNED) AS follower_count, \
                 social_stats_updated_at, \
                 updated_at"
            }
            Dialect::Sqlite => {
                "id, \
                 COALESCE(name, '') AS name, \
                 instagram_url AS profile_url, \
                 followers_instagram AS follower_count, \
                 social_stats_updated_at, \
                 updated_at"
            }
        }
    }

    /// Refresh-time expression that compares chronologically.
    fn refreshed_at(self) -> &'static str {
        match self {
            Dialect::Postgres | Dialect::MySql => "social_stats_updated_at",
            Dialect::Sqlite => "datetime(social_stats_updated_at)",
        }
    }

    fn cutoff(self) -> String {
        match self {
            Dialect::Postgres | Dialect::MySql => self.placeholder(1),
            Dialect::Sqlite => format!("datetime({})", self.placeholder(1)),
        }
    }

    /// Never-refreshed rows first, then oldest refresh, then id.
    fn stalest_first(self) -> String {
        match self {
            Dialect::Postgres => "social_stats_updated_at ASC NULLS FIRST, id ASC".to_string(),
            Dialect::MySql | Dialect::Sqlite => format!(
                "social_stats_updated_at IS NULL DESC, {} ASC, id ASC",
                self.refreshed_at()
            ),
        }
    }

    /// Candidate query. Binds the cutoff, then the limit when `limited`.
    pub fn select_candidates_sql(self, limited: bool) -> String {
        let mut sql = format!(
            "SELECT {columns} FROM artists \
             WHERE instagram_url IS NOT NULL AND instagram_url <> '' \
             AND (social_stats_updated_at IS NULL OR {refreshed_at} < {cutoff}) \
             ORDER BY {order}",
            columns = self.record_columns(),
            refreshed_at = self.refreshed_at(),
            cutoff = self.cutoff(),
            order = self.stalest_first(),
        );
        if limited {
            sql.push_str(&format!(" LIMIT {}", self.placeholder(2)));
        }
        sql
    }

    /// Single-row update. Binds follower count, refresh time, modified time, id.
    pub fn apply_refresh_sql(self) -> String {
        format!(
            "UPDATE artists SET followers_instagram = {}, social_stats_updated_at = {}, \
             updated_at = {} WHERE id = {}",
            self.placeholder(1),
            self.placeholder(2),
            self.placeholder(3),
            self.placeholder(4),
        )
    }
}

/// Timestamp text in the upstream app's SQLite layout.
fn sqlite_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

enum StorePool {
    Postgres(PgPool),
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

/// `ArtistStore` over a single-connection pool of any supported driver.
pub struct SqlArtistStore {
    dialect: Dialect,
    pool: StorePool,
}

impl SqlArtistStore {
    /// Open one connection to the store named by `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let dialect = Dialect::from_url(database_url)?;
        let pool = match dialect {
            Dialect::Postgres => StorePool::Postgres(
                PgPoolOptions::new()
                    .max_connections(1)
                    .connect(database_url)
                    .await?,
            ),
            Dialect::MySql => StorePool::MySql(
                MySqlPoolOptions::new()
                    .max_connections(1)
                    .connect(database_url)
                    .await?,
            ),
            Dialect::Sqlite => StorePool::Sqlite(
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .connect(database_url)
                    .await?,
            ),
        };
        info!(dialect = ?dialect, "Connected to artist store");
        Ok(Self { dialect, pool })
    }

    /// Wrap a pool the caller already owns, e.g. an in-memory database
    /// shared with the code that created its schema.
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            dialect: Dialect::Sqlite,
            pool: StorePool::Sqlite(pool),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Release the connection. Call once, at the end of the run.
    pub async fn close(&self) {
        match &self.pool {
            StorePool::Postgres(pool) => pool.close().await,
            StorePool::MySql(pool) => pool.close().await,
            StorePool::Sqlite(pool) => pool.close().await,
        }
    }
}

#[async_trait]
impl ArtistStore for SqlArtistStore {
    async fn select_candidates(
        &self,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ArtistRecord>> {
        let limit = (limit > 0).then(|| i64::try_from(limit).unwrap_or(i64::MAX));
        let sql = self.dialect.select_candidates_sql(limit.is_some());

        let rows = match &self.pool {
            StorePool::Postgres(pool) => {
                let mut query =
                    sqlx::query_as::<sqlx::Postgres, ArtistRecord>(&sql).bind(stale_before);
                if let Some(limit) = limit {
                    query = query.bind(limit);
                }
                query.fetch_all(pool).await?
            }
            StorePool::MySql(pool) => {
                let mut query =
                    sqlx::query_as::<sqlx::MySql, ArtistRecord>(&sql).bind(stale_before);
                if let Some(limit) = limit {
                    query = query.bind(limit);
                }
                query.fetch_all(pool).await?
            }
            StorePool::Sqlite(pool) => {
                let mut query = sqlx::query_as::<sqlx::Sqlite, ArtistRecord>(&sql)
                    .bind(sqlite_timestamp(stale_before));
                if let Some(limit) = limit {
                    query = query.bind(limit);
                }
                query.fetch_all(pool).await?
            }
        };

        Ok(rows)
    }

    async fn apply_refresh(&self, id: i64, follower_count: i64, now: DateTime<Utc>) -> Result<()> {
        let sql = self.dialect.apply_refresh_sql();

        let rows_affected = match &self.pool {
            StorePool::Postgres(pool) => {
                let mut tx = pool.begin().await?;
                let result = sqlx::query(&sql)
                    .bind(follower_count)
                    .bind(now)
                    .bind(now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                result.rows_affected()
            }
            StorePool::MySql(pool) => {
                let mut tx = pool.begin().await?;
                let result = sqlx::query(&sql)
                    .bind(follower_count)
                    .bind(now)
                    .bind(now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                result.rows_affected()
            }
            StorePool::Sqlite(pool) => {
                let now = sqlite_timestamp(now);
                let mut tx = pool.begin().await?;
                let result = sqlx::query(&sql)
                    .bind(follower_count)
                    .bind(now.clone())
                    .bind(now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                result.rows_affected()
            }
        };

        // MySQL reports zero affected rows when the values were already equal.
        if rows_affected == 0 && self.dialect != Dialect::MySql {
            warn!(artist_id = id, "Follower update matched no rows");
        }
        Ok(())
    }
}
