//! SQLite storage for the review cache.

pub mod connection;
pub mod migrations;
pub mod review_cache;

pub use connection::{create_pool, create_test_pool, database_url, ConnectionError, PoolConfig};
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use review_cache::SqliteReviewCache;

use sqlx::SqlitePool;

use crate::domain::errors::DomainResult;

/// Open (creating if needed) the cache database at `path` and bring its schema
/// up to date.
pub async fn open_review_cache(path: &str, retention_days: u32) -> DomainResult<SqliteReviewCache> {
    let pool: SqlitePool = create_pool(&database_url(path), None).await?;
    Migrator::new(pool.clone())
        .run_embedded_migrations(all_embedded_migrations())
        .await?;
    Ok(SqliteReviewCache::new(pool, retention_days))
}
