//! SQLite implementation of the ReviewCache.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Fingerprint, GameReview};
use crate::domain::ports::ReviewCache;

/// Timestamps are stored in one fixed-width format so they sort as text.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::Cache(format!("bad stored_at `{s}`: {e}")))
}

#[derive(Clone)]
pub struct SqliteReviewCache {
    pool: SqlitePool,
    retention: Duration,
}

impl SqliteReviewCache {
    pub fn new(pool: SqlitePool, retention_days: u32) -> Self {
        Self {
            pool,
            retention: Duration::days(i64::from(retention_days)),
        }
    }

    /// Store an entry with an explicit timestamp.
    pub async fn put_at(
        &self,
        fingerprint: &Fingerprint,
        review: &GameReview,
        stored_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let review_json = serde_json::to_string(review)?;

        sqlx::query(
            r#"INSERT INTO review_cache (fingerprint, review_json, stored_at)
               VALUES (?, ?, ?)
               ON CONFLICT(fingerprint) DO UPDATE SET
                   review_json = excluded.review_json,
                   stored_at = excluded.stored_at"#,
        )
        .bind(fingerprint.as_str())
        .bind(&review_json)
        .bind(format_timestamp(stored_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn cutoff(&self) -> DateTime<Utc> {
        Utc::now() - self.retention
    }
}

#[derive(sqlx::FromRow)]
struct CacheRow {
    review_json: String,
    stored_at: String,
}

#[async_trait]
impl ReviewCache for SqliteReviewCache {
    async fn get(&self, fingerprint: &Fingerprint) -> DomainResult<Option<GameReview>> {
        let row: Option<CacheRow> =
            sqlx::query_as("SELECT review_json, stored_at FROM review_cache WHERE fingerprint = ?")
                .bind(fingerprint.as_str())
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        if parse_timestamp(&row.stored_at)? < self.cutoff() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&row.review_json)?))
    }

    async fn put(&self, fingerprint: &Fingerprint, review: &GameReview) -> DomainResult<()> {
        self.put_at(fingerprint, review, Utc::now()).await
    }

    async fn purge_expired(&self) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM review_cache WHERE stored_at < ?")
            .bind(format_timestamp(self.cutoff()))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
