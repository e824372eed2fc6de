//! In-memory ReviewCache for tests and single-process use.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Fingerprint, GameReview};
use crate::domain::ports::ReviewCache;

#[derive(Debug, Clone)]
struct Entry {
    review: Arc<GameReview>,
    stored_at: DateTime<Utc>,
}

/// Review cache held in a shared map.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct InMemoryReviewCache {
    entries: Arc<RwLock<HashMap<Fingerprint, Entry>>>,
    retention: Duration,
}

impl InMemoryReviewCache {
    pub fn new(retention_days: u32) -> Self {
        Self::with_retention(Duration::days(i64::from(retention_days)))
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    /// Store an entry with an explicit timestamp.
    pub async fn put_at(&self, fingerprint: &Fingerprint, review: &GameReview, stored_at: DateTime<Utc>) {
        let entry = Entry {
            review: Arc::new(review.clone()),
            stored_at,
        };
        self.entries.write().await.insert(fingerprint.clone(), entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn is_live(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        entry.stored_at >= now - self.retention
    }
}

impl Default for InMemoryReviewCache {
    fn default() -> Self {
        Self::new(7)
    }
}

#[async_trait]
impl ReviewCache for InMemoryReviewCache {
    async fn get(&self, fingerprint: &Fingerprint) -> DomainResult<Option<GameReview>> {
        let entries = self.entries.read().await;
        let now = Utc::now();
        Ok(entries
            .get(fingerprint)
            .filter(|entry| self.is_live(entry, now))
            .map(|entry| (*entry.review).clone()))
    }

    async fn put(&self, fingerprint: &Fingerprint, review: &GameReview) -> DomainResult<()> {
        self.put_at(fingerprint, review, Utc::now()).await;
        Ok(())
    }

    async fn purge_expired(&self) -> DomainResult<u64> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at >= now - self.retention);
        Ok((before - entries.len()) as u64)
    }
}
