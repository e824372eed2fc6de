//! Result cache port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Fingerprint, GameReview};

/// Content-addressed store of finished reviews.
///
/// Entries are whole-review replacements, so concurrent `put`s for the same
/// fingerprint resolve last-writer-wins. Entries older than the retention
/// window read as missing.
#[async_trait]
pub trait ReviewCache: Send + Sync {
    /// Look up a live entry.
    async fn get(&self, fingerprint: &Fingerprint) -> DomainResult<Option<GameReview>>;

    /// Store or overwrite an entry.
    async fn put(&self, fingerprint: &Fingerprint, review: &GameReview) -> DomainResult<()>;

    /// Drop expired entries; returns how many were removed.
    async fn purge_expired(&self) -> DomainResult<u64>;
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReviewCache;

#[async_trait]
impl ReviewCache for NullReviewCache {
    async fn get(&self, _fingerprint: &Fingerprint) -> DomainResult<Option<GameReview>> {
        Ok(None)
    }

    async fn put(&self, _fingerprint: &Fingerprint, _review: &GameReview) -> DomainResult<()> {
        Ok(())
    }

    async fn purge_expired(&self) -> DomainResult<u64> {
        Ok(0)
    }
}
