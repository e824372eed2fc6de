//! Caching decorator for review synthesizers.
//!
//! Reviews are memoized by the fingerprint of their input. The cache is
//! best-effort: slow or failing cache I/O is logged and treated as a miss, and
//! a failed write never fails the request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Fingerprint, GameReview};
use crate::domain::ports::{ReviewCache, ReviewSynthesizer, SynthesisRequest};
use crate::services::schema_validator::validate;

/// Synthesizer decorator that consults a review cache first.
pub struct CachingSynthesizer {
    inner: Arc<dyn ReviewSynthesizer>,
    cache: Arc<dyn ReviewCache>,
    io_timeout: Duration,
}

impl CachingSynthesizer {
    pub fn new(inner: Arc<dyn ReviewSynthesizer>, cache: Arc<dyn ReviewCache>, io_timeout: Duration) -> Self {
        Self {
            inner,
            cache,
            io_timeout,
        }
    }

    fn timeout_error(&self, operation: &str) -> DomainError {
        DomainError::Timeout {
            operation: operation.to_string(),
            after_ms: u64::try_from(self.io_timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    async fn lookup(&self, fingerprint: &Fingerprint) -> Option<GameReview> {
        let result = tokio::time::timeout(self.io_timeout, self.cache.get(fingerprint))
            .await
            .unwrap_or_else(|_| Err(self.timeout_error("cache read")));

        match result {
            Ok(Some(review)) => match validate(review) {
                Ok(review) => Some(review),
                Err(violation) => {
                    warn!(fingerprint = fingerprint.short(), %violation, "Ignoring invalid cached review");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(fingerprint = fingerprint.short(), error = %err, "Review cache read failed");
                None
            }
        }
    }

    async fn store(&self, fingerprint: &Fingerprint, review: &GameReview) {
        let result = tokio::time::timeout(self.io_timeout, self.cache.put(fingerprint, review))
            .await
            .unwrap_or_else(|_| Err(self.timeout_error("cache write")));

        if let Err(err) = result {
            warn!(fingerprint = fingerprint.short(), error = %err, "Review cache write failed");
        }
    }
}

#[async_trait]
impl ReviewSynthesizer for CachingSynthesizer {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn synthesize(&self, request: SynthesisRequest) -> DomainResult<GameReview> {
        request.check_input()?;
        let fingerprint = request.fingerprint();

        if let Some(review) = self.lookup(&fingerprint).await {
            info!(fingerprint = fingerprint.short(), "Review cache hit");
            return Ok(review);
        }

        debug!(fingerprint = fingerprint.short(), synthesizer = self.inner.name(), "Review cache miss");
        let review = self.inner.synthesize(request).await?;
        self.store(&fingerprint, &review).await;
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryReviewCache;
    use crate::adapters::oracles::{MockResponse, MockReviewOracle};
    use crate::domain::models::{ImageFormat, ScreenshotRef};
    use crate::domain::ports::NullReviewCache;
    use crate::services::fixture_synthesizer::demo_review;
    use crate::services::oracle_synthesizer::OracleSynthesizer;

    struct BrokenCache;

    #[async_trait]
    impl ReviewCache for BrokenCache {
        async fn get(&self, _fingerprint: &Fingerprint) -> DomainResult<Option<GameReview>> {
            Err(DomainError::Cache("disk on fire".to_string()))
        }

        async fn put(&self, _fingerprint: &Fingerprint, _review: &GameReview) -> DomainResult<()> {
            Err(DomainError::Cache("disk on fire".to_string()))
        }

        async fn purge_expired(&self) -> DomainResult<u64> {
            Ok(0)
        }
    }

    struct SlowCache;

    #[async_trait]
    impl ReviewCache for SlowCache {
        async fn get(&self, _fingerprint: &Fingerprint) -> DomainResult<Option<GameReview>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn put(&self, _fingerprint: &Fingerprint, _review: &GameReview) -> DomainResult<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }

        async fn purge_expired(&self) -> DomainResult<u64> {
            Ok(0)
        }
    }

    fn request(bytes: &[u8]) -> SynthesisRequest {
        SynthesisRequest::screenshot(ScreenshotRef::from_bytes(ImageFormat::Png, bytes))
    }

    fn setup(cache: Arc<dyn ReviewCache>) -> (Arc<MockReviewOracle>, CachingSynthesizer) {
        let oracle = Arc::new(MockReviewOracle::new());
        let inner = Arc::new(OracleSynthesizer::new(oracle.clone(), Duration::from_secs(5)));
        let caching = CachingSynthesizer::new(inner, cache, Duration::from_millis(50));
        (oracle, caching)
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let (oracle, synthesizer) = setup(Arc::new(InMemoryReviewCache::default()));

        let first = synthesizer.synthesize(request(b"same")).await.unwrap();
        let second = synthesizer.synthesize(request(b"same")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(oracle.calls().await, 1);

        synthesizer.synthesize(request(b"different")).await.unwrap();
        assert_eq!(oracle.calls().await, 2);
    }

    #[tokio::test]
    async fn test_failed_synthesis_is_not_cached() {
        let cache = Arc::new(InMemoryReviewCache::default());
        let (oracle, synthesizer) = setup(cache.clone());
        oracle.push_response(MockResponse::failure("bad key")).await;

        assert!(synthesizer.synthesize(request(b"img")).await.is_err());
        assert!(cache.is_empty().await);
        assert!(synthesizer.synthesize(request(b"img")).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_cached_entry_is_ignored() {
        let cache = Arc::new(InMemoryReviewCache::default());
        let mut corrupt = demo_review().unwrap();
        corrupt.messages.clear();
        let req = request(b"img");
        cache.put(&req.fingerprint(), &corrupt).await.unwrap();

        let (oracle, synthesizer) = setup(cache);
        let review = synthesizer.synthesize(req).await.unwrap();
        assert!(!review.messages.is_empty());
        assert_eq!(oracle.calls().await, 1);
    }

    #[tokio::test]
    async fn test_broken_cache_degrades_to_miss() {
        let (oracle, synthesizer) = setup(Arc::new(BrokenCache));
        assert!(synthesizer.synthesize(request(b"img")).await.is_ok());
        assert!(synthesizer.synthesize(request(b"img")).await.is_ok());
        assert_eq!(oracle.calls().await, 2);
    }

    #[tokio::test]
    async fn test_slow_cache_times_out_to_miss() {
        let (oracle, synthesizer) = setup(Arc::new(SlowCache));
        let review = tokio::time::timeout(Duration::from_secs(5), synthesizer.synthesize(request(b"img")))
            .await
            .expect("cache timeouts should bound the request")
            .unwrap();
        assert!(!review.message_reviews.is_empty());
        assert_eq!(oracle.calls().await, 1);
    }

    #[tokio::test]
    async fn test_null_cache_always_misses() {
        let (oracle, synthesizer) = setup(Arc::new(NullReviewCache));
        synthesizer.synthesize(request(b"img")).await.unwrap();
        synthesizer.synthesize(request(b"img")).await.unwrap();
        assert_eq!(oracle.calls().await, 2);
    }
}
