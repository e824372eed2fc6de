//! Review cache backends: shared contract, persistence and expiry.

mod common;

use chrono::{Duration, Utc};

use message_chess::adapters::cache::InMemoryReviewCache;
use message_chess::adapters::sqlite::{open_review_cache, SqliteReviewCache};
use message_chess::domain::models::{Fingerprint, GameReview, ImageFormat, ScreenshotRef};
use message_chess::domain::ports::{ReviewCache, SynthesisRequest};
use message_chess::services::demo_review;

use common::short_transcript;

async fn sqlite_cache(retention_days: u32) -> (tempfile::TempDir, SqliteReviewCache) {
    let (dir, path) = common::temp_db_path();
    let cache = open_review_cache(&path.display().to_string(), retention_days)
        .await
        .expect("cache opens");
    (dir, cache)
}

fn renamed(opening: &str) -> GameReview {
    let mut review = demo_review().unwrap();
    review.opening_name = opening.to_string();
    review
}

async fn check_contract(cache: &dyn ReviewCache) {
    let fp = Fingerprint::of_bytes(b"contract");
    assert!(cache.get(&fp).await.unwrap().is_none());

    cache.put(&fp, &renamed("First")).await.unwrap();
    cache.put(&fp, &renamed("Second")).await.unwrap();

    let stored = cache.get(&fp).await.unwrap().unwrap();
    assert_eq!(stored.opening_name, "Second");
    assert_eq!(cache.purge_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn test_backends_share_contract() {
    check_contract(&InMemoryReviewCache::default()).await;

    let (_dir, cache) = sqlite_cache(7).await;
    check_contract(&cache).await;
}

#[tokio::test]
async fn test_sqlite_entries_persist_across_reopen() {
    let (dir, path) = common::temp_db_path();
    let path = path.display().to_string();
    let fp = Fingerprint::of_bytes(common::PNG_BYTES);

    {
        let cache = open_review_cache(&path, 7).await.unwrap();
        cache.put(&fp, &renamed("Persisted")).await.unwrap();
    }

    let reopened = open_review_cache(&path, 7).await.unwrap();
    let stored = reopened.get(&fp).await.unwrap().unwrap();
    assert_eq!(stored.opening_name, "Persisted");
    drop(dir);
}

#[tokio::test]
async fn test_expired_entries_read_as_missing_and_purge() {
    let (_dir, cache) = sqlite_cache(7).await;
    let old = Fingerprint::of_bytes(b"old");
    let fresh = Fingerprint::of_bytes(b"fresh");
    let review = demo_review().unwrap();

    cache
        .put_at(&old, &review, Utc::now() - Duration::days(8))
        .await
        .unwrap();
    cache
        .put_at(&fresh, &review, Utc::now() - Duration::days(6))
        .await
        .unwrap();

    assert!(cache.get(&old).await.unwrap().is_none());
    assert!(cache.get(&fresh).await.unwrap().is_some());
    assert_eq!(cache.purge_expired().await.unwrap(), 1);
    assert_eq!(cache.purge_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn test_memory_expiry_matches_sqlite() {
    let cache = InMemoryReviewCache::new(7);
    let old = Fingerprint::of_bytes(b"old");
    cache
        .put_at(&old, &demo_review().unwrap(), Utc::now() - Duration::days(30))
        .await;

    assert!(cache.get(&old).await.unwrap().is_none());
    assert_eq!(cache.purge_expired().await.unwrap(), 1);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_concurrent_writers_leave_one_complete_entry() {
    let (_dir, cache) = sqlite_cache(7).await;
    let fp = Fingerprint::of_bytes(b"contended");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            let fp = fp.clone();
            tokio::spawn(async move { cache.put(&fp, &renamed(&format!("Writer {i}"))).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = cache.get(&fp).await.unwrap().unwrap();
    assert!(stored.opening_name.starts_with("Writer "));
    assert_eq!(stored.message_reviews, demo_review().unwrap().message_reviews);
}

#[test]
fn test_fingerprints_separate_inputs() {
    let png = ScreenshotRef::from_bytes(ImageFormat::Png, common::PNG_BYTES);
    let same_png = ScreenshotRef::from_bytes(ImageFormat::Png, common::PNG_BYTES);
    let jpeg = ScreenshotRef::from_bytes(ImageFormat::Jpeg, common::JPEG_BYTES);

    let a = SynthesisRequest::screenshot(png).fingerprint();
    assert_eq!(a, SynthesisRequest::screenshot(same_png).fingerprint());
    assert_ne!(a, SynthesisRequest::screenshot(jpeg).fingerprint());

    let transcript = SynthesisRequest::transcript(short_transcript()).fingerprint();
    assert_eq!(
        transcript,
        SynthesisRequest::transcript(short_transcript()).fingerprint()
    );
    assert_ne!(a, transcript);
}
