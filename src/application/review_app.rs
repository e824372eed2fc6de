//! The wired-up review system.
//!
//! `ReviewApp` is the outward surface: screenshot and transcript reviews, the
//! practice run API and cache maintenance. `GameReview` is the only payload
//! it hands out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Config, GameReview, Message, Persona, RunId, RunSnapshot, SynthesisStrategy,
};
use crate::domain::ports::{ReviewCache, ReviewSynthesizer, SynthesisRequest};
use crate::services::{
    CachingSynthesizer, RunService, RunServiceConfig, ScreenshotIngest, TurnOutcome,
};

use super::wiring::{assemble, Components};

/// Facade over ingestion, synthesis, caching and practice runs.
pub struct ReviewApp {
    strategy: SynthesisStrategy,
    ingest: ScreenshotIngest,
    synthesizer: Arc<dyn ReviewSynthesizer>,
    cached: Arc<CachingSynthesizer>,
    cache: Arc<dyn ReviewCache>,
    runs: RunService,
}

impl ReviewApp {
    /// Build everything from configuration.
    pub async fn from_config(config: &Config) -> DomainResult<Self> {
        let components = assemble(config).await?;
        Ok(Self::with_components(config, components))
    }

    /// Build from explicit collaborators.
    pub fn with_components(config: &Config, components: Components) -> Self {
        let Components {
            strategy,
            synthesizer,
            persona_oracle,
            cache,
        } = components;

        let cached = Arc::new(CachingSynthesizer::new(
            synthesizer.clone(),
            cache.clone(),
            Duration::from_millis(config.cache.timeout_ms),
        ));
        let runs = RunService::new(
            persona_oracle,
            cached.clone(),
            RunServiceConfig::from(&config.runs),
        );

        Self {
            strategy,
            ingest: ScreenshotIngest::new(config.upload.max_bytes),
            synthesizer,
            cached,
            cache,
            runs,
        }
    }

    pub const fn strategy(&self) -> SynthesisStrategy {
        self.strategy
    }

    pub fn personas(&self) -> &'static [Persona] {
        self.runs.personas()
    }

    /// Review a conversation screenshot, served from the cache when possible.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn synthesize_from_image(&self, bytes: &[u8]) -> DomainResult<GameReview> {
        let image = self.ingest.accept(bytes)?;
        self.cached.synthesize(SynthesisRequest::screenshot(image)).await
    }

    /// Review a screenshot without reading or writing the cache.
    pub async fn synthesize_from_image_uncached(&self, bytes: &[u8]) -> DomainResult<GameReview> {
        let image = self.ingest.accept(bytes)?;
        self.synthesizer.synthesize(SynthesisRequest::screenshot(image)).await
    }

    /// Review a known transcript.
    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    pub async fn analyze_transcript(&self, messages: Vec<Message>) -> DomainResult<GameReview> {
        self.cached.synthesize(SynthesisRequest::transcript(messages)).await
    }

    pub async fn start_run(&self, persona_id: Option<&str>) -> DomainResult<RunSnapshot> {
        self.runs.start(persona_id).await
    }

    pub async fn start_replacing(
        &self,
        prior: &RunId,
        persona_id: Option<&str>,
    ) -> DomainResult<RunSnapshot> {
        self.runs.start_replacing(prior, persona_id).await
    }

    pub async fn submit_user_message(&self, run_id: &RunId, text: &str) -> DomainResult<TurnOutcome> {
        self.runs.submit_user_message(run_id, text).await
    }

    pub async fn end_early(&self, run_id: &RunId) -> DomainResult<()> {
        self.runs.end_early(run_id).await
    }

    pub async fn current_state(&self, run_id: &RunId) -> DomainResult<RunSnapshot> {
        self.runs.current_state(run_id).await
    }

    pub async fn retry_review(&self, run_id: &RunId) -> DomainResult<RunSnapshot> {
        self.runs.retry_review(run_id).await
    }

    /// Delete expired cache entries.
    pub async fn purge_cache(&self) -> DomainResult<u64> {
        let purged = self.cache.purge_expired().await?;
        info!(purged, "Purged expired review cache entries");
        Ok(purged)
    }
}
