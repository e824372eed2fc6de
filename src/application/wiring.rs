//! Start-up wiring: strategy selection and cache backend.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::adapters::cache::InMemoryReviewCache;
use crate::adapters::oracles::{MockPersonaOracle, OracleRegistry};
use crate::adapters::sqlite::open_review_cache;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CacheBackend, CacheConfig, Config, OracleType, SynthesisStrategy};
use crate::domain::ports::{NullReviewCache, PersonaOracle, ReviewCache, ReviewSynthesizer};
use crate::services::{FixtureSynthesizer, OracleSynthesizer};

/// The collaborators a [`ReviewApp`](super::ReviewApp) is built from.
#[derive(Clone)]
pub struct Components {
    /// Strategy actually in use; never `Auto`
    pub strategy: SynthesisStrategy,
    /// Synthesizer without caching
    pub synthesizer: Arc<dyn ReviewSynthesizer>,
    pub persona_oracle: Arc<dyn PersonaOracle>,
    pub cache: Arc<dyn ReviewCache>,
}

/// Pick the concrete strategy for this configuration.
///
/// `auto` uses the oracle when it can run (mock backend, or an API key is
/// available) and the fixture otherwise.
pub fn resolve_strategy(config: &Config) -> SynthesisStrategy {
    match config.synthesis.strategy {
        SynthesisStrategy::Auto => {
            let usable = config.oracle.oracle_type == OracleType::Mock
                || config.oracle.resolve_api_key().is_some();
            if usable {
                SynthesisStrategy::Oracle
            } else {
                warn!("No API key configured, falling back to the fixture review");
                SynthesisStrategy::Fixture
            }
        }
        explicit => explicit,
    }
}

/// Build the synthesizer and persona oracle for the configured strategy.
pub fn build_synthesis(
    config: &Config,
) -> DomainResult<(SynthesisStrategy, Arc<dyn ReviewSynthesizer>, Arc<dyn PersonaOracle>)> {
    let strategy = resolve_strategy(config);
    match strategy {
        SynthesisStrategy::Oracle => {
            if config.oracle.oracle_type == OracleType::AnthropicApi
                && config.oracle.resolve_api_key().is_none()
            {
                return Err(DomainError::Configuration(
                    "the oracle strategy needs oracle.api_key or ANTHROPIC_API_KEY".to_string(),
                ));
            }
            let oracles = OracleRegistry::from_config(&config.oracle)
                .create_by_type(config.oracle.oracle_type)?;
            let synthesizer = OracleSynthesizer::new(
                oracles.review,
                Duration::from_secs(config.synthesis.review_timeout_secs),
            );
            info!(oracle = config.oracle.oracle_type.as_str(), "Using oracle review synthesis");
            Ok((strategy, Arc::new(synthesizer), oracles.persona))
        }
        SynthesisStrategy::Fixture | SynthesisStrategy::Auto => {
            info!("Using fixture review synthesis");
            Ok((
                SynthesisStrategy::Fixture,
                Arc::new(FixtureSynthesizer::new()),
                Arc::new(MockPersonaOracle::new()),
            ))
        }
    }
}

/// Open the configured review cache.
///
/// The cache is best-effort: a backend that fails to open is logged and
/// replaced by one that always misses.
pub async fn open_cache(config: &CacheConfig) -> Arc<dyn ReviewCache> {
    if !config.enabled {
        info!("Review cache disabled");
        return Arc::new(NullReviewCache);
    }
    match config.backend {
        CacheBackend::Memory => Arc::new(InMemoryReviewCache::new(config.retention_days)),
        CacheBackend::Sqlite => {
            match open_review_cache(&config.database_path, config.retention_days).await {
                Ok(cache) => Arc::new(cache),
                Err(err) => {
                    warn!(
                        path = %config.database_path,
                        error = %err,
                        "Could not open review cache, continuing without it"
                    );
                    Arc::new(NullReviewCache)
                }
            }
        }
    }
}

/// Assemble every collaborator from configuration.
pub async fn assemble(config: &Config) -> DomainResult<Components> {
    let (strategy, synthesizer, persona_oracle) = build_synthesis(config)?;
    let cache = open_cache(&config.cache).await;
    Ok(Components {
        strategy,
        synthesizer,
        persona_oracle,
        cache,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(strategy: SynthesisStrategy, oracle_type: OracleType, key: Option<&str>) -> Config {
        let mut config = Config::default();
        config.synthesis.strategy = strategy;
        config.oracle.oracle_type = oracle_type;
        config.oracle.api_key = key.map(str::to_string);
        config
    }

    #[test]
    fn test_auto_without_key_uses_fixture() {
        temp_env::with_var_unset("ANTHROPIC_API_KEY", || {
            let config = config_with(SynthesisStrategy::Auto, OracleType::AnthropicApi, None);
            assert_eq!(resolve_strategy(&config), SynthesisStrategy::Fixture);

            let (strategy, synthesizer, persona) = build_synthesis(&config).unwrap();
            assert_eq!(strategy, SynthesisStrategy::Fixture);
            assert_eq!(synthesizer.name(), "fixture");
            assert_eq!(persona.name(), "mock");
        });
    }

    #[test]
    fn test_auto_with_key_uses_oracle() {
        let config = config_with(SynthesisStrategy::Auto, OracleType::AnthropicApi, Some("sk-test"));
        let (strategy, synthesizer, persona) = build_synthesis(&config).unwrap();
        assert_eq!(strategy, SynthesisStrategy::Oracle);
        assert_eq!(synthesizer.name(), "oracle");
        assert_eq!(persona.name(), "anthropic_api");
    }

    #[test]
    fn test_env_key_enables_oracle() {
        temp_env::with_var("ANTHROPIC_API_KEY", Some("sk-env"), || {
            let config = config_with(SynthesisStrategy::Auto, OracleType::AnthropicApi, None);
            assert_eq!(resolve_strategy(&config), SynthesisStrategy::Oracle);
        });
    }

    #[test]
    fn test_mock_oracle_needs_no_key() {
        let config = config_with(SynthesisStrategy::Auto, OracleType::Mock, None);
        let (strategy, _, persona) = build_synthesis(&config).unwrap();
        assert_eq!(strategy, SynthesisStrategy::Oracle);
        assert_eq!(persona.name(), "mock");
    }

    #[test]
    fn test_explicit_oracle_without_key_is_rejected() {
        temp_env::with_var_unset("ANTHROPIC_API_KEY", || {
            let config = config_with(SynthesisStrategy::Oracle, OracleType::AnthropicApi, None);
            let err = build_synthesis(&config).err().unwrap();
            assert!(matches!(err, DomainError::Configuration(_)));
        });
    }

    #[tokio::test]
    async fn test_open_cache_backends() {
        let mut config = CacheConfig {
            backend: CacheBackend::Memory,
            ..CacheConfig::default()
        };
        let cache = open_cache(&config).await;
        assert_eq!(cache.purge_expired().await.unwrap(), 0);

        let dir = tempfile::tempdir().unwrap();
        config.backend = CacheBackend::Sqlite;
        config.database_path = dir.path().join("cache.db").display().to_string();
        let cache = open_cache(&config).await;
        assert_eq!(cache.purge_expired().await.unwrap(), 0);
        assert!(dir.path().join("cache.db").exists());
    }
}
