//! Oracle registry and factory.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{OracleConfig, OracleType};
use crate::domain::ports::{PersonaOracle, ReviewOracle};

use super::anthropic_api::{AnthropicApiConfig, AnthropicApiOracle};
use super::mock::{MockPersonaOracle, MockReviewOracle};

/// Review and persona oracles created from one backend.
#[derive(Clone)]
pub struct OraclePair {
    pub review: Arc<dyn ReviewOracle>,
    pub persona: Arc<dyn PersonaOracle>,
}

/// Registry of available oracle backends.
pub struct OracleRegistry {
    anthropic_api_config: AnthropicApiConfig,
}

impl OracleRegistry {
    pub fn new() -> Self {
        Self {
            anthropic_api_config: AnthropicApiConfig::default(),
        }
    }

    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            anthropic_api_config: AnthropicApiConfig::from(config),
        }
    }

    pub fn with_anthropic_api_config(mut self, config: AnthropicApiConfig) -> Self {
        self.anthropic_api_config = config;
        self
    }

    /// Create both oracles for a backend type.
    pub fn create_by_type(&self, oracle_type: OracleType) -> DomainResult<OraclePair> {
        match oracle_type {
            OracleType::AnthropicApi => {
                let oracle = Arc::new(AnthropicApiOracle::new(self.anthropic_api_config.clone())?);
                Ok(OraclePair {
                    review: oracle.clone(),
                    persona: oracle,
                })
            }
            OracleType::Mock => Ok(Self::mock_pair()),
        }
    }

    /// Create both oracles for a backend name.
    pub fn create(&self, oracle_type: &str) -> Option<DomainResult<OraclePair>> {
        OracleType::parse(oracle_type).map(|t| self.create_by_type(t))
    }

    /// Offline oracles: canned review, echoing persona.
    pub fn mock_pair() -> OraclePair {
        OraclePair {
            review: Arc::new(MockReviewOracle::new()),
            persona: Arc::new(MockPersonaOracle::new()),
        }
    }

    pub fn available_types() -> Vec<&'static str> {
        vec![OracleType::AnthropicApi.as_str(), OracleType::Mock.as_str()]
    }
}

impl Default for OracleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
