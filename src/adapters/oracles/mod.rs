//! Oracle backends: Anthropic Messages API and offline mocks.

pub mod anthropic_api;
pub mod mock;
pub mod registry;

pub use anthropic_api::{AnthropicApiConfig, AnthropicApiOracle};
pub use mock::{MockPersonaOracle, MockResponse, MockReviewOracle};
pub use registry::{OraclePair, OracleRegistry};
