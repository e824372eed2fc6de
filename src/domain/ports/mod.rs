//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that adapters implement:
//! - ReviewOracle: external reasoning service producing raw review text
//! - PersonaOracle: replies for the practice persona
//! - ReviewCache: content-addressed store of finished reviews
//! - ReviewSynthesizer: strategies that turn input into a validated review

pub mod persona_oracle;
pub mod review_cache;
pub mod review_oracle;
pub mod synthesizer;

pub use persona_oracle::{PersonaOracle, PersonaTurn};
pub use review_cache::{NullReviewCache, ReviewCache};
pub use review_oracle::{PromptRole, PromptTurn, ReviewOracle, ReviewPrompt};
pub use synthesizer::{ReviewSynthesizer, SynthesisRequest};
