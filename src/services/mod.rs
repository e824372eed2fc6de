//! Service layer: validation, derivation, synthesis strategies and runs.

pub mod caching_synthesizer;
pub mod fixture_synthesizer;
pub mod oracle_synthesizer;
pub mod review_builder;
pub mod review_prompts;
pub mod run_service;
pub mod schema_validator;
pub mod screenshot_ingest;

pub use caching_synthesizer::CachingSynthesizer;
pub use fixture_synthesizer::{demo_review, FixtureSynthesizer, DEMO_REVIEW_ID};
pub use oracle_synthesizer::OracleSynthesizer;
pub use review_builder::{build, rederive, MoveJudgment, ReviewDraft};
pub use run_service::{RunService, RunServiceConfig, TurnOutcome, PERSONA_FALLBACK_REPLY};
pub use schema_validator::{validate, EVAL_TOLERANCE};
pub use screenshot_ingest::ScreenshotIngest;
