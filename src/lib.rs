//! message-chess - chess-engine style game reviews for text conversations
//!
//! A conversation is treated as a game: each message the user sends is a
//! move, and a review labels every move, tracks a running evaluation and
//! picks out the critical moments. Reviews come from a conversation
//! screenshot or from a five-turn practice run against a simulated persona.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): review schema, run state, personas, ports
//!   and the error taxonomy
//! - **Service Layer** (`services`): validation, derivation, synthesis
//!   strategies, caching and the practice run state machine
//! - **Adapters** (`adapters`): `SQLite` and in-memory caches, oracle backends
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **Application Layer** (`application`): configuration-driven wiring
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use message_chess::application::ReviewApp;
//! use message_chess::domain::models::Config;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let app = ReviewApp::from_config(&Config::default()).await?;
//! let review = app.synthesize_from_image(&std::fs::read("chat.png")?).await?;
//! println!("{}: {:+.2}", review.opening_name, review.final_eval());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::ReviewApp;
pub use domain::errors::{DomainError, DomainResult, ErrorKind, ErrorReport, SchemaViolation};
pub use domain::models::{
    Config, GameReview, Message, MoveLabel, Persona, PersonaTable, RunId, RunSnapshot, RunState,
    Speaker,
};
pub use domain::ports::{
    PersonaOracle, ReviewCache, ReviewOracle, ReviewSynthesizer, SynthesisRequest,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{validate, RunService};
