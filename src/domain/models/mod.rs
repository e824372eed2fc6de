pub mod config;
pub mod message;
pub mod persona;
pub mod review;
pub mod run;
pub mod screenshot;

pub use config::{
    CacheBackend, CacheConfig, Config, LoggingConfig, OracleConfig, OracleType, RunsConfig,
    SynthesisConfig, SynthesisStrategy, UploadConfig,
};
pub use message::{check_transcript, Message, PlayerSide, Speaker};
pub use persona::{Persona, PersonaTable};
pub use review::{
    CriticalMoment, EvalSample, GameReview, LabelCounts, LabelTally, MessageReview, MoveLabel,
    Player, Players, ReviewMode, SuggestedReply, EVAL_BASELINE, MAX_CRITICAL_MOMENTS,
};
pub use run::{Run, RunId, RunSnapshot, RunState, TURN_LIMIT};
pub use screenshot::{Fingerprint, ImageFormat, ScreenshotRef};
