//! Domain layer for message-chess
//!
//! Review schema, run state, personas, the port traits adapters implement,
//! and the error taxonomy shared by every layer.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult, ErrorKind, ErrorReport, SchemaViolation};
