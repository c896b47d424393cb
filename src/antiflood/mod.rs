//! Flood control core.
//!
//! A flood is a run of consecutive messages from one sender in one chat
//! with no message from anyone else in between. When a run reaches the
//! chat's threshold the configured action (ban, kick, mute, timed ban,
//! timed mute) is applied.
//!
//! - `duration` - compact duration specs ("10m", "6d")
//! - `settings` - per-chat threshold and policy store
//! - `counter` - per-chat consecutive-message counter
//! - `sender` - identity a run is attributed to
//! - `evaluator` - per-message entry point
//! - `action` - executes the policy through the gateway
//! - `commands` - admin settings commands
//! - `audit` - records for the log channel

pub mod action;
pub mod audit;
pub mod commands;
pub mod counter;
pub mod duration;
pub mod error;
pub mod evaluator;
pub mod gateway;
pub mod sender;
pub mod settings;

#[cfg(test)]
pub mod testing;

pub use action::ActionDispatcher;
pub use audit::{AuditRecord, AuditTag, AuditUser};
pub use counter::FloodCounter;
pub use error::{FloodError, FloodResult, GatewayError};
pub use evaluator::{ChatKind, FloodEvaluator, FloodEvent};
pub use gateway::{AdminOracle, ModerationGateway, NotificationSink};
pub use sender::SenderId;
pub use settings::{FloodSettingsStore, MemoryFloodSettings};
