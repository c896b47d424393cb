//! Bot module - Telegram wiring.

pub mod dispatcher;
mod runtime;
pub mod telegram;
pub mod webhook;

pub use dispatcher::{build_dispatcher, AppState, ThrottledBot};
pub use runtime::run;
