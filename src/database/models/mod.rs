//! Database model exports.

pub mod antiflood;

pub use antiflood::{FloodMode, FloodPolicy, FloodSetting};
