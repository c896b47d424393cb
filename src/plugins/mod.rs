//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()`

pub mod antiflood;
pub mod help;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show help")]
    Help,

    #[command(description = "Show the current flood setting")]
    Flood,

    #[command(description = "Set the flood threshold")]
    Setflood,

    #[command(description = "Set the flood action")]
    Setfloodmode,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help::help_command))
        .branch(case![Command::Flood].endpoint(antiflood::flood_command))
        .branch(case![Command::Setflood].endpoint(antiflood::setflood_command))
        .branch(case![Command::Setfloodmode].endpoint(antiflood::setfloodmode_command))
}
