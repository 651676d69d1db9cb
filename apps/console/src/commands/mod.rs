//! # Console Commands
//!
//! Operator commands read from stdin, one per line.
//!
//! ## Command Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Console Commands                                │
//! │                                                                         │
//! │  ┌──────────────────────────────┐  ┌──────────────────────────────┐    │
//! │  │  scan.rs                     │  │  config.rs                   │    │
//! │  │                              │  │                              │    │
//! │  │  • scan                      │  │  • status                    │    │
//! │  │  • tap [hex-id]              │  │  • config                    │    │
//! │  │  • cancel                    │  │                              │    │
//! │  │  • next                      │  │                              │    │
//! │  │  • retry                     │  │                              │    │
//! │  └──────────────────────────────┘  └──────────────────────────────┘    │
//! │                                                                         │
//! │  help • quit                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod scan;

use std::str::FromStr;

use guardia_core::{TagId, ValidationError};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::AppResult;
use crate::state::{ConfigState, ScannerState};

/// Text printed by `help`.
pub const HELP: &str = "\
Commands:
  scan            start reading a card
  tap [hex-id]    present a card to the simulated radio (no id = anonymous card)
  cancel          stop the scan in progress
  next            dismiss the result
  retry           probe the NFC hardware again
  status          show the scanner state as JSON
  config          show the loaded configuration as JSON
  help            show this text
  quit            shut the scanner down and exit";

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan,
    /// Present a tag; `None` presents one without an identifier.
    Tap(Option<TagId>),
    Cancel,
    Next,
    Retry,
    Status,
    Config,
    Help,
    Quit,
}

/// Why a command line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}' (type 'help')")]
    UnknownCommand(String),

    #[error("'{0}' takes no arguments")]
    UnexpectedArgument(String),

    #[error("Invalid tag id: {0}")]
    InvalidTagId(#[from] ValidationError),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        if word.is_empty() {
            return Err(CommandError::Empty);
        }

        let word = word.to_ascii_lowercase();
        if word == "tap" {
            return if rest.is_empty() {
                Ok(Command::Tap(None))
            } else {
                Ok(Command::Tap(Some(TagId::parse(rest)?)))
            };
        }

        let command = match word.as_str() {
            "scan" | "read" => Command::Scan,
            "cancel" => Command::Cancel,
            "next" | "reset" => Command::Next,
            "retry" => Command::Retry,
            "status" => Command::Status,
            "config" => Command::Config,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::UnknownCommand(word)),
        };

        if !rest.is_empty() {
            return Err(CommandError::UnexpectedArgument(word));
        }
        Ok(command)
    }
}

/// What a command wants printed.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing beyond what the emitter already printed.
    Silent,
    Text(String),
    Json(Value),
    /// Leave the command loop; the caller shuts the scanner down.
    Quit,
}

/// Runs one command against the scanner.
pub async fn execute(
    scanner: &ScannerState,
    config: &ConfigState,
    command: Command,
) -> AppResult<Reply> {
    debug!(?command, "Executing command");

    match command {
        Command::Scan => scan::start(scanner).await,
        Command::Tap(tag_id) => scan::tap(scanner, tag_id),
        Command::Cancel => Ok(scan::cancel(scanner)),
        Command::Next => Ok(scan::next(scanner)),
        Command::Retry => scan::retry(scanner).await,
        Command::Status => config::status(scanner, config),
        Command::Config => config::show(config),
        Command::Help => Ok(Reply::Text(HELP.to_string())),
        Command::Quit => Ok(Reply::Quit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("scan".parse::<Command>(), Ok(Command::Scan));
        assert_eq!("  CANCEL ".parse::<Command>(), Ok(Command::Cancel));
        assert_eq!("next".parse::<Command>(), Ok(Command::Next));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_tap_normalizes_id() {
        let command: Command = "tap 04:a2:2b".parse().unwrap();
        assert_eq!(command, Command::Tap(Some(TagId::parse("04A22B").unwrap())));
        assert_eq!("tap".parse::<Command>(), Ok(Command::Tap(None)));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert!(matches!(
            "launch".parse::<Command>(),
            Err(CommandError::UnknownCommand(word)) if word == "launch"
        ));
        assert!(matches!(
            "scan now".parse::<Command>(),
            Err(CommandError::UnexpectedArgument(_))
        ));
        assert!(matches!(
            "tap xyz".parse::<Command>(),
            Err(CommandError::InvalidTagId(_))
        ));
    }
}
