//! Chat command parsing.

use crate::scan::params::{DEFAULT_MESSAGE_LIMIT, MAX_MESSAGE_LIMIT};

/// Prefix marking a chat message as a command.
pub const COMMAND_PREFIX: &str = ">";

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan {
        limit: Option<u32>,
        include_seen: bool,
        from_last: bool,
    },
    CheckRecovery,
    ResumeScan,
    ClearRecovery,
    History,
    ClearHistory,
    Ping,
    Help,
}

impl Command {
    /// Parse a raw chat message; `None` when it is not a command.
    pub fn parse_message(content: &str) -> Option<Command> {
        let command = content.strip_prefix(COMMAND_PREFIX)?.trim();
        Self::parse(command)
    }

    fn parse(command: &str) -> Option<Command> {
        let mut parts = command.split_whitespace();
        match parts.next()? {
            "scan" => {
                let mut limit = None;
                let mut include_seen = false;
                let mut from_last = false;

                // Unknown tokens are tolerated, matching the original
                // command surface.
                for part in parts {
                    if let Ok(n) = part.parse::<u32>() {
                        limit = Some(n.min(MAX_MESSAGE_LIMIT));
                    } else if part == "--all" {
                        include_seen = true;
                    } else if part == "--new" {
                        from_last = true;
                    }
                }

                if limit.is_none() && !include_seen && !from_last {
                    limit = Some(DEFAULT_MESSAGE_LIMIT);
                }

                Some(Command::Scan {
                    limit,
                    include_seen,
                    from_last,
                })
            }
            name => {
                if parts.next().is_some() {
                    return None;
                }
                match name {
                    "check_recovery" => Some(Command::CheckRecovery),
                    "resume_scan" => Some(Command::ResumeScan),
                    "clear_recovery" => Some(Command::ClearRecovery),
                    "history" => Some(Command::History),
                    "clear_history" => Some(Command::ClearHistory),
                    "ping" => Some(Command::Ping),
                    "help" => Some(Command::Help),
                    _ => None,
                }
            }
        }
    }
}
