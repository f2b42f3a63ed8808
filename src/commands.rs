//! Chat commands

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start over with fresh score and lives
    Restart,
    /// Collect the nearest live item wherever it is
    Collect,
    /// Toggle sound cues
    Mute,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("not a command")]
    NotACommand,
    #[error("unknown command /{0}")]
    Unknown(String),
}

impl Command {
    pub const ALL: [Command; 3] = [Command::Restart, Command::Collect, Command::Mute];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Restart => "restart",
            Command::Collect => "collect",
            Command::Mute => "mute",
        }
    }

    /// Parse a chat line. Leading whitespace and case are ignored, trailing
    /// arguments are ignored.
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let rest = line
            .trim_start()
            .strip_prefix('/')
            .ok_or(CommandError::NotACommand)?;
        let name = rest.split_whitespace().next().unwrap_or("");
        if name.is_empty() {
            return Err(CommandError::NotACommand);
        }
        Command::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| CommandError::Unknown(name.to_string()))
    }

    /// "/restart, /collect, /mute"
    pub fn usage() -> String {
        Command::ALL
            .iter()
            .map(|c| format!("/{}", c.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/restart"), Ok(Command::Restart));
        assert_eq!(Command::parse("  /COLLECT now"), Ok(Command::Collect));
        assert_eq!(Command::parse("/mute"), Ok(Command::Mute));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("hello"), Err(CommandError::NotACommand));
        assert_eq!(Command::parse("/"), Err(CommandError::NotACommand));
        assert_eq!(
            Command::parse("/dance"),
            Err(CommandError::Unknown("dance".into()))
        );
        assert_eq!(Command::usage(), "/restart, /collect, /mute");
    }
}
