//! Line-oriented resolution scripts.
//!
//! ```text
//! # comments and blank lines are ignored
//! ours 0
//! theirs 2
//! all both
//! undo
//! ```
//!
//! Conflict indices are 0-based, matching the order of `ec show`.

use std::fmt;
use std::str::FromStr;

use crate::errors::{CommandError, ScriptError};
use crate::markers::Resolution;

/// One resolution command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptCommand {
    /// `<resolution> <index>`
    Apply { index: usize, resolution: Resolution },
    /// `all <resolution>`
    ApplyAll(Resolution),
    Undo,
    Redo,
}

impl FromStr for ScriptCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = s.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            return Err(CommandError::UnknownCommand(String::new()));
        };
        let arity = |expected: &'static str| CommandError::WrongArity {
            command: command.to_string(),
            expected,
        };

        match command.to_ascii_lowercase().as_str() {
            "undo" | "redo" if !args.is_empty() => Err(arity("no arguments")),
            "undo" => Ok(Self::Undo),
            "redo" => Ok(Self::Redo),
            "all" => match args {
                [res] => Ok(Self::ApplyAll(res.parse()?)),
                _ => Err(arity("one resolution")),
            },
            "ours" | "theirs" | "both" | "none" => match args {
                [index] => Ok(Self::Apply {
                    index: index
                        .parse::<usize>()
                        .map_err(|_| CommandError::InvalidIndex(index.to_string()))?,
                    resolution: command.parse()?,
                }),
                _ => Err(arity("one conflict index")),
            },
            _ => Err(CommandError::UnknownCommand(command.to_string())),
        }
    }
}

impl fmt::Display for ScriptCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply { index, resolution } => write!(f, "{resolution} {index}"),
            Self::ApplyAll(resolution) => write!(f, "all {resolution}"),
            Self::Undo => f.write_str("undo"),
            Self::Redo => f.write_str("redo"),
        }
    }
}

/// Parse a whole script, skipping blank lines and `#` comments.
pub fn parse_script(script: &str) -> Result<Vec<ScriptCommand>, ScriptError> {
    script
        .lines()
        .enumerate()
        .map(|(i, raw)| (i + 1, raw.split('#').next().unwrap_or_default().trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line, text)| {
            text.parse::<ScriptCommand>()
                .map_err(|source| ScriptError::Parse { line, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::UnknownResolution;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "ours 3".parse::<ScriptCommand>(),
            Ok(ScriptCommand::Apply {
                index: 3,
                resolution: Resolution::Ours
            })
        );
        assert_eq!(
            "  NONE   0 ".parse::<ScriptCommand>(),
            Ok(ScriptCommand::Apply {
                index: 0,
                resolution: Resolution::None
            })
        );
        assert_eq!("all both".parse::<ScriptCommand>(), Ok(ScriptCommand::ApplyAll(Resolution::Both)));
        assert_eq!("undo".parse::<ScriptCommand>(), Ok(ScriptCommand::Undo));
        assert_eq!("redo".parse::<ScriptCommand>(), Ok(ScriptCommand::Redo));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "pick 1".parse::<ScriptCommand>(),
            Err(CommandError::UnknownCommand("pick".into()))
        );
        assert_eq!(
            "ours x".parse::<ScriptCommand>(),
            Err(CommandError::InvalidIndex("x".into()))
        );
        assert!(matches!(
            "ours".parse::<ScriptCommand>(),
            Err(CommandError::WrongArity { .. })
        ));
        assert!(matches!(
            "undo 2".parse::<ScriptCommand>(),
            Err(CommandError::WrongArity { .. })
        ));
        assert_eq!(
            "all unset".parse::<ScriptCommand>(),
            Err(CommandError::InvalidResolution(UnknownResolution("unset".into())))
        );
    }

    #[test]
    fn test_display_round_trips() {
        for text in ["theirs 7", "all none", "undo", "redo"] {
            let cmd: ScriptCommand = text.parse().unwrap();
            assert_eq!(cmd.to_string(), text);
        }
    }

    #[test]
    fn test_parse_script_skips_comments_and_reports_line() {
        let script = "# resolve\nours 0\n\n  theirs 1  # keep remote\nall both\n";
        let cmds = parse_script(script).unwrap();
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[2], ScriptCommand::ApplyAll(Resolution::Both));

        let err = parse_script("ours 0\nbogus\n").unwrap_err();
        assert_eq!(
            err,
            ScriptError::Parse {
                line: 2,
                source: CommandError::UnknownCommand("bogus".into())
            }
        );
    }
}
