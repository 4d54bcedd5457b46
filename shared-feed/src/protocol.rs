//! Command parsing for the interactive shell.
//!
//! Turns a line of user input (like `post hello there` or `get 5`) into a
//! [`ShellCommand`]. The shell then runs it against any feed backend.

use anyhow::{Result, anyhow};

/// Number of messages `get` fetches when no count is given.
pub const DEFAULT_GET_COUNT: i64 = 10;

/// Commands that can be entered at the shell prompt.
#[derive(Debug, PartialEq)]
pub enum ShellCommand {
    Post { message: String },
    Get { count: i64 },
    Help,
    Quit,
}

impl ShellCommand {
    /// Parses a line of user input into a command.
    ///
    /// # Syntax
    /// Command words are case-insensitive and support aliases:
    /// - `POST <text>` (alias: `p`) - append the rest of the line verbatim
    /// - `GET [n]` (alias: `g`) - print the last `n` messages, default 10
    /// - `HELP` (alias: `h`) - print command reference
    /// - `QUIT` / `EXIT` (alias: `q`) - leave the shell
    ///
    /// Negative counts parse fine; the feed rejects them.
    pub fn parse(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("empty command"));
        }

        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (trimmed, ""),
        };

        let cmd = word.to_uppercase();
        let normalized_cmd = match cmd.as_str() {
            "P" => "POST",
            "G" => "GET",
            "H" => "HELP",
            "Q" | "EXIT" => "QUIT",
            other => other,
        };

        match (normalized_cmd, rest.is_empty()) {
            ("QUIT", true) => Ok(ShellCommand::Quit),
            ("HELP", true) => Ok(ShellCommand::Help),
            ("POST", false) => Ok(ShellCommand::Post {
                message: rest.to_string(),
            }),
            ("POST", true) => Err(anyhow!("POST requires a message: POST <text>")),
            ("GET", true) => Ok(ShellCommand::Get {
                count: DEFAULT_GET_COUNT,
            }),
            ("GET", false) => rest
                .parse()
                .map(|count| ShellCommand::Get { count })
                .map_err(|_| anyhow!("GET takes an optional integer count: GET [n]")),
            ("QUIT" | "HELP", false) => Err(anyhow!("{normalized_cmd} takes no arguments")),
            _ => Err(anyhow!(
                "invalid command. Try: POST/p <text>, GET/g [n], HELP/h, QUIT/q"
            )),
        }
    }
}

pub const HELP: &str = "\
commands:
  post <text>   append a message to the feed (alias: p)
  get [n]       print the last n messages, oldest first (default 10, alias: g)
  help          show this help (alias: h)
  quit          leave the shell (aliases: exit, q)";
