// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat commands.

/// A recognized chat command. Arguments are trimmed but otherwise raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!mode` shows the current mode; `!mode <name>` switches.
    Mode(Option<String>),
    /// `!roast <name>` pins a target and switches to roast mode.
    Roast(Option<String>),
    /// `!unroast` clears the pinned target.
    Unroast,
    /// `!usage` reports the caller's standing.
    Usage,
}

/// Parse `text` as a command. Anything that is not one of the known
/// commands, including unknown `!words`, is left for normal handling.
pub fn parse_command(prefix: &str, text: &str) -> Option<Command> {
    let rest = text.trim().strip_prefix(prefix)?;
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };
    let arg = arg.map(str::to_string);
    match name.to_ascii_lowercase().as_str() {
        "mode" => Some(Command::Mode(arg)),
        "roast" => Some(Command::Roast(arg)),
        "unroast" => Some(Command::Unroast),
        "usage" => Some(Command::Usage),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(
            parse_command("!", "!mode serious"),
            Some(Command::Mode(Some("serious".to_string())))
        );
        assert_eq!(parse_command("!", "  !MODE  "), Some(Command::Mode(None)));
        assert_eq!(
            parse_command("!", "!roast  Big Dave "),
            Some(Command::Roast(Some("Big Dave".to_string())))
        );
        assert_eq!(parse_command("!", "!unroast"), Some(Command::Unroast));
        assert_eq!(parse_command("?", "?usage"), Some(Command::Usage));
    }

    #[test]
    fn ignores_plain_text_and_unknown_commands() {
        assert_eq!(parse_command("!", "hello there"), None);
        assert_eq!(parse_command("!", "!dance"), None);
        assert_eq!(parse_command("!", "mode serious"), None);
    }
}
