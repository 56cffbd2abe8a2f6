use sequencer::Command;

/// User intent read from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    ToggleMute,
    Quit,
}

impl Intent {
    /// Sequencer command for this intent; `None` for host-only intents.
    pub fn command(self) -> Option<Command> {
        match self {
            Self::Start => Some(Command::Start),
            Self::ToggleMute => Some(Command::ToggleMute),
            Self::Quit => None,
        }
    }
}

/// Parses one input line; unknown input yields `None`.
pub fn parse_intent(line: &str) -> Option<Intent> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "play" | "start" | "restart" => Some(Intent::Start),
        "m" | "mute" | "unmute" => Some(Intent::ToggleMute),
        "q" | "quit" | "exit" => Some(Intent::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use sequencer::Command;

    use super::{Intent, parse_intent};

    #[test]
    fn parses_short_and_long_forms_case_insensitively() {
        assert_eq!(parse_intent("p"), Some(Intent::Start));
        assert_eq!(parse_intent("  Restart \n"), Some(Intent::Start));
        assert_eq!(parse_intent("M"), Some(Intent::ToggleMute));
        assert_eq!(parse_intent("quit"), Some(Intent::Quit));
    }

    #[test]
    fn unknown_input_is_ignored() {
        assert_eq!(parse_intent(""), None);
        assert_eq!(parse_intent("pause"), None);
    }

    #[test]
    fn quit_has_no_sequencer_command() {
        assert_eq!(Intent::Start.command(), Some(Command::Start));
        assert_eq!(Intent::ToggleMute.command(), Some(Command::ToggleMute));
        assert_eq!(Intent::Quit.command(), None);
    }
}
