//! Chat commands: `/gassorter`, `/gassorter debug`, `/gassorter debug on|off`.

/// A recognized chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    /// The bare root: list commands.
    Help,
    /// `debug` without an argument: report the switch.
    DebugStatus,
    DebugOn,
    DebugOff,
    /// `debug` with an argument other than on/off.
    DebugUsage,
    /// Anything else under the root.
    Unknown,
}

/// Result of offering a chat message to the command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Not ours. The host processes the message normally.
    NotHandled,
    Handled {
        reply: String,
        /// The host must not broadcast the original message.
        suppress_broadcast: bool,
    },
}

impl CommandOutcome {
    pub fn reply(&self) -> Option<&str> {
        match self {
            CommandOutcome::NotHandled => None,
            CommandOutcome::Handled { reply, .. } => Some(reply),
        }
    }

    pub fn is_handled(&self) -> bool {
        matches!(self, CommandOutcome::Handled { .. })
    }
}

/// Parse `message` as a command under `root`.
///
/// Returns `None` when the trimmed message does not start with `root`
/// (case-insensitive). Words are separated by any run of spaces.
pub fn parse_command(root: &str, message: &str) -> Option<ChatCommand> {
    let message = message.trim();
    let head = message.get(..root.len())?;
    if root.is_empty() || !head.eq_ignore_ascii_case(root) {
        return None;
    }

    let mut words = message.split(' ').filter(|w| !w.is_empty()).skip(1);
    let command = match words.next() {
        None => ChatCommand::Help,
        Some(sub) if sub.eq_ignore_ascii_case("debug") => match words.next() {
            None => ChatCommand::DebugStatus,
            Some(arg) if arg.eq_ignore_ascii_case("on") => ChatCommand::DebugOn,
            Some(arg) if arg.eq_ignore_ascii_case("off") => ChatCommand::DebugOff,
            Some(_) => ChatCommand::DebugUsage,
        },
        Some(_) => ChatCommand::Unknown,
    };
    Some(command)
}

impl ChatCommand {
    /// The new debug switch value, if this command sets it.
    pub fn debug_switch(self) -> Option<bool> {
        match self {
            ChatCommand::DebugOn => Some(true),
            ChatCommand::DebugOff => Some(false),
            _ => None,
        }
    }

    /// Reply text, given the debug switch after the command took effect.
    pub fn reply(self, root: &str, debug_enabled: bool) -> String {
        match self {
            ChatCommand::Help => format!("Commands: {root} debug [on|off]"),
            ChatCommand::DebugStatus => format!(
                "Debug is {}. Use: {root} debug on|off",
                if debug_enabled { "ON" } else { "OFF" }
            ),
            ChatCommand::DebugOn => "Debug ON".to_string(),
            ChatCommand::DebugOff => "Debug OFF".to_string(),
            ChatCommand::DebugUsage => format!("Usage: {root} debug on|off"),
            ChatCommand::Unknown => format!("Unknown command. Try: {root} debug on|off"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/gassorter";

    #[test]
    fn foreign_messages_are_ignored() {
        assert_eq!(parse_command(ROOT, "hello"), None);
        assert_eq!(parse_command(ROOT, ""), None);
        assert_eq!(parse_command(ROOT, "/gas"), None);
        assert_eq!(parse_command(ROOT, "say /gassorter debug"), None);
    }

    #[test]
    fn parses_every_form() {
        assert_eq!(parse_command(ROOT, "/gassorter"), Some(ChatCommand::Help));
        assert_eq!(parse_command(ROOT, "/GasSorter debug"), Some(ChatCommand::DebugStatus));
        assert_eq!(parse_command(ROOT, "/gassorter debug ON"), Some(ChatCommand::DebugOn));
        assert_eq!(parse_command(ROOT, "/gassorter DEBUG off"), Some(ChatCommand::DebugOff));
        assert_eq!(parse_command(ROOT, "/gassorter debug maybe"), Some(ChatCommand::DebugUsage));
        assert_eq!(parse_command(ROOT, "/gassorter purge"), Some(ChatCommand::Unknown));
    }

    #[test]
    fn extra_whitespace_tolerated() {
        assert_eq!(
            parse_command(ROOT, "   /gassorter    debug    on   "),
            Some(ChatCommand::DebugOn)
        );
    }

    #[test]
    fn multibyte_message_does_not_panic() {
        assert_eq!(parse_command(ROOT, "héllo wörld, ça va?"), None);
    }

    #[test]
    fn replies() {
        assert_eq!(ChatCommand::Help.reply(ROOT, false), "Commands: /gassorter debug [on|off]");
        assert_eq!(
            ChatCommand::DebugStatus.reply(ROOT, true),
            "Debug is ON. Use: /gassorter debug on|off"
        );
        assert_eq!(
            ChatCommand::DebugStatus.reply(ROOT, false),
            "Debug is OFF. Use: /gassorter debug on|off"
        );
        assert_eq!(ChatCommand::DebugOn.reply(ROOT, true), "Debug ON");
        assert_eq!(ChatCommand::DebugOff.reply(ROOT, false), "Debug OFF");
        assert_eq!(ChatCommand::DebugUsage.reply(ROOT, false), "Usage: /gassorter debug on|off");
        assert_eq!(
            ChatCommand::Unknown.reply(ROOT, false),
            "Unknown command. Try: /gassorter debug on|off"
        );
    }

    #[test]
    fn debug_switch_values() {
        assert_eq!(ChatCommand::DebugOn.debug_switch(), Some(true));
        assert_eq!(ChatCommand::DebugOff.debug_switch(), Some(false));
        assert_eq!(ChatCommand::DebugStatus.debug_switch(), None);
    }
}
