//! Slash commands for the terminal chat

/// A slash command entry for display
#[derive(Debug, Clone)]
pub struct SlashCommandHelp {
    pub command: &'static str,
    pub description: &'static str,
}

pub const SLASH_COMMANDS: &[SlashCommandHelp] = &[
    SlashCommandHelp {
        command: "/help, /h",
        description: "Show this help",
    },
    SlashCommandHelp {
        command: "/retry, /r",
        description: "Resend the last failed message",
    },
    SlashCommandHelp {
        command: "/expand",
        description: "Open the chat window",
    },
    SlashCommandHelp {
        command: "/collapse",
        description: "Hide the chat window",
    },
    SlashCommandHelp {
        command: "/status",
        description: "Show network, rate limit and retry state",
    },
    SlashCommandHelp {
        command: "/logs [n]",
        description: "Show the last n log entries (default 20)",
    },
    SlashCommandHelp {
        command: "/quit, /q",
        description: "Leave the chat",
    },
];

const DEFAULT_LOG_LINES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Text for the assistant
    Message(String),
    Command(SlashCommand),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Retry,
    Expand,
    Collapse,
    Status,
    Logs(usize),
    Quit,
    Unknown,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Input::Message(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or("").to_lowercase();
        let command = match name.as_str() {
            "help" | "h" | "?" => SlashCommand::Help,
            "retry" | "r" => SlashCommand::Retry,
            "expand" | "open" => SlashCommand::Expand,
            "collapse" | "close" => SlashCommand::Collapse,
            "status" => SlashCommand::Status,
            "logs" => SlashCommand::Logs(
                parts
                    .next()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(DEFAULT_LOG_LINES),
            ),
            "quit" | "q" | "exit" => SlashCommand::Quit,
            _ => SlashCommand::Unknown,
        };
        Input::Command(command)
    }
}
