//! Output formatting
//!
//! Colored terminal rendering for chat messages, replies, status lines and
//! the profile.

use console::Style;
use std::borrow::Cow;
use folio_core::rate_limiter::RateLimitStatus;
use folio_core::service::AiFailure;
use folio_core::session::{ChatMessage, ChatState, Sender};
use folio_core::{AiResponse, NetworkStatus, ProfileContext, ResponseOutcome};

/// Message text made safe for the terminal: escape sequences and stray
/// control characters from model output are removed before printing.
pub fn printable(text: &str) -> Cow<'_, str> {
    let stripped = console::strip_ansi_codes(text);
    if !stripped.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
        return stripped;
    }
    Cow::Owned(
        stripped
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect(),
    )
}

pub struct OutputFormatter {
    blue: Style,
    green: Style,
    yellow: Style,
    red: Style,
    dim: Style,
    bold: Style,
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self {
            blue: Style::new().blue(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            dim: Style::new().dim(),
            bold: Style::new().bold(),
        }
    }
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    fn network_style(&self, status: NetworkStatus) -> &Style {
        match status {
            NetworkStatus::Online => &self.green,
            NetworkStatus::Slow => &self.yellow,
            NetworkStatus::Offline => &self.red,
        }
    }

    /// Icon plus label, colored by status
    pub fn network_badge(&self, status: NetworkStatus) -> String {
        self.network_style(status)
            .apply_to(format!("{} {}", status.icon(), status))
            .to_string()
    }

    /// Header line for the chat window
    pub fn print_header(&self, name: &str, status: NetworkStatus) {
        println!();
        println!(
            "{}  {}",
            self.bold.apply_to(format!("Chat with {}", name)),
            self.network_badge(status)
        );
        println!(
            "{}",
            self.dim
                .apply_to("Type a question, or /help for commands. Ctrl-D quits.")
        );
        println!();
    }

    pub fn print_message(&self, name: &str, message: &ChatMessage) {
        let time = message.timestamp.with_timezone(&chrono::Local).format("%H:%M");
        let content = printable(&message.content);
        match message.sender {
            Sender::User => println!(
                "{} {} {}",
                self.dim.apply_to(time),
                self.blue.apply_to("You:"),
                content
            ),
            Sender::Ai if message.is_error => println!(
                "{} {} {}",
                self.dim.apply_to(time),
                self.red.apply_to(format!("{}:", name)),
                content
            ),
            Sender::Ai => println!(
                "{} {} {}",
                self.dim.apply_to(time),
                self.green.apply_to(format!("{}:", name)),
                content
            ),
        }
    }

    /// Error banner; mentions /retry only when retrying is allowed
    pub fn print_error_banner(&self, state: &ChatState) {
        let Some(error) = &state.error else {
            return;
        };
        println!(
            "{} {}",
            self.network_badge(state.network_status),
            self.red.apply_to(error)
        );
        if state.is_retryable {
            println!("{}", self.dim.apply_to("Type /retry to try again."));
        }
    }

    pub fn print_state(&self, state: &ChatState, limits: &RateLimitStatus) {
        println!();
        println!("{}", self.bold.apply_to("Chat Status:"));
        println!("Network:  {}", self.network_badge(state.network_status));
        println!(
            "Window:   {}",
            if state.is_expanded {
                self.green.apply_to("expanded")
            } else {
                self.yellow.apply_to("collapsed")
            }
        );
        println!("Messages: {}", state.messages.len());
        println!("Retries:  {}", state.retry_count);
        println!(
            "Requests: {}/{} in window{}",
            limits.requests_in_window,
            limits.max_requests,
            if limits.cooling_down {
                " (cooling down)"
            } else {
                ""
            }
        );
        if let Some(last) = &state.last_failed_message {
            println!("Pending:  {}", self.yellow.apply_to(last));
        }
        println!();
    }

    /// One-shot reply from `folio ask`
    pub fn print_response(&self, name: &str, response: &AiResponse) {
        match &response.outcome {
            ResponseOutcome::Answered { text, fallback_used } => {
                println!(
                    "{} {}",
                    self.green.apply_to(format!("{}:", name)),
                    printable(text)
                );
                if *fallback_used {
                    println!(
                        "{}",
                        self.dim.apply_to("(offline reply; the AI service was unavailable)")
                    );
                }
            }
            ResponseOutcome::Failed(failure) => self.print_failure(failure),
        }
        println!(
            "{}",
            self.dim
                .apply_to(format!("{}ms", response.response_time.as_millis()))
        );
    }

    pub fn print_failure(&self, failure: &AiFailure) {
        println!("{}", self.red.apply_to(&failure.message));
        if failure.retryable {
            println!("{}", self.dim.apply_to("Try again in a moment."));
        }
    }

    pub fn print_profile(&self, profile: &ProfileContext) {
        println!();
        println!("{}", self.bold.apply_to(&profile.name));
        println!("{} · {}", profile.role, profile.location);
        println!();
        println!("{}", profile.summary);

        println!();
        println!("{}", self.bold.apply_to("Skills:"));
        for (category, items) in &profile.skill_groups {
            println!("  {} {}", self.blue.apply_to(format!("{}:", category)), items.join(", "));
        }

        println!();
        println!("{}", self.bold.apply_to("Projects:"));
        for project in &profile.projects {
            match &project.period {
                Some(period) => println!(
                    "  {} {}",
                    self.green.apply_to(&project.name),
                    self.dim.apply_to(format!("({})", period))
                ),
                None => println!("  {}", self.green.apply_to(&project.name)),
            }
            println!("    {}", project.description);
            if !project.technologies.is_empty() {
                println!("    {}", self.dim.apply_to(project.technologies.join(", ")));
            }
        }

        println!();
        println!("{}", self.bold.apply_to("Experience:"));
        for job in &profile.experience {
            println!(
                "  {} at {} {}",
                job.title,
                self.green.apply_to(&job.company),
                self.dim.apply_to(format!("({})", job.period))
            );
        }

        println!();
        println!("{}", self.bold.apply_to("Education:"));
        for school in &profile.education {
            println!(
                "  {}, {} {}",
                school.degree,
                school.institution,
                self.dim.apply_to(format!("({})", school.period))
            );
        }

        println!();
        println!("{} {}", self.bold.apply_to("Contact:"), profile.contact.email);
        for link in [
            &profile.contact.github,
            &profile.contact.linkedin,
            &profile.contact.website,
        ]
        .into_iter()
        .flatten()
        {
            println!("  {}", self.blue.apply_to(link));
        }
        println!();
    }

    pub fn print_logs(&self, lines: &[String]) {
        if lines.is_empty() {
            println!("{}", self.dim.apply_to("No log entries yet."));
            return;
        }
        for line in lines {
            println!("{}", self.dim.apply_to(line));
        }
    }

    pub fn print_info(&self, message: &str) {
        println!("{}", self.blue.apply_to(message));
    }

    pub fn print_success(&self, message: &str) {
        println!("{}", self.green.apply_to(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_strips_escape_sequences() {
        let reply = "\x1b[2J\x1b[31mI build <b>web apps</b>\x1b[0m\x07";
        assert_eq!(printable(reply), "I build <b>web apps</b>");
    }

    #[test]
    fn test_printable_keeps_plain_text() {
        let reply = "Skills:\n\tRust & TypeScript";
        assert!(matches!(printable(reply), Cow::Borrowed(_)));
        assert_eq!(printable(reply), reply);
    }
}
