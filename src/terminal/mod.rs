//! Interactive terminal chat
//!
//! A line-based rendering of the chat widget on top of
//! [`ChatSession`]. The network badge follows the monitor, which is kept
//! fresh by the probe loop and the interface watcher for as long as the
//! chat runs.

mod commands;

use crate::output::OutputFormatter;
use anyhow::{Context, Result};
use commands::{Input, SlashCommand, SLASH_COMMANDS};
use dialoguer::theme::ColorfulTheme;
use folio_core::{AiResponseService, ChatSession};
use std::sync::Arc;

/// Read one line without blocking the runtime. `None` on EOF or ctrl-c.
async fn read_line(prompt: String) -> Result<Option<String>> {
    let result = tokio::task::spawn_blocking(move || {
        dialoguer::Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    })
    .await
    .context("Input task failed")?;

    match result {
        Ok(line) => Ok(Some(line)),
        Err(dialoguer::Error::IO(e))
            if matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::Interrupted
            ) =>
        {
            Ok(None)
        }
        Err(e) => Err(e).context("Failed to read input"),
    }
}

struct ChatTerminal {
    session: ChatSession,
    formatter: OutputFormatter,
    name: String,
    /// Messages already printed
    shown: usize,
}

impl ChatTerminal {
    fn print_new_messages(&mut self) {
        let messages = self.session.display_messages();
        for message in messages.iter().skip(self.shown) {
            self.formatter.print_message(&self.name, message);
        }
        self.shown = messages.len();
    }

    fn print_history(&mut self) {
        self.shown = 0;
        self.print_new_messages();
    }

    fn print_help(&self) {
        println!();
        for entry in SLASH_COMMANDS {
            println!("  {:<12} {}", entry.command, entry.description);
        }
        println!();
    }

    async fn send(&mut self, text: &str) {
        self.session.update_input(text);
        let draft = self.session.state().input_value.clone();
        // echo the visitor's line before waiting on the reply
        if let Some(turn) = self.session.begin_send(&draft) {
            self.print_new_messages();
            self.formatter.print_info("…");
            let response = self
                .session
                .service()
                .generate_response(turn.text(), turn.retry_count())
                .await;
            self.session.finish(turn, response);
        }
        self.print_new_messages();
        self.formatter.print_error_banner(self.session.state());
    }

    async fn retry(&mut self) {
        if !self.session.retry().await {
            self.formatter.print_info("Nothing to retry.");
            return;
        }
        self.print_new_messages();
        self.formatter.print_error_banner(self.session.state());
    }

    /// Returns false when the chat should end
    async fn handle(&mut self, input: Input) -> bool {
        match input {
            Input::Empty => {}
            Input::Message(_) if !self.session.state().is_expanded => {
                self.formatter
                    .print_info("The chat is collapsed. Type /expand to open it.");
            }
            Input::Message(text) => self.send(&text).await,
            Input::Command(SlashCommand::Retry) => self.retry().await,
            Input::Command(SlashCommand::Expand) => {
                self.session.expand();
                self.formatter
                    .print_header(&self.name, self.session.state().network_status);
                self.print_history();
            }
            Input::Command(SlashCommand::Collapse) => {
                self.session.collapse();
                self.formatter.print_info("Chat collapsed.");
            }
            Input::Command(SlashCommand::Status) => {
                self.session.refresh_network_status().await;
                let limits = self.session.service().limiter().status();
                self.formatter.print_state(self.session.state(), &limits);
            }
            Input::Command(SlashCommand::Logs(n)) => {
                self.formatter.print_logs(&folio_core::logger::get_recent_logs(n));
            }
            Input::Command(SlashCommand::Help) => self.print_help(),
            Input::Command(SlashCommand::Unknown) => {
                self.formatter
                    .print_info("Unknown command. Type /help for the list.");
            }
            Input::Command(SlashCommand::Quit) => return false,
        }
        true
    }
}

/// Run the chat until /quit or EOF
pub async fn run(service: Arc<AiResponseService>, name: String, collapsed: bool) -> Result<()> {
    let network = service.network().clone();
    let probe_task = network.spawn_probe_loop();
    let watch_task = crate::connectivity::spawn_watcher(network);

    let mut chat = ChatTerminal {
        session: ChatSession::new(service),
        formatter: OutputFormatter::new(),
        name,
        shown: 0,
    };

    if collapsed {
        chat.formatter.print_info(&format!(
            "Chat with {} is collapsed. Type /expand to open it.",
            chat.name
        ));
    } else {
        chat.session.expand();
        chat.formatter
            .print_header(&chat.name, chat.session.state().network_status);
    }

    let outcome = loop {
        if chat.session.network_changed() {
            let status = chat.session.state().network_status;
            println!("{}", chat.formatter.network_badge(status));
        }

        let line = match read_line("You".to_string()).await {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };
        if !chat.handle(Input::parse(&line)).await {
            break Ok(());
        }
    };

    probe_task.abort();
    watch_task.abort();
    folio_core::info_log!(
        "Chat ended after {} messages",
        chat.session.state().messages.len()
    );
    outcome
}
