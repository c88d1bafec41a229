//! Chat session state machine
//!
//! Drives one visitor conversation: visibility, the draft, the message
//! history and the send / error / retry cycle. Sends go through a two-phase
//! API: `begin_*` checks the sending guard and hands out a [`PendingTurn`],
//! which must be passed back to [`ChatSession::finish`] with the service's
//! answer. [`ChatSession::send`] and [`ChatSession::retry`] do both phases.

mod message;
mod state;

pub use message::{ChatMessage, Sender};
pub use state::{ChatState, Phase};

use crate::network::NetworkStatus;
use crate::service::{AiResponse, AiResponseService, ResponseOutcome};
use crate::validation::{truncate_chars, MAX_MESSAGE_CHARS};
use std::sync::Arc;
use tokio::sync::watch;

/// A turn in flight. Only obtainable while the session is idle.
#[derive(Debug)]
pub struct PendingTurn {
    text: String,
    retry_count: u32,
}

impl PendingTurn {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }
}

pub struct ChatSession {
    state: ChatState,
    service: Arc<AiResponseService>,
    network: watch::Receiver<NetworkStatus>,
}

impl ChatSession {
    pub fn new(service: Arc<AiResponseService>) -> Self {
        let network = service.network().subscribe();
        let state = ChatState {
            network_status: *network.borrow(),
            ..ChatState::default()
        };
        Self {
            state,
            service,
            network,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn service(&self) -> &Arc<AiResponseService> {
        &self.service
    }

    pub fn expand(&mut self) {
        self.state.is_expanded = true;
    }

    pub fn collapse(&mut self) {
        self.state.is_expanded = false;
    }

    pub fn toggle(&mut self) {
        self.state.is_expanded = !self.state.is_expanded;
    }

    /// Replace the draft, capped at the message limit. Typing dismisses an
    /// error banner.
    pub fn update_input(&mut self, value: &str) {
        self.state.input_value = truncate_chars(value, MAX_MESSAGE_CHARS).to_string();
        if self.state.error.is_some() {
            self.state.clear_error();
        }
    }

    /// Start sending `text`. `None` while another turn is in flight or when
    /// the text is blank.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingTurn> {
        if self.state.is_loading {
            return None;
        }
        let message = ChatMessage::user(text)?;
        let text = message.content.clone();

        self.state.push(Some(message));
        self.state.input_value.clear();
        self.state.is_loading = true;
        self.state.clear_error();
        self.state.last_failed_message = None;
        self.state.retry_count = 0;

        Some(PendingTurn {
            text,
            retry_count: 0,
        })
    }

    /// Start re-sending the last failed message. `None` without one.
    pub fn begin_retry(&mut self) -> Option<PendingTurn> {
        if self.state.is_loading {
            return None;
        }
        let text = self.state.last_failed_message.clone()?;

        self.state.retry_count += 1;
        self.state.is_loading = true;
        self.state.clear_error();

        Some(PendingTurn {
            text,
            retry_count: self.state.retry_count,
        })
    }

    /// Apply the service's answer for `turn`
    pub fn finish(&mut self, turn: PendingTurn, response: AiResponse) {
        self.state.is_loading = false;

        match response.outcome {
            ResponseOutcome::Answered { text, .. } => {
                self.state.push(ChatMessage::ai(&text));
                self.state.retry_count = 0;
                self.state.last_failed_message = None;
                self.state.clear_error();
            }
            ResponseOutcome::Failed(failure) if failure.retryable => {
                self.state.error = Some(failure.message);
                self.state.is_retryable = true;
                self.state.last_failed_message = Some(turn.text);
            }
            ResponseOutcome::Failed(failure) => {
                self.state
                    .push(ChatMessage::ai_error(&failure.message, Some(turn.text)));
                self.state.clear_error();
                self.state.last_failed_message = None;
            }
        }
    }

    /// Send `text` and wait for the outcome. Returns false if nothing was sent.
    pub async fn send(&mut self, text: &str) -> bool {
        match self.begin_send(text) {
            Some(turn) => {
                self.complete(turn).await;
                true
            }
            None => false,
        }
    }

    /// Send the current draft
    pub async fn send_input(&mut self) -> bool {
        let draft = self.state.input_value.clone();
        self.send(&draft).await
    }

    /// Re-send the last failed message. Returns false if there is none.
    pub async fn retry(&mut self) -> bool {
        match self.begin_retry() {
            Some(turn) => {
                self.complete(turn).await;
                true
            }
            None => false,
        }
    }

    async fn complete(&mut self, turn: PendingTurn) {
        let response = self
            .service
            .generate_response(&turn.text, turn.retry_count)
            .await;
        self.finish(turn, response);
    }

    /// Pick up a status change from the network monitor, if any
    pub fn network_changed(&mut self) -> bool {
        match self.network.has_changed() {
            Ok(true) => {
                self.state.network_status = *self.network.borrow_and_update();
                true
            }
            _ => false,
        }
    }

    /// Probe the network (subject to throttling) and update the badge
    pub async fn refresh_network_status(&mut self) -> NetworkStatus {
        let status = self.service.network().probe().await;
        self.network_changed();
        self.state.network_status = status;
        status
    }

    /// Messages in display order
    pub fn display_messages(&self) -> Vec<&ChatMessage> {
        self.state.sorted_messages()
    }
}
