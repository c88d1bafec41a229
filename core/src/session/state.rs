use super::message::ChatMessage;
use crate::network::NetworkStatus;

/// What the chat is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    Error,
}

/// Per-session chat state, memory only
#[derive(Debug, Clone)]
pub struct ChatState {
    pub is_expanded: bool,
    pub messages: Vec<ChatMessage>,
    pub input_value: String,
    pub is_loading: bool,
    pub error: Option<String>,
    pub is_retryable: bool,
    pub last_failed_message: Option<String>,
    pub retry_count: u32,
    pub network_status: NetworkStatus,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            is_expanded: false,
            messages: Vec::new(),
            input_value: String::new(),
            is_loading: false,
            error: None,
            is_retryable: false,
            last_failed_message: None,
            retry_count: 0,
            network_status: NetworkStatus::Online,
        }
    }
}

impl ChatState {
    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Sending
        } else if self.error.is_some() {
            Phase::Error
        } else {
            Phase::Idle
        }
    }

    pub(super) fn push(&mut self, message: Option<ChatMessage>) {
        if let Some(message) = message {
            self.messages.push(message);
        }
    }

    pub(super) fn clear_error(&mut self) {
        self.error = None;
        self.is_retryable = false;
    }

    /// Messages ordered by creation time, ties kept in insertion order
    pub fn sorted_messages(&self) -> Vec<&ChatMessage> {
        let mut messages: Vec<&ChatMessage> = self.messages.iter().collect();
        messages.sort_by_key(|m| m.timestamp);
        messages
    }
}
