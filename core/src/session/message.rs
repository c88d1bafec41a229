use crate::validation::{truncate_chars, MAX_MESSAGE_CHARS};
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
        }
    }
}

/// One entry in the chat history. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub is_loading: bool,
    pub is_error: bool,
    pub is_retryable: bool,
    /// The visitor text an error message refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_message: Option<String>,
}

impl ChatMessage {
    /// Visitor message, trimmed and capped; `None` when blank
    pub fn user(content: &str) -> Option<Self> {
        let content = truncate_chars(content.trim(), MAX_MESSAGE_CHARS);
        Self::build(Sender::User, content)
    }

    /// Assistant reply; `None` when blank
    pub fn ai(content: &str) -> Option<Self> {
        Self::build(Sender::Ai, content.trim())
    }

    /// Assistant-side error notice
    pub fn ai_error(content: &str, original: Option<String>) -> Option<Self> {
        let mut message = Self::build(Sender::Ai, content.trim())?;
        message.is_error = true;
        message.original_message = original;
        Some(message)
    }

    fn build(sender: Sender, content: &str) -> Option<Self> {
        if content.is_empty() {
            return None;
        }
        let timestamp = Utc::now();
        Some(Self {
            id: message_id(sender, &timestamp),
            content: content.to_string(),
            sender,
            timestamp,
            is_loading: false,
            is_error: false,
            is_retryable: false,
            original_message: None,
        })
    }
}

/// `<epoch millis>-<sender>-<random suffix>`
fn message_id(sender: Sender, timestamp: &DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}-{}-{}", timestamp.timestamp_millis(), sender.as_str(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_trimmed_and_capped() {
        let msg = ChatMessage::user("  hello  ").unwrap();
        assert_eq!(msg.content, "hello");
        assert_eq!(msg.sender, Sender::User);

        let long = "y".repeat(700);
        assert_eq!(ChatMessage::user(&long).unwrap().content.chars().count(), 500);
    }

    #[test]
    fn test_blank_messages_rejected() {
        assert!(ChatMessage::user("   ").is_none());
        assert!(ChatMessage::ai("\n").is_none());
        assert!(ChatMessage::ai_error("", None).is_none());
    }

    #[test]
    fn test_id_format() {
        let msg = ChatMessage::ai("hi").unwrap();
        let parts: Vec<&str> = msg.id.splitn(3, '-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], msg.timestamp.timestamp_millis().to_string());
        assert_eq!(parts[1], "ai");
        assert_eq!(parts[2].len(), 9);

        let other = ChatMessage::ai("hi").unwrap();
        assert_ne!(msg.id, other.id);
    }

    #[test]
    fn test_content_kept_verbatim() {
        // escaping is left to whatever renders the message
        let msg = ChatMessage::ai("<b>bold</b> & \"quotes\"").unwrap();
        assert_eq!(msg.content, "<b>bold</b> & \"quotes\"");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"], "<b>bold</b> & \"quotes\"");
    }

    #[test]
    fn test_error_message_flags() {
        let msg = ChatMessage::ai_error("Could you rephrase?", Some("??".to_string())).unwrap();
        assert!(msg.is_error);
        assert_eq!(msg.sender, Sender::Ai);
        assert_eq!(msg.original_message.as_deref(), Some("??"));
    }
}
