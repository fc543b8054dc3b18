//! Chat message types

use super::FileAttachment;
use serde::{Deserialize, Serialize};

/// Who authored a message, for render identity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

/// Message metadata as delivered by the chat backend
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default)]
    pub session_id: Option<String>,
    /// Fields the client does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One entry in the chat transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_user: bool,
    #[serde(default)]
    pub is_status_message: bool,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<FileAttachment>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            ..Default::default()
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn status(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_status_message: true,
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(MessageMetadata::default)
            .session_id = Some(session_id.into());
        self
    }

    pub fn with_attachment(mut self, attachment: FileAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn session_id(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.session_id.as_deref())
    }

    /// Status messages count as bot-authored for identity purposes
    pub fn role(&self) -> Role {
        if self.is_user {
            Role::User
        } else {
            Role::Bot
        }
    }

    /// Bot-authored and not a status line; the only kind that plays a reveal
    pub fn is_bot_message(&self) -> bool {
        !self.is_user && !self.is_status_message
    }
}

/// Render identity of a message: `(session id, index, role)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageKey {
    pub session_id: Option<String>,
    pub index: usize,
    pub role: Role,
}

impl MessageKey {
    pub fn for_message(message: &ChatMessage, index: usize) -> Self {
        Self {
            session_id: message.session_id().map(str::to_string),
            index,
            role: message.role(),
        }
    }
}

impl std::fmt::Display for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.session_id.as_deref().unwrap_or("undefined"),
            self.index,
            self.role.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = r#"{
            "text": "hi",
            "isUser": false,
            "isStatusMessage": false,
            "metadata": {"sessionId": "s-1", "turn": 3}
        }"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.session_id(), Some("s-1"));
        assert!(msg.is_bot_message());
        assert_eq!(msg.metadata.unwrap().extra["turn"], 3);
    }

    #[test]
    fn test_key_display() {
        let msg = ChatMessage::bot("x").with_session("abc");
        assert_eq!(MessageKey::for_message(&msg, 2).to_string(), "abc-2-bot");

        let user = ChatMessage::user("y");
        assert_eq!(MessageKey::for_message(&user, 0).to_string(), "undefined-0-user");
    }

    #[test]
    fn test_status_is_not_bot_message() {
        let status = ChatMessage::status("working");
        assert_eq!(status.role(), Role::Bot);
        assert!(!status.is_bot_message());
    }
}
