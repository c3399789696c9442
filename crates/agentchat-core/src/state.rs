//! UI-agnostic conversation message types
//!
//! Messages travel to and from the backend in the LangChain-style shape
//! `{"type": "human" | "ai", "data": {"content": "..."}}`; in memory the
//! role is a closed enum so a typo can never produce an unrenderable message.

use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Ai => "ai",
        }
    }

    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "human" => Some(Role::Human),
            "ai" => Some(Role::Ai),
            _ => None,
        }
    }
}

/// A single chat message; `content` is markdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireMessage", try_from = "WireMessage")]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) data: WireContent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct WireContent {
    #[serde(default)]
    pub(crate) content: Option<String>,
}

impl From<Message> for WireMessage {
    fn from(message: Message) -> Self {
        Self {
            kind: message.role.as_str().to_string(),
            data: WireContent {
                content: Some(message.content),
            },
        }
    }
}

impl TryFrom<WireMessage> for Message {
    type Error = String;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let role = Role::from_wire(&wire.kind)
            .ok_or_else(|| format!("unsupported message type '{}'", wire.kind))?;
        Ok(Self {
            role,
            content: wire.data.content.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_uses_wire_shape() {
        let value = serde_json::to_value(Message::ai("hello")).unwrap();
        assert_eq!(value, json!({"type": "ai", "data": {"content": "hello"}}));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<Message, _> =
            serde_json::from_value(json!({"type": "system", "data": {"content": "x"}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_null_content_becomes_empty() {
        let message: Message =
            serde_json::from_value(json!({"type": "human", "data": {"content": null}})).unwrap();
        assert_eq!(message, Message::human(""));
    }
}
