use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata identifying one conversation stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationDescriptor {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub chat_history_guid: String,
    #[serde(default)]
    pub chat_agent: String,
}

impl ConversationDescriptor {
    /// Label used by the history picker
    pub fn label(&self) -> String {
        format!("{} | {} | {}", self.date, self.chat_agent, self.chat_history_guid)
    }
}

/// Return `existing` untouched, or mint a fresh descriptor for `preferred_agent`.
pub fn provision(
    existing: Option<&ConversationDescriptor>,
    preferred_agent: &str,
) -> ConversationDescriptor {
    match existing {
        Some(descriptor) => descriptor.clone(),
        None => ConversationDescriptor {
            // Same shape as a browser `toISOString()`: 2024-05-01T12:00:00.000Z
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            chat_history_guid: Uuid::new_v4().to_string(),
            chat_agent: preferred_agent.to_string(),
        },
    }
}
