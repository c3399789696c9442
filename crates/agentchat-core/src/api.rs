use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::descriptor::ConversationDescriptor;
use crate::state::{Message, WireMessage};

/// Failure talking to the agent backend
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error! status: {}", .0.as_u16())]
    Status(StatusCode),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Body of `POST /chat/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendRequest {
    pub user_input: String,
    pub chat_agent: String,
    pub chat_history_guid: String,
}

/// Reply from `POST /chat/`
#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    pub response: String,
    #[serde(default)]
    pub chat_history_guid: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub agent_tools: serde_json::Value,
}

#[derive(Deserialize)]
struct HistoryListResponse {
    #[serde(default)]
    chat_history_metadata: Option<Vec<ConversationDescriptor>>,
}

/// One stored conversation, as returned by `GET /chat/history/?chat_history_guid=`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub descriptor: ConversationDescriptor,
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
struct HistoryRecordResponse {
    #[serde(flatten)]
    descriptor: ConversationDescriptor,
    #[serde(default)]
    chat_history_contents: Option<Vec<WireMessage>>,
}

impl From<HistoryRecordResponse> for HistoryRecord {
    fn from(raw: HistoryRecordResponse) -> Self {
        let messages = raw
            .chat_history_contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|wire| match Message::try_from(wire) {
                Ok(message) => Some(message),
                Err(e) => {
                    tracing::warn!(
                        guid = %raw.descriptor.chat_history_guid,
                        "skipping history entry: {}",
                        e
                    );
                    None
                }
            })
            .collect();

        Self {
            descriptor: raw.descriptor,
            messages,
        }
    }
}

/// HTTP client for the chat backend
#[derive(Clone)]
pub struct ChatApiClient {
    client: Client,
    base_url: String,
    send_timeout: Option<Duration>,
}

impl ChatApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            send_timeout: None,
        }
    }

    /// Apply a per-request timeout to message sends
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn history_url(&self) -> String {
        format!("{}/chat/history/", self.base_url)
    }

    /// `GET /chat/history/`. A missing metadata list is reported as empty.
    pub async fn list_histories(&self) -> Result<Vec<ConversationDescriptor>, ClientError> {
        let response = self.client.get(self.history_url()).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        let body = response.bytes().await?;
        let listing: HistoryListResponse = serde_json::from_slice(&body)?;
        Ok(listing.chat_history_metadata.unwrap_or_default())
    }

    /// `GET /chat/history/?chat_history_guid=<guid>`
    pub async fn fetch_history(&self, guid: &str) -> Result<HistoryRecord, ClientError> {
        let response = self
            .client
            .get(self.history_url())
            .query(&[("chat_history_guid", guid)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        let body = response.bytes().await?;
        let record: HistoryRecordResponse = serde_json::from_slice(&body)?;
        Ok(record.into())
    }

    /// `POST /chat/`
    pub async fn send_message(&self, request: &SendRequest) -> Result<SendResponse, ClientError> {
        let url = format!("{}/chat/", self.base_url);

        let mut builder = self.client.post(&url).json(request);
        if let Some(timeout) = self.send_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Role;
    use serde_json::json;

    #[test]
    fn test_status_error_message() {
        let err = ClientError::Status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ChatApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.history_url(), "http://localhost:8000/chat/history/");
    }

    #[test]
    fn test_history_record_skips_unknown_roles() {
        let raw: HistoryRecordResponse = serde_json::from_value(json!({
            "chat_history_guid": "g-1",
            "chat_agent": "CodingWizard",
            "date": "2024-01-01T00:00:00.000Z",
            "chat_history_contents": [
                {"type": "human", "data": {"content": "hi"}},
                {"type": "system", "data": {"content": "ignored"}},
                {"type": "ai", "data": {"content": "hello"}}
            ]
        }))
        .unwrap();

        let record = HistoryRecord::from(raw);
        assert_eq!(record.descriptor.chat_history_guid, "g-1");
        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.messages[0].role, Role::Human);
        assert_eq!(record.messages[1], Message::ai("hello"));
    }

    #[test]
    fn test_history_record_without_contents() {
        let raw: HistoryRecordResponse =
            serde_json::from_value(json!({"chat_history_guid": "g-2"})).unwrap();
        let record = HistoryRecord::from(raw);
        assert!(record.messages.is_empty());
        assert_eq!(record.descriptor.chat_agent, "");
    }

    #[test]
    fn test_send_request_body_fields() {
        let request = SendRequest {
            user_input: "hello".to_string(),
            chat_agent: "AgentFramework".to_string(),
            chat_history_guid: "g-1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "user_input": "hello",
                "chat_agent": "AgentFramework",
                "chat_history_guid": "g-1"
            })
        );
    }
}
