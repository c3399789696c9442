//! Root wiring between agent choice, stored history and the conversation
//! on screen.
//!
//! The coordinator never performs I/O itself. Every operation returns the
//! [`Command`]s the front-end must run; their results are fed back through
//! [`Coordinator::history_listed`], [`Coordinator::history_loaded`] and
//! [`Coordinator::send_finished`].

use std::time::Instant;

use crate::api::{ClientError, HistoryRecord, SendRequest, SendResponse};
use crate::conversation::Conversation;
use crate::descriptor::{provision, ConversationDescriptor};
use crate::history::HistoryDirectory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListHistories,
    FetchHistory { guid: String },
    SendMessage { request: SendRequest },
}

pub struct Coordinator {
    default_agent: String,
    active_agent: Option<String>,
    history: HistoryDirectory,
    selected: Option<ConversationDescriptor>,
    conversation: Conversation,
}

impl Coordinator {
    pub fn new(default_agent: &str) -> Self {
        Self {
            default_agent: default_agent.to_string(),
            active_agent: None,
            history: HistoryDirectory::new(),
            selected: None,
            conversation: Conversation::new(provision(None, default_agent), Vec::new()),
        }
    }

    /// Commands to run once at start-up
    pub fn mount(&self) -> Vec<Command> {
        vec![Command::ListHistories]
    }

    /// Agent a freshly provisioned conversation would use
    pub fn preferred_agent(&self) -> &str {
        self.active_agent.as_deref().unwrap_or(&self.default_agent)
    }

    pub fn history(&self) -> &HistoryDirectory {
        &self.history
    }

    pub fn selected(&self) -> Option<&ConversationDescriptor> {
        self.selected.as_ref()
    }

    pub fn active_descriptor(&self) -> &ConversationDescriptor {
        self.conversation.descriptor()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    /// Leave any resumed history and start an empty conversation with `agent`.
    /// The history list is refreshed to pick up chats created elsewhere.
    pub fn start_new_chat(&mut self, agent: &str) -> Vec<Command> {
        self.selected = None;
        self.active_agent = Some(agent.to_string());

        let descriptor = provision(None, agent);
        tracing::info!(
            guid = %descriptor.chat_history_guid,
            agent = %descriptor.chat_agent,
            "starting new chat"
        );
        self.conversation.replace(descriptor, Vec::new());

        vec![Command::ListHistories]
    }

    /// Resume the stored conversation `guid`.
    ///
    /// Re-selecting the current conversation, an empty guid, or a guid not in
    /// the directory does nothing.
    pub fn select_history(&mut self, guid: &str) -> Vec<Command> {
        if guid.is_empty() {
            return Vec::new();
        }
        if self.selected.as_ref().is_some_and(|d| d.chat_history_guid == guid) {
            return Vec::new();
        }

        let Some(descriptor) = self.history.find(guid).cloned() else {
            tracing::warn!(%guid, "selected chat history not in directory");
            return Vec::new();
        };

        tracing::info!(%guid, agent = %descriptor.chat_agent, "resuming chat");
        let active = provision(Some(&descriptor), self.preferred_agent());
        self.selected = Some(descriptor);
        // Empty until the fetch lands, so nothing from the previous chat leaks in
        self.conversation.replace(active, Vec::new());

        vec![Command::FetchHistory {
            guid: guid.to_string(),
        }]
    }

    pub fn history_listed(
        &mut self,
        result: Result<Vec<ConversationDescriptor>, ClientError>,
    ) -> bool {
        self.history.apply_listing(result)
    }

    /// Apply a fetched conversation. Stale or failed fetches are dropped.
    pub fn history_loaded(&mut self, guid: &str, result: Result<HistoryRecord, ClientError>) -> bool {
        let still_selected = self
            .selected
            .as_ref()
            .is_some_and(|d| d.chat_history_guid == guid);
        if !still_selected {
            tracing::debug!(%guid, "discarding history for deselected chat");
            return false;
        }

        match result {
            Ok(record) => {
                tracing::info!(%guid, messages = record.messages.len(), "loaded chat history");
                self.conversation.replace_messages(record.messages);
                true
            }
            Err(e) => {
                tracing::warn!(%guid, "fetching chat history failed: {}", e);
                false
            }
        }
    }

    /// Submit the draft of the active conversation
    pub fn submit(&mut self, now: Instant) -> Option<Command> {
        self.conversation
            .submit(now)
            .map(|request| Command::SendMessage { request })
    }

    pub fn send_finished(&mut self, guid: &str, result: Result<SendResponse, ClientError>) -> bool {
        self.conversation.complete(guid, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Message;
    use reqwest::StatusCode;

    fn entry(guid: &str, agent: &str) -> ConversationDescriptor {
        ConversationDescriptor {
            date: "2024-04-02T09:30:00.000Z".to_string(),
            chat_history_guid: guid.to_string(),
            chat_agent: agent.to_string(),
        }
    }

    fn record(guid: &str, messages: Vec<Message>) -> HistoryRecord {
        HistoryRecord {
            descriptor: entry(guid, "CodingWizard"),
            messages,
        }
    }

    fn coordinator_with_history() -> Coordinator {
        let mut coordinator = Coordinator::new("AgentFramework");
        coordinator.history_listed(Ok(vec![
            entry("G", "CodingWizard"),
            entry("H", "research_agent"),
        ]));
        coordinator
    }

    #[test]
    fn test_mount_lists_history() {
        let coordinator = Coordinator::new("AgentFramework");
        assert_eq!(coordinator.mount(), vec![Command::ListHistories]);
        assert_eq!(coordinator.active_descriptor().chat_agent, "AgentFramework");
        assert!(coordinator.conversation().messages().is_empty());
    }

    #[test]
    fn test_select_history_fetches_once() {
        let mut coordinator = coordinator_with_history();

        let commands = coordinator.select_history("G");
        assert_eq!(commands, vec![Command::FetchHistory { guid: "G".to_string() }]);
        assert_eq!(coordinator.active_descriptor().chat_history_guid, "G");
        assert_eq!(coordinator.active_descriptor().chat_agent, "CodingWizard");

        // Same selection again triggers nothing
        assert!(coordinator.select_history("G").is_empty());
    }

    #[test]
    fn test_history_load_replaces_entire_log() {
        let mut coordinator = coordinator_with_history();
        coordinator.conversation_mut().input_mut().push_str("draft");
        coordinator.submit(Instant::now());
        assert_eq!(coordinator.conversation().messages().len(), 1);

        coordinator.select_history("G");
        assert!(coordinator.conversation().messages().is_empty());

        let stored = vec![Message::human("q"), Message::ai("a")];
        assert!(coordinator.history_loaded("G", Ok(record("G", stored.clone()))));
        assert_eq!(coordinator.conversation().messages(), stored.as_slice());
    }

    #[test]
    fn test_send_during_history_load_keeps_both() {
        let mut coordinator = coordinator_with_history();
        coordinator.select_history("G");

        coordinator.conversation_mut().input_mut().push_str("new q");
        let Some(Command::SendMessage { request }) = coordinator.submit(Instant::now()) else {
            panic!("expected a send command");
        };

        let stored = vec![Message::human("old q"), Message::ai("old a")];
        assert!(coordinator.history_loaded("G", Ok(record("G", stored))));
        let contents: Vec<&str> = coordinator
            .conversation()
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, ["old q", "old a", "new q"]);

        let reply = SendResponse {
            response: "R".to_string(),
            chat_history_guid: None,
            agent_name: None,
            agent_tools: serde_json::Value::Null,
        };
        assert!(coordinator.send_finished(&request.chat_history_guid, Ok(reply)));
        let contents: Vec<&str> = coordinator
            .conversation()
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, ["old q", "old a", "new q", "R"]);
    }

    #[test]
    fn test_stale_history_load_ignored() {
        let mut coordinator = coordinator_with_history();
        coordinator.select_history("G");
        coordinator.select_history("H");

        assert!(!coordinator.history_loaded("G", Ok(record("G", vec![Message::ai("stale")]))));
        assert!(coordinator.conversation().messages().is_empty());
        assert_eq!(coordinator.active_descriptor().chat_history_guid, "H");
    }

    #[test]
    fn test_failed_history_load_is_silent() {
        let mut coordinator = coordinator_with_history();
        coordinator.select_history("G");
        let err = ClientError::Status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!coordinator.history_loaded("G", Err(err)));
        assert!(coordinator.conversation().errors().is_empty());
    }

    #[test]
    fn test_unknown_or_empty_selection_ignored() {
        let mut coordinator = coordinator_with_history();
        assert!(coordinator.select_history("").is_empty());
        assert!(coordinator.select_history("missing").is_empty());
        assert!(coordinator.selected().is_none());
    }

    #[test]
    fn test_start_new_chat_resets_selection_and_refreshes() {
        let mut coordinator = coordinator_with_history();
        coordinator.select_history("G");
        coordinator.history_loaded("G", Ok(record("G", vec![Message::ai("old")])));

        let commands = coordinator.start_new_chat("no_tools_agent");
        assert_eq!(commands, vec![Command::ListHistories]);
        assert!(coordinator.selected().is_none());
        assert!(coordinator.conversation().messages().is_empty());

        let active = coordinator.active_descriptor();
        assert_eq!(active.chat_agent, "no_tools_agent");
        assert_ne!(active.chat_history_guid, "G");
        assert_eq!(coordinator.preferred_agent(), "no_tools_agent");
    }

    #[test]
    fn test_new_chat_descriptor_stable_across_sends() {
        let mut coordinator = Coordinator::new("AgentFramework");
        let guid = coordinator.active_descriptor().chat_history_guid.clone();

        coordinator.conversation_mut().input_mut().push_str("one");
        let Some(Command::SendMessage { request }) = coordinator.submit(Instant::now()) else {
            panic!("expected a send command");
        };
        assert_eq!(request.chat_history_guid, guid);

        coordinator.history_listed(Ok(vec![entry("X", "CodingWizard")]));
        assert_eq!(coordinator.active_descriptor().chat_history_guid, guid);
    }

    #[test]
    fn test_send_reply_after_switch_is_dropped() {
        let mut coordinator = coordinator_with_history();
        coordinator.conversation_mut().input_mut().push_str("hello");
        let Some(Command::SendMessage { request }) = coordinator.submit(Instant::now()) else {
            panic!("expected a send command");
        };

        coordinator.select_history("H");
        let late = SendResponse {
            response: "late".to_string(),
            chat_history_guid: None,
            agent_name: None,
            agent_tools: serde_json::Value::Null,
        };
        assert!(!coordinator.send_finished(&request.chat_history_guid, Ok(late)));
        assert!(coordinator.conversation().messages().is_empty());
    }
}
