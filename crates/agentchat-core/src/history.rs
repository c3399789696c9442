use crate::api::ClientError;
use crate::descriptor::ConversationDescriptor;

pub const PICKER_PLACEHOLDER: &str = "Pick a previous chat to resume";

/// Conversations known to the backend, as last listed
#[derive(Debug, Clone, Default)]
pub struct HistoryDirectory {
    entries: Vec<ConversationDescriptor>,
}

impl HistoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ConversationDescriptor] {
        &self.entries
    }

    /// Fold a listing result into the directory.
    ///
    /// Only a non-empty listing replaces what we have; failures are logged
    /// and otherwise ignored. Returns true when the entries changed.
    pub fn apply_listing(&mut self, result: Result<Vec<ConversationDescriptor>, ClientError>) -> bool {
        match result {
            Ok(entries) if !entries.is_empty() => {
                tracing::info!(count = entries.len(), "loaded chat history list");
                self.entries = entries;
                true
            }
            Ok(_) => {
                tracing::debug!("chat history list empty, keeping previous entries");
                false
            }
            Err(e) => {
                tracing::warn!("listing chat history failed: {}", e);
                false
            }
        }
    }

    pub fn find(&self, guid: &str) -> Option<&ConversationDescriptor> {
        self.entries.iter().find(|entry| entry.chat_history_guid == guid)
    }

    /// Picker rows: the disabled placeholder first, then one row per entry
    pub fn picker_options(&self) -> Vec<String> {
        std::iter::once(PICKER_PLACEHOLDER.to_string())
            .chain(self.entries.iter().map(ConversationDescriptor::label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn entry(guid: &str, agent: &str) -> ConversationDescriptor {
        ConversationDescriptor {
            date: "2024-04-02T09:30:00.000Z".to_string(),
            chat_history_guid: guid.to_string(),
            chat_agent: agent.to_string(),
        }
    }

    #[test]
    fn test_empty_directory_shows_only_placeholder() {
        let directory = HistoryDirectory::new();
        assert_eq!(directory.picker_options(), vec![PICKER_PLACEHOLDER.to_string()]);
    }

    #[test]
    fn test_populated_listing_adds_options() {
        let mut directory = HistoryDirectory::new();
        assert!(directory.apply_listing(Ok(vec![entry("g-1", "CodingWizard"), entry("g-2", "research_agent")])));

        let options = directory.picker_options();
        assert_eq!(options.len(), 3);
        assert_eq!(options[1], "2024-04-02T09:30:00.000Z | CodingWizard | g-1");
        assert_eq!(options[2], "2024-04-02T09:30:00.000Z | research_agent | g-2");
    }

    #[test]
    fn test_empty_listing_keeps_previous_entries() {
        let mut directory = HistoryDirectory::new();
        directory.apply_listing(Ok(vec![entry("g-1", "CodingWizard")]));
        assert!(!directory.apply_listing(Ok(Vec::new())));
        assert_eq!(directory.entries().len(), 1);
    }

    #[test]
    fn test_failed_listing_keeps_previous_entries() {
        let mut directory = HistoryDirectory::new();
        directory.apply_listing(Ok(vec![entry("g-1", "CodingWizard")]));
        assert!(!directory.apply_listing(Err(ClientError::Status(StatusCode::NOT_FOUND))));
        assert_eq!(directory.find("g-1").map(|e| e.chat_agent.as_str()), Some("CodingWizard"));
    }

    #[test]
    fn test_find_unknown_guid() {
        let mut directory = HistoryDirectory::new();
        directory.apply_listing(Ok(vec![entry("g-1", "CodingWizard")]));
        assert!(directory.find("g-9").is_none());
    }
}
