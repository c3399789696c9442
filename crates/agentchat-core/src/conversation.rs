//! Live state of the conversation on screen: message log, draft input,
//! the Idle/Sending machine, and the errors raised while sending.

use std::time::Instant;

use crate::api::{ClientError, SendRequest, SendResponse};
use crate::descriptor::ConversationDescriptor;
use crate::error_surface::{ErrorSurface, UiError};
use crate::state::Message;

/// Category recorded for failed sends
pub const SEND_ERROR_CATEGORY: &str = "Sending Chat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Sending {
        started: Instant,
        /// Log as it was before the optimistic append
        snapshot: Vec<Message>,
        text: String,
    },
}

#[derive(Debug, Clone)]
pub struct Conversation {
    descriptor: ConversationDescriptor,
    messages: Vec<Message>,
    input: String,
    state: SendState,
    errors: ErrorSurface,
    scroll_requested: bool,
}

impl Conversation {
    pub fn new(descriptor: ConversationDescriptor, messages: Vec<Message>) -> Self {
        Self {
            descriptor,
            messages,
            input: String::new(),
            state: SendState::Idle,
            errors: ErrorSurface::new(),
            scroll_requested: true,
        }
    }

    pub fn descriptor(&self) -> &ConversationDescriptor {
        &self.descriptor
    }

    pub fn guid(&self) -> &str {
        &self.descriptor.chat_history_guid
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.state, SendState::Sending { .. })
    }

    /// Whole seconds spent waiting on the current send
    pub fn elapsed_secs(&self, now: Instant) -> Option<u64> {
        match &self.state {
            SendState::Sending { started, .. } => {
                Some(now.saturating_duration_since(*started).as_secs())
            }
            SendState::Idle => None,
        }
    }

    pub fn errors(&self) -> &ErrorSurface {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorSurface {
        &mut self.errors
    }

    /// Swap in another conversation. The log is replaced wholesale, the draft
    /// is dropped and any outstanding send is forgotten.
    pub fn replace(&mut self, descriptor: ConversationDescriptor, messages: Vec<Message>) {
        if self.is_sending() {
            tracing::debug!(
                guid = %self.descriptor.chat_history_guid,
                "dropping in-flight send on conversation switch"
            );
        }
        self.descriptor = descriptor;
        self.messages = messages;
        self.input.clear();
        self.state = SendState::Idle;
        self.scroll_requested = true;
    }

    /// Replace the log of the current conversation, e.g. once its stored
    /// history arrives. Descriptor and draft are kept. An outstanding send is
    /// rebased onto the new log and its message stays at the end.
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        match &mut self.state {
            SendState::Sending { snapshot, text, .. } => {
                snapshot.clone_from(&messages);
                self.messages = messages;
                self.messages.push(Message::human(text.clone()));
            }
            SendState::Idle => self.messages = messages,
        }
        self.scroll_requested = true;
    }

    /// Take the draft, append it optimistically and enter Sending.
    ///
    /// Returns `None` while a send is outstanding or when the draft is blank.
    pub fn submit(&mut self, now: Instant) -> Option<SendRequest> {
        if self.is_sending() || self.input.trim().is_empty() {
            return None;
        }

        let text = std::mem::take(&mut self.input);
        let snapshot = self.messages.clone();
        self.messages.push(Message::human(text.clone()));
        self.scroll_requested = true;

        self.state = SendState::Sending {
            started: now,
            snapshot,
            text: text.clone(),
        };

        Some(SendRequest {
            user_input: text,
            chat_agent: self.descriptor.chat_agent.clone(),
            chat_history_guid: self.descriptor.chat_history_guid.clone(),
        })
    }

    /// Apply the outcome of a send issued for `guid`.
    ///
    /// Results for a conversation that is no longer active are discarded and
    /// `false` is returned.
    pub fn complete(&mut self, guid: &str, result: Result<SendResponse, ClientError>) -> bool {
        if guid != self.descriptor.chat_history_guid {
            tracing::debug!(%guid, "discarding reply for inactive conversation");
            return false;
        }

        let SendState::Sending { snapshot, text, .. } =
            std::mem::replace(&mut self.state, SendState::Idle)
        else {
            tracing::debug!(%guid, "discarding reply with no send outstanding");
            return false;
        };

        match result {
            Ok(reply) => {
                // Rebuilt from the pre-send snapshot, so the optimistic copy is not doubled
                let mut messages = snapshot;
                messages.push(Message::human(text));
                messages.push(Message::ai(reply.response));
                self.messages = messages;
            }
            Err(e) => {
                tracing::error!(%guid, "sending chat failed: {}", e);
                self.errors.push(UiError::new(SEND_ERROR_CATEGORY, e.to_string()));
            }
        }

        self.scroll_requested = true;
        true
    }

    /// True once after each log mutation
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }
}
