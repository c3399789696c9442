pub mod agent;
pub mod api;
pub mod config;
pub mod conversation;
pub mod coordinator;
pub mod copy;
pub mod descriptor;
pub mod error_surface;
pub mod highlight;
pub mod history;
pub mod render;
pub mod state;

// Re-export main types for convenience
pub use agent::{Agent, UnknownAgent};
pub use api::{ChatApiClient, ClientError, HistoryRecord, SendRequest, SendResponse};
pub use config::{Config, Overrides, Settings};
pub use conversation::Conversation;
pub use coordinator::{Command, Coordinator};
pub use copy::{Clipboard, CopyButtons};
pub use descriptor::{provision, ConversationDescriptor};
pub use error_surface::{ErrorSurface, UiError};
pub use history::HistoryDirectory;
pub use render::{Block, MarkdownRenderer, RenderedMessage};
pub use state::{Message, Role};
