use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::time::Instant;

use agentchat_core::{
    Agent, ChatApiClient, ClientError, Clipboard, Command, ConversationDescriptor, Coordinator,
    CopyButtons, HistoryRecord, MarkdownRenderer, RenderedMessage,
};
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    AgentPicker,
    HistoryPicker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Errors,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub popup: Option<Popup>,

    pub coordinator: Coordinator,
    client: ChatApiClient,
    events: UnboundedSender<AppEvent>,
    fetch_task: Option<JoinHandle<()>>,
    send_task: Option<JoinHandle<()>>,

    // Draft cursor, in chars
    pub input_cursor: usize,

    // Chat view; sizes are written back by the renderer
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub total_chat_lines: u16,
    pub stick_to_bottom: bool,

    // 0-2 for the "Thinking" ellipsis
    pub animation_frame: u8,

    pub agent_picker_state: ListState,
    pub history_picker_state: ListState,
    pub error_state: ListState,

    // Code block targeted by the copy key: (message index, block index)
    pub selected_code: Option<(usize, usize)>,
    pub reveal_selected_code: bool,
    pub copy_buttons: CopyButtons,
    clipboard: Box<dyn Clipboard>,

    renderer: MarkdownRenderer,
    render_cache: HashMap<usize, (u64, Rc<RenderedMessage>)>,
}

fn content_hash(content: &str) -> u64 {
    let mut h = DefaultHasher::new();
    content.hash(&mut h);
    h.finish()
}

impl App {
    pub fn new(
        client: ChatApiClient,
        default_agent: Agent,
        events: UnboundedSender<AppEvent>,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Chat,
            popup: None,
            coordinator: Coordinator::new(default_agent.as_str()),
            client,
            events,
            fetch_task: None,
            send_task: None,
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            total_chat_lines: 0,
            stick_to_bottom: true,
            animation_frame: 0,
            agent_picker_state: ListState::default(),
            history_picker_state: ListState::default(),
            error_state: ListState::default(),
            selected_code: None,
            reveal_selected_code: false,
            copy_buttons: CopyButtons::new(),
            clipboard,
            renderer: MarkdownRenderer::new(),
            render_cache: HashMap::new(),
        }
    }

    pub fn mount(&mut self) {
        let commands = self.coordinator.mount();
        self.run_commands(commands);
    }

    /// Start background work for each command. Results come back as
    /// [`AppEvent`]s on the UI loop.
    pub fn run_commands(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::ListHistories => {
                    let client = self.client.clone();
                    let tx = self.events.clone();
                    tokio::spawn(async move {
                        let result = client.list_histories().await;
                        let _ = tx.send(AppEvent::HistoryListed(result));
                    });
                }
                Command::FetchHistory { guid } => {
                    if let Some(task) = self.fetch_task.take() {
                        task.abort();
                    }
                    let client = self.client.clone();
                    let tx = self.events.clone();
                    self.fetch_task = Some(tokio::spawn(async move {
                        let result = client.fetch_history(&guid).await;
                        let _ = tx.send(AppEvent::HistoryLoaded { guid, result });
                    }));
                }
                Command::SendMessage { request } => {
                    let client = self.client.clone();
                    let tx = self.events.clone();
                    self.send_task = Some(tokio::spawn(async move {
                        let result = client.send_message(&request).await;
                        let guid = request.chat_history_guid;
                        let _ = tx.send(AppEvent::SendFinished { guid, result });
                    }));
                }
            }
        }
    }

    fn cancel_in_flight(&mut self) {
        for task in [self.fetch_task.take(), self.send_task.take()].into_iter().flatten() {
            task.abort();
        }
    }

    /// Reset per-conversation view state after the conversation was swapped out
    pub fn reset_view(&mut self) {
        self.input_cursor = 0;
        self.reset_log_view();
    }

    /// Reset state tied to the message log. The draft and its cursor are kept.
    fn reset_log_view(&mut self) {
        self.chat_scroll = 0;
        self.stick_to_bottom = true;
        self.selected_code = None;
        self.copy_buttons.clear();
        self.render_cache.clear();
    }

    pub fn history_listed(
        &mut self,
        result: Result<Vec<ConversationDescriptor>, ClientError>,
    ) {
        // Keep the history picker on the same entry across a refresh
        let highlighted = self.highlighted_history_guid();
        if !self.coordinator.history_listed(result) {
            return;
        }
        let row = highlighted.and_then(|guid| {
            self.coordinator
                .history()
                .entries()
                .iter()
                .position(|entry| entry.chat_history_guid == guid)
                .map(|i| i + 1)
        });
        self.history_picker_state.select(Some(row.unwrap_or(0)));
    }

    pub fn history_loaded(&mut self, guid: &str, result: Result<HistoryRecord, ClientError>) {
        if self.coordinator.history_loaded(guid, result) {
            self.reset_log_view();
            let draft_len = self.coordinator.conversation().input().chars().count();
            self.input_cursor = self.input_cursor.min(draft_len);
        }
    }

    pub fn start_new_chat(&mut self, agent: Agent) {
        self.cancel_in_flight();
        let commands = self.coordinator.start_new_chat(agent.as_str());
        self.reset_view();
        self.run_commands(commands);
    }

    pub fn select_history(&mut self, guid: &str) {
        let commands = self.coordinator.select_history(guid);
        if commands.is_empty() {
            return;
        }
        self.cancel_in_flight();
        self.reset_view();
        self.run_commands(commands);
    }

    pub fn submit(&mut self) {
        if let Some(command) = self.coordinator.submit(Instant::now()) {
            self.input_cursor = 0;
            self.run_commands(vec![command]);
        }
    }

    pub fn send_finished(&mut self) {
        self.send_task = None;
        if self.coordinator.conversation().errors().is_open() {
            self.error_state.select(Some(0));
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.coordinator.conversation().is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Follow the log to the bottom after the coordinator changed it
    pub fn sync_scroll(&mut self) {
        if self.coordinator.conversation_mut().take_scroll_request() {
            self.stick_to_bottom = true;
        }
    }

    /// Markdown for message `index`, re-rendered only when its content changed
    pub fn rendered(&mut self, index: usize) -> Option<Rc<RenderedMessage>> {
        let content = &self.coordinator.conversation().messages().get(index)?.content;
        let hash = content_hash(content);

        if let Some((cached_hash, rendered)) = self.render_cache.get(&index) {
            if *cached_hash == hash {
                return Some(Rc::clone(rendered));
            }
        }

        let rendered = Rc::new(self.renderer.render(content));
        self.render_cache.insert(index, (hash, Rc::clone(&rendered)));
        Some(rendered)
    }

    /// Every code block in the log, in display order
    pub fn code_block_keys(&mut self) -> Vec<(usize, usize)> {
        let count = self.coordinator.conversation().messages().len();
        let mut keys = Vec::new();
        for index in 0..count {
            if let Some(rendered) = self.rendered(index) {
                keys.extend((0..rendered.code_block_count()).map(|block| (index, block)));
            }
        }
        keys
    }

    pub fn select_next_code_block(&mut self) {
        let keys = self.code_block_keys();
        if keys.is_empty() {
            return;
        }
        let next = match self.selected_code.and_then(|key| keys.iter().position(|k| *k == key)) {
            Some(pos) => (pos + 1).min(keys.len() - 1),
            None => 0,
        };
        self.selected_code = Some(keys[next]);
        self.reveal_selected_code = true;
    }

    pub fn select_prev_code_block(&mut self) {
        let keys = self.code_block_keys();
        if keys.is_empty() {
            return;
        }
        let prev = match self.selected_code.and_then(|key| keys.iter().position(|k| *k == key)) {
            Some(pos) => pos.saturating_sub(1),
            None => keys.len() - 1,
        };
        self.selected_code = Some(keys[prev]);
        self.reveal_selected_code = true;
    }

    pub fn copy_selected_code(&mut self) {
        let Some((message, block)) = self.selected_code else {
            return;
        };
        let Some(rendered) = self.rendered(message) else {
            return;
        };
        if let Some(code) = rendered.code_block(block) {
            self.copy_buttons
                .activate((message, block), self.clipboard.as_mut(), &code.text, Instant::now());
        }
    }

    // Chat scrolling
    pub fn max_scroll(&self) -> u16 {
        self.total_chat_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.stick_to_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        if self.chat_scroll >= self.max_scroll() {
            self.stick_to_bottom = true;
        }
    }

    pub fn scroll_top(&mut self) {
        self.stick_to_bottom = false;
        self.chat_scroll = 0;
    }

    pub fn scroll_bottom(&mut self) {
        self.stick_to_bottom = true;
        self.chat_scroll = self.max_scroll();
    }

    // Pickers
    pub fn open_agent_picker(&mut self) {
        let current = Agent::all()
            .iter()
            .position(|agent| agent.as_str() == self.coordinator.preferred_agent())
            .unwrap_or(0);
        self.agent_picker_state.select(Some(current));
        self.popup = Some(Popup::AgentPicker);
    }

    pub fn open_history_picker(&mut self) {
        // Row 0 is the placeholder; start on the active conversation if listed
        let guid = self.coordinator.active_descriptor().chat_history_guid.clone();
        let row = self
            .coordinator
            .history()
            .entries()
            .iter()
            .position(|entry| entry.chat_history_guid == guid)
            .map_or(0, |i| i + 1);
        self.history_picker_state.select(Some(row));
        self.popup = Some(Popup::HistoryPicker);
    }

    fn highlighted_history_guid(&self) -> Option<String> {
        self.history_picker_state
            .selected()
            .and_then(|row| row.checked_sub(1))
            .and_then(|i| self.coordinator.history().entries().get(i))
            .map(|entry| entry.chat_history_guid.clone())
    }

    pub fn picker_len(&self) -> usize {
        match self.popup {
            Some(Popup::AgentPicker) => Agent::all().len(),
            Some(Popup::HistoryPicker) => self.coordinator.history().entries().len() + 1,
            None => 0,
        }
    }

    fn picker_state(&mut self) -> Option<&mut ListState> {
        match self.popup {
            Some(Popup::AgentPicker) => Some(&mut self.agent_picker_state),
            Some(Popup::HistoryPicker) => Some(&mut self.history_picker_state),
            None => None,
        }
    }

    pub fn picker_nav_down(&mut self) {
        let len = self.picker_len();
        if let Some(state) = self.picker_state() {
            if len > 0 {
                let i = state.selected().unwrap_or(0);
                state.select(Some((i + 1).min(len - 1)));
            }
        }
    }

    pub fn picker_nav_up(&mut self) {
        if let Some(state) = self.picker_state() {
            let i = state.selected().unwrap_or(0);
            state.select(Some(i.saturating_sub(1)));
        }
    }

    /// Apply the highlighted picker row. The history placeholder row is inert.
    pub fn picker_confirm(&mut self) {
        match self.popup {
            Some(Popup::AgentPicker) => {
                let agent = self
                    .agent_picker_state
                    .selected()
                    .and_then(|i| Agent::all().get(i).copied());
                if let Some(agent) = agent {
                    self.popup = None;
                    self.start_new_chat(agent);
                }
            }
            Some(Popup::HistoryPicker) => {
                if let Some(guid) = self.highlighted_history_guid() {
                    self.popup = None;
                    self.select_history(&guid);
                }
            }
            None => {}
        }
    }

    // Error surface
    pub fn focus_errors(&mut self) {
        if !self.coordinator.conversation().errors().visible().is_empty() {
            self.focus = FocusPane::Errors;
            if self.error_state.selected().is_none() {
                self.error_state.select(Some(0));
            }
        }
    }

    pub fn error_nav_down(&mut self) {
        let len = self.coordinator.conversation().errors().len();
        if len > 0 {
            let i = self.error_state.selected().unwrap_or(0);
            self.error_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn error_nav_up(&mut self) {
        let i = self.error_state.selected().unwrap_or(0);
        self.error_state.select(Some(i.saturating_sub(1)));
    }

    pub fn dismiss_selected_error(&mut self) {
        let Some(i) = self.error_state.selected() else {
            return;
        };
        let errors = self.coordinator.conversation_mut().errors_mut();
        errors.dismiss(i);

        if errors.is_open() && !errors.is_empty() {
            self.error_state.select(Some(i.min(errors.len() - 1)));
        } else {
            self.error_state.select(None);
            self.focus = FocusPane::Chat;
        }
    }

    pub fn close_errors(&mut self) {
        self.coordinator.conversation_mut().errors_mut().close();
        self.error_state.select(None);
        self.focus = FocusPane::Chat;
    }
}
