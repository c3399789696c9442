use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::HistoryListed(result) => app.history_listed(result),
        AppEvent::HistoryLoaded { guid, result } => app.history_loaded(&guid, result),
        AppEvent::SendFinished { guid, result } => {
            if app.coordinator.send_finished(&guid, result) {
                app.send_finished();
            }
        }
    }
    app.sync_scroll();
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    if app.popup.is_some() {
        handle_picker(app, key);
        return;
    }
    if app.focus == FocusPane::Errors {
        handle_errors(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Tab => app.input_mode = InputMode::Editing,

        KeyCode::Char('n') => app.open_agent_picker(),
        KeyCode::Char('r') => app.open_history_picker(),

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(1)),
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(1)),
        KeyCode::Char('g') => app.scroll_top(),
        KeyCode::Char('G') => app.scroll_bottom(),

        // Code blocks
        KeyCode::Char(']') => app.select_next_code_block(),
        KeyCode::Char('[') => app.select_prev_code_block(),
        KeyCode::Char('y') => app.copy_selected_code(),

        KeyCode::Char('e') => app.focus_errors(),
        KeyCode::Esc => app.selected_code = None,
        _ => {}
    }
}

fn handle_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.popup = None,
        KeyCode::Char('j') | KeyCode::Down => app.picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.picker_nav_up(),
        KeyCode::Enter => app.picker_confirm(),
        _ => {}
    }
}

fn handle_errors(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_errors(),
        KeyCode::Char('j') | KeyCode::Down => app.error_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.error_nav_up(),
        KeyCode::Char('d') | KeyCode::Char('x') | KeyCode::Delete => app.dismiss_selected_error(),
        KeyCode::Tab | KeyCode::Char('e') => app.focus = FocusPane::Chat,
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    let newline = (key.code == KeyCode::Enter && key.modifiers.contains(KeyModifiers::ALT))
        || (key.code == KeyCode::Char('j') && key.modifiers.contains(KeyModifiers::CONTROL));
    if newline {
        insert_char(app, '\n');
        return;
    }

    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            if !app.coordinator.conversation().is_sending() {
                app.submit();
                if app.coordinator.conversation().input().is_empty() {
                    app.input_mode = InputMode::Normal;
                }
            }
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let input = app.coordinator.conversation_mut().input_mut();
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let input = app.coordinator.conversation_mut().input_mut();
            if app.input_cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.coordinator.conversation().input().chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.coordinator.conversation().input().chars().count();
        }
        KeyCode::Char(c) => insert_char(app, c),
        _ => {}
    }
}

fn insert_char(app: &mut App, c: char) {
    let input = app.coordinator.conversation_mut().input_mut();
    let byte_pos = char_to_byte_index(input, app.input_cursor);
    input.insert(byte_pos, c);
    app.input_cursor += 1;
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentchat_core::{
        Agent, ChatApiClient, Clipboard, ConversationDescriptor, HistoryRecord, Message,
        SendResponse,
    };
    use tokio::sync::mpsc;

    struct NoClipboard;

    impl Clipboard for NoClipboard {
        fn set_text(&mut self, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = ChatApiClient::new("http://127.0.0.1:9");
        (App::new(client, Agent::default(), tx, Box::new(NoClipboard)), rx)
    }

    fn entry(guid: &str) -> ConversationDescriptor {
        ConversationDescriptor {
            date: "2024-04-02T09:30:00.000Z".to_string(),
            chat_history_guid: guid.to_string(),
            chat_agent: "CodingWizard".to_string(),
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        let key = KeyEvent::new(code, KeyModifiers::NONE);
        handle_event(app, AppEvent::Key(key)).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_history_loaded_keeps_draft_cursor() {
        let (mut app, _rx) = app();
        handle_event(&mut app, AppEvent::HistoryListed(Ok(vec![entry("G")]))).unwrap();
        app.select_history("G");

        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "abc");

        let record = HistoryRecord {
            descriptor: entry("G"),
            messages: vec![Message::human("old q"), Message::ai("old a")],
        };
        handle_event(
            &mut app,
            AppEvent::HistoryLoaded {
                guid: "G".to_string(),
                result: Ok(record),
            },
        )
        .unwrap();
        type_text(&mut app, "d");

        assert_eq!(app.coordinator.conversation().input(), "abcd");
        assert_eq!(app.coordinator.conversation().messages().len(), 2);
        assert!(app.stick_to_bottom);
    }

    #[tokio::test]
    async fn test_send_finished_event_appends_reply() {
        let (mut app, _rx) = app();
        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "hi");
        press(&mut app, KeyCode::Enter);
        assert!(app.coordinator.conversation().is_sending());
        assert_eq!(app.input_mode, InputMode::Normal);

        let guid = app.coordinator.active_descriptor().chat_history_guid.clone();
        let reply = SendResponse {
            response: "hello".to_string(),
            chat_history_guid: None,
            agent_name: None,
            agent_tools: serde_json::Value::Null,
        };
        handle_event(&mut app, AppEvent::SendFinished { guid, result: Ok(reply) }).unwrap();

        let messages = app.coordinator.conversation().messages();
        assert_eq!(messages, &[Message::human("hi"), Message::ai("hello")]);
        assert!(!app.coordinator.conversation().is_sending());
    }

    #[tokio::test]
    async fn test_history_refresh_keeps_picker_on_entry() {
        let (mut app, _rx) = app();
        handle_event(&mut app, AppEvent::HistoryListed(Ok(vec![entry("G"), entry("H")]))).unwrap();

        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.history_picker_state.selected(), Some(2));

        let refreshed = vec![entry("N"), entry("G"), entry("H")];
        handle_event(&mut app, AppEvent::HistoryListed(Ok(refreshed))).unwrap();
        assert_eq!(app.history_picker_state.selected(), Some(3));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.coordinator.active_descriptor().chat_history_guid, "H");
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("héllo", 10), "héllo".len());
        assert_eq!(char_to_byte_index("", 0), 0);
    }
}
