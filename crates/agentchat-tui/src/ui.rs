use std::time::Instant;

use agentchat_core::{Agent, Role};
use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame,
};

use crate::app::{App, FocusPane, InputMode, Popup};
use crate::markdown;

const UNKNOWN: &str = "unknown";

/// Ensure the selected item in a list is visible by adjusting the ListState offset.
fn ensure_selected_visible(state: &mut ListState, visible_height: usize) {
    let visible_height = visible_height.max(1);

    if let Some(selected) = state.selected() {
        let min_offset = selected.saturating_sub(visible_height - 1);
        let max_offset = selected;

        let new_offset = state.offset().clamp(min_offset, max_offset);
        if new_offset != state.offset() {
            *state.offset_mut() = new_offset;
        }
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        UNKNOWN
    } else {
        value
    }
}

/// Rows a line occupies once wrapped to `width` columns
fn wrapped_height(line: &Line, width: usize) -> usize {
    line.width().max(1).div_ceil(width.max(1))
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let errors_height = {
        let visible = app.coordinator.conversation().errors().visible().len();
        if visible == 0 {
            0
        } else {
            (visible.min(3) * 2 + 2) as u16
        }
    };
    let input_height = {
        let draft_lines = app.coordinator.conversation().input().split('\n').count();
        (draft_lines.clamp(1, 5) + 2) as u16
    };

    // Main layout: header, chat, errors, input, footer
    let [header_area, chat_area, errors_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(errors_height),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    if errors_height > 0 {
        render_errors(app, frame, errors_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    match app.popup {
        Some(Popup::AgentPicker) => render_agent_picker(app, frame, area),
        Some(Popup::HistoryPicker) => render_history_picker(app, frame, area),
        None => {}
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let descriptor = app.coordinator.active_descriptor();
    let label_style = Style::default().fg(Color::Cyan).bold();
    let value_style = Style::default().fg(Color::White);

    let title = Line::from(vec![
        Span::styled(" Chat Date: ", label_style),
        Span::styled(or_unknown(&descriptor.date).to_string(), value_style),
        Span::styled("  Chat Agent: ", label_style),
        Span::styled(or_unknown(&descriptor.chat_agent).to_string(), value_style),
        Span::styled("  Chat ID: ", label_style),
        Span::styled(or_unknown(&descriptor.chat_history_guid).to_string(), value_style),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let now = Instant::now();

    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let focused = app.focus == FocusPane::Chat && app.input_mode == InputMode::Normal;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.coordinator.active_descriptor().chat_agent));

    let message_count = app.coordinator.conversation().messages().len();
    let elapsed = app.coordinator.conversation().elapsed_secs(now);

    if message_count == 0 && elapsed.is_none() {
        let placeholder = Paragraph::new(Text::from(Span::styled(
            "Press i to start typing, n for a new chat, r to resume one...",
            Style::default().fg(Color::DarkGray),
        )))
        .block(chat_block);
        frame.render_widget(placeholder, area);
        app.total_chat_lines = 0;
        app.chat_scroll = 0;
        return;
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut selected_line = None;

    for index in 0..message_count {
        let role = app.coordinator.conversation().messages()[index].role;
        let (label, color) = match role {
            Role::Human => ("You:", Color::Cyan),
            Role::Ai => ("AI:", Color::Yellow),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));

        if let Some(rendered) = app.rendered(index) {
            let labels: Vec<&str> = (0..rendered.code_block_count())
                .map(|block| app.copy_buttons.label((index, block), now))
                .collect();
            let selected = app
                .selected_code
                .filter(|(message, _)| *message == index)
                .map(|(_, block)| block);

            let out = markdown::message_lines(&rendered, &labels, selected);
            if let Some(header) = selected.and_then(|block| out.code_headers.get(block)) {
                selected_line = Some(lines.len() + header);
            }
            lines.extend(out.lines);
        }
        lines.push(Line::default());
    }

    if let Some(secs) = elapsed {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(vec![
            Span::styled(
                format!("Thinking{:<3} ", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
            Span::styled(format!("{} seconds", secs), Style::default().fg(Color::Gray)),
        ]));
    }

    // Wrapped row offsets so scrolling works in screen rows
    let width = app.chat_width as usize;
    let mut row_of_line = Vec::with_capacity(lines.len());
    let mut total_rows = 0usize;
    for line in &lines {
        row_of_line.push(total_rows);
        total_rows += wrapped_height(line, width);
    }
    app.total_chat_lines = total_rows.min(u16::MAX as usize) as u16;

    if app.reveal_selected_code {
        app.reveal_selected_code = false;
        if let Some(row) = selected_line.and_then(|line| row_of_line.get(line)) {
            app.stick_to_bottom = false;
            app.chat_scroll = (*row).min(u16::MAX as usize) as u16;
        }
    } else if app.stick_to_bottom {
        app.chat_scroll = app.max_scroll();
    }
    app.chat_scroll = app.chat_scroll.min(app.max_scroll());

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if app.max_scroll() > 0 {
        let mut scrollbar_state =
            ScrollbarState::new(app.max_scroll() as usize).position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_errors(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Errors;
    let border_color = if focused { Color::Red } else { Color::DarkGray };

    let count = app.coordinator.conversation().errors().visible().len();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Errors ({}) - e to focus, d to dismiss, Esc to close ", count));

    let items: Vec<ListItem> = app
        .coordinator
        .conversation()
        .errors()
        .visible()
        .iter()
        .map(|error| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(
                        error.title(),
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled("[dismiss]", Style::default().fg(Color::DarkGray)),
                ]),
                Line::from(format!("  {}", error.message)),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Red)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    if focused {
        let visible_items = (area.height.saturating_sub(2) / 2) as usize;
        ensure_selected_visible(&mut app.error_state, visible_items);
        frame.render_stateful_widget(list, area, &mut app.error_state);
    } else {
        frame.render_widget(list, area);
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let conversation = app.coordinator.conversation();
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let title = if conversation.is_sending() {
        " Waiting for reply... "
    } else if editing {
        " Message (Enter to send, Alt+Enter for newline, Esc to stop) "
    } else {
        " Message (i to type) "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Cursor row/column within the draft
    let before_cursor: String = conversation.input().chars().take(app.input_cursor).collect();
    let cursor_row = before_cursor.matches('\n').count();
    let cursor_col = before_cursor
        .rsplit('\n')
        .next()
        .map_or(0, |line| line.chars().count());

    let inner_height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_y = cursor_row.saturating_sub(inner_height.saturating_sub(1));
    let scroll_x = if inner_width > 0 && cursor_col >= inner_width {
        cursor_col - inner_width + 1
    } else {
        0
    };

    // Use cyan text to match the "You:" style
    let input = Paragraph::new(conversation.input().to_string())
        .style(Style::default().fg(Color::Cyan))
        .block(input_block)
        .scroll((scroll_y as u16, scroll_x as u16));
    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((
            area.x + (cursor_col - scroll_x) as u16 + 1,
            area.y + (cursor_row - scroll_y) as u16 + 1,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match (app.input_mode, app.focus) {
        (InputMode::Editing, _) => " INSERT ",
        (InputMode::Normal, FocusPane::Errors) => " ERRORS ",
        (InputMode::Normal, FocusPane::Chat) => " CHAT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<(&str, &str)> = if app.popup.is_some() {
        vec![("j/k", "move"), ("Enter", "select"), ("Esc", "cancel")]
    } else if app.input_mode == InputMode::Editing {
        vec![("Enter", "send"), ("Alt+Enter", "newline"), ("Esc", "normal")]
    } else if app.focus == FocusPane::Errors {
        vec![("j/k", "select"), ("d", "dismiss"), ("Esc", "close"), ("Tab", "chat")]
    } else {
        vec![
            ("i", "type"),
            ("n", "new chat"),
            ("r", "resume"),
            ("j/k", "scroll"),
            ("]/[", "code block"),
            ("y", "copy"),
            ("e", "errors"),
            ("q", "quit"),
        ]
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn popup_area(area: Rect, width: u16, rows: usize) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = (rows as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn picker_highlight() -> Style {
    Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn render_agent_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let agents = Agent::all();
    let popup_area = popup_area(area, 44, agents.len());
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" New Chat With (Enter to start, Esc to cancel) ");

    let current = app.coordinator.preferred_agent();
    let items: Vec<ListItem> = agents
        .iter()
        .map(|agent| {
            let style = if agent.as_str() == current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", agent.as_str())).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(picker_highlight())
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.agent_picker_state);
}

fn render_history_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let options = app.coordinator.history().picker_options();
    let popup_area = popup_area(area, 90, options.len());
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Resume Chat (Enter to open, Esc to cancel) ");

    let active_label = app.coordinator.active_descriptor().label();
    let items: Vec<ListItem> = options
        .into_iter()
        .enumerate()
        .map(|(row, option)| {
            let style = if row == 0 {
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)
            } else if option == active_label {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", option)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(picker_highlight())
        .highlight_symbol("> ");

    let visible_height = popup_area.height.saturating_sub(2) as usize;
    ensure_selected_visible(&mut app.history_picker_state, visible_height);
    frame.render_stateful_widget(list, popup_area, &mut app.history_picker_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_unknown() {
        assert_eq!(or_unknown(""), "unknown");
        assert_eq!(or_unknown("CodingWizard"), "CodingWizard");
    }

    #[test]
    fn test_wrapped_height() {
        assert_eq!(wrapped_height(&Line::default(), 10), 1);
        assert_eq!(wrapped_height(&Line::from("abcdefghij"), 10), 1);
        assert_eq!(wrapped_height(&Line::from("abcdefghijk"), 10), 2);
        assert_eq!(wrapped_height(&Line::from("abc"), 0), 3);
    }

    #[test]
    fn test_ensure_selected_visible_scrolls_down() {
        let mut state = ListState::default();
        state.select(Some(7));
        ensure_selected_visible(&mut state, 3);
        assert_eq!(state.offset(), 5);
    }
}
