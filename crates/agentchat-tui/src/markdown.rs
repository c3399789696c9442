//! Rendered message blocks as ratatui lines.

use agentchat_core::highlight::{CodeSpan, Rgb};
use agentchat_core::render::{Block, CodeBlock, InlineStyle, RenderedMessage, TextSpan};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

pub struct MessageLines {
    pub lines: Vec<Line<'static>>,
    /// Line index of each code block's header, in block order
    pub code_headers: Vec<usize>,
}

/// Lay out one message. `labels[i]` is the copy label for code block `i`;
/// `selected` is the code block currently targeted by the copy key.
pub fn message_lines(
    rendered: &RenderedMessage,
    labels: &[&str],
    selected: Option<usize>,
) -> MessageLines {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut code_headers = Vec::new();

    for (i, block) in rendered.blocks.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }

        match block {
            Block::Text(text_lines) => {
                lines.extend(text_lines.iter().map(|line| {
                    Line::from(line.iter().map(text_span).collect::<Vec<_>>())
                }));
            }
            Block::Code(code) => {
                let index = code_headers.len();
                code_headers.push(lines.len());
                let label = labels.get(index).copied().unwrap_or(agentchat_core::copy::COPY_LABEL);
                lines.push(code_header(code, label, selected == Some(index)));
                lines.extend(code.lines.iter().map(|spans| code_line(spans)));
            }
        }
    }

    MessageLines {
        lines,
        code_headers,
    }
}

fn code_header(code: &CodeBlock, label: &str, selected: bool) -> Line<'static> {
    let language = code.language.clone().unwrap_or_else(|| "code".to_string());
    let button_style = if selected {
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };

    Line::from(vec![
        Span::styled(format!("╭─ {} ", language), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("[{}]", label), button_style),
    ])
}

fn code_line(spans: &[CodeSpan]) -> Line<'static> {
    let mut line = vec![Span::styled("│ ", Style::default().fg(Color::DarkGray))];
    line.extend(spans.iter().map(|span| {
        let mut style = Style::default();
        if let Some(Rgb(r, g, b)) = span.color {
            style = style.fg(Color::Rgb(r, g, b));
        }
        if span.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if span.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        Span::styled(span.text.clone(), style)
    }));
    Line::from(line)
}

fn text_span(span: &TextSpan) -> Span<'static> {
    Span::styled(span.text.clone(), inline_style(&span.style))
}

fn inline_style(inline: &InlineStyle) -> Style {
    let mut style = Style::default();

    if inline.heading.is_some() {
        style = style.fg(Color::Cyan);
    }
    if inline.quote {
        style = style.fg(Color::Gray);
    }
    if inline.code {
        style = style.fg(Color::Yellow);
    }
    if inline.link {
        style = style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
    }
    if inline.image {
        style = style.fg(Color::Magenta).add_modifier(Modifier::ITALIC);
    }
    if inline.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if inline.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if inline.strikethrough {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }

    style
}
