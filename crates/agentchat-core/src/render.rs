//! Markdown to display blocks.
//!
//! The output is terminal-agnostic: text lines made of styled spans, and code
//! blocks carrying both their exact source and highlighted lines. Front-ends
//! map these onto their own widgets.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::highlight::{CodeLine, SyntaxHighlighter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link: bool,
    pub image: bool,
    pub quote: bool,
    pub heading: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub style: InlineStyle,
}

pub type TextLine = Vec<TextSpan>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<String>,
    /// Exact source, trailing newline included
    pub text: String,
    pub lines: Vec<CodeLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text(Vec<TextLine>),
    Code(CodeBlock),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMessage {
    pub blocks: Vec<Block>,
}

impl RenderedMessage {
    pub fn code_blocks(&self) -> impl Iterator<Item = &CodeBlock> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Code(code) => Some(code),
            Block::Text(_) => None,
        })
    }

    pub fn code_block(&self, index: usize) -> Option<&CodeBlock> {
        self.code_blocks().nth(index)
    }

    pub fn code_block_count(&self) -> usize {
        self.code_blocks().count()
    }
}

#[derive(Default)]
pub struct MarkdownRenderer {
    highlighter: SyntaxHighlighter,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self, markdown: &str) -> RenderedMessage {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut builder = Builder::new(&self.highlighter);
        for event in Parser::new_ext(markdown, options) {
            builder.process_event(event);
        }
        builder.finish()
    }
}

struct LinkState {
    dest: String,
    text: String,
}

struct Builder<'a> {
    highlighter: &'a SyntaxHighlighter,
    blocks: Vec<Block>,
    lines: Vec<TextLine>,
    current: TextLine,
    style_stack: Vec<InlineStyle>,
    /// Next number for ordered lists, `None` for bullets
    list_stack: Vec<Option<u64>>,
    quote_depth: usize,
    links: Vec<LinkState>,
    image_alt: Option<String>,
    code: Option<(Option<String>, String)>,
}

impl<'a> Builder<'a> {
    fn new(highlighter: &'a SyntaxHighlighter) -> Self {
        Self {
            highlighter,
            blocks: Vec::new(),
            lines: Vec::new(),
            current: Vec::new(),
            style_stack: vec![InlineStyle::default()],
            list_stack: Vec::new(),
            quote_depth: 0,
            links: Vec::new(),
            image_alt: None,
            code: None,
        }
    }

    fn style(&self) -> InlineStyle {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, modify: impl FnOnce(&mut InlineStyle)) {
        let mut style = self.style();
        modify(&mut style);
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                let style = InlineStyle {
                    code: true,
                    ..self.style()
                };
                self.push_span(&code, style);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.break_line(),
            Event::Rule => {
                self.break_line();
                self.push_span("────────", InlineStyle::default());
                self.end_block();
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_span(marker, InlineStyle::default());
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.break_line();
                let level = heading_number(level);
                self.push_style(|s| {
                    s.bold = true;
                    s.heading = Some(level);
                });
            }
            Tag::CodeBlock(kind) => {
                self.flush_text_block();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::Emphasis => self.push_style(|s| s.italic = true),
            Tag::Strong => self.push_style(|s| s.bold = true),
            Tag::Strikethrough => self.push_style(|s| s.strikethrough = true),
            Tag::Link { dest_url, .. } => {
                self.links.push(LinkState {
                    dest: dest_url.to_string(),
                    text: String::new(),
                });
                self.push_style(|s| s.link = true);
            }
            Tag::Image { .. } => self.image_alt = Some(String::new()),
            Tag::BlockQuote => {
                self.break_line();
                self.quote_depth += 1;
                self.push_style(|s| s.quote = true);
            }
            Tag::List(start) => {
                self.break_line();
                self.list_stack.push(start);
            }
            Tag::Item => {
                self.break_line();
                let depth = self.list_stack.len().saturating_sub(1);
                let marker = match self.list_stack.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                let prefix = format!("{}{}", "  ".repeat(depth), marker);
                self.push_span(&prefix, InlineStyle::default());
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.list_stack.is_empty() {
                    self.end_block();
                } else {
                    self.break_line();
                }
            }
            TagEnd::Heading(_) => {
                self.pop_style();
                self.end_block();
            }
            TagEnd::CodeBlock => {
                if let Some((language, text)) = self.code.take() {
                    let lines = self.highlighter.highlight(&text, language.as_deref());
                    self.blocks.push(Block::Code(CodeBlock {
                        language,
                        text,
                        lines,
                    }));
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(link) = self.links.pop() {
                    if !link.dest.is_empty() && link.dest != link.text {
                        self.push_span(&format!(" ({})", link.dest), InlineStyle::default());
                    }
                }
            }
            TagEnd::Image => {
                if let Some(alt) = self.image_alt.take() {
                    let style = InlineStyle {
                        image: true,
                        ..InlineStyle::default()
                    };
                    self.push_span(&format!("[image: {}]", alt), style);
                }
            }
            TagEnd::BlockQuote => {
                self.pop_style();
                self.break_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if self.quote_depth == 0 {
                    self.end_block();
                }
            }
            TagEnd::List(_) => {
                self.break_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.end_block();
                }
            }
            TagEnd::Item => self.break_line(),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some((_, code)) = self.code.as_mut() {
            code.push_str(text);
            return;
        }
        if let Some(alt) = self.image_alt.as_mut() {
            alt.push_str(text);
            return;
        }

        for link in self.links.iter_mut() {
            link.text.push_str(text);
        }

        let style = self.style();
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                self.push_span(part, style);
            }
            if parts.peek().is_some() {
                self.break_line();
            }
        }
    }

    fn push_span(&mut self, text: &str, style: InlineStyle) {
        if self.current.is_empty() && self.quote_depth > 0 {
            let quote = InlineStyle {
                quote: true,
                ..InlineStyle::default()
            };
            self.current.push(TextSpan {
                text: "│ ".repeat(self.quote_depth),
                style: quote,
            });
        }

        // Merge with the previous span when the style is unchanged
        if let Some(last) = self.current.last_mut() {
            if last.style == style {
                last.text.push_str(text);
                return;
            }
        }
        self.current.push(TextSpan {
            text: text.to_string(),
            style,
        });
    }

    fn break_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
    }

    /// Finish a paragraph-level element with a blank separator line
    fn end_block(&mut self) {
        self.break_line();
        if self.lines.last().is_some_and(|line| !line.is_empty()) {
            self.lines.push(Vec::new());
        }
    }

    fn flush_text_block(&mut self) {
        self.break_line();
        while self.lines.last().is_some_and(|line| line.is_empty()) {
            self.lines.pop();
        }
        if !self.lines.is_empty() {
            self.blocks.push(Block::Text(std::mem::take(&mut self.lines)));
        }
    }

    fn finish(mut self) -> RenderedMessage {
        self.flush_text_block();
        RenderedMessage {
            blocks: self.blocks,
        }
    }
}

fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
