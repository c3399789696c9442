//! Code block highlighting with syntect.

use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

const THEME_NAME: &str = "base16-ocean.dark";

/// 24-bit colour, independent of any terminal library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSpan {
    pub text: String,
    /// `None` for plain, unhighlighted text
    pub color: Option<Rgb>,
    pub bold: bool,
    pub italic: bool,
}

impl CodeSpan {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            color: None,
            bold: false,
            italic: false,
        }
    }
}

pub type CodeLine = Vec<CodeSpan>;

pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes
            .remove(THEME_NAME)
            .or_else(|| themes.into_values().next());

        Self { syntax_set, theme }
    }

    fn find_syntax(&self, language: &str) -> Option<&SyntaxReference> {
        let lower = language.trim().to_lowercase();
        let token = match lower.as_str() {
            "" => return None,
            "js" | "jsx" => "javascript",
            "ts" | "tsx" => "typescript",
            "py" => "python",
            "rb" => "ruby",
            "rs" => "rust",
            "sh" | "shell" | "zsh" => "bash",
            "yml" => "yaml",
            "md" => "markdown",
            "c++" => "cpp",
            "cs" => "c#",
            "golang" => "go",
            other => other,
        };

        self.syntax_set
            .find_syntax_by_token(token)
            .or_else(|| self.syntax_set.find_syntax_by_extension(token))
            .or_else(|| self.syntax_set.find_syntax_by_name(language.trim()))
    }

    /// Highlight `code` line by line. Unknown languages come back as plain lines.
    pub fn highlight(&self, code: &str, language: Option<&str>) -> Vec<CodeLine> {
        let syntax = language.and_then(|lang| self.find_syntax(lang));
        let (Some(syntax), Some(theme)) = (syntax, self.theme.as_ref()) else {
            return plain_lines(code);
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();

        for line in code.lines() {
            // Newline-aware syntaxes need the line terminator to track state
            let with_newline = format!("{}\n", line);
            match highlighter.highlight_line(&with_newline, &self.syntax_set) {
                Ok(ranges) => lines.push(
                    ranges
                        .into_iter()
                        .filter_map(|(style, text)| {
                            let text = text.trim_end_matches('\n');
                            (!text.is_empty()).then(|| to_span(style, text))
                        })
                        .collect(),
                ),
                Err(e) => {
                    tracing::debug!("highlighting failed, using plain text: {}", e);
                    return plain_lines(code);
                }
            }
        }

        lines
    }
}

fn to_span(style: Style, text: &str) -> CodeSpan {
    let fg = style.foreground;
    CodeSpan {
        text: text.to_string(),
        color: Some(Rgb(fg.r, fg.g, fg.b)),
        bold: style.font_style.contains(FontStyle::BOLD),
        italic: style.font_style.contains(FontStyle::ITALIC),
    }
}

fn plain_lines(code: &str) -> Vec<CodeLine> {
    code.lines()
        .map(|line| {
            if line.is_empty() {
                Vec::new()
            } else {
                vec![CodeSpan::plain(line)]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(lines: &[CodeLine]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.iter().map(|span| span.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_known_language_is_coloured() {
        let highlighter = SyntaxHighlighter::new();
        let lines = highlighter.highlight("fn main() {\n    let x = 1;\n}\n", Some("rust"));

        assert_eq!(joined(&lines), vec!["fn main() {", "    let x = 1;", "}"]);
        assert!(lines[0].iter().all(|span| span.color.is_some()));
    }

    #[test]
    fn test_alias_resolves() {
        let highlighter = SyntaxHighlighter::new();
        let lines = highlighter.highlight("console.log(\"hi\")", Some("js"));
        assert_eq!(joined(&lines), vec!["console.log(\"hi\")"]);
        assert!(lines[0].iter().any(|span| span.color.is_some()));
    }

    #[test]
    fn test_unknown_language_is_plain() {
        let highlighter = SyntaxHighlighter::new();
        let lines = highlighter.highlight("some text\n\nmore", Some("not-a-language"));

        assert_eq!(joined(&lines), vec!["some text", "", "more"]);
        assert!(lines.iter().flatten().all(|span| span.color.is_none()));
    }

    #[test]
    fn test_missing_language_is_plain() {
        let highlighter = SyntaxHighlighter::new();
        let lines = highlighter.highlight("plain", None);
        assert_eq!(lines, vec![vec![CodeSpan::plain("plain")]]);
    }
}
