//! Per-code-block copy controls.

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";
pub const COPIED_DURATION: Duration = Duration::from_secs(2);

/// Destination for copied code
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Text placed on the clipboard for a code block: exact content minus one
/// trailing newline.
pub fn copy_text(code: &str) -> &str {
    code.strip_suffix('\n').unwrap_or(code)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CopyButton {
    copied_at: Option<Instant>,
}

impl CopyButton {
    /// Copy `code` and start the confirmation window. Failures are logged only.
    pub fn activate(&mut self, clipboard: &mut dyn Clipboard, code: &str, now: Instant) -> bool {
        match clipboard.set_text(copy_text(code)) {
            Ok(()) => {
                self.copied_at = Some(now);
                true
            }
            Err(e) => {
                tracing::warn!("copying code block failed: {:#}", e);
                false
            }
        }
    }

    pub fn label(&self, now: Instant) -> &'static str {
        match self.copied_at {
            Some(at) if now.saturating_duration_since(at) < COPIED_DURATION => COPIED_LABEL,
            _ => COPY_LABEL,
        }
    }
}

/// Copy buttons keyed by (message index, code block index)
#[derive(Debug, Default)]
pub struct CopyButtons {
    buttons: HashMap<(usize, usize), CopyButton>,
}

impl CopyButtons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(
        &mut self,
        key: (usize, usize),
        clipboard: &mut dyn Clipboard,
        code: &str,
        now: Instant,
    ) -> bool {
        self.buttons
            .entry(key)
            .or_default()
            .activate(clipboard, code, now)
    }

    pub fn label(&self, key: (usize, usize), now: Instant) -> &'static str {
        self.buttons
            .get(&key)
            .map_or(COPY_LABEL, |button| button.label(now))
    }

    /// Forget every button, e.g. when the log is replaced
    pub fn clear(&mut self) {
        self.buttons.clear();
    }
}
