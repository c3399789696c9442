use agentchat_core::Clipboard;
use anyhow::{anyhow, Result};

/// System clipboard via arboard. The handle is opened lazily so a missing
/// display only fails the copy, not start-up.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| anyhow!("Could not open clipboard: {}", e))?;
            self.inner = Some(clipboard);
        }

        match self.inner.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_string())
                .map_err(|e| anyhow!("Could not write to clipboard: {}", e)),
            None => Err(anyhow!("Clipboard unavailable")),
        }
    }
}
