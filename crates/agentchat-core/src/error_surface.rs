/// A recoverable failure shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    pub category: String,
    pub message: String,
}

impl UiError {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
        }
    }

    pub fn title(&self) -> String {
        format!("Error {}", self.category)
    }
}

/// Ordered list of dismissable errors plus its visibility flag.
///
/// Closing the surface keeps the list; only `dismiss` removes entries.
#[derive(Debug, Clone, Default)]
pub struct ErrorSurface {
    errors: Vec<UiError>,
    open: bool,
}

impl ErrorSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error; always reopens the surface
    pub fn push(&mut self, error: UiError) {
        self.errors.push(error);
        self.open = true;
    }

    /// Remove the error at `index`. Dismissing the last one closes the surface.
    pub fn dismiss(&mut self, index: usize) -> Option<UiError> {
        if index >= self.errors.len() {
            return None;
        }

        let had_one = self.errors.len() == 1;
        let removed = self.errors.remove(index);
        if had_one {
            self.open = false;
        }
        Some(removed)
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn errors(&self) -> &[UiError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors to draw right now
    pub fn visible(&self) -> &[UiError] {
        if self.open {
            &self.errors
        } else {
            &[]
        }
    }
}
