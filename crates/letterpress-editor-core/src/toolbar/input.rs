//! Single-field input embedded in a toolbar.
//!
//! The input pins the editor range when it is displayed, since focusing the
//! field moves the platform selection out of the editor. Hiding it hands the
//! pinned range back for the caller to restore.

use crate::selection::DomRange;

/// The commit handler currently installed on an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputHandler {
    LinkUrl,
    ImageUrl,
    /// Second image stage, carrying the URL accepted by the first.
    ImageAlt { url: String },
}

/// What a commit hands to its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputCommit {
    pub handler: InputHandler,
    pub value: String,
    pub pinned: Option<DomRange>,
}

/// Whether the input stays up after a handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    KeepOpen,
    Close,
}

/// What the caller must do after `hide`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HideOutcome {
    /// Range to put the editor selection back on.
    pub restore: Option<DomRange>,
    /// Whether the owning toolbar should bring its buttons back.
    pub notify_owner: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolbarInput {
    visible: bool,
    value: String,
    placeholder: String,
    pinned: Option<DomRange>,
    handler: Option<InputHandler>,
    stay_open: bool,
}

impl ToolbarInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Mirror what the user typed into the field.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn pinned(&self) -> Option<DomRange> {
        self.pinned
    }

    pub fn handler(&self) -> Option<&InputHandler> {
        self.handler.as_ref()
    }

    pub fn stays_open(&self) -> bool {
        self.stay_open
    }

    /// Keep the input up after a commit unless the handler closes it.
    pub fn set_stay_open(&mut self, stay_open: bool) {
        self.stay_open = stay_open;
    }

    pub fn set_handler(&mut self, handler: InputHandler) {
        self.handler = Some(handler);
    }

    pub fn clear_handler(&mut self) {
        self.handler = None;
    }

    /// Replace the pinned range.
    pub fn pin(&mut self, range: DomRange) {
        self.pinned = Some(range);
    }

    /// Reveal the input with an empty value. `range` is pinned unless the
    /// input already holds one.
    pub fn display(&mut self, placeholder: impl Into<String>, range: Option<DomRange>) {
        if let Some(range) = range {
            self.pinned = Some(range);
        }
        self.placeholder = placeholder.into();
        self.value.clear();
        self.visible = true;
    }

    /// Take the value for the installed handler. `None` means there is no
    /// handler and the input should simply be hidden.
    pub fn commit(&self) -> Option<InputCommit> {
        let handler = self.handler.clone()?;
        Some(InputCommit {
            handler,
            value: self.value.clone(),
            pinned: self.pinned,
        })
    }

    /// Hide the input, clear its value and handler, and hand back the pinned
    /// range.
    pub fn hide(&mut self, use_callback: bool) -> HideOutcome {
        self.visible = false;
        self.value.clear();
        self.handler = None;
        self.stay_open = false;
        HideOutcome {
            restore: self.pinned.take(),
            notify_owner: use_callback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Dom, Position};

    fn range() -> DomRange {
        let dom = Dom::new();
        DomRange::new(Position::new(dom.root(), 0), Position::new(dom.root(), 0))
    }

    #[test]
    fn test_commit_without_handler() {
        let mut input = ToolbarInput::new();
        input.display("Paste a link", Some(range()));
        input.set_value("example.com");
        assert_eq!(input.commit(), None);
    }

    #[test]
    fn test_commit_hands_over_value_and_range() {
        let mut input = ToolbarInput::new();
        input.set_handler(InputHandler::LinkUrl);
        input.display("Paste a link", Some(range()));
        input.set_value("example.com");
        let commit = input.commit().unwrap();
        assert_eq!(commit.handler, InputHandler::LinkUrl);
        assert_eq!(commit.value, "example.com");
        assert_eq!(commit.pinned, Some(range()));
    }

    #[test]
    fn test_hide_resets_and_restores() {
        let mut input = ToolbarInput::new();
        input.set_handler(InputHandler::ImageUrl);
        input.set_stay_open(true);
        input.display("Image URL", Some(range()));
        input.set_value("x");

        let outcome = input.hide(true);
        assert_eq!(outcome.restore, Some(range()));
        assert!(outcome.notify_owner);
        assert!(!input.is_visible());
        assert_eq!(input.value(), "");
        assert_eq!(input.handler(), None);
        assert!(!input.stays_open());
        assert_eq!(input.hide(false).restore, None);
    }

    #[test]
    fn test_redisplay_keeps_pinned_range() {
        let mut input = ToolbarInput::new();
        input.display("Paste a link", Some(range()));
        input.set_value("bad");
        input.display("Enter a valid URL", None);
        assert_eq!(input.value(), "");
        assert_eq!(input.placeholder(), "Enter a valid URL");
        assert_eq!(input.pinned(), Some(range()));
    }
}
