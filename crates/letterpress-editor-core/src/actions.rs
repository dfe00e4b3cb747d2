//! Editor actions, input types and event results.
//!
//! Platform-agnostic definitions for editor operations. `EditorAction`
//! represents the structured edits toolbars trigger, while `InputType`
//! represents the semantic intent of a browser `beforeinput` event.

use smol_str::SmolStr;

use crate::dom::NodeId;
use crate::toolbar::ToolbarKind;

/// Semantic input types from input events.
///
/// Based on the W3C Input Events specification. Only the types the editor
/// implements get their own variant; everything else is `Unknown` and is
/// left to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    // === Insertion ===
    /// Insert typed text.
    InsertText,
    /// Insert text from IME composition.
    InsertCompositionText,
    /// Insert a line break (Shift+Enter).
    InsertLineBreak,
    /// Insert a paragraph break (Enter).
    InsertParagraph,
    /// Insert from paste operation.
    InsertFromPaste,
    /// Insert from drop operation.
    InsertFromDrop,
    /// Insert replacement text (e.g., spell check correction).
    InsertReplacementText,

    // === Deletion ===
    /// Delete content backward (Backspace).
    DeleteContentBackward,
    /// Delete content forward (Delete key).
    DeleteContentForward,
    /// Delete word backward (Ctrl/Alt+Backspace).
    DeleteWordBackward,
    /// Delete word forward (Ctrl/Alt+Delete).
    DeleteWordForward,
    /// Delete to the start of the line (Cmd+Backspace), soft or hard.
    DeleteLineBackward,
    /// Delete to the end of the line, soft or hard.
    DeleteLineForward,
    /// Delete by cut operation.
    DeleteByCut,
    /// Delete the selection without a direction.
    DeleteContent,

    // === History ===
    HistoryUndo,
    HistoryRedo,

    // === Formatting ===
    FormatBold,
    FormatItalic,

    // === Unknown ===
    /// Unrecognized input type.
    Unknown(String),
}

impl InputType {
    /// Parse a browser `inputType` string.
    pub fn parse(s: &str) -> Self {
        match s {
            "insertText" => Self::InsertText,
            "insertCompositionText" => Self::InsertCompositionText,
            "insertLineBreak" => Self::InsertLineBreak,
            "insertParagraph" => Self::InsertParagraph,
            "insertFromPaste" => Self::InsertFromPaste,
            "insertFromDrop" => Self::InsertFromDrop,
            "insertReplacementText" => Self::InsertReplacementText,
            "deleteContentBackward" => Self::DeleteContentBackward,
            "deleteContentForward" => Self::DeleteContentForward,
            "deleteWordBackward" | "deleteEntireWordBackward" => Self::DeleteWordBackward,
            "deleteWordForward" | "deleteEntireWordForward" => Self::DeleteWordForward,
            "deleteSoftLineBackward" | "deleteHardLineBackward" => Self::DeleteLineBackward,
            "deleteSoftLineForward" | "deleteHardLineForward" => Self::DeleteLineForward,
            "deleteByCut" => Self::DeleteByCut,
            "deleteContent" => Self::DeleteContent,
            "historyUndo" => Self::HistoryUndo,
            "historyRedo" => Self::HistoryRedo,
            "formatBold" => Self::FormatBold,
            "formatItalic" => Self::FormatItalic,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Structured edits a toolbar button triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorAction {
    /// Toggle bold on the range.
    ToggleBold,
    /// Toggle italic on the range.
    ToggleItalic,
    /// Cycle the range's block through plain and heading.
    ToggleHeading,
    /// Unwrap an intersecting link, or prompt for a URL and wrap.
    ToggleLink,
    /// Two-stage prompt for an image URL and alt text.
    InsertImage,
    InsertHorizontalRule,
}

/// Platform work queued by a handler and drained by the browser layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEffect {
    /// Focus the toolbar's input once it has been revealed (deferred).
    FocusInput(ToolbarKind),
    /// Scroll the block into view if it is off screen (deferred).
    ScrollIntoView(NodeId),
    /// Tell the user something went wrong, out of band.
    Alert(String),
    /// The document changed.
    Changed,
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let browser/beforeinput handle it.
    NotHandled,
    /// Event should be passed through (navigation, composition, etc).
    PassThrough,
}

/// Result of handling a beforeinput event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeforeInputResult {
    /// Event was handled, prevent default browser behavior.
    Handled,
    /// Event should be handled by browser (e.g., during composition).
    PassThrough,
}

/// Key values for keyboard input.
///
/// Platform-agnostic key representation. Platform-specific code converts
/// from native key events to this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    CapsLock,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Parse a `KeyboardEvent.key` value.
    pub fn parse(key: &str) -> Self {
        match key {
            "Enter" => Self::Enter,
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Tab" => Self::Tab,
            "Escape" => Self::Escape,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Alt" | "AltGraph" => Self::Alt,
            "CapsLock" => Self::CapsLock,
            "Control" => Self::Control,
            "Meta" => Self::Meta,
            "Shift" => Self::Shift,
            s if s.chars().count() == 1 => Self::character(s),
            _ => Self::Unidentified,
        }
    }

    /// Check if this is an arrow key.
    pub fn is_arrow(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft | Self::ArrowRight | Self::ArrowUp | Self::ArrowDown
        )
    }

    /// Arrow keys pointing towards the start of the document.
    pub fn is_backward_arrow(&self) -> bool {
        matches!(self, Self::ArrowLeft | Self::ArrowUp)
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::Alt | Self::CapsLock | Self::Control | Self::Meta | Self::Shift
        )
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Ctrl, Alt or Meta held: the key is a shortcut, not text.
    pub fn is_command(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_type() {
        assert_eq!(InputType::parse("insertText"), InputType::InsertText);
        assert_eq!(
            InputType::parse("deleteEntireWordBackward"),
            InputType::DeleteWordBackward
        );
        assert_eq!(
            InputType::parse("formatUnderline"),
            InputType::Unknown("formatUnderline".into())
        );
        assert_eq!(
            InputType::parse("deleteHardLineForward"),
            InputType::DeleteLineForward
        );
        assert_eq!(InputType::parse("deleteByCut"), InputType::DeleteByCut);
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(Key::parse("a"), Key::character("a"));
        assert_eq!(Key::parse("é"), Key::character("é"));
        assert_eq!(Key::parse("ArrowUp"), Key::ArrowUp);
        assert_eq!(Key::parse("F13"), Key::Unidentified);
        assert!(Key::ArrowUp.is_backward_arrow());
        assert!(!Key::ArrowDown.is_backward_arrow());
        assert!(Key::Shift.is_modifier());
    }
}
