//! Drives an `Editor` the way the browser layer does.

use std::ops::Range;

use crate::actions::{InputType, Key, KeydownResult, Modifiers};
use crate::block::{BlockKind, HeadingLevel};
use crate::config::EditorConfig;
use crate::document::BlockPoint;
use crate::editor::Editor;
use crate::selection::Selection;
use crate::toolbar::{ButtonId, ToolbarKind};

pub(crate) fn editor() -> Editor {
    Editor::new(EditorConfig::default())
}

/// Keydown, the beforeinput the platform fires when the key was not
/// handled, then keyup.
pub(crate) fn press(editor: &mut Editor, key: Key) {
    let result = editor.handle_keydown(&key, Modifiers::NONE);
    if result == KeydownResult::NotHandled {
        let input = match &key {
            Key::Character(s) => Some((InputType::InsertText, Some(s.to_string()))),
            Key::Backspace => Some((InputType::DeleteContentBackward, None)),
            Key::Delete => Some((InputType::DeleteContentForward, None)),
            Key::Enter => Some((InputType::InsertParagraph, None)),
            _ => None,
        };
        if let Some((input_type, data)) = input {
            editor.handle_beforeinput(&input_type, data.as_deref());
        }
    }
    editor.handle_keyup(&key);
}

pub(crate) fn type_text(editor: &mut Editor, text: &str) {
    for ch in text.chars() {
        press(editor, Key::character(ch.to_string()));
    }
}

/// One line per block: its kind, then its inline HTML.
pub(crate) fn blocks(editor: &Editor) -> Vec<String> {
    let doc = editor.document();
    doc.blocks()
        .into_iter()
        .map(|block| {
            let kind = match doc.block_kind(block) {
                Some(BlockKind::Text) => "text",
                Some(BlockKind::Heading(HeadingLevel::One)) => "h1",
                Some(BlockKind::Heading(HeadingLevel::Two)) => "h2",
                Some(BlockKind::Container) => "container",
                None => "?",
            };
            format!("{kind}: {}", doc.dom().inner_html(block))
        })
        .collect()
}

/// The caret as (block index, offset).
pub(crate) fn caret(editor: &Editor) -> Option<(usize, usize)> {
    let doc = editor.document();
    let point = doc.block_point(editor.selection()?.anchor)?;
    let index = doc.blocks().iter().position(|&b| b == point.block)?;
    Some((index, point.offset))
}

pub(crate) fn place_caret(editor: &mut Editor, block: usize, offset: usize) {
    select_across(editor, (block, offset), (block, offset));
}

/// Select `range` inside one block, then fire selectionchange.
pub(crate) fn select(editor: &mut Editor, block: usize, range: Range<usize>) {
    select_across(editor, (block, range.start), (block, range.end));
}

pub(crate) fn select_across(editor: &mut Editor, from: (usize, usize), to: (usize, usize)) {
    let doc = editor.document();
    let blocks = doc.blocks();
    let anchor = doc.position(BlockPoint::new(blocks[from.0], from.1));
    let focus = doc.position(BlockPoint::new(blocks[to.0], to.1));
    editor.set_selection(Some(Selection::new(anchor, focus)));
    editor.handle_selection_change(false);
}

pub(crate) fn click(editor: &mut Editor, kind: ToolbarKind, id: ButtonId) -> bool {
    editor.click_button(kind, id)
}

/// Focus moves into the toolbar's input, taking the selection out of the
/// editor. Typing `value` and pressing Enter commits it.
pub(crate) fn enter_input(editor: &mut Editor, kind: ToolbarKind, value: &str) {
    editor.set_selection(None);
    editor.handle_selection_change(false);
    editor.set_input_value(kind, value);
    editor.commit_input(kind);
}
