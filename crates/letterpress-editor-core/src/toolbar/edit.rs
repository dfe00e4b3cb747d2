use crate::actions::EditorAction;
use crate::document::Document;
use crate::selection::DomRange;
use crate::types::{Point, Rect, Size, place_near};

use super::{ButtonId, Toolbar, ToolbarButton, ToolbarFrame, ToolbarKind};

/// Inline-style, heading and link operations over a non-empty range.
#[derive(Debug, Clone, PartialEq)]
pub struct EditToolbar {
    frame: ToolbarFrame,
    buttons: Vec<ToolbarButton>,
}

impl Default for EditToolbar {
    fn default() -> Self {
        Self::new()
    }
}

impl EditToolbar {
    pub const OFFSET: f64 = 10.0;

    pub fn new() -> Self {
        Self {
            frame: ToolbarFrame::default(),
            buttons: vec![
                ToolbarButton::new(ButtonId::Bold, "B", "Bold", EditorAction::ToggleBold),
                ToolbarButton::new(ButtonId::Italic, "I", "Italic", EditorAction::ToggleItalic),
                ToolbarButton::new(ButtonId::Heading, "H", "Heading", EditorAction::ToggleHeading),
                ToolbarButton::new(ButtonId::Link, "Link", "Link", EditorAction::ToggleLink),
            ],
        }
    }

    /// Re-evaluate button states for `range`: inside a heading only the
    /// heading button stays usable, and link is active inside a link.
    pub fn refresh_states(&mut self, doc: &Document, range: DomRange) {
        let dom = doc.dom();
        let Some(common) = range.common_ancestor(dom) else {
            return;
        };
        let in_heading = doc
            .find_block(common)
            .and_then(|block| doc.block_kind(block))
            .is_some_and(|kind| kind.is_heading());
        let in_link = dom.has_tag(dom.ancestor_by_tag(common, "a"), "a");

        for button in &mut self.buttons {
            match button.id() {
                ButtonId::Heading => button.enable(),
                _ if in_heading => button.disable(),
                ButtonId::Link if in_link => button.activate(),
                _ => button.enable(),
            }
        }
    }
}

impl Toolbar for EditToolbar {
    fn kind(&self) -> ToolbarKind {
        ToolbarKind::Edit
    }

    fn frame(&self) -> &ToolbarFrame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut ToolbarFrame {
        &mut self.frame
    }

    fn buttons(&self) -> &[ToolbarButton] {
        &self.buttons
    }

    fn buttons_mut(&mut self) -> &mut [ToolbarButton] {
        &mut self.buttons
    }

    fn offset(&self) -> f64 {
        Self::OFFSET
    }

    /// Just below the selection, flipped above near the viewport bottom.
    fn compute_position(&self, anchor: Rect, size: Size, viewport: Size) -> Point {
        place_near(anchor, size, viewport, self.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockKind, HeadingLevel};
    use crate::config::EditorConfig;
    use crate::dom::Position;
    use crate::inline::Inline;
    use crate::toolbar::ButtonState;

    fn states(toolbar: &EditToolbar) -> Vec<ButtonState> {
        toolbar.buttons().iter().map(|b| b.state()).collect()
    }

    fn doc_with(text: &str) -> (Document, DomRange) {
        let mut doc = Document::new(EditorConfig::default());
        let block = doc.first_block().unwrap();
        doc.set_inline(block, &Inline::plain(text));
        let range = DomRange::new(Position::new(block, 0), Position::new(block, 1));
        (doc, range)
    }

    #[test]
    fn test_plain_text_enables_all() {
        let (doc, range) = doc_with("Hello");
        let mut toolbar = EditToolbar::new();
        toolbar.refresh_states(&doc, range);
        assert_eq!(states(&toolbar), vec![ButtonState::Enabled; 4]);
    }

    #[test]
    fn test_heading_disables_inline_buttons() {
        let (mut doc, range) = doc_with("Hello");
        let block = doc.first_block().unwrap();
        doc.retag_block(block, BlockKind::Heading(HeadingLevel::One))
            .unwrap();
        let mut toolbar = EditToolbar::new();
        toolbar.refresh_states(&doc, range);
        assert_eq!(
            states(&toolbar),
            vec![
                ButtonState::Disabled,
                ButtonState::Disabled,
                ButtonState::Enabled,
                ButtonState::Disabled
            ]
        );
    }

    #[test]
    fn test_link_active_inside_link() {
        let mut doc = Document::new(EditorConfig::default());
        let block = doc.first_block().unwrap();
        let mut content = Inline::plain("Body");
        content.set_link(0..4, Some("http://studiesabroad.com"));
        doc.set_inline(block, &content);
        let a = doc.dom().first_child(block).unwrap();
        let text = doc.dom().first_child(a).unwrap();
        let range = DomRange::new(Position::new(text, 1), Position::new(text, 3));

        let mut toolbar = EditToolbar::new();
        toolbar.refresh_states(&doc, range);
        assert_eq!(
            toolbar.button(ButtonId::Link).map(|b| b.state()),
            Some(ButtonState::Active)
        );
    }

    #[test]
    fn test_place_uses_small_offset() {
        let mut toolbar = EditToolbar::new();
        toolbar.place(
            Rect::new(100.0, 100.0, 200.0, 20.0),
            Size::new(100.0, 30.0),
            Size::new(800.0, 600.0),
        );
        assert_eq!(toolbar.frame().position, Point::new(150.0, 130.0));
    }
}
