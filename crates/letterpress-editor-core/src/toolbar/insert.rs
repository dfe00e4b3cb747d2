use crate::actions::EditorAction;
use crate::dom::NodeId;
use crate::types::{Point, Rect, Size, place_beside};

use super::{ButtonId, Toolbar, ToolbarButton, ToolbarFrame, ToolbarKind};

/// Block-insert operations, offered next to an empty Text Block.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertToolbar {
    frame: ToolbarFrame,
    buttons: Vec<ToolbarButton>,
    target: Option<NodeId>,
}

impl Default for InsertToolbar {
    fn default() -> Self {
        Self::new()
    }
}

impl InsertToolbar {
    pub const OFFSET: f64 = 40.0;

    pub fn new() -> Self {
        Self {
            frame: ToolbarFrame::default(),
            buttons: vec![
                ToolbarButton::new(
                    ButtonId::Image,
                    "Image",
                    "Insert image",
                    EditorAction::InsertImage,
                ),
                ToolbarButton::new(
                    ButtonId::HorizontalRule,
                    "Rule",
                    "Insert horizontal rule",
                    EditorAction::InsertHorizontalRule,
                ),
            ],
            target: None,
        }
    }

    /// The empty block the toolbar is offered for.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn show_for(&mut self, block: NodeId) {
        self.target = Some(block);
        self.show();
    }

    pub fn dismiss(&mut self) {
        self.target = None;
        self.hide();
    }
}

impl Toolbar for InsertToolbar {
    fn kind(&self) -> ToolbarKind {
        ToolbarKind::Insert
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

    fn compute_position(&self, anchor: Rect, size: Size, _viewport: Size) -> Point {
        place_beside(anchor, size, self.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;

    #[test]
    fn test_show_for_and_dismiss() {
        let dom = Dom::new();
        let mut toolbar = InsertToolbar::new();
        toolbar.show_for(dom.root());
        assert!(toolbar.is_visible());
        assert_eq!(toolbar.target(), Some(dom.root()));
        toolbar.mount_input();
        toolbar.dismiss();
        assert!(!toolbar.is_visible());
        assert!(!toolbar.frame().buttons_hidden);
        assert_eq!(toolbar.target(), None);
    }

    #[test]
    fn test_place_left_of_block() {
        let mut toolbar = InsertToolbar::new();
        toolbar.place(
            Rect::new(300.0, 200.0, 400.0, 24.0),
            Size::new(80.0, 30.0),
            Size::new(800.0, 600.0),
        );
        assert_eq!(toolbar.frame().position, Point::new(180.0, 197.0));
    }
}
