//! Floating toolbars.
//!
//! Toolbars are plain state: visibility, placement, button states and an
//! embedded input. The editor drives them and the browser layer renders
//! them.

mod button;
mod edit;
mod input;
mod insert;

pub use button::{ButtonId, ButtonState, ToolbarButton};
pub use edit::EditToolbar;
pub use input::{Disposition, HideOutcome, InputCommit, InputHandler, ToolbarInput};
pub use insert::InsertToolbar;

use crate::types::{Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarKind {
    Edit,
    Insert,
}

impl ToolbarKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Insert => "insert",
        }
    }
}

/// State shared by both toolbars.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolbarFrame {
    pub visible: bool,
    /// Buttons are hidden while the input is prompting.
    pub buttons_hidden: bool,
    pub position: Point,
    pub input: ToolbarInput,
}

pub trait Toolbar {
    fn kind(&self) -> ToolbarKind;

    fn frame(&self) -> &ToolbarFrame;

    fn frame_mut(&mut self) -> &mut ToolbarFrame;

    fn buttons(&self) -> &[ToolbarButton];

    fn buttons_mut(&mut self) -> &mut [ToolbarButton];

    /// Distance kept from the anchor when placing.
    fn offset(&self) -> f64;

    /// Where the toolbar goes for an anchor rectangle.
    fn compute_position(&self, anchor: Rect, size: Size, viewport: Size) -> Point;

    fn show(&mut self) {
        self.frame_mut().visible = true;
    }

    fn hide(&mut self) {
        let frame = self.frame_mut();
        frame.visible = false;
        frame.buttons_hidden = false;
    }

    fn is_visible(&self) -> bool {
        self.frame().visible
    }

    fn place(&mut self, anchor: Rect, size: Size, viewport: Size) {
        let position = self.compute_position(anchor, size, viewport);
        self.frame_mut().position = position;
    }

    fn input(&self) -> &ToolbarInput {
        &self.frame().input
    }

    fn input_mut(&mut self) -> &mut ToolbarInput {
        &mut self.frame_mut().input
    }

    /// Hide the buttons and let the input take their place.
    fn mount_input(&mut self) {
        self.frame_mut().buttons_hidden = true;
    }

    fn restore_buttons(&mut self) {
        self.frame_mut().buttons_hidden = false;
    }

    fn button(&self, id: ButtonId) -> Option<&ToolbarButton> {
        self.buttons().iter().find(|b| b.id() == id)
    }

    fn button_mut(&mut self, id: ButtonId) -> Option<&mut ToolbarButton> {
        self.buttons_mut().iter_mut().find(|b| b.id() == id)
    }
}
