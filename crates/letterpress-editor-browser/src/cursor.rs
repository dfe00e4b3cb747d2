//! Selection bridge between the platform and the mirror.
//!
//! The rendered host is an exact projection of the mirror, so a node is
//! found by its child-index path from the host. Text offsets are chars in the
//! mirror and UTF-16 code units in the platform.

use letterpress_editor_core::{Dom, DomRange, NodeId, Position, Selection};
use wasm_bindgen::JsValue;

/// Char offset for a UTF-16 offset into `text`.
pub fn utf16_to_char(text: &str, utf16: usize) -> usize {
    let mut units = 0;
    for (index, ch) in text.chars().enumerate() {
        if units >= utf16 {
            return index;
        }
        units += ch.len_utf16();
    }
    text.chars().count()
}

/// UTF-16 offset for a char offset into `text`.
pub fn char_to_utf16(text: &str, chars: usize) -> usize {
    text.chars().take(chars).map(char::len_utf16).sum()
}

/// Child indices from `ancestor` down to `node`. `None` when `node` is not
/// inside `ancestor`.
pub fn dom_path(ancestor: &web_sys::Node, node: &web_sys::Node) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    let mut current = node.clone();
    while &current != ancestor {
        let parent = current.parent_node()?;
        let children = parent.child_nodes();
        let index = (0..children.length()).find(|&i| children.get(i).as_ref() == Some(&current))?;
        path.push(index as usize);
        current = parent;
    }
    path.reverse();
    Some(path)
}

pub fn dom_node_at_path(ancestor: &web_sys::Node, path: &[usize]) -> Option<web_sys::Node> {
    path.iter()
        .try_fold(ancestor.clone(), |node, &index| node.child_nodes().get(index as u32))
}

/// Maps boundary points between one mounted host and the mirror.
pub struct SelectionBridge<'a> {
    pub dom: &'a Dom,
    pub host: NodeId,
    pub host_el: &'a web_sys::Node,
}

impl SelectionBridge<'_> {
    pub fn to_mirror(&self, node: &web_sys::Node, offset: u32) -> Option<Position> {
        let path = dom_path(self.host_el, node)?;
        let mirror = self.dom.node_at_path(self.host, &path)?;
        let offset = match self.dom.text(mirror) {
            Some(text) => utf16_to_char(text, offset as usize),
            None => offset as usize,
        };
        Some(Position::new(mirror, offset.min(self.dom.node_len(mirror))))
    }

    pub fn to_platform(&self, pos: Position) -> Option<(web_sys::Node, u32)> {
        let path = self.dom.path_from(self.host, pos.node)?;
        let node = dom_node_at_path(self.host_el, &path)?;
        let offset = match self.dom.text(pos.node) {
            Some(text) => char_to_utf16(text, pos.offset),
            None => pos.offset,
        };
        Some((node, offset as u32))
    }

    /// Platform element rendered for a mirror node.
    pub fn element_for(&self, node: NodeId) -> Option<web_sys::Node> {
        let path = self.dom.path_from(self.host, node)?;
        dom_node_at_path(self.host_el, &path)
    }

    /// The platform selection as a mirror selection. `None` when either
    /// endpoint is outside the host.
    pub fn read(&self) -> Option<Selection> {
        let selection = web_sys::window()?.get_selection().ok()??;
        let anchor = self.to_mirror(&selection.anchor_node()?, selection.anchor_offset())?;
        let focus = self.to_mirror(&selection.focus_node()?, selection.focus_offset())?;
        Some(Selection::new(anchor, focus))
    }

    /// Put `selection` on the platform, skipping the write when it is
    /// already there.
    pub fn write(&self, selection: Selection) -> Result<(), JsValue> {
        let Some(platform) = gloo_utils::window().get_selection()? else {
            return Ok(());
        };
        let (Some((anchor, anchor_offset)), Some((focus, focus_offset))) = (
            self.to_platform(selection.anchor),
            self.to_platform(selection.focus),
        ) else {
            tracing::debug!(target: "letterpress::selection", "selection has no rendered counterpart");
            return Ok(());
        };
        let unchanged = platform.anchor_node().as_ref() == Some(&anchor)
            && platform.anchor_offset() == anchor_offset
            && platform.focus_node().as_ref() == Some(&focus)
            && platform.focus_offset() == focus_offset;
        if unchanged {
            return Ok(());
        }
        platform.set_base_and_extent(&anchor, anchor_offset, &focus, focus_offset)
    }

    /// Platform range for a mirror range, for measuring.
    pub fn range(&self, range: DomRange) -> Option<web_sys::Range> {
        let (start, start_offset) = self.to_platform(range.start)?;
        let (end, end_offset) = self.to_platform(range.end)?;
        let platform = gloo_utils::document().create_range().ok()?;
        platform.set_start(&start, start_offset).ok()?;
        platform.set_end(&end, end_offset).ok()?;
        Some(platform)
    }
}

/// Chars from the start of `block` to the platform caret.
pub fn caret_offset_in(block: &web_sys::Element) -> Option<usize> {
    let selection = web_sys::window()?.get_selection().ok()??;
    let node = selection.focus_node()?;
    if !block.contains(Some(&node)) {
        return None;
    }
    let range = gloo_utils::document().create_range().ok()?;
    range.set_start(block, 0).ok()?;
    range.set_end(&node, selection.focus_offset()).ok()?;
    Some(String::from(range.to_string()).chars().count())
}
