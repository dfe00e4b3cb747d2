//! Selection service over the mirror tree.
//!
//! One selection with one range, as the editor assumes throughout.

use std::cmp::Ordering;

use crate::dom::{Dom, NodeId, Position};

/// Anchor and focus of the current selection, in the order the user made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(at: Position) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The selection as a document-ordered range.
    pub fn range(&self, dom: &Dom) -> DomRange {
        match dom.compare(self.anchor, self.focus) {
            Some(Ordering::Greater) => DomRange::new(self.focus, self.anchor),
            _ => DomRange::new(self.anchor, self.focus),
        }
    }
}

/// A range with `start` at or before `end` in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: Position,
    pub end: Position,
}

impl DomRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn collapse(&self, to_start: bool) -> DomRange {
        Self::collapsed(if to_start { self.start } else { self.end })
    }

    pub fn common_ancestor(&self, dom: &Dom) -> Option<NodeId> {
        dom.common_ancestor(self.start.node, self.end.node)
    }

    /// Whether both endpoints live under `node`.
    pub fn is_within(&self, dom: &Dom, node: NodeId) -> bool {
        dom.contains(node, self.start.node) && dom.contains(node, self.end.node)
    }

    pub fn is_connected(&self, dom: &Dom) -> bool {
        dom.is_connected(self.start.node) && dom.is_connected(self.end.node)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    current: Option<Selection>,
}

impl SelectionState {
    pub fn get(&self) -> Option<Selection> {
        self.current
    }

    pub fn set(&mut self, selection: Option<Selection>) {
        tracing::trace!(target: "letterpress::selection", ?selection, "selection set");
        self.current = selection;
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn anchor(&self) -> Option<Position> {
        self.current.map(|s| s.anchor)
    }

    pub fn focus(&self) -> Option<Position> {
        self.current.map(|s| s.focus)
    }

    /// The first (and only) range, or `None` without a selection.
    pub fn current_range(&self, dom: &Dom) -> Option<DomRange> {
        self.current.map(|s| s.range(dom))
    }

    /// No selection counts as collapsed.
    pub fn is_collapsed(&self) -> bool {
        self.current.is_none_or(|s| s.is_collapsed())
    }

    pub fn collapse_at(&mut self, at: Position) {
        self.set(Some(Selection::collapsed(at)));
    }

    /// Replace the selection with a collapsed copy of `range`.
    pub fn collapse_to(&mut self, range: DomRange, to_start: bool) {
        let collapsed = range.collapse(to_start);
        self.collapse_at(collapsed.start);
    }

    pub fn select_range(&mut self, range: DomRange) {
        self.set(Some(Selection::new(range.start, range.end)));
    }

    /// Select every child of `node`.
    pub fn select_node_contents(&mut self, dom: &Dom, node: NodeId) {
        let range = DomRange::new(Position::new(node, 0), Position::new(node, dom.node_len(node)));
        self.select_range(range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_paragraphs() -> (Dom, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.root();
        let mut texts = Vec::new();
        for text in ["one", "two"] {
            let p = dom.create_element("p");
            let t = dom.create_text(text);
            dom.append_child(p, t);
            dom.append_child(root, p);
            texts.push(t);
        }
        (dom, texts[0], texts[1])
    }

    #[test]
    fn test_backward_selection_orders_range() {
        let (dom, one, two) = two_paragraphs();
        let sel = Selection::new(Position::new(two, 1), Position::new(one, 2));
        let range = sel.range(&dom);
        assert_eq!(range.start, Position::new(one, 2));
        assert_eq!(range.end, Position::new(two, 1));
        assert_eq!(range.common_ancestor(&dom), Some(dom.root()));
    }

    #[test]
    fn test_collapse_to() {
        let (dom, one, two) = two_paragraphs();
        let mut state = SelectionState::default();
        assert!(state.is_collapsed());
        assert_eq!(state.current_range(&dom), None);

        let range = DomRange::new(Position::new(one, 0), Position::new(two, 3));
        state.select_range(range);
        assert!(!state.is_collapsed());
        state.collapse_to(range, true);
        assert_eq!(state.anchor(), Some(Position::new(one, 0)));
        state.collapse_to(range, false);
        assert_eq!(state.focus(), Some(Position::new(two, 3)));
    }

    #[test]
    fn test_select_node_contents() {
        let (dom, one, _) = two_paragraphs();
        let p = dom.parent(one).unwrap();
        let mut state = SelectionState::default();
        state.select_node_contents(&dom, p);
        let range = state.current_range(&dom).unwrap();
        assert_eq!(range.start, Position::new(p, 0));
        assert_eq!(range.end, Position::new(p, 1));
        assert!(range.is_within(&dom, p));
    }
}
