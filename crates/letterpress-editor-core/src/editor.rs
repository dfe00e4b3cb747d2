//! The editor core.
//!
//! Owns the document, the selection and both toolbars. The browser layer
//! forwards platform events to the `handle_*` methods, then renders the
//! mirror, syncs the selection back and drains [`EditorEffect`]s.
//!
//! Every handled event runs in the same order: structural mutation,
//! normalization, caret recovery, toolbar re-evaluation.

use std::ops::Range;

use crate::actions::{
    BeforeInputResult, EditorAction, EditorEffect, InputType, Key, KeydownResult, Modifiers,
};
use crate::block::{BlockKind, CONTAINER_CLASS, Embed, HOST_CLASS, HeadingLevel};
use crate::config::EditorConfig;
use crate::document::{BlockPoint, Document};
use crate::dom::{Dom, NodeId, Position};
use crate::error::SnapshotError;
use crate::html::{parse_fragment, sanitize_paste, strip_control_chars};
use crate::inline::{Inline, Marks};
use crate::selection::{DomRange, Selection, SelectionState};
use crate::text_helpers::{find_word_boundary_backward, find_word_boundary_forward};
use crate::toolbar::{
    ButtonId, Disposition, EditToolbar, InputHandler, InsertToolbar, Toolbar, ToolbarKind,
};
use crate::types::{Rect, Size};
use crate::url::validate_url;

pub const LINK_PLACEHOLDER: &str = "Paste or type a link";
pub const INVALID_URL_PLACEHOLDER: &str = "Enter a valid URL";
pub const IMAGE_URL_PLACEHOLDER: &str = "Paste or type an image URL";
pub const IMAGE_ALT_PLACEHOLDER: &str = "Describe the image";
pub const IMAGE_ERROR_MESSAGE: &str =
    "The image could not be loaded and was removed. Check the image URL and try again.";

/// Caret state recorded on keydown, used to recover the caret on keyup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PreKeydown {
    block: NodeId,
    offset: usize,
    previous: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Bold,
    Italic,
}

/// What a toolbar should be positioned against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAnchor {
    Range(DomRange),
    Block(NodeId),
}

#[derive(Debug, Clone)]
pub struct Editor {
    doc: Document,
    selection: SelectionState,
    edit_toolbar: EditToolbar,
    insert_toolbar: InsertToolbar,
    effects: Vec<EditorEffect>,
    pre_keydown: Option<PreKeydown>,
    composing: bool,
    /// Block the platform is editing on a passed-through input.
    pending_reimport: Option<NodeId>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let mut editor = Self {
            doc: Document::new(config),
            selection: SelectionState::default(),
            edit_toolbar: EditToolbar::new(),
            insert_toolbar: InsertToolbar::new(),
            effects: Vec::new(),
            pre_keydown: None,
            composing: false,
            pending_reimport: None,
        };
        editor.caret_to_first_block();
        editor
    }

    // === Accessors ===

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn dom(&self) -> &Dom {
        self.doc.dom()
    }

    pub fn host(&self) -> NodeId {
        self.doc.host()
    }

    pub fn config(&self) -> &EditorConfig {
        self.doc.config()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection.get()
    }

    pub fn current_range(&self) -> Option<DomRange> {
        self.selection.current_range(self.doc.dom())
    }

    pub fn edit_toolbar(&self) -> &EditToolbar {
        &self.edit_toolbar
    }

    pub fn insert_toolbar(&self) -> &InsertToolbar {
        &self.insert_toolbar
    }

    pub fn toolbar(&self, kind: ToolbarKind) -> &dyn Toolbar {
        match kind {
            ToolbarKind::Edit => &self.edit_toolbar,
            ToolbarKind::Insert => &self.insert_toolbar,
        }
    }

    fn toolbar_mut(&mut self, kind: ToolbarKind) -> &mut dyn Toolbar {
        match kind {
            ToolbarKind::Edit => &mut self.edit_toolbar,
            ToolbarKind::Insert => &mut self.insert_toolbar,
        }
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// Drain the platform work queued since the last call.
    pub fn take_effects(&mut self) -> Vec<EditorEffect> {
        std::mem::take(&mut self.effects)
    }

    fn emit(&mut self, effect: EditorEffect) {
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
    }

    // === Selection service ===

    /// Replace the selection with the platform's current one.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection.set(selection);
    }

    /// Nearest enclosing block of the selection's anchor.
    pub fn block_at_anchor(&self) -> Option<NodeId> {
        self.selection
            .anchor()
            .and_then(|anchor| self.doc.block_at(anchor))
    }

    /// Collapse the selection onto `range`.
    pub fn collapse_to(&mut self, range: DomRange, to_start: bool) {
        self.selection.collapse_to(range, to_start);
    }

    /// Select the whole inline content of `block`.
    pub fn select_node_contents(&mut self, block: NodeId) {
        self.selection.select_node_contents(self.doc.dom(), block);
    }

    fn caret_point(&self) -> Option<BlockPoint> {
        self.selection
            .anchor()
            .and_then(|anchor| self.doc.block_point(anchor))
    }

    fn set_caret(&mut self, point: BlockPoint) {
        let pos = self.doc.position(point);
        self.selection.collapse_at(pos);
    }

    fn caret_to_first_block(&mut self) {
        if let Some(first) = self.doc.first_block() {
            self.set_caret(BlockPoint::new(first, 0));
        }
    }

    /// Block point for a range endpoint. Endpoints sitting directly in the
    /// host snap to the adjacent block.
    fn point_for(&self, pos: Position, is_start: bool) -> Option<BlockPoint> {
        if let Some(point) = self.doc.block_point(pos) {
            return Some(point);
        }
        if pos.node != self.doc.host() {
            return None;
        }
        let children = self.doc.dom().children(self.doc.host());
        if is_start {
            let block = *children.get(pos.offset)?;
            Some(BlockPoint::new(block, 0))
        } else {
            let block = *children.get(pos.offset.checked_sub(1)?)?;
            Some(BlockPoint::new(block, self.doc.block_len(block)))
        }
    }

    fn range_points(&self) -> Option<(BlockPoint, BlockPoint)> {
        let range = self.current_range()?;
        Some((
            self.point_for(range.start, true)?,
            self.point_for(range.end, false)?,
        ))
    }

    /// Anchor and focus as block points, to be restored after a rebuild.
    fn selection_points(&self) -> Option<(BlockPoint, BlockPoint)> {
        let sel = self.selection.get()?;
        let dom = self.doc.dom();
        let forward = !matches!(
            dom.compare(sel.anchor, sel.focus),
            Some(std::cmp::Ordering::Greater)
        );
        Some((
            self.point_for(sel.anchor, forward)?,
            self.point_for(sel.focus, !forward)?,
        ))
    }

    fn restore_selection_points(&mut self, points: Option<(BlockPoint, BlockPoint)>) {
        if let Some((anchor, focus)) = points {
            let selection = Selection::new(self.doc.position(anchor), self.doc.position(focus));
            self.selection.set(Some(selection));
        }
    }

    fn is_editable(&self, block: NodeId) -> bool {
        self.doc.block_kind(block).is_some_and(BlockKind::is_editable)
    }

    /// Blocks from `start` to `end` with the inline range each one covers.
    fn segments(&self, start: BlockPoint, end: BlockPoint) -> Vec<(NodeId, Range<usize>)> {
        let blocks = self.doc.blocks();
        let (Some(si), Some(ei)) = (
            blocks.iter().position(|&b| b == start.block),
            blocks.iter().position(|&b| b == end.block),
        ) else {
            return Vec::new();
        };
        blocks[si..=ei.max(si)]
            .iter()
            .map(|&block| {
                let from = if block == start.block { start.offset } else { 0 };
                let to = if block == end.block {
                    end.offset
                } else {
                    self.doc.block_len(block)
                };
                (block, from..to.max(from))
            })
            .collect()
    }

    // === Structural edits ===

    /// Delete everything between two points, merging the end block into the
    /// start block. Returns where the caret goes.
    fn delete_range(&mut self, start: BlockPoint, end: BlockPoint) -> BlockPoint {
        let blocks = self.doc.blocks();
        let (Some(si), Some(ei)) = (
            blocks.iter().position(|&b| b == start.block),
            blocks.iter().position(|&b| b == end.block),
        ) else {
            return start;
        };
        if si == ei {
            if self.is_editable(start.block) {
                let mut content = self.doc.inline(start.block);
                content.delete(start.offset..end.offset);
                self.doc.set_inline(start.block, &content);
                self.emit(EditorEffect::Changed);
            }
            return start;
        }
        for &block in &blocks[si + 1..ei] {
            self.doc.dom_mut().remove(block);
        }
        let previous = self.doc.previous_block(start.block);
        let caret = match (self.is_editable(start.block), self.is_editable(end.block)) {
            (true, true) => {
                let mut head = self.doc.inline(start.block);
                head.delete(start.offset..head.len());
                let mut tail = self.doc.inline(end.block).split_off(end.offset);
                if self.doc.block_kind(start.block).is_some_and(BlockKind::is_heading) {
                    tail.strip();
                }
                head.append(tail);
                self.doc.set_inline(start.block, &head);
                self.doc.dom_mut().remove(end.block);
                start
            }
            (true, false) => {
                let mut head = self.doc.inline(start.block);
                head.delete(start.offset..head.len());
                self.doc.set_inline(start.block, &head);
                self.doc.dom_mut().remove(end.block);
                start
            }
            (false, true) => {
                let mut tail = self.doc.inline(end.block);
                tail.delete(0..end.offset);
                self.doc.set_inline(end.block, &tail);
                self.doc.dom_mut().remove(start.block);
                BlockPoint::new(end.block, 0)
            }
            (false, false) => {
                self.doc.dom_mut().remove(start.block);
                self.doc.dom_mut().remove(end.block);
                match previous {
                    Some(prev) => BlockPoint::new(prev, self.doc.block_len(prev)),
                    None => {
                        let created = self.doc.ensure_first_block();
                        let first = created.or_else(|| self.doc.first_block());
                        BlockPoint::new(first.unwrap_or(start.block), 0)
                    }
                }
            }
        };
        self.emit(EditorEffect::Changed);
        caret
    }

    /// Delete the selected content and resolve the caret into a Text or
    /// Heading Block.
    fn prepare_insertion(&mut self) -> Option<BlockPoint> {
        let (start, end) = self.range_points()?;
        let point = if start != end {
            self.delete_range(start, end)
        } else {
            start
        };
        match self.doc.block_kind(point.block)? {
            BlockKind::Container => {
                let block = self.text_block_beside(point.block, Direction::Forward);
                Some(BlockPoint::new(block, 0))
            }
            _ => Some(point),
        }
    }

    fn insert_text(&mut self, text: &str) {
        let text = strip_control_chars(text);
        let Some(point) = self.prepare_insertion() else {
            tracing::debug!(target: "letterpress::editor", "no caret for text insertion");
            return;
        };
        let mut content = self.doc.inline(point.block);
        let marks = if self.doc.block_kind(point.block).is_some_and(BlockKind::is_heading) {
            Marks::default()
        } else {
            content.marks_for_insert(point.offset)
        };
        let count = content.insert_str(point.offset, &text, &marks);
        self.doc.set_inline(point.block, &content);
        self.set_caret(BlockPoint::new(point.block, point.offset + count));
        self.emit(EditorEffect::Changed);
    }

    /// Split the caret's block; the content after the caret moves into a new
    /// Text Block that receives the caret.
    fn split_block(&mut self) {
        let Some(point) = self.prepare_insertion() else {
            return;
        };
        let mut head = self.doc.inline(point.block);
        let tail = head.split_off(point.offset);
        self.doc.set_inline(point.block, &head);
        let block = self.doc.create_text_block();
        self.doc.set_inline(block, &tail);
        if let Err(err) = self.doc.dom_mut().insert_after(point.block, block) {
            tracing::debug!(target: "letterpress::editor", error = %err, "split target vanished");
            return;
        }
        self.set_caret(BlockPoint::new(block, 0));
        self.emit(EditorEffect::ScrollIntoView(block));
        self.emit(EditorEffect::Changed);
    }

    /// Append `source` to `target` and drop `source`.
    fn merge_blocks(&mut self, target: NodeId, source: NodeId) -> BlockPoint {
        let mut content = self.doc.inline(target);
        let at = content.len();
        let mut tail = self.doc.inline(source);
        if self.doc.block_kind(target).is_some_and(BlockKind::is_heading) {
            tail.strip();
        }
        content.append(tail);
        self.doc.set_inline(target, &content);
        self.doc.dom_mut().remove(source);
        self.emit(EditorEffect::Changed);
        BlockPoint::new(target, at)
    }

    fn remove_container(&mut self, container: NodeId) {
        tracing::debug!(target: "letterpress::editor", "removing container block");
        self.doc.dom_mut().remove(container);
        self.emit(EditorEffect::Changed);
    }

    /// Delete the selection, or one unit before the caret. At a block start
    /// the block merges into the previous one, or the previous Container
    /// Block is removed.
    fn delete_backward(&mut self) {
        let Some((start, end)) = self.range_points() else {
            return;
        };
        if start != end {
            let caret = self.delete_range(start, end);
            self.set_caret(caret);
            return;
        }
        if !self.is_editable(start.block) {
            return;
        }
        if start.offset > 0 {
            let mut content = self.doc.inline(start.block);
            content.delete(start.offset - 1..start.offset);
            self.doc.set_inline(start.block, &content);
            self.set_caret(BlockPoint::new(start.block, start.offset - 1));
            self.emit(EditorEffect::Changed);
            return;
        }
        match self.doc.previous_block(start.block) {
            None => {}
            Some(prev) if !self.is_editable(prev) => {
                self.remove_container(prev);
                self.set_caret(BlockPoint::new(start.block, 0));
            }
            Some(prev) => {
                let caret = self.merge_blocks(prev, start.block);
                self.set_caret(caret);
            }
        }
    }

    fn delete_forward(&mut self) {
        let Some((start, end)) = self.range_points() else {
            return;
        };
        if start != end {
            let caret = self.delete_range(start, end);
            self.set_caret(caret);
            return;
        }
        if !self.is_editable(start.block) {
            return;
        }
        let len = self.doc.block_len(start.block);
        if start.offset < len {
            let mut content = self.doc.inline(start.block);
            content.delete(start.offset..start.offset + 1);
            self.doc.set_inline(start.block, &content);
            self.set_caret(start);
            self.emit(EditorEffect::Changed);
            return;
        }
        match self.doc.next_block(start.block) {
            None => {}
            Some(next) if !self.is_editable(next) => {
                self.remove_container(next);
                self.set_caret(start);
            }
            Some(next) => {
                let caret = self.merge_blocks(start.block, next);
                self.set_caret(caret);
            }
        }
    }

    /// Delete the selection, if there is one.
    fn delete_selection(&mut self) {
        let Some((start, end)) = self.range_points() else {
            return;
        };
        if start != end {
            let caret = self.delete_range(start, end);
            self.set_caret(caret);
        }
    }

    fn delete_word(&mut self, direction: Direction) {
        self.delete_within_block(direction, |content, offset| match direction {
            Direction::Backward => find_word_boundary_backward(content, offset),
            Direction::Forward => find_word_boundary_forward(content, offset),
        });
    }

    /// Delete to the start or end of the caret's block.
    fn delete_line(&mut self, direction: Direction) {
        self.delete_within_block(direction, |content, _| match direction {
            Direction::Backward => 0,
            Direction::Forward => content.len(),
        });
    }

    /// Delete from the caret to `boundary` within its block. A selection, or
    /// a caret already at the boundary, deletes like Backspace or Delete.
    fn delete_within_block(
        &mut self,
        direction: Direction,
        boundary: impl Fn(&Inline, usize) -> usize,
    ) {
        let Some((start, end)) = self.range_points() else {
            return;
        };
        let mut content = self.doc.inline(start.block);
        let range = if start == end && self.is_editable(start.block) {
            let edge = boundary(&content, start.offset);
            match direction {
                Direction::Backward => edge.min(start.offset)..start.offset,
                Direction::Forward => start.offset..edge.max(start.offset),
            }
        } else {
            0..0
        };
        if range.is_empty() {
            return match direction {
                Direction::Backward => self.delete_backward(),
                Direction::Forward => self.delete_forward(),
            };
        }
        let caret = range.start;
        content.delete(range);
        self.doc.set_inline(start.block, &content);
        self.set_caret(BlockPoint::new(start.block, caret));
        self.emit(EditorEffect::Changed);
    }

    /// The Text or Heading Block next to `container` in `direction`. A new
    /// Text Block is created when the neighbour is missing or another
    /// Container Block.
    fn text_block_beside(&mut self, container: NodeId, direction: Direction) -> NodeId {
        let neighbour = match direction {
            Direction::Backward => self.doc.previous_block(container),
            Direction::Forward => self.doc.next_block(container),
        };
        if let Some(block) = neighbour.filter(|&b| self.is_editable(b)) {
            return block;
        }
        let block = self.doc.create_text_block();
        let placed = match direction {
            Direction::Backward => self.doc.dom_mut().insert_before(container, block),
            Direction::Forward => self.doc.dom_mut().insert_after(container, block),
        };
        if let Err(err) = placed {
            tracing::debug!(target: "letterpress::editor", error = %err, "container vanished");
        }
        self.emit(EditorEffect::Changed);
        block
    }

    // === Reactions ===

    /// Re-create the First Text Block if the host lost it, and bring back a
    /// caret that escaped the host.
    fn ensure_first_block(&mut self) {
        if let Some(block) = self.doc.ensure_first_block() {
            self.set_caret(BlockPoint::new(block, 0));
            self.emit(EditorEffect::Changed);
            return;
        }
        let escaped = self.selection.get().is_some_and(|sel| {
            !self.doc.dom().is_connected(sel.anchor.node)
                || !self.doc.dom().is_connected(sel.focus.node)
                || !self.doc.contains(sel.anchor)
        });
        if escaped {
            tracing::debug!(target: "letterpress::selection", "caret escaped the host");
            self.caret_to_first_block();
        }
    }

    /// Put a caret that is in no block back where it was before the key went
    /// down, or into a new Text Block after the previous block.
    fn position_cursor(&mut self) {
        let Some(anchor) = self.selection.anchor() else {
            return;
        };
        if self.doc.block_at(anchor).is_some() {
            return;
        }
        let Some(pre) = self.pre_keydown else {
            self.caret_to_first_block();
            return;
        };
        let dom = self.doc.dom();
        if dom.is_connected(pre.block)
            && dom.contains(self.doc.host(), pre.block)
            && self.is_editable(pre.block)
        {
            let offset = pre.offset.min(self.doc.block_len(pre.block));
            self.set_caret(BlockPoint::new(pre.block, offset));
            return;
        }
        let host = self.doc.host();
        let block = self.doc.create_text_block();
        let previous = pre
            .previous
            .filter(|&p| self.doc.dom().parent(p) == Some(host));
        match previous {
            Some(prev) => {
                let _ = self.doc.dom_mut().insert_after(prev, block);
            }
            None => self.doc.dom_mut().insert_child(host, 0, block),
        }
        tracing::debug!(target: "letterpress::editor", "caret recovered into a new block");
        self.set_caret(BlockPoint::new(block, 0));
        self.emit(EditorEffect::Changed);
    }

    /// Move a caret that landed in a Container Block to the neighbouring
    /// Text Block. Backward arrows go to the previous block, anything else
    /// to the next one.
    fn prevent_text_in_container(&mut self, key: Option<&Key>) -> bool {
        let Some(point) = self.caret_point() else {
            return false;
        };
        if self.doc.block_kind(point.block) != Some(BlockKind::Container) {
            return false;
        }
        let direction = match key {
            Some(key) if key.is_backward_arrow() => Direction::Backward,
            _ => Direction::Forward,
        };
        let target = self.text_block_beside(point.block, direction);
        let offset = match direction {
            Direction::Backward => self.doc.block_len(target),
            Direction::Forward => 0,
        };
        self.set_caret(BlockPoint::new(target, offset));
        true
    }

    fn normalize_current(&mut self) {
        let Some(mut selection) = self.selection.get() else {
            return;
        };
        match self.doc.normalize_selection(&mut selection) {
            Ok(()) => self.selection.set(Some(selection)),
            Err(err) => {
                tracing::debug!(target: "letterpress::editor", error = %err, "normalization skipped");
            }
        }
    }

    /// Show the insert toolbar for a collapsed caret in an empty Text Block,
    /// hide it otherwise. An open prompt keeps it up.
    fn refresh_insert_toolbar(&mut self) {
        if self.insert_toolbar.input().is_visible() {
            return;
        }
        let target = self
            .caret_point()
            .filter(|_| self.selection.is_collapsed())
            .map(|point| point.block)
            .filter(|&block| {
                self.doc.block_kind(block) == Some(BlockKind::Text)
                    && self.doc.is_empty_block(block)
            });
        match target {
            Some(block) => self.insert_toolbar.show_for(block),
            None => self.insert_toolbar.dismiss(),
        }
    }

    /// Button states follow the selection; the toolbar itself is hidden once
    /// the selection collapses, unless its prompt is open.
    fn refresh_edit_toolbar(&mut self) {
        if let Some(range) = self.current_range() {
            self.edit_toolbar.refresh_states(&self.doc, range);
        }
        if !self.has_content_selection() && !self.edit_toolbar.input().is_visible() {
            self.edit_toolbar.hide();
        }
    }

    fn has_content_selection(&self) -> bool {
        let Some(range) = self.current_range() else {
            return false;
        };
        if range.is_collapsed() || !range.is_within(self.doc.dom(), self.doc.host()) {
            return false;
        }
        self.range_points().is_some_and(|(start, end)| start != end)
    }

    /// Steps that follow every handled event.
    fn settle(&mut self) {
        self.normalize_current();
        self.ensure_first_block();
        self.prevent_text_in_container(None);
        self.refresh_edit_toolbar();
        self.refresh_insert_toolbar();
        self.collect_garbage();
    }

    /// Nodes the editor still refers to. Garbage collection keeps them and
    /// the detached trees they live in.
    fn held_nodes(&self) -> Vec<NodeId> {
        let mut held = vec![self.doc.host()];
        if let Some(selection) = self.selection.get() {
            held.extend([selection.anchor.node, selection.focus.node]);
        }
        if let Some(pre) = self.pre_keydown {
            held.push(pre.block);
            held.extend(pre.previous);
        }
        held.extend(self.insert_toolbar.target());
        held.extend(self.pending_reimport);
        for kind in [ToolbarKind::Edit, ToolbarKind::Insert] {
            if let Some(range) = self.toolbar(kind).input().pinned() {
                held.extend([range.start.node, range.end.node]);
            }
        }
        held.extend(self.effects.iter().filter_map(|effect| match effect {
            EditorEffect::ScrollIntoView(block) => Some(*block),
            _ => None,
        }));
        held
    }

    /// Free the nodes edits have detached once enough have piled up. The
    /// platform holds on to the composing block, so nothing is freed mid
    /// composition.
    fn collect_garbage(&mut self) {
        if self.composing || !self.doc.dom().should_collect() {
            return;
        }
        let held = self.held_nodes();
        let freed = self.doc.dom_mut().collect_garbage(&held);
        tracing::trace!(target: "letterpress::dom", freed, "collected detached nodes");
    }

    // === Event handlers ===

    pub fn handle_keydown(&mut self, key: &Key, modifiers: Modifiers) -> KeydownResult {
        if self.composing {
            return KeydownResult::PassThrough;
        }
        let Some(point) = self.caret_point() else {
            return KeydownResult::NotHandled;
        };
        let Some(kind) = self.doc.block_kind(point.block) else {
            return KeydownResult::NotHandled;
        };
        if kind.is_editable() {
            self.pre_keydown = Some(PreKeydown {
                block: point.block,
                offset: point.offset,
                previous: self.doc.dom().previous_sibling(point.block),
            });
        }

        if kind == BlockKind::Container {
            if key.is_modifier() || modifiers.is_command() {
                return KeydownResult::NotHandled;
            }
            self.prevent_text_in_container(Some(key));
            self.settle();
            return if key.is_arrow() {
                KeydownResult::Handled
            } else {
                KeydownResult::NotHandled
            };
        }

        let collapsed = self
            .range_points()
            .is_some_and(|(start, end)| start == end);
        match key {
            Key::Enter => {
                self.split_block();
                self.settle();
                KeydownResult::Handled
            }
            Key::Backspace if collapsed && point.offset == 0 => {
                match self.doc.previous_block(point.block) {
                    Some(prev) if self.doc.block_kind(prev) == Some(BlockKind::Container) => {
                        self.remove_container(prev);
                        self.set_caret(BlockPoint::new(point.block, 0));
                        self.settle();
                        KeydownResult::Handled
                    }
                    _ => KeydownResult::NotHandled,
                }
            }
            Key::Delete if collapsed && point.offset == self.doc.block_len(point.block) => {
                match self.doc.next_block(point.block) {
                    Some(next) if self.doc.block_kind(next) == Some(BlockKind::Container) => {
                        self.remove_container(next);
                        self.set_caret(point);
                        self.settle();
                        KeydownResult::Handled
                    }
                    _ => KeydownResult::NotHandled,
                }
            }
            _ => KeydownResult::NotHandled,
        }
    }

    pub fn handle_beforeinput(
        &mut self,
        input_type: &InputType,
        data: Option<&str>,
    ) -> BeforeInputResult {
        if self.composing || *input_type == InputType::InsertCompositionText {
            return BeforeInputResult::PassThrough;
        }
        tracing::trace!(target: "letterpress::editor", ?input_type, "beforeinput");
        self.pending_reimport = None;
        match input_type {
            InputType::InsertText | InputType::InsertReplacementText => {
                if let Some(text) = data.filter(|t| !t.is_empty()) {
                    self.insert_text(text);
                }
            }
            InputType::InsertParagraph | InputType::InsertLineBreak => self.split_block(),
            InputType::InsertFromPaste | InputType::InsertFromDrop => {
                if let Some(text) = data {
                    self.paste_text(text);
                }
            }
            InputType::DeleteContentBackward => self.delete_backward(),
            InputType::DeleteContentForward => self.delete_forward(),
            InputType::DeleteWordBackward => self.delete_word(Direction::Backward),
            InputType::DeleteWordForward => self.delete_word(Direction::Forward),
            InputType::DeleteLineBackward => self.delete_line(Direction::Backward),
            InputType::DeleteLineForward => self.delete_line(Direction::Forward),
            InputType::DeleteByCut | InputType::DeleteContent => self.delete_selection(),
            InputType::FormatBold => self.toggle_mark(Mark::Bold),
            InputType::FormatItalic => self.toggle_mark(Mark::Italic),
            InputType::HistoryUndo | InputType::HistoryRedo => {
                tracing::trace!(target: "letterpress::editor", ?input_type, "no history kept");
            }
            InputType::InsertCompositionText => {}
            InputType::Unknown(name) => return self.pass_through(name),
        }
        self.settle();
        BeforeInputResult::Handled
    }

    /// Leave an input the editor has no model for to the platform. The
    /// caret's block is read back through [`Editor::reimport_block`] once
    /// the platform has applied it.
    fn pass_through(&mut self, input_type: &str) -> BeforeInputResult {
        self.pending_reimport = self
            .caret_point()
            .map(|point| point.block)
            .filter(|&block| self.is_editable(block));
        tracing::debug!(target: "letterpress::editor", input_type, "passed through to the platform");
        BeforeInputResult::PassThrough
    }

    pub fn handle_keyup(&mut self, key: &Key) {
        if self.composing {
            return;
        }
        self.ensure_first_block();
        self.position_cursor();
        self.prevent_text_in_container(Some(key));
        self.normalize_current();
        self.refresh_insert_toolbar();
    }

    /// Click inside the host. Clicks on the insert toolbar are its own.
    pub fn handle_click(&mut self, on_insert_toolbar: bool) {
        if on_insert_toolbar {
            return;
        }
        self.prevent_text_in_container(None);
        self.refresh_insert_toolbar();
    }

    /// Show the edit toolbar over a non-empty selection inside the host,
    /// hide it otherwise. A selection inside the edit toolbar leaves it be.
    pub fn handle_selection_change(&mut self, in_edit_toolbar: bool) {
        if in_edit_toolbar {
            return;
        }
        if self.has_content_selection() {
            if let Some(range) = self.current_range() {
                self.edit_toolbar.refresh_states(&self.doc, range);
            }
            self.edit_toolbar.show();
        } else if !self.edit_toolbar.input().is_visible() {
            self.edit_toolbar.hide();
        }
    }

    pub fn handle_mouseup(&mut self) {
        self.handle_selection_change(false);
    }

    /// Insert clipboard plain text at the caret.
    pub fn handle_paste(&mut self, text: &str) {
        self.paste_text(text);
        self.settle();
    }

    fn paste_text(&mut self, text: &str) {
        let clean = sanitize_paste(text);
        if clean.is_empty() {
            return;
        }
        self.insert_text(&clean);
    }

    pub fn begin_composition(&mut self) {
        self.composing = true;
    }

    /// Re-import a block the platform edited during IME composition.
    pub fn end_composition(&mut self, block: NodeId, html: &str, caret_offset: usize) {
        self.composing = false;
        self.replace_block_html(block, html, caret_offset);
        self.settle();
    }

    /// The block waiting to be re-imported after a passed-through input.
    pub fn pending_reimport(&self) -> Option<NodeId> {
        self.pending_reimport
    }

    /// Re-import a block after the platform applied a passed-through input
    /// to it.
    pub fn reimport_block(&mut self, block: NodeId, html: &str, caret_offset: usize) {
        self.pending_reimport = None;
        self.replace_block_html(block, html, caret_offset);
        self.settle();
    }

    /// Replace the content of `block` with markup read back from the
    /// platform, in canonical form.
    fn replace_block_html(&mut self, block: NodeId, html: &str, caret_offset: usize) {
        if !self.is_editable(block) || !self.doc.dom().is_connected(block) {
            return;
        }
        let nodes = match parse_fragment(self.doc.dom_mut(), html) {
            Ok(nodes) => nodes,
            Err(err) => {
                tracing::warn!(target: "letterpress::editor", error = %err, "platform markup did not parse");
                return;
            }
        };
        let dom = self.doc.dom_mut();
        dom.clear_children(block);
        for node in nodes {
            dom.append_child(block, node);
        }
        let mut content = self.doc.inline(block);
        if self.doc.block_kind(block).is_some_and(BlockKind::is_heading) {
            content.strip();
        }
        self.doc.set_inline(block, &content);
        self.set_caret(BlockPoint::new(block, caret_offset.min(content.len())));
        self.emit(EditorEffect::Changed);
    }

    /// An image embed failed to load: drop its Container Block and tell the
    /// user.
    pub fn handle_image_error(&mut self, image: NodeId) {
        let dom = self.doc.dom();
        let Some(container) = dom
            .parent(image)
            .filter(|&c| dom.has_class(c, CONTAINER_CLASS) && dom.is_connected(c))
        else {
            return;
        };
        tracing::warn!(
            target: "letterpress::editor",
            src = dom.attr(image, "src").unwrap_or(""),
            "image failed to load"
        );
        let fallback = self.doc.next_block(container).or(self.doc.previous_block(container));
        self.remove_container(container);
        let caret_lost = self
            .selection
            .anchor()
            .is_some_and(|a| !self.doc.dom().is_connected(a.node));
        if let Some(block) = fallback.filter(|_| caret_lost) {
            self.set_caret(BlockPoint::new(block, 0));
        }
        self.emit(EditorEffect::Alert(IMAGE_ERROR_MESSAGE.to_string()));
        self.settle();
    }

    // === Toolbar actions ===

    /// Click a toolbar button. Returns false when the button is disabled.
    pub fn click_button(&mut self, kind: ToolbarKind, id: ButtonId) -> bool {
        let action = self.toolbar(kind).button(id).and_then(|b| b.click());
        match action {
            Some(action) => {
                self.perform(action);
                true
            }
            None => false,
        }
    }

    pub fn perform(&mut self, action: EditorAction) {
        tracing::debug!(target: "letterpress::editor", ?action, "perform");
        match action {
            EditorAction::ToggleBold => self.toggle_mark(Mark::Bold),
            EditorAction::ToggleItalic => self.toggle_mark(Mark::Italic),
            EditorAction::ToggleHeading => self.toggle_heading(),
            EditorAction::ToggleLink => self.toggle_link(),
            EditorAction::InsertImage => self.begin_image_prompt(),
            EditorAction::InsertHorizontalRule => self.insert_horizontal_rule(),
        }
        self.settle();
    }

    /// Remove the mark when every char in the range carries it, add it to
    /// the whole range otherwise. Headings are left alone.
    fn toggle_mark(&mut self, mark: Mark) {
        let Some((start, end)) = self.range_points() else {
            return;
        };
        if start == end {
            return;
        }
        let segments: Vec<_> = self
            .segments(start, end)
            .into_iter()
            .filter(|(block, _)| self.doc.block_kind(*block) == Some(BlockKind::Text))
            .collect();
        let states: Vec<bool> = segments
            .iter()
            .filter_map(|(block, range)| {
                let content = self.doc.inline(*block);
                match mark {
                    Mark::Bold => content.all_bold(range.clone()),
                    Mark::Italic => content.all_italic(range.clone()),
                }
            })
            .collect();
        if states.is_empty() {
            return;
        }
        let apply = !states.iter().all(|&s| s);
        let points = self.selection_points();
        for (block, range) in segments {
            let mut content = self.doc.inline(block);
            match mark {
                Mark::Bold => content.set_bold(range, apply),
                Mark::Italic => content.set_italic(range, apply),
            }
            self.doc.set_inline(block, &content);
        }
        self.restore_selection_points(points);
        self.emit(EditorEffect::Changed);
    }

    /// The block a range-wide operation acts on.
    fn range_block(&self) -> Option<NodeId> {
        let range = self.current_range()?;
        range
            .common_ancestor(self.doc.dom())
            .and_then(|common| self.doc.find_block(common))
            .or_else(|| self.point_for(range.start, true).map(|p| p.block))
    }

    /// Cycle plain ↔ heading: level 1 for the First Text Block, level 2
    /// everywhere else.
    fn toggle_heading(&mut self) {
        let Some(block) = self.range_block() else {
            return;
        };
        let target = match self.doc.block_kind(block) {
            None | Some(BlockKind::Container) => return,
            Some(BlockKind::Heading(_)) => BlockKind::Text,
            Some(BlockKind::Text) if self.doc.is_first_block(block) => {
                BlockKind::Heading(HeadingLevel::One)
            }
            Some(BlockKind::Text) => BlockKind::Heading(HeadingLevel::Two),
        };
        if let Err(err) = self.doc.retag_block(block, target) {
            tracing::warn!(target: "letterpress::editor", error = %err, "heading toggle failed");
            return;
        }
        let end = self.doc.block_len(block);
        self.set_caret(BlockPoint::new(block, end));
        let whole = DomRange::new(
            Position::new(block, 0),
            Position::new(block, self.doc.dom().node_len(block)),
        );
        self.edit_toolbar.refresh_states(&self.doc, whole);
        self.emit(EditorEffect::Changed);
    }

    /// Unwrap links the range touches, or prompt for a URL to wrap it in.
    fn toggle_link(&mut self) {
        let Some((start, end)) = self.range_points() else {
            return;
        };
        if start == end {
            return;
        }
        let segments = self.segments(start, end);
        let intersects = segments
            .iter()
            .any(|(block, range)| self.doc.inline(*block).has_link_in(range.clone()));
        if intersects {
            let points = self.selection_points();
            for (block, range) in segments {
                let mut content = self.doc.inline(block);
                content.unlink(range);
                self.doc.set_inline(block, &content);
            }
            self.restore_selection_points(points);
            self.emit(EditorEffect::Changed);
            return;
        }
        let range = self.current_range();
        self.edit_toolbar.mount_input();
        let input = self.edit_toolbar.input_mut();
        input.set_handler(InputHandler::LinkUrl);
        input.display(LINK_PLACEHOLDER, range);
        self.emit(EditorEffect::FocusInput(ToolbarKind::Edit));
    }

    fn begin_image_prompt(&mut self) {
        let range = self.current_range();
        self.insert_toolbar.mount_input();
        let input = self.insert_toolbar.input_mut();
        input.set_stay_open(true);
        input.set_handler(InputHandler::ImageUrl);
        input.display(IMAGE_URL_PLACEHOLDER, range);
        self.emit(EditorEffect::FocusInput(ToolbarKind::Insert));
    }

    /// Insert a horizontal rule before the caret's block. The First Text
    /// Block never gets one.
    fn insert_horizontal_rule(&mut self) {
        let Some(block) = self.block_at_anchor().or(self.insert_toolbar.target()) else {
            return;
        };
        if !self.is_editable(block) {
            return;
        }
        if self.doc.is_first_block(block) {
            tracing::debug!(target: "letterpress::editor", "no horizontal rule before the first block");
            return;
        }
        let container = self.doc.create_container_block(&Embed::HorizontalRule);
        if let Err(err) = self.doc.dom_mut().insert_before(block, container) {
            tracing::debug!(target: "letterpress::editor", error = %err, "rule target vanished");
            return;
        }
        self.doc.seed_sentinel(block);
        self.set_caret(BlockPoint::new(block, 0));
        self.emit(EditorEffect::Changed);
    }

    // === Toolbar input ===

    /// Mirror the text typed into a toolbar's input field.
    pub fn set_input_value(&mut self, kind: ToolbarKind, value: &str) {
        self.toolbar_mut(kind).input_mut().set_value(value);
    }

    /// Enter in a toolbar input: run the installed handler.
    pub fn commit_input(&mut self, kind: ToolbarKind) {
        let input = self.toolbar(kind).input();
        let stay_open = input.stays_open();
        let Some(commit) = input.commit() else {
            self.hide_input(kind, true);
            self.settle();
            return;
        };
        let disposition = match commit.handler {
            InputHandler::LinkUrl => self.commit_link(&commit.value, commit.pinned),
            InputHandler::ImageUrl => self.commit_image_url(&commit.value),
            InputHandler::ImageAlt { url } => {
                self.commit_image_alt(url, &commit.value, commit.pinned)
            }
        };
        let close = match disposition {
            Some(Disposition::Close) => true,
            Some(Disposition::KeepOpen) => false,
            None => !stay_open,
        };
        if close {
            self.hide_input(kind, true);
        }
        self.settle();
    }

    /// Blur, Escape or a click outside the toolbar.
    pub fn dismiss_input(&mut self, kind: ToolbarKind) {
        if self.toolbar(kind).input().is_visible() {
            self.hide_input(kind, true);
            self.settle();
        }
    }

    fn hide_input(&mut self, kind: ToolbarKind, use_callback: bool) {
        let outcome = self.toolbar_mut(kind).input_mut().hide(use_callback);
        if let Some(range) = outcome.restore.filter(|r| r.is_connected(self.doc.dom())) {
            self.selection.select_range(range);
        }
        if outcome.notify_owner {
            self.toolbar_mut(kind).restore_buttons();
        }
    }

    fn commit_link(&mut self, value: &str, pinned: Option<DomRange>) -> Option<Disposition> {
        let url = match validate_url(value) {
            Ok(url) => url,
            Err(err) => {
                tracing::debug!(target: "letterpress::editor", error = %err, "link URL rejected");
                self.edit_toolbar
                    .input_mut()
                    .display(INVALID_URL_PLACEHOLDER, None);
                self.emit(EditorEffect::FocusInput(ToolbarKind::Edit));
                return Some(Disposition::KeepOpen);
            }
        };
        let pinned = pinned.filter(|r| r.is_connected(self.doc.dom()))?;
        let start = self.point_for(pinned.start, true)?;
        let end = self.point_for(pinned.end, false)?;
        for (block, range) in self.segments(start, end) {
            if self.doc.block_kind(block) != Some(BlockKind::Text) {
                continue;
            }
            let mut content = self.doc.inline(block);
            content.set_link(range, Some(&url));
            self.doc.set_inline(block, &content);
        }
        let at = self.doc.position(end);
        self.edit_toolbar.input_mut().pin(DomRange::collapsed(at));
        self.emit(EditorEffect::Changed);
        None
    }

    fn commit_image_url(&mut self, value: &str) -> Option<Disposition> {
        let input = self.insert_toolbar.input_mut();
        match validate_url(value) {
            Ok(url) => {
                input.set_handler(InputHandler::ImageAlt { url });
                input.display(IMAGE_ALT_PLACEHOLDER, None);
            }
            Err(err) => {
                tracing::debug!(target: "letterpress::editor", error = %err, "image URL rejected");
                input.display(IMAGE_URL_PLACEHOLDER, None);
            }
        }
        self.emit(EditorEffect::FocusInput(ToolbarKind::Insert));
        None
    }

    fn commit_image_alt(
        &mut self,
        url: String,
        alt: &str,
        pinned: Option<DomRange>,
    ) -> Option<Disposition> {
        let block = pinned
            .filter(|r| r.is_connected(self.doc.dom()))
            .and_then(|r| self.doc.block_at(r.start))
            .or(self.insert_toolbar.target())
            .filter(|&b| self.doc.dom().is_connected(b) && self.is_editable(b));
        let Some(block) = block else {
            tracing::debug!(target: "letterpress::editor", "image target vanished");
            return Some(Disposition::Close);
        };
        let container = self.doc.create_container_block(&Embed::Image {
            src: url,
            alt: alt.trim().to_string(),
        });
        let caret_block = if self.doc.is_first_block(block) {
            let fresh = self.doc.create_text_block();
            let dom = self.doc.dom_mut();
            let placed = dom
                .insert_after(block, container)
                .and_then(|()| dom.insert_after(container, fresh));
            if placed.is_err() {
                return Some(Disposition::Close);
            }
            fresh
        } else {
            if self.doc.dom_mut().insert_before(block, container).is_err() {
                return Some(Disposition::Close);
            }
            self.doc.seed_sentinel(block);
            block
        };
        let at = self.doc.position(BlockPoint::new(caret_block, 0));
        self.insert_toolbar.input_mut().pin(DomRange::collapsed(at));
        self.emit(EditorEffect::Changed);
        Some(Disposition::Close)
    }

    // === Placement ===

    /// What a visible toolbar should be positioned against.
    pub fn toolbar_anchor(&self, kind: ToolbarKind) -> Option<ToolbarAnchor> {
        match kind {
            ToolbarKind::Edit if self.edit_toolbar.is_visible() => self
                .edit_toolbar
                .input()
                .pinned()
                .or_else(|| self.current_range())
                .map(ToolbarAnchor::Range),
            ToolbarKind::Insert if self.insert_toolbar.is_visible() => {
                self.insert_toolbar.target().map(ToolbarAnchor::Block)
            }
            _ => None,
        }
    }

    /// Record the measured placement of a toolbar.
    pub fn place_toolbar(&mut self, kind: ToolbarKind, anchor: Rect, size: Size, viewport: Size) {
        self.toolbar_mut(kind).place(anchor, size, viewport);
    }

    // === Snapshot ===

    /// The inner host as HTML, with `contenteditable` set to `editable`.
    pub fn serialize(&self, editable: bool) -> String {
        self.doc.serialize(editable)
    }

    /// Replace the document with a snapshot produced by `serialize`.
    ///
    /// The snapshot's first element must carry the inner-host class;
    /// otherwise nothing changes.
    pub fn load(&mut self, html: &str) -> Result<(), SnapshotError> {
        let mut dom = Dom::new();
        let nodes = parse_fragment(&mut dom, html)?;
        let root = nodes
            .into_iter()
            .find(|&n| !dom.text(n).is_some_and(|t| t.trim().is_empty()))
            .ok_or(SnapshotError::MissingRoot)?;
        if !dom.has_class(root, HOST_CLASS) {
            return Err(SnapshotError::NotEditorRoot {
                tag: dom.tag(root).unwrap_or("#text").to_string(),
                class: HOST_CLASS,
            });
        }
        self.doc.adopt(dom, root);
        self.doc.ensure_first_block();
        self.edit_toolbar = EditToolbar::new();
        self.insert_toolbar = InsertToolbar::new();
        self.pre_keydown = None;
        self.composing = false;
        self.pending_reimport = None;
        self.caret_to_first_block();
        self.emit(EditorEffect::Changed);
        tracing::info!(
            target: "letterpress::editor",
            blocks = self.doc.blocks().len(),
            "loaded snapshot"
        );
        Ok(())
    }
}
