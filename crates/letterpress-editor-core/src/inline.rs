//! Inline content of a Text or Heading Block as a flat run of styled units.
//!
//! Every inline edit flattens the block, edits the units and rebuilds the
//! block in canonical nesting (link outermost, then `<b>`, then `<i>`), so
//! adjacent text nodes never survive an edit.

use std::ops::Range;

use smol_str::SmolStr;

use crate::dom::{Dom, NodeId, Position};

/// Inline styles carried by a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub link: Option<SmolStr>,
}

impl Marks {
    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && self.link.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Char(char),
    /// A `<br>` inside the block.
    Break,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Styled {
    pub unit: Unit,
    pub marks: Marks,
}

/// Flattened inline content. Offsets count chars, with a line break
/// counting as one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inline {
    units: Vec<Styled>,
}

/// A leaf of the inline tree with its starting offset.
struct Leaf {
    node: NodeId,
    start: usize,
    len: usize,
    is_text: bool,
}

impl Inline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: &str) -> Self {
        let mut inline = Self::new();
        inline.insert_str(0, text, &Marks::default());
        inline
    }

    /// Read the inline content of `block`. A lone line-break sentinel reads
    /// as empty.
    pub fn flatten(dom: &Dom, block: NodeId) -> Self {
        let mut units = Vec::new();
        for &child in dom.children(block) {
            flatten_into(dom, child, &Marks::default(), &mut units);
        }
        if units.len() == 1 && units[0].unit == Unit::Break {
            units.clear();
        }
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[Styled] {
        &self.units
    }

    /// The text with line breaks dropped.
    pub fn text(&self) -> String {
        self.units
            .iter()
            .filter_map(|s| match s.unit {
                Unit::Char(c) => Some(c),
                Unit::Break => None,
            })
            .collect()
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.units.get(offset).map(|s| match s.unit {
            Unit::Char(c) => c,
            Unit::Break => '\n',
        })
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let end = range.end.min(self.len());
        range.start.min(end)..end
    }

    /// Marks a char typed at `offset` picks up: bold and italic from the
    /// preceding unit, a link only when the caret is strictly inside it.
    pub fn marks_for_insert(&self, offset: usize) -> Marks {
        let before = offset.checked_sub(1).and_then(|i| self.units.get(i));
        let after = self.units.get(offset);
        let Some(before) = before.or(after) else {
            return Marks::default();
        };
        let after_link = after.and_then(|a| a.marks.link.as_ref());
        let link = match (before.marks.link.as_ref(), after_link) {
            (Some(a), Some(b)) if a == b && offset > 0 => Some(a.clone()),
            _ => None,
        };
        Marks {
            bold: before.marks.bold,
            italic: before.marks.italic,
            link,
        }
    }

    pub fn insert_str(&mut self, offset: usize, text: &str, marks: &Marks) -> usize {
        let offset = offset.min(self.len());
        let new: Vec<Styled> = text
            .chars()
            .map(|c| Styled {
                unit: Unit::Char(c),
                marks: marks.clone(),
            })
            .collect();
        let count = new.len();
        self.units.splice(offset..offset, new);
        count
    }

    pub fn delete(&mut self, range: Range<usize>) {
        let range = self.clamp(range);
        self.units.drain(range);
    }

    /// Split at `offset`, keeping the head and returning the tail.
    pub fn split_off(&mut self, offset: usize) -> Inline {
        let offset = offset.min(self.len());
        Inline {
            units: self.units.split_off(offset),
        }
    }

    pub fn append(&mut self, mut other: Inline) {
        self.units.append(&mut other.units);
    }

    /// Drop every mark and every line break, leaving only text.
    pub fn strip(&mut self) {
        self.units.retain(|s| matches!(s.unit, Unit::Char(_)));
        for s in &mut self.units {
            s.marks = Marks::default();
        }
    }

    fn chars_in(&self, range: Range<usize>) -> impl Iterator<Item = &Styled> {
        let range = self.clamp(range);
        self.units[range]
            .iter()
            .filter(|s| matches!(s.unit, Unit::Char(_)))
    }

    /// Whether every char in `range` is bold. `None` when there is no char.
    pub fn all_bold(&self, range: Range<usize>) -> Option<bool> {
        self.all(range, |m| m.bold)
    }

    pub fn all_italic(&self, range: Range<usize>) -> Option<bool> {
        self.all(range, |m| m.italic)
    }

    fn all(&self, range: Range<usize>, pred: impl Fn(&Marks) -> bool) -> Option<bool> {
        let mut any = false;
        for s in self.chars_in(range) {
            any = true;
            if !pred(&s.marks) {
                return Some(false);
            }
        }
        any.then_some(true)
    }

    pub fn set_bold(&mut self, range: Range<usize>, bold: bool) {
        let range = self.clamp(range);
        for s in &mut self.units[range] {
            s.marks.bold = bold;
        }
    }

    pub fn set_italic(&mut self, range: Range<usize>, italic: bool) {
        let range = self.clamp(range);
        for s in &mut self.units[range] {
            s.marks.italic = italic;
        }
    }

    pub fn set_link(&mut self, range: Range<usize>, link: Option<&str>) {
        let range = self.clamp(range);
        for s in &mut self.units[range] {
            s.marks.link = link.map(SmolStr::new);
        }
    }

    pub fn has_link_in(&self, range: Range<usize>) -> bool {
        let range = self.clamp(range);
        self.units[range].iter().any(|s| s.marks.link.is_some())
    }

    /// The contiguous extent around `offset` carrying the same link.
    pub fn link_extent(&self, offset: usize) -> Option<Range<usize>> {
        let link = self.units.get(offset)?.marks.link.as_ref()?;
        let mut start = offset;
        while start > 0 && self.units[start - 1].marks.link.as_ref() == Some(link) {
            start -= 1;
        }
        let mut end = offset + 1;
        while end < self.len() && self.units[end].marks.link.as_ref() == Some(link) {
            end += 1;
        }
        Some(start..end)
    }

    /// Remove every link touching `range`, over its whole extent.
    pub fn unlink(&mut self, range: Range<usize>) {
        let range = self.clamp(range);
        let mut offset = range.start;
        while offset < range.end {
            match self.link_extent(offset) {
                Some(extent) => {
                    self.set_link(extent.clone(), None);
                    offset = extent.end;
                }
                None => offset += 1,
            }
        }
    }

    /// Replace the children of `block` with the canonical rendering of this
    /// content. Empty content becomes a lone `<br>` sentinel.
    pub fn rebuild(&self, dom: &mut Dom, block: NodeId) {
        dom.clear_children(block);
        if self.units.is_empty() {
            let br = dom.create_element("br");
            dom.append_child(block, br);
            return;
        }
        for (link, group) in group_by(&self.units, |s| s.marks.link.clone()) {
            let link_parent = match link {
                Some(href) => {
                    let a = dom.create_element("a");
                    dom.set_attr(a, "href", href.as_str());
                    dom.append_child(block, a);
                    a
                }
                None => block,
            };
            for (bold, group) in group_by(group, |s| s.marks.bold) {
                let bold_parent = wrap_if(dom, link_parent, bold, "b");
                for (italic, group) in group_by(group, |s| s.marks.italic) {
                    let parent = wrap_if(dom, bold_parent, italic, "i");
                    emit_units(dom, parent, group);
                }
            }
        }
    }
}

fn flatten_into(dom: &Dom, node: NodeId, marks: &Marks, out: &mut Vec<Styled>) {
    if let Some(text) = dom.text(node) {
        out.extend(text.chars().map(|c| Styled {
            unit: Unit::Char(c),
            marks: marks.clone(),
        }));
        return;
    }
    let mut marks = marks.clone();
    match dom.tag(node) {
        Some("br") => {
            out.push(Styled {
                unit: Unit::Break,
                marks,
            });
            return;
        }
        Some("b" | "strong") => marks.bold = true,
        Some("i" | "em") => marks.italic = true,
        Some("a") => {
            if let Some(href) = dom.attr(node, "href") {
                marks.link = Some(SmolStr::new(href));
            }
        }
        _ => {}
    }
    for &child in dom.children(node) {
        flatten_into(dom, child, &marks, out);
    }
}

fn group_by<K: PartialEq>(
    units: &[Styled],
    key: impl Fn(&Styled) -> K,
) -> Vec<(K, &[Styled])> {
    let mut groups: Vec<(K, &[Styled])> = Vec::new();
    let mut start = 0;
    for i in 1..=units.len() {
        if i == units.len() || key(&units[i]) != key(&units[start]) {
            groups.push((key(&units[start]), &units[start..i]));
            start = i;
        }
    }
    groups
}

fn wrap_if(dom: &mut Dom, parent: NodeId, wrap: bool, tag: &str) -> NodeId {
    if !wrap {
        return parent;
    }
    let el = dom.create_element(tag);
    dom.append_child(parent, el);
    el
}

fn emit_units(dom: &mut Dom, parent: NodeId, units: &[Styled]) {
    let mut text = String::new();
    for s in units {
        match s.unit {
            Unit::Char(c) => text.push(c),
            Unit::Break => {
                flush_text(dom, parent, &mut text);
                let br = dom.create_element("br");
                dom.append_child(parent, br);
            }
        }
    }
    flush_text(dom, parent, &mut text);
}

fn flush_text(dom: &mut Dom, parent: NodeId, text: &mut String) {
    if !text.is_empty() {
        let node = dom.create_text(std::mem::take(text));
        dom.append_child(parent, node);
    }
}

/// Leaves of `block` (text nodes and `<br>`s) with their start offsets.
fn leaves(dom: &Dom, block: NodeId) -> Vec<Leaf> {
    let mut out = Vec::new();
    let mut offset = 0;
    for node in dom.descendants(block) {
        if let Some(text) = dom.text(node) {
            let len = text.chars().count();
            out.push(Leaf {
                node,
                start: offset,
                len,
                is_text: true,
            });
            offset += len;
        } else if dom.has_tag(node, "br") {
            out.push(Leaf {
                node,
                start: offset,
                len: 1,
                is_text: false,
            });
            offset += 1;
        }
    }
    // A lone sentinel has no length.
    if out.len() == 1 && !out[0].is_text {
        out[0].len = 0;
    }
    out
}

/// Inline offset of `pos` within `block`. Positions before the block map
/// to 0 and positions after it to the end.
pub fn offset_of(dom: &Dom, block: NodeId, pos: Position) -> usize {
    let leaves = leaves(dom, block);
    let total = leaves.last().map(|l| l.start + l.len).unwrap_or(0);
    if !dom.contains(block, pos.node) {
        return match dom.compare(pos, Position::new(block, 0)) {
            Some(std::cmp::Ordering::Greater) => total,
            _ => 0,
        };
    }
    if dom.is_text(pos.node) {
        let leaf = leaves.iter().find(|l| l.node == pos.node);
        return leaf
            .map(|l| l.start + pos.offset.min(l.len))
            .unwrap_or(0);
    }
    // Element position: count the units of leaves before the boundary.
    let boundary = Position::new(pos.node, pos.offset);
    leaves
        .iter()
        .filter(|l| {
            matches!(
                dom.compare(Position::new(l.node, 0), boundary),
                Some(std::cmp::Ordering::Less)
            ) && !dom.contains(l.node, pos.node)
        })
        .map(|l| l.len)
        .sum()
}

/// Position for inline `offset` in `block`, preferring text nodes.
pub fn position_at(dom: &Dom, block: NodeId, offset: usize) -> Position {
    let leaves = leaves(dom, block);
    for leaf in &leaves {
        if leaf.is_text && leaf.start <= offset && offset <= leaf.start + leaf.len {
            return Position::new(leaf.node, offset - leaf.start);
        }
        if !leaf.is_text && offset <= leaf.start {
            return before_node(dom, leaf.node, block);
        }
    }
    match leaves.last() {
        Some(last) if last.len > 0 => after_node(dom, last.node, block),
        _ => Position::new(block, 0),
    }
}

fn before_node(dom: &Dom, node: NodeId, block: NodeId) -> Position {
    match (dom.parent(node), dom.index_in_parent(node)) {
        (Some(parent), Some(index)) => Position::new(parent, index),
        _ => Position::new(block, 0),
    }
}

fn after_node(dom: &Dom, node: NodeId, block: NodeId) -> Position {
    match (dom.parent(node), dom.index_in_parent(node)) {
        (Some(parent), Some(index)) => Position::new(parent, index + 1),
        _ => Position::new(block, dom.children(block).len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_fragment;

    fn block(dom: &mut Dom, html: &str) -> NodeId {
        let p = dom.create_element("p");
        let root = dom.root();
        dom.append_child(root, p);
        for node in parse_fragment(dom, html).unwrap() {
            dom.append_child(p, node);
        }
        p
    }

    fn canonical(html: &str) -> String {
        let mut dom = Dom::new();
        let p = block(&mut dom, html);
        Inline::flatten(&dom, p).rebuild(&mut dom, p);
        dom.inner_html(p)
    }

    #[test]
    fn test_flatten_marks() {
        let mut dom = Dom::new();
        let p = block(
            &mut dom,
            r#"a<strong>b<em>c</em></strong><a href="http://x.y">d</a><br>"#,
        );
        let inline = Inline::flatten(&dom, p);
        assert_eq!(inline.len(), 5);
        assert_eq!(inline.text(), "abcd");
        let marks: Vec<_> = inline.units().iter().map(|s| s.marks.clone()).collect();
        assert!(marks[1].bold && !marks[1].italic);
        assert!(marks[2].bold && marks[2].italic);
        assert_eq!(marks[3].link.as_deref(), Some("http://x.y"));
        assert_eq!(inline.units()[4].unit, Unit::Break);
    }

    #[test]
    fn test_sentinel_reads_empty() {
        let mut dom = Dom::new();
        let p = block(&mut dom, "<br>");
        assert!(Inline::flatten(&dom, p).is_empty());
    }

    #[test]
    fn test_rebuild_canonical_nesting() {
        assert_eq!(canonical("<i><b>x</b></i>"), "<b><i>x</i></b>");
        assert_eq!(
            canonical(r#"<b><a href="http://a.b">x</a>y</b>"#),
            r#"<a href="http://a.b"><b>x</b></a><b>y</b>"#
        );
        assert_eq!(canonical("<b>a</b><b>b</b>c"), "<b>ab</b>c");
        assert_eq!(canonical("<span>a</span>b"), "ab");
        assert_eq!(canonical(""), "<br>");
    }

    #[test]
    fn test_toggle_bold_range() {
        let mut inline = Inline::plain("hello");
        assert_eq!(inline.all_bold(1..3), Some(false));
        inline.set_bold(1..3, true);
        assert_eq!(inline.all_bold(1..3), Some(true));
        assert_eq!(inline.all_bold(0..3), Some(false));
        assert_eq!(inline.all_bold(2..2), None);

        let mut dom = Dom::new();
        let p = block(&mut dom, "");
        inline.rebuild(&mut dom, p);
        assert_eq!(dom.inner_html(p), "h<b>el</b>lo");
    }

    #[test]
    fn test_unlink_whole_extent() {
        let mut inline = Inline::plain("abcdef");
        inline.set_link(1..5, Some("http://a.b"));
        inline.set_bold(2..3, true);
        inline.unlink(3..4);
        assert!(!inline.has_link_in(0..6));
        assert_eq!(inline.all_bold(2..3), Some(true));
    }

    #[test]
    fn test_marks_for_insert() {
        let mut inline = Inline::plain("abcd");
        inline.set_bold(0..2, true);
        inline.set_link(1..3, Some("http://a.b"));
        assert!(inline.marks_for_insert(2).bold);
        assert_eq!(inline.marks_for_insert(2).link.as_deref(), Some("http://a.b"));
        assert_eq!(inline.marks_for_insert(3).link, None);
        assert!(inline.marks_for_insert(0).bold);
        assert_eq!(inline.marks_for_insert(0).link, None);
        assert_eq!(Inline::new().marks_for_insert(0), Marks::default());
    }

    #[test]
    fn test_offset_mapping() {
        let mut dom = Dom::new();
        let p = block(&mut dom, "ab<b>cd</b><br>ef");
        let b = dom.child(p, 1).unwrap();
        let cd = dom.first_child(b).unwrap();
        let ef = dom.child(p, 3).unwrap();

        assert_eq!(offset_of(&dom, p, Position::new(cd, 1)), 3);
        assert_eq!(offset_of(&dom, p, Position::new(p, 2)), 4);
        assert_eq!(offset_of(&dom, p, Position::new(p, 4)), 7);
        assert_eq!(offset_of(&dom, p, Position::new(ef, 2)), 7);

        assert_eq!(position_at(&dom, p, 3), Position::new(cd, 1));
        let ab = dom.child(p, 0).unwrap();
        assert_eq!(position_at(&dom, p, 2), Position::new(ab, 2));
        assert_eq!(position_at(&dom, p, 5), Position::new(ef, 0));
        assert_eq!(position_at(&dom, p, 7), Position::new(ef, 2));
    }

    #[test]
    fn test_offset_mapping_sentinel() {
        let mut dom = Dom::new();
        let p = block(&mut dom, "<br>");
        assert_eq!(position_at(&dom, p, 0), Position::new(p, 0));
        assert_eq!(offset_of(&dom, p, Position::new(p, 1)), 0);
    }

    #[test]
    fn test_split_and_append() {
        let mut inline = Inline::plain("IntroBody");
        let tail = inline.split_off(5);
        assert_eq!(inline.text(), "Intro");
        assert_eq!(tail.text(), "Body");
        inline.append(tail);
        assert_eq!(inline.text(), "IntroBody");
    }
}
