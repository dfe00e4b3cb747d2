//! The mirror tree.
//!
//! An arena of element and text nodes that the editor mutates directly. The
//! browser layer keeps the contenteditable host an exact projection of it.
//!
//! Conventions follow the platform Range model: a [`Position`] in a text
//! node counts chars, a position in an element counts children. Removing a
//! node detaches it but keeps its data, so stale handles stay valid and
//! [`Dom::is_connected`] reports whether the node is still in the document.
//! Detached nodes are freed by [`Dom::collect_garbage`], after which their
//! slots are handed out again.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use markdown_weaver_escape::escape_html;
use smol_str::SmolStr;

use crate::error::DomError;

/// Classes appended to every button built by [`Dom::build_button`].
pub const BUTTON_CLASSES: [&str; 2] = ["standard", "dark"];

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr"];

/// Handle to a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: SmolStr,
    pub attrs: Vec<(SmolStr, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A boundary point in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Options for [`Dom::build_element`].
///
/// Applied in order: classes, style, attributes, text content, inner HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementOptions {
    pub style: BTreeMap<String, String>,
    pub classes: Vec<String>,
    pub text_content: Option<String>,
    pub inner_html: Option<String>,
    pub attributes: Vec<(String, String)>,
}

impl ElementOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(property.into(), value.into());
        self
    }

    pub fn styles(mut self, styles: &BTreeMap<String, String>) -> Self {
        self.style
            .extend(styles.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes.extend(classes.into_iter().map(Into::into));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn inner_html(mut self, html: impl Into<String>) -> Self {
        self.inner_html = Some(html.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// The `style` attribute value, or `None` for an empty style map.
    pub fn style_attribute(&self) -> Option<String> {
        if self.style.is_empty() {
            None
        } else {
            Some(format_style(&self.style))
        }
    }

    /// The `class` attribute value, with duplicates dropped.
    pub fn class_attribute(&self) -> Option<String> {
        let mut seen: Vec<&str> = Vec::new();
        for class in self.classes.iter().flat_map(|c| c.split_whitespace()) {
            if !seen.contains(&class) {
                seen.push(class);
            }
        }
        if seen.is_empty() {
            None
        } else {
            Some(seen.join(" "))
        }
    }
}

/// Render a style map as an inline `style` attribute value.
pub fn format_style(style: &BTreeMap<String, String>) -> String {
    style
        .iter()
        .map(|(k, v)| format!("{k}: {v};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Allocations between two garbage collections.
pub const COLLECT_AFTER: usize = 256;

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    allocated_since_collect: usize,
    root: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// An empty document with a `body` root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            allocated_since_collect: 0,
            root: NodeId(0),
        };
        dom.root = dom.create_element("body");
        dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
        };
        self.allocated_since_collect += 1;
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = node;
                id
            }
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(node);
                id
            }
        }
    }

    /// Slots in the arena, free ones included.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes that have not been freed, connected or not.
    pub fn allocated(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn should_collect(&self) -> bool {
        self.allocated_since_collect >= COLLECT_AFTER
    }

    /// Free every node that is neither connected nor in the same detached
    /// tree as one of `keep`. Returns the number of nodes freed.
    ///
    /// Handles to freed nodes must not be used afterwards: their slots are
    /// reused by later allocations.
    pub fn collect_garbage(&mut self, keep: &[NodeId]) -> usize {
        let mut marked = vec![false; self.nodes.len()];
        for &id in &self.free {
            marked[id.index()] = true;
        }
        let tops = std::iter::once(self.root)
            .chain(keep.iter().filter_map(|&id| self.ancestors(id).last()));
        let mut stack: Vec<NodeId> = tops.collect();
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut marked[id.index()], true) {
                continue;
            }
            stack.extend(self.children(id).iter().copied());
        }
        let mut freed = 0;
        for (index, marked) in marked.into_iter().enumerate() {
            if marked {
                continue;
            }
            self.nodes[index] = Node {
                data: NodeData::Text(String::new()),
                parent: None,
                children: Vec::new(),
            };
            self.free.push(NodeId(index as u32));
            freed += 1;
        }
        self.allocated_since_collect = 0;
        freed
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: SmolStr::new(tag.to_ascii_lowercase()),
            attrs: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    // === Node data ===

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Text(_))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element(el) => Some(el.tag.as_str()),
            NodeData::Text(_) => None,
        }
    }

    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn set_tag(&mut self, id: NodeId, tag: &str) -> Result<(), DomError> {
        match &mut self.node_mut(id).data {
            NodeData::Element(el) => {
                el.tag = SmolStr::new(tag.to_ascii_lowercase());
                Ok(())
            }
            NodeData::Text(_) => Err(DomError::NotAnElement),
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(t) => Some(t.as_str()),
            NodeData::Element(_) => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let NodeData::Text(t) = &mut self.node_mut(id).data {
            *t = text.into();
        }
    }

    /// Platform "length": chars for text nodes, children for elements.
    pub fn node_len(&self, id: NodeId) -> usize {
        match &self.node(id).data {
            NodeData::Text(t) => t.chars().count(),
            NodeData::Element(_) => self.node(id).children.len(),
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(t) => out.push_str(t),
            NodeData::Element(_) => {
                for &child in &self.node(id).children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    // === Attributes ===

    pub fn attrs(&self, id: NodeId) -> &[(SmolStr, String)] {
        match &self.node(id).data {
            NodeData::Element(el) => &el.attrs,
            NodeData::Text(_) => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let NodeData::Element(el) = &mut self.node_mut(id).data {
            match el.attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value,
                None => el.attrs.push((SmolStr::new(name.to_ascii_lowercase()), value)),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element(el) = &mut self.node_mut(id).data {
            el.attrs.retain(|(k, _)| k != name);
        }
    }

    pub fn clear_attrs(&mut self, id: NodeId) {
        if let NodeData::Element(el) = &mut self.node_mut(id).data {
            el.attrs.clear();
        }
    }

    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attr(id, "class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let value = match self.attr(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", value);
    }

    // === Tree structure ===

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.node(id).children.get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.child(parent, index + 1)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&n| self.parent(n))
    }

    /// Walk from `node` up to the root looking for `tag`; return the match,
    /// or the root when there is none.
    pub fn ancestor_by_tag(&self, node: NodeId, tag: &str) -> NodeId {
        self.ancestors(node)
            .find(|&n| self.has_tag(n, tag))
            .unwrap_or(self.root)
    }

    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        self.ancestors(a).find(|&n| self.contains(n, b))
    }

    /// Pre-order list of the nodes under `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Child indices leading from `ancestor` down to `node`.
    pub fn path_from(&self, ancestor: NodeId, node: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = node;
        while current != ancestor {
            path.push(self.index_in_parent(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    pub fn node_at_path(&self, ancestor: NodeId, path: &[usize]) -> Option<NodeId> {
        path.iter()
            .try_fold(ancestor, |node, &index| self.child(node, index))
    }

    /// Document order of two boundary points. `None` when they live in
    /// different trees.
    pub fn compare(&self, a: Position, b: Position) -> Option<Ordering> {
        if a.node == b.node {
            return Some(a.offset.cmp(&b.offset));
        }
        let top = self.common_ancestor(a.node, b.node)?;
        let pa = self.path_from(top, a.node)?;
        let pb = self.path_from(top, b.node)?;
        match (pa.first(), pb.first()) {
            (Some(ia), Some(ib)) => Some(ia.cmp(ib)),
            // `a.node` is an ancestor of `b.node`.
            (None, Some(&ib)) => Some(if a.offset <= ib {
                Ordering::Less
            } else {
                Ordering::Greater
            }),
            (Some(&ia), None) => Some(if b.offset <= ia {
                Ordering::Greater
            } else {
                Ordering::Less
            }),
            (None, None) => Some(a.offset.cmp(&b.offset)),
        }
    }

    // === Mutation ===

    /// Detach `id` from its parent. Its own subtree is left intact.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.remove(child);
        let children = &mut self.node_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        let parent = self.parent(reference).ok_or(DomError::Detached)?;
        let index = self.index_in_parent(reference).ok_or(DomError::Detached)?;
        self.insert_child(parent, index, node);
        Ok(())
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        let parent = self.parent(reference).ok_or(DomError::Detached)?;
        let index = self.index_in_parent(reference).ok_or(DomError::Detached)?;
        self.insert_child(parent, index + 1, node);
        Ok(())
    }

    /// Detach and return every child of `id`.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for &child in &children {
            self.node_mut(child).parent = None;
        }
        children
    }

    pub fn clear_children(&mut self, id: NodeId) {
        self.take_children(id);
    }

    /// Replace `id` by its children.
    pub fn replace_with_children(&mut self, id: NodeId) -> Result<(), DomError> {
        let parent = self.parent(id).ok_or(DomError::Detached)?;
        let index = self.index_in_parent(id).ok_or(DomError::Detached)?;
        let children = self.take_children(id);
        for (i, child) in children.into_iter().enumerate() {
            self.insert_child(parent, index + i, child);
        }
        self.remove(id);
        Ok(())
    }

    /// Merge adjacent text nodes and drop empty ones under `id`, remapping the
    /// tracked positions so they keep pointing at the same content.
    pub fn normalize(&mut self, id: NodeId, tracked: &mut [&mut Position]) -> Result<(), DomError> {
        if !self.is_connected(id) || tracked.iter().any(|p| !self.is_connected(p.node)) {
            return Err(DomError::Detached);
        }
        let mut elements = vec![id];
        elements.extend(self.descendants(id).into_iter().filter(|&n| self.is_element(n)));
        for element in elements {
            self.normalize_children(element, tracked);
        }
        Ok(())
    }

    fn normalize_children(&mut self, parent: NodeId, tracked: &mut [&mut Position]) {
        let mut index = 0;
        while index < self.children(parent).len() {
            let child = self.children(parent)[index];
            let Some(text) = self.text(child) else {
                index += 1;
                continue;
            };
            if text.is_empty() {
                self.remove(child);
                for pos in tracked.iter_mut() {
                    if pos.node == child {
                        **pos = Position::new(parent, index);
                    } else if pos.node == parent && pos.offset > index {
                        pos.offset -= 1;
                    }
                }
                continue;
            }
            let Some(prev) = index.checked_sub(1).map(|i| self.children(parent)[i]) else {
                index += 1;
                continue;
            };
            let Some(prev_text) = self.text(prev) else {
                index += 1;
                continue;
            };
            let prev_len = prev_text.chars().count();
            let merged = format!("{prev_text}{text}");
            self.set_text(prev, merged);
            self.remove(child);
            for pos in tracked.iter_mut() {
                if pos.node == child {
                    **pos = Position::new(prev, prev_len + pos.offset);
                } else if pos.node == parent && pos.offset == index {
                    **pos = Position::new(prev, prev_len);
                } else if pos.node == parent && pos.offset > index {
                    pos.offset -= 1;
                }
            }
        }
    }

    // === Construction ===

    /// Build a detached element with `options` applied.
    pub fn build_element(&mut self, tag: &str, options: &ElementOptions) -> NodeId {
        let el = self.create_element(tag);
        if let Some(class) = options.class_attribute() {
            self.set_attr(el, "class", class);
        }
        if let Some(style) = options.style_attribute() {
            self.set_attr(el, "style", style);
        }
        for (name, value) in &options.attributes {
            self.set_attr(el, name, value.as_str());
        }
        if let Some(text) = &options.text_content {
            let node = self.create_text(text.as_str());
            self.append_child(el, node);
        }
        if let Some(html) = &options.inner_html {
            self.clear_children(el);
            match crate::html::parse_fragment(self, html) {
                Ok(nodes) => {
                    for node in nodes {
                        self.append_child(el, node);
                    }
                }
                Err(err) => {
                    tracing::debug!(target: "letterpress::dom", error = %err, "innerHTML did not parse, inserting as text");
                    let node = self.create_text(html.as_str());
                    self.append_child(el, node);
                }
            }
        }
        el
    }

    /// A `<button>` with the standard class pair after the caller's classes.
    pub fn build_button(&mut self, options: &ElementOptions) -> NodeId {
        let options = options.clone().classes(BUTTON_CLASSES);
        self.build_element("button", &options)
    }

    // === Serialization ===

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize an element with `attrs` standing in for its own attributes.
    pub fn outer_html_with_attrs(&self, id: NodeId, attrs: &[(SmolStr, String)]) -> String {
        let mut out = String::new();
        match self.tag(id) {
            Some(tag) => self.write_element(id, tag, attrs, &mut out),
            None => self.write_node(id, &mut out),
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(text) => {
                let _ = escape_html(&mut *out, text);
            }
            NodeData::Element(el) => self.write_element(id, &el.tag, &el.attrs, out),
        }
    }

    fn write_element(&self, id: NodeId, tag: &str, attrs: &[(SmolStr, String)], out: &mut String) {
        out.push('<');
        out.push_str(tag);
        for (name, value) in attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            let _ = escape_html(&mut *out, value);
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&tag) {
            return;
        }
        for &child in self.children(id) {
            self.write_node(child, out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(dom: &mut Dom, parts: &[&str]) -> NodeId {
        let p = dom.create_element("p");
        for part in parts {
            let t = dom.create_text(*part);
            dom.append_child(p, t);
        }
        let root = dom.root();
        dom.append_child(root, p);
        p
    }

    #[test]
    fn test_build_element_applies_options() {
        let mut dom = Dom::new();
        let options = ElementOptions::new()
            .class("one")
            .class("two one")
            .style("color", "red")
            .attr("data-kind", "x")
            .text("hi");
        let el = dom.build_element("span", &options);
        assert_eq!(
            dom.outer_html(el),
            r#"<span class="one two" style="color: red;" data-kind="x">hi</span>"#
        );
    }

    #[test]
    fn test_build_element_inner_html() {
        let mut dom = Dom::new();
        let el = dom.build_element("div", &ElementOptions::new().inner_html("<b>x</b><br>y"));
        assert_eq!(dom.inner_html(el), "<b>x</b><br>y");

        let broken = dom.build_element("div", &ElementOptions::new().inner_html("<b>x"));
        assert_eq!(dom.text_content(broken), "<b>x");
    }

    #[test]
    fn test_build_button_appends_standard_classes() {
        let mut dom = Dom::new();
        let b = dom.build_button(&ElementOptions::new().class("bold").text("B"));
        assert_eq!(
            dom.outer_html(b),
            r#"<button class="bold standard dark">B</button>"#
        );
    }

    #[test]
    fn test_remove_keeps_detached_data() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["abc"]);
        assert!(dom.is_connected(p));
        dom.remove(p);
        assert!(!dom.is_connected(p));
        assert_eq!(dom.text_content(p), "abc");
    }

    #[test]
    fn test_ancestor_by_tag_falls_back_to_root() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["abc"]);
        let text = dom.first_child(p).unwrap();
        assert_eq!(dom.ancestor_by_tag(text, "p"), p);
        assert_eq!(dom.ancestor_by_tag(text, "a"), dom.root());
    }

    #[test]
    fn test_normalize_merges_and_remaps() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["ab", "", "cd", "ef"]);
        let kids = dom.children(p).to_vec();
        let mut in_third = Position::new(kids[2], 1);
        let mut in_fourth = Position::new(kids[3], 2);
        let mut at_end = Position::new(p, 4);
        dom.normalize(p, &mut [&mut in_third, &mut in_fourth, &mut at_end])
            .unwrap();

        assert_eq!(dom.children(p), &[kids[0]]);
        assert_eq!(dom.text(kids[0]), Some("abcdef"));
        assert_eq!(in_third, Position::new(kids[0], 3));
        assert_eq!(in_fourth, Position::new(kids[0], 6));
        assert_eq!(at_end, Position::new(p, 1));
    }

    #[test]
    fn test_normalize_rejects_detached_position() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["ab"]);
        let stray = dom.create_text("x");
        let mut pos = Position::new(stray, 0);
        assert_eq!(dom.normalize(p, &mut [&mut pos]), Err(DomError::Detached));
    }

    #[test]
    fn test_compare_positions() {
        let mut dom = Dom::new();
        let p1 = paragraph(&mut dom, &["ab"]);
        let p2 = paragraph(&mut dom, &["cd"]);
        let t1 = dom.first_child(p1).unwrap();
        let t2 = dom.first_child(p2).unwrap();
        let root = dom.root();

        assert_eq!(
            dom.compare(Position::new(t1, 2), Position::new(t2, 0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            dom.compare(Position::new(root, 1), Position::new(t2, 0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            dom.compare(Position::new(root, 1), Position::new(t1, 1)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_paths_round_trip() {
        let mut dom = Dom::new();
        paragraph(&mut dom, &["ab"]);
        let p2 = paragraph(&mut dom, &["cd"]);
        let t2 = dom.first_child(p2).unwrap();
        let path = dom.path_from(dom.root(), t2).unwrap();
        assert_eq!(path, vec![1, 0]);
        assert_eq!(dom.node_at_path(dom.root(), &path), Some(t2));
    }

    #[test]
    fn test_serialization_escapes_and_voids() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["a < b & c"]);
        let br = dom.create_element("br");
        dom.append_child(p, br);
        dom.set_attr(p, "title", "\"quoted\"");
        assert_eq!(
            dom.outer_html(p),
            "<p title=\"&quot;quoted&quot;\">a &lt; b &amp; c<br></p>"
        );
    }

    #[test]
    fn test_class_helpers() {
        let mut dom = Dom::new();
        let el = dom.create_element("div");
        dom.add_class(el, "a");
        dom.add_class(el, "b");
        dom.add_class(el, "a");
        assert_eq!(dom.attr(el, "class"), Some("a b"));
        assert!(dom.has_class(el, "b"));
    }

    #[test]
    fn test_replace_with_children_keeps_order() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["a"]);
        let a = dom.create_element("a");
        let inner = dom.create_text("b");
        dom.append_child(a, inner);
        dom.append_child(p, a);
        let tail = dom.create_text("c");
        dom.append_child(p, tail);

        dom.replace_with_children(a).unwrap();
        assert_eq!(dom.outer_html(p), "<p>abc</p>");
        assert!(!dom.is_connected(a));
        assert_eq!(dom.replace_with_children(a), Err(DomError::Detached));
    }

    #[test]
    fn test_collect_frees_detached_nodes() {
        let mut dom = Dom::new();
        let keep = paragraph(&mut dom, &["kept"]);
        let gone = paragraph(&mut dom, &["gone"]);
        let stray = paragraph(&mut dom, &["stray"]);
        let stray_text = dom.first_child(stray).unwrap();
        dom.remove(gone);
        dom.remove(stray);

        let before = dom.allocated();
        // Holding the text keeps its whole detached tree.
        assert_eq!(dom.collect_garbage(&[stray_text]), 2);
        assert_eq!(dom.allocated(), before - 2);
        assert_eq!(dom.text_content(keep), "kept");
        assert_eq!(dom.parent(stray_text), Some(stray));
        assert!(!dom.should_collect());

        let capacity = dom.capacity();
        let reused = dom.create_element("span");
        assert!(reused.index() < capacity);
        assert_eq!(dom.capacity(), capacity);
    }

    #[test]
    fn test_arena_stays_bounded_under_churn() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &[]);
        for i in 0..5000 {
            dom.clear_children(p);
            let text = dom.create_text(i.to_string());
            dom.append_child(p, text);
            if dom.should_collect() {
                dom.collect_garbage(&[]);
            }
        }
        assert_eq!(dom.text_content(p), "4999");
        assert!(dom.capacity() <= COLLECT_AFTER + 3);
    }
}
