//! The block document held under the editor's inner host.

use smol_str::SmolStr;

use crate::block::{BlockKind, CONTAINER_CLASS, Embed, HOST_CLASS, HeadingLevel};
use crate::config::EditorConfig;
use crate::dom::{Dom, ElementOptions, NodeId, Position};
use crate::error::DomError;
use crate::inline::{self, Inline};
use crate::selection::Selection;
use crate::url::is_valid_link_target;

/// Elements that may sit inside a block. Found directly under a loaded host,
/// they are gathered into a Text Block.
const INLINE_TAGS: &[&str] = &[
    "a", "b", "strong", "i", "em", "u", "s", "span", "br", "code", "sub", "sup", "small", "mark",
];

/// A caret location as (block, inline offset). Survives block rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPoint {
    pub block: NodeId,
    pub offset: usize,
}

impl BlockPoint {
    pub fn new(block: NodeId, offset: usize) -> Self {
        Self { block, offset }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    dom: Dom,
    host: NodeId,
    config: EditorConfig,
}

impl Document {
    /// Build the inner host with the configured style and the First Text
    /// Block.
    pub fn new(config: EditorConfig) -> Self {
        let mut dom = Dom::new();
        let host = dom.build_element("div", &config.host_options());
        dom.set_attr(host, "contenteditable", "true");
        let root = dom.root();
        dom.append_child(root, host);
        let mut doc = Self { dom, host, config };
        let first = doc.create_text_block();
        doc.dom.append_child(host, first);
        doc
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // === Queries ===

    /// Element children of the host, in order.
    pub fn blocks(&self) -> Vec<NodeId> {
        self.dom
            .children(self.host)
            .iter()
            .copied()
            .filter(|&n| self.dom.is_element(n))
            .collect()
    }

    pub fn first_block(&self) -> Option<NodeId> {
        self.blocks().first().copied()
    }

    pub fn block_kind(&self, node: NodeId) -> Option<BlockKind> {
        let tag = self.dom.tag(node)?;
        if let Some(level) = HeadingLevel::from_tag(tag) {
            return Some(BlockKind::Heading(level));
        }
        if self.dom.has_class(node, CONTAINER_CLASS) {
            return Some(BlockKind::Container);
        }
        if tag == self.config.block_tag() || tag == "div" {
            return Some(BlockKind::Text);
        }
        None
    }

    /// Nearest enclosing block of `node`, stopping at the host. `None` when
    /// the node is outside every block.
    pub fn find_block(&self, node: NodeId) -> Option<NodeId> {
        if !self.dom.contains(self.host, node) {
            return None;
        }
        self.dom
            .ancestors(node)
            .take_while(|&n| n != self.host)
            .find(|&n| {
                self.dom.tag(n).is_some_and(|tag| {
                    matches!(tag, "h1" | "h2" | "div") || tag == self.config.block_tag()
                })
            })
    }

    /// The block holding `pos`.
    pub fn block_at(&self, pos: Position) -> Option<NodeId> {
        self.find_block(pos.node)
    }

    pub fn is_first_block(&self, node: NodeId) -> bool {
        self.first_block() == Some(node)
    }

    /// No text and no embed. A lone sentinel counts as empty.
    pub fn is_empty_block(&self, node: NodeId) -> bool {
        self.block_kind(node).is_some_and(BlockKind::is_editable)
            && Inline::flatten(&self.dom, node).is_empty()
    }

    pub fn previous_block(&self, block: NodeId) -> Option<NodeId> {
        let blocks = self.blocks();
        let index = blocks.iter().position(|&b| b == block)?;
        index.checked_sub(1).map(|i| blocks[i])
    }

    pub fn next_block(&self, block: NodeId) -> Option<NodeId> {
        let blocks = self.blocks();
        let index = blocks.iter().position(|&b| b == block)?;
        blocks.get(index + 1).copied()
    }

    pub fn inline(&self, block: NodeId) -> Inline {
        Inline::flatten(&self.dom, block)
    }

    pub fn block_len(&self, block: NodeId) -> usize {
        self.inline(block).len()
    }

    pub fn block_point(&self, pos: Position) -> Option<BlockPoint> {
        let block = self.block_at(pos)?;
        Some(BlockPoint::new(block, inline::offset_of(&self.dom, block, pos)))
    }

    pub fn position(&self, point: BlockPoint) -> Position {
        inline::position_at(&self.dom, point.block, point.offset)
    }

    /// Whether `pos` sits inside the host.
    pub fn contains(&self, pos: Position) -> bool {
        self.dom.contains(self.host, pos.node)
    }

    // === Construction ===

    /// A detached, empty Text Block with the configured tag, style and
    /// classes.
    pub fn create_text_block(&mut self) -> NodeId {
        let options = self.config.text_block_options();
        let block = self.dom.build_element(self.config.block_tag(), &options);
        self.seed_sentinel(block);
        block
    }

    /// A detached Container Block wrapping `embed`.
    pub fn create_container_block(&mut self, embed: &Embed) -> NodeId {
        let options = ElementOptions::new()
            .class(CONTAINER_CLASS)
            .attr("contenteditable", "false");
        let container = self.dom.build_element("div", &options);
        let child = match embed {
            Embed::Image { src, alt } => {
                let options = self
                    .config
                    .image_options()
                    .attr("src", src.as_str())
                    .attr("alt", alt.as_str());
                self.dom.build_element(embed.tag(), &options)
            }
            Embed::HorizontalRule => self.dom.create_element(embed.tag()),
        };
        self.dom.append_child(container, child);
        container
    }

    // === Mutation ===

    /// Give an empty block its line-break sentinel.
    pub fn seed_sentinel(&mut self, block: NodeId) {
        if Inline::flatten(&self.dom, block).is_empty() {
            self.dom.clear_children(block);
            let br = self.dom.create_element("br");
            self.dom.append_child(block, br);
        }
    }

    pub fn set_inline(&mut self, block: NodeId, inline: &Inline) {
        inline.rebuild(&mut self.dom, block);
    }

    /// Retag a Text or Heading block in place. Inline markup is stripped to
    /// text and the attributes are replaced by the configured ones.
    pub fn retag_block(&mut self, block: NodeId, kind: BlockKind) -> Result<(), DomError> {
        let (tag, options) = match kind {
            BlockKind::Text => (self.config.block_tag(), self.config.text_block_options()),
            BlockKind::Heading(level) => (level.tag(), self.config.heading_options(level)),
            BlockKind::Container => return Err(DomError::NotAnElement),
        };
        let mut content = self.inline(block);
        content.strip();
        self.dom.set_tag(block, tag)?;
        self.dom.clear_attrs(block);
        if let Some(class) = options.class_attribute() {
            self.dom.set_attr(block, "class", class);
        }
        if let Some(style) = options.style_attribute() {
            self.dom.set_attr(block, "style", style);
        }
        content.rebuild(&mut self.dom, block);
        Ok(())
    }

    /// Re-create the First Text Block when the host is empty, holds only a
    /// bare line break, or starts with something that is not a Text or
    /// Heading Block. Returns the new block.
    pub fn ensure_first_block(&mut self) -> Option<NodeId> {
        let children = self.dom.children(self.host).to_vec();
        let only_break = !children.is_empty()
            && children.iter().all(|&c| {
                self.dom.has_tag(c, "br")
                    || self.dom.text(c).is_some_and(|t| t.trim().is_empty())
            });
        if children.is_empty() || only_break {
            self.dom.clear_children(self.host);
            let block = self.create_text_block();
            self.dom.append_child(self.host, block);
            tracing::debug!(target: "letterpress::editor", "re-created first block in empty host");
            return Some(block);
        }
        let first_ok = self
            .first_block()
            .and_then(|b| self.block_kind(b))
            .is_some_and(BlockKind::is_editable);
        if first_ok {
            return None;
        }
        let block = self.create_text_block();
        self.dom.insert_child(self.host, 0, block);
        tracing::debug!(target: "letterpress::editor", "inserted first block before a non-text block");
        Some(block)
    }

    /// Merge adjacent text nodes around the selection, remapping it.
    pub fn normalize_selection(&mut self, selection: &mut Selection) -> Result<(), DomError> {
        let range = selection.range(&self.dom);
        let mut targets = Vec::new();
        for node in [range.start.node, range.end.node] {
            if let Some(block) = self.find_block(node) {
                targets.push(block);
            }
        }
        if let Some(common) = range.common_ancestor(&self.dom) {
            if self.dom.contains(self.host, common) && self.dom.is_element(common) {
                targets.push(common);
            }
        }
        targets.dedup();
        let Selection { anchor, focus } = selection;
        for target in targets {
            self.dom.normalize(target, &mut [&mut *anchor, &mut *focus])?;
        }
        Ok(())
    }

    // === Snapshot ===

    /// The host as HTML, with its class present and `contenteditable` set to
    /// `editable`.
    pub fn serialize(&self, editable: bool) -> String {
        let mut attrs: Vec<(SmolStr, String)> = self.dom.attrs(self.host).to_vec();
        let has_class = self.dom.has_class(self.host, HOST_CLASS);
        match attrs.iter_mut().find(|(k, _)| k == "class") {
            Some((_, v)) if !has_class => *v = format!("{HOST_CLASS} {v}").trim().to_string(),
            Some(_) => {}
            None => attrs.insert(0, (SmolStr::new_static("class"), HOST_CLASS.to_string())),
        }
        let flag = if editable { "true" } else { "false" };
        match attrs.iter_mut().find(|(k, _)| k == "contenteditable") {
            Some((_, v)) => *v = flag.to_string(),
            None => attrs.push((SmolStr::new_static("contenteditable"), flag.to_string())),
        }
        self.dom.outer_html_with_attrs(self.host, &attrs)
    }

    /// Replace the host with `root`, a parsed snapshot root living in `dom`.
    pub fn adopt(&mut self, mut dom: Dom, root: NodeId) {
        dom.set_attr(root, "contenteditable", "true");
        dom.add_class(root, HOST_CLASS);
        let body = dom.root();
        dom.append_child(body, root);
        self.dom = dom;
        self.host = root;
        self.wrap_loose_content();
        self.unwrap_invalid_links();
    }

    fn is_loose(&self, node: NodeId) -> bool {
        match self.dom.tag(node) {
            Some(tag) => INLINE_TAGS.contains(&tag),
            None => true,
        }
    }

    /// Gather runs of text and inline elements sitting directly in the host
    /// into Text Blocks. Blank text next to a block is dropped.
    fn wrap_loose_content(&mut self) {
        let children = self.dom.children(self.host).to_vec();
        let mut run: Option<NodeId> = None;
        for (index, &child) in children.iter().enumerate() {
            if !self.is_loose(child) {
                run = None;
                continue;
            }
            let blank = self.dom.text(child).is_some_and(|t| t.trim().is_empty());
            let block_follows = children
                .get(index + 1)
                .is_none_or(|&next| !self.is_loose(next));
            if blank && (run.is_none() || block_follows) {
                self.dom.remove(child);
                continue;
            }
            let block = match run {
                Some(block) => block,
                None => {
                    let block = self.create_text_block();
                    self.dom.clear_children(block);
                    if let Err(err) = self.dom.insert_before(child, block) {
                        tracing::debug!(target: "letterpress::editor", error = %err, "loose content vanished");
                        continue;
                    }
                    tracing::debug!(target: "letterpress::editor", "wrapped loose host content in a text block");
                    run = Some(block);
                    block
                }
            };
            self.dom.append_child(block, child);
        }
    }

    /// Links can only be made through URL validation; anything else that
    /// came in with a snapshot loses its link.
    fn unwrap_invalid_links(&mut self) {
        let links: Vec<NodeId> = self
            .dom
            .descendants(self.host)
            .into_iter()
            .filter(|&n| {
                self.dom.has_tag(n, "a")
                    && !self.dom.attr(n, "href").is_some_and(is_valid_link_target)
            })
            .collect();
        for link in links {
            if let Err(err) = self.dom.replace_with_children(link) {
                tracing::debug!(target: "letterpress::editor", error = %err, "link vanished");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockTag;

    #[test]
    fn test_new_document_has_first_block() {
        let doc = Document::new(EditorConfig::default());
        assert_eq!(
            doc.serialize(false),
            r#"<div class="letterpress-editor" contenteditable="false"><p class="letterpress-block"><br></p></div>"#
        );
        let first = doc.first_block().unwrap();
        assert_eq!(doc.block_kind(first), Some(BlockKind::Text));
        assert!(doc.is_empty_block(first));
    }

    #[test]
    fn test_configured_division_blocks() {
        let mut config = EditorConfig::default();
        config.default_block_tag = BlockTag::Division;
        config.container_style.insert("padding".into(), "8px".into());
        config.text_block_classes.push("copy".into());
        let doc = Document::new(config);
        insta::assert_snapshot!(doc.serialize(true), @r#"<div class="letterpress-editor" style="padding: 8px;" contenteditable="true"><div class="letterpress-block copy"><br></div></div>"#);
    }

    #[test]
    fn test_find_block() {
        let mut doc = Document::new(EditorConfig::default());
        let first = doc.first_block().unwrap();
        let mut content = Inline::plain("hi");
        content.set_bold(0..2, true);
        doc.set_inline(first, &content);
        let b = doc.dom().first_child(first).unwrap();
        let text = doc.dom().first_child(b).unwrap();
        assert_eq!(doc.find_block(text), Some(first));
        assert_eq!(doc.find_block(doc.host()), None);
        assert_eq!(doc.find_block(doc.dom().root()), None);
    }

    #[test]
    fn test_container_block() {
        let mut doc = Document::new(EditorConfig::default());
        let container = doc.create_container_block(&Embed::Image {
            src: "http://example.com/x.jpg".into(),
            alt: "a photo".into(),
        });
        let host = doc.host();
        doc.dom_mut().append_child(host, container);
        assert_eq!(doc.block_kind(container), Some(BlockKind::Container));
        assert!(!doc.is_empty_block(container));
        assert_eq!(
            doc.dom().outer_html(container),
            r#"<div class="letterpress-container" contenteditable="false"><img src="http://example.com/x.jpg" alt="a photo"></div>"#
        );
    }

    #[test]
    fn test_retag_strips_inline() {
        let mut config = EditorConfig::default();
        config.heading_level2_classes.push("subtitle".into());
        let mut doc = Document::new(config);
        let first = doc.first_block().unwrap();
        let mut content = Inline::plain("Title");
        content.set_italic(0..3, true);
        doc.set_inline(first, &content);

        doc.retag_block(first, BlockKind::Heading(HeadingLevel::Two))
            .unwrap();
        assert_eq!(
            doc.dom().outer_html(first),
            r#"<h2 class="subtitle">Title</h2>"#
        );
        doc.retag_block(first, BlockKind::Text).unwrap();
        assert_eq!(
            doc.dom().outer_html(first),
            r#"<p class="letterpress-block">Title</p>"#
        );
    }

    #[test]
    fn test_ensure_first_block() {
        let mut doc = Document::new(EditorConfig::default());
        assert_eq!(doc.ensure_first_block(), None);

        let host = doc.host();
        doc.dom_mut().clear_children(host);
        let br = doc.dom_mut().create_element("br");
        doc.dom_mut().append_child(host, br);
        let created = doc.ensure_first_block().unwrap();
        assert_eq!(doc.blocks(), vec![created]);

        let rule = doc.create_container_block(&Embed::HorizontalRule);
        doc.dom_mut().insert_child(host, 0, rule);
        let created = doc.ensure_first_block().unwrap();
        assert_eq!(doc.blocks()[0], created);
        assert_eq!(doc.blocks().len(), 3);
    }

    #[test]
    fn test_neighbours() {
        let mut doc = Document::new(EditorConfig::default());
        let first = doc.first_block().unwrap();
        let second = doc.create_text_block();
        doc.dom_mut().insert_after(first, second).unwrap();
        assert_eq!(doc.next_block(first), Some(second));
        assert_eq!(doc.previous_block(second), Some(first));
        assert_eq!(doc.previous_block(first), None);
        assert!(doc.is_first_block(first));
    }
}
