//! Projects the mirror onto the real host element.
//!
//! Blocks are diffed by the hash of their HTML. An unchanged block keeps its
//! element, and with it the platform selection inside it. A changed or new
//! block is re-created from its HTML.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use letterpress_editor_core::{Dom, NodeId};
use wasm_bindgen::{JsCast, JsValue};

pub fn hash_html(html: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    html.hash(&mut hasher);
    hasher.finish()
}

struct RenderedBlock {
    hash: u64,
    element: web_sys::Element,
}

pub struct DomSync {
    host_el: web_sys::HtmlElement,
    rendered: HashMap<NodeId, RenderedBlock>,
}

impl DomSync {
    /// Create the platform host for the mirror's host. Blocks are filled in
    /// by the first `render`.
    pub fn new(document: &web_sys::Document, dom: &Dom, host: NodeId) -> Result<Self, JsValue> {
        let tag = dom.tag(host).unwrap_or("div");
        let host_el = document
            .create_element(tag)?
            .dyn_into::<web_sys::HtmlElement>()
            .map_err(JsValue::from)?;
        Ok(Self {
            host_el,
            rendered: HashMap::new(),
        })
    }

    pub fn host_element(&self) -> &web_sys::HtmlElement {
        &self.host_el
    }

    pub fn element_for(&self, block: NodeId) -> Option<&web_sys::Element> {
        self.rendered.get(&block).map(|r| &r.element)
    }

    /// Force `block` to be re-created on the next render, for when the
    /// platform edited it directly.
    pub fn invalidate(&mut self, block: NodeId) {
        self.rendered.remove(&block);
    }

    /// Forget every rendered block, as after a snapshot load.
    pub fn reset(&mut self) {
        self.rendered.clear();
    }

    /// Bring the platform host in line with the mirror. Returns the number
    /// of blocks that were re-created.
    pub fn render(&mut self, dom: &Dom, host: NodeId) -> Result<usize, JsValue> {
        self.sync_host_attributes(dom, host)?;

        let document = gloo_utils::document();
        let host_node: &web_sys::Node = self.host_el.as_ref();
        let mut old = std::mem::take(&mut self.rendered);
        let mut cursor = host_node.first_child();
        let mut desired: Vec<web_sys::Node> = Vec::new();
        let mut created = 0;

        for &block in dom.children(host) {
            if !dom.is_element(block) {
                tracing::debug!(target: "letterpress::browser", "skipped host child that is not a block");
                continue;
            }
            let html = dom.outer_html(block);
            let hash = hash_html(&html);
            let element = match old.remove(&block) {
                Some(existing) if existing.hash == hash => existing.element,
                _ => match element_from_html(&document, &html) {
                    Ok(element) => {
                        created += 1;
                        element
                    }
                    Err(err) => {
                        tracing::warn!(target: "letterpress::browser", ?err, "block did not render");
                        continue;
                    }
                },
            };
            let node: &web_sys::Node = element.as_ref();
            if cursor.as_ref() == Some(node) {
                cursor = node.next_sibling();
            } else {
                host_node.insert_before(node, cursor.as_ref())?;
            }
            desired.push(node.clone());
            self.rendered.insert(block, RenderedBlock { hash, element });
        }

        // Anything not projected from the mirror goes.
        let children = host_node.child_nodes();
        let stray: Vec<web_sys::Node> = (0..children.length())
            .filter_map(|i| children.get(i))
            .filter(|child| !desired.contains(child))
            .collect();
        for node in stray {
            host_node.remove_child(&node)?;
        }

        if created > 0 {
            tracing::trace!(target: "letterpress::browser", created, "re-rendered blocks");
        }
        Ok(created)
    }

    fn sync_host_attributes(&self, dom: &Dom, host: NodeId) -> Result<(), JsValue> {
        let attrs = dom.attrs(host);
        let names: js_sys::Array = self.host_el.get_attribute_names();
        for name in names.iter().filter_map(|n| n.as_string()) {
            if !attrs.iter().any(|(k, _)| *k == name) {
                self.host_el.remove_attribute(&name)?;
            }
        }
        for (name, value) in attrs {
            if self.host_el.get_attribute(name).as_deref() != Some(value.as_str()) {
                self.host_el.set_attribute(name, value)?;
            }
        }
        Ok(())
    }
}

fn element_from_html(document: &web_sys::Document, html: &str) -> Result<web_sys::Element, JsValue> {
    let wrapper = document.create_element("div")?;
    wrapper.set_inner_html(html);
    wrapper
        .first_element_child()
        .ok_or_else(|| JsValue::from_str("block rendered no element"))
}
