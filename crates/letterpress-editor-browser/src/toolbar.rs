//! Toolbar rendering.
//!
//! Each toolbar is a fixed-position element on the body holding its buttons
//! and its input field. All state lives in the core; a view only reflects
//! it.

use letterpress_editor_core::dom::{BUTTON_CLASSES, ElementOptions};
use letterpress_editor_core::{ButtonId, Point, Size, Toolbar, ToolbarKind};
use wasm_bindgen::{JsCast, JsValue};

use crate::element::{build_button, build_element, set_display};

pub struct ToolbarView {
    kind: ToolbarKind,
    root: web_sys::HtmlElement,
    buttons: Vec<(ButtonId, web_sys::HtmlElement)>,
    input: web_sys::HtmlInputElement,
}

impl ToolbarView {
    pub fn build(document: &web_sys::Document, toolbar: &dyn Toolbar) -> Result<Self, JsValue> {
        let kind = toolbar.kind();
        let options = ElementOptions::new()
            .class("letterpress-toolbar")
            .class(format!("letterpress-toolbar-{}", kind.name()))
            .style("position", "fixed")
            .style("z-index", "1000")
            .style("display", "none");
        let root = build_element(document, "div", &options)?
            .dyn_into::<web_sys::HtmlElement>()
            .map_err(JsValue::from)?;

        let mut buttons = Vec::new();
        for button in toolbar.buttons() {
            let options = ElementOptions::new()
                .text(button.label())
                .attr("type", "button")
                .attr("title", button.title())
                .attr("data-button", button.id().name());
            let el = build_button(document, &options)?;
            root.append_child(&el)?;
            buttons.push((button.id(), el));
        }

        let options = ElementOptions::new()
            .class("letterpress-toolbar-input")
            .attr("type", "text")
            .style("display", "none");
        let input = build_element(document, "input", &options)?
            .dyn_into::<web_sys::HtmlInputElement>()
            .map_err(JsValue::from)?;
        root.append_child(&input)?;

        gloo_utils::body().append_child(&root)?;
        Ok(Self {
            kind,
            root,
            buttons,
            input,
        })
    }

    pub fn kind(&self) -> ToolbarKind {
        self.kind
    }

    pub fn root(&self) -> &web_sys::HtmlElement {
        &self.root
    }

    pub fn input(&self) -> &web_sys::HtmlInputElement {
        &self.input
    }

    pub fn contains(&self, node: &web_sys::Node) -> bool {
        self.root.contains(Some(node))
    }

    pub fn input_contains(&self, node: &web_sys::Node) -> bool {
        self.input.contains(Some(node))
    }

    /// The button an event target belongs to.
    pub fn button_at(&self, target: &web_sys::Node) -> Option<ButtonId> {
        self.buttons
            .iter()
            .find(|(_, el)| el.contains(Some(target)))
            .map(|(id, _)| *id)
    }

    /// Reflect visibility, button states and the input.
    pub fn render(&self, toolbar: &dyn Toolbar) {
        let frame = toolbar.frame();
        set_display(&self.root, frame.visible);
        for (id, el) in &self.buttons {
            let Some(button) = toolbar.button(*id) else {
                continue;
            };
            set_display(el, !frame.buttons_hidden);
            el.set_class_name(&format!(
                "{} {}",
                BUTTON_CLASSES.join(" "),
                button.state().class_name()
            ));
            let result = if button.is_disabled() {
                el.set_attribute("disabled", "")
            } else {
                el.remove_attribute("disabled")
            };
            if let Err(err) = result {
                tracing::debug!(target: "letterpress::browser", ?err, "button state update failed");
            }
        }

        let input = toolbar.input();
        let input_el: &web_sys::HtmlElement = self.input.as_ref();
        set_display(input_el, input.is_visible());
        self.input.set_placeholder(input.placeholder());
        if self.input.value() != input.value() {
            self.input.set_value(input.value());
        }
        self.set_position(frame.position);
    }

    pub fn set_position(&self, position: Point) {
        let style = self.root.style();
        let result = style
            .set_property("left", &format!("{}px", position.x))
            .and_then(|()| style.set_property("top", &format!("{}px", position.y)));
        if let Err(err) = result {
            tracing::debug!(target: "letterpress::browser", ?err, "toolbar placement failed");
        }
    }

    pub fn measure(&self) -> Size {
        let rect = self.root.get_bounding_client_rect();
        Size::new(rect.width(), rect.height())
    }

    pub fn remove(&self) {
        self.root.remove();
    }
}
