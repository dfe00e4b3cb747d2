//! Real-DOM element construction from core `ElementOptions`.

use letterpress_editor_core::dom::{BUTTON_CLASSES, ElementOptions};
use wasm_bindgen::{JsCast, JsValue};

/// Build a detached element with `options` applied in the same order as the
/// mirror does: classes, style, attributes, text content, inner HTML.
pub fn build_element(
    document: &web_sys::Document,
    tag: &str,
    options: &ElementOptions,
) -> Result<web_sys::Element, JsValue> {
    let el = document.create_element(tag)?;
    if let Some(class) = options.class_attribute() {
        el.set_attribute("class", &class)?;
    }
    if let Some(style) = options.style_attribute() {
        el.set_attribute("style", &style)?;
    }
    for (name, value) in &options.attributes {
        el.set_attribute(name, value)?;
    }
    if let Some(text) = &options.text_content {
        el.set_text_content(Some(text));
    }
    if let Some(html) = &options.inner_html {
        el.set_inner_html(html);
    }
    Ok(el)
}

/// A `<button>` carrying the standard class pair after the caller's classes.
pub fn build_button(
    document: &web_sys::Document,
    options: &ElementOptions,
) -> Result<web_sys::HtmlElement, JsValue> {
    let options = options.clone().classes(BUTTON_CLASSES);
    build_element(document, "button", &options)?
        .dyn_into::<web_sys::HtmlElement>()
        .map_err(JsValue::from)
}

/// Show or hide an element through its inline `display`.
pub fn set_display(el: &web_sys::HtmlElement, visible: bool) {
    let style = el.style();
    let result = if visible {
        style.remove_property("display").map(|_| ())
    } else {
        style.set_property("display", "none")
    };
    if let Err(err) = result {
        tracing::debug!(target: "letterpress::browser", ?err, "display toggle failed");
    }
}
