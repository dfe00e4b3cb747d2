//! Browser event extraction.
//!
//! Converts `web_sys` events into the core's platform-agnostic key, input
//! type and target values.

use letterpress_editor_core::{InputType, Key, Modifiers};
use wasm_bindgen::JsCast;

/// Get input type from a beforeinput event.
pub fn input_type(event: &web_sys::InputEvent) -> InputType {
    InputType::parse(&event.input_type())
}

/// Get data from a beforeinput event, handling different sources.
pub fn input_data(event: &web_sys::InputEvent) -> Option<String> {
    // First try the data property.
    if let Some(data) = event.data().filter(|d| !d.is_empty()) {
        return Some(data);
    }

    // For paste/drop, try dataTransfer.
    event
        .data_transfer()
        .and_then(|dt| dt.get_data("text/plain").ok())
        .filter(|text| !text.is_empty())
}

pub fn key_and_modifiers(event: &web_sys::KeyboardEvent) -> (Key, Modifiers) {
    let modifiers = Modifiers {
        ctrl: event.ctrl_key(),
        alt: event.alt_key(),
        shift: event.shift_key(),
        meta: event.meta_key(),
    };
    (Key::parse(&event.key()), modifiers)
}

/// The node an event was dispatched to.
pub fn target_node(event: &web_sys::Event) -> Option<web_sys::Node> {
    event.target()?.dyn_into::<web_sys::Node>().ok()
}
