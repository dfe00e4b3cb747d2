//! WASM browser tests for letterpress-editor-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use letterpress_editor_browser::cursor::{char_to_utf16, dom_node_at_path, dom_path, utf16_to_char};
use letterpress_editor_browser::dom::ElementOptions;
use letterpress_editor_browser::element::{build_button, build_element};
use letterpress_editor_browser::{Editor, EditorConfig, MountedEditor, SnapshotError};

fn container() -> web_sys::Element {
    let document = gloo_utils::document();
    let el = document.create_element("div").unwrap();
    gloo_utils::body().append_child(&el).unwrap();
    el
}

fn mount(config: EditorConfig) -> (web_sys::Element, MountedEditor) {
    let container = container();
    let mounted = MountedEditor::mount(&container, Editor::new(config), None).unwrap();
    (container, mounted)
}

// === Offset conversion ===

#[wasm_bindgen_test]
fn test_utf16_offsets_ascii() {
    assert_eq!(char_to_utf16("hello", 3), 3);
    assert_eq!(utf16_to_char("hello", 3), 3);
}

#[wasm_bindgen_test]
fn test_utf16_offsets_astral() {
    // The emoji is one char and two code units.
    let text = "a😀b";
    assert_eq!(char_to_utf16(text, 2), 3);
    assert_eq!(utf16_to_char(text, 3), 2);
    assert_eq!(utf16_to_char(text, 99), 3);
}

#[wasm_bindgen_test]
fn test_dom_path_round_trip() {
    let root = container();
    root.set_inner_html("<p>one</p><p>two <b>three</b></p>");
    let bold_text = root
        .query_selector("b")
        .unwrap()
        .unwrap()
        .first_child()
        .unwrap();
    let path = dom_path(&root, &bold_text).unwrap();
    assert_eq!(path, vec![1, 1, 0]);
    assert_eq!(dom_node_at_path(&root, &path), Some(bold_text));

    let outside = gloo_utils::document().create_element("span").unwrap();
    assert_eq!(dom_path(&root, &outside), None);
}

// === Element construction ===

#[wasm_bindgen_test]
fn test_build_element_applies_options() {
    let options = ElementOptions::new()
        .class("a")
        .class("b")
        .style("color", "red")
        .attr("data-x", "1")
        .text("hi");
    let el = build_element(&gloo_utils::document(), "span", &options).unwrap();
    assert_eq!(el.class_name(), "a b");
    assert_eq!(el.get_attribute("data-x").as_deref(), Some("1"));
    assert!(el.get_attribute("style").unwrap().contains("color"));
    assert_eq!(el.text_content().as_deref(), Some("hi"));
}

#[wasm_bindgen_test]
fn test_build_button_appends_standard_classes() {
    let options = ElementOptions::new().class("extra").text("B");
    let button = build_button(&gloo_utils::document(), &options).unwrap();
    assert_eq!(button.tag_name(), "BUTTON");
    assert_eq!(button.class_name(), "extra standard dark");
}

// === Mounting ===

#[wasm_bindgen_test]
fn test_mount_renders_mirror() {
    let (container, mounted) = mount(EditorConfig::default());
    let host = container.first_element_child().unwrap();
    insta::assert_snapshot!(
        host.outer_html(),
        @r#"<div class="letterpress-editor" contenteditable="true"><p class="letterpress-block"><br></p></div>"#
    );
    assert_eq!(host.outer_html(), mounted.serialize(true));
    mounted.unmount();
    assert!(container.first_element_child().is_none());
}

#[wasm_bindgen_test]
fn test_mount_builds_toolbars() {
    let (_container, mounted) = mount(EditorConfig::default());
    let document = gloo_utils::document();
    let toolbars = document.query_selector_all(".letterpress-toolbar").unwrap();
    assert_eq!(toolbars.length(), 2);
    let edit = document
        .query_selector(".letterpress-toolbar-edit")
        .unwrap()
        .unwrap()
        .dyn_into::<web_sys::HtmlElement>()
        .unwrap();
    assert_eq!(edit.style().get_property_value("display").unwrap(), "none");
    mounted.unmount();
    assert_eq!(document.query_selector_all(".letterpress-toolbar").unwrap().length(), 0);
}

#[wasm_bindgen_test]
fn test_placeholder_style_injected_and_removed() {
    let config = EditorConfig {
        empty_placeholder: "Write here".into(),
        ..EditorConfig::default()
    };
    let (_container, mounted) = mount(config);
    let style = gloo_utils::head().last_element_child().unwrap();
    assert_eq!(style.tag_name(), "STYLE");
    assert!(style.text_content().unwrap().contains("Write here"));
    mounted.unmount();
    assert!(!style.is_connected());
}

#[wasm_bindgen_test]
fn test_load_rerenders_host() {
    let (container, mounted) = mount(EditorConfig::default());
    let snapshot = r#"<div class="letterpress-editor" contenteditable="false"><p class="letterpress-block">Hello <b>world</b></p><p class="letterpress-block"><br></p></div>"#;
    mounted.load(snapshot).unwrap();
    let host = container.first_element_child().unwrap();
    assert_eq!(host.child_element_count(), 2);
    assert_eq!(host.first_element_child().unwrap().inner_html(), "Hello <b>world</b>");
    let mut expected = Editor::new(EditorConfig::default());
    expected.load(snapshot).unwrap();
    assert_eq!(mounted.serialize(true), expected.serialize(true));
    assert_eq!(host.outer_html(), expected.serialize(true));
    mounted.unmount();
}

#[wasm_bindgen_test]
fn test_load_with_loose_text_renders_every_block() {
    let (container, mounted) = mount(EditorConfig::default());
    mounted
        .load(r#"<div class="letterpress-editor">hi<p class="letterpress-block">x</p></div>"#)
        .unwrap();
    let host = container.first_element_child().unwrap();
    assert_eq!(host.child_nodes().length(), 2);
    assert_eq!(host.child_element_count(), 2);
    assert_eq!(host.first_element_child().unwrap().inner_html(), "hi");
    assert_eq!(host.outer_html(), mounted.serialize(true));
    mounted.unmount();
}

#[wasm_bindgen_test]
fn test_load_rejects_foreign_markup() {
    let (_container, mounted) = mount(EditorConfig::default());
    let before = mounted.serialize(true);
    let err = mounted.load("<p>nope</p>").unwrap_err();
    assert!(matches!(err, SnapshotError::NotEditorRoot { .. }));
    assert_eq!(mounted.serialize(true), before);
    mounted.unmount();
}

#[wasm_bindgen_test]
fn test_unmount_returns_editor_state() {
    let (_container, mounted) = mount(EditorConfig::default());
    let snapshot = r#"<div class="letterpress-editor" contenteditable="true"><p class="letterpress-block">one</p><p class="letterpress-block">two</p></div>"#;
    mounted.load(snapshot).unwrap();
    let serialized = mounted.serialize(true);
    let editor = mounted.unmount();
    assert_eq!(editor.document().blocks().len(), 2);
    assert_eq!(editor.serialize(true), serialized);
}
