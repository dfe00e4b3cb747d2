//! Types exposed to JavaScript via wasm-bindgen.

use std::collections::BTreeMap;

use letterpress_editor_core::{BlockTag, EditorConfig};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

/// Editor construction options, as a plain JS object.
///
/// Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
#[serde(rename_all = "camelCase", default)]
pub struct JsEditorConfig {
    #[tsify(type = "\"p\" | \"paragraph\" | \"div\" | \"division\"", optional)]
    pub default_block_tag: BlockTag,
    #[tsify(optional)]
    pub container_style: BTreeMap<String, String>,
    #[tsify(optional)]
    pub text_block_style: BTreeMap<String, String>,
    #[tsify(optional)]
    pub text_block_classes: Vec<String>,
    #[tsify(optional)]
    pub heading_level1_style: BTreeMap<String, String>,
    #[tsify(optional)]
    pub heading_level1_classes: Vec<String>,
    #[tsify(optional)]
    pub heading_level2_style: BTreeMap<String, String>,
    #[tsify(optional)]
    pub heading_level2_classes: Vec<String>,
    #[tsify(optional)]
    pub image_style: BTreeMap<String, String>,
    #[tsify(optional)]
    pub image_classes: Vec<String>,
    #[tsify(optional)]
    pub empty_placeholder: String,
}

impl From<JsEditorConfig> for EditorConfig {
    fn from(js: JsEditorConfig) -> Self {
        EditorConfig {
            default_block_tag: js.default_block_tag,
            container_style: js.container_style,
            text_block_style: js.text_block_style,
            text_block_classes: js.text_block_classes,
            heading_level1_style: js.heading_level1_style,
            heading_level1_classes: js.heading_level1_classes,
            heading_level2_style: js.heading_level2_style,
            heading_level2_classes: js.heading_level2_classes,
            image_style: js.image_style,
            image_classes: js.image_classes,
            empty_placeholder: js.empty_placeholder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_every_field() {
        let js = JsEditorConfig {
            default_block_tag: BlockTag::Division,
            text_block_classes: vec!["copy".into()],
            empty_placeholder: "Write here".into(),
            ..JsEditorConfig::default()
        };
        let config = EditorConfig::from(js);
        assert_eq!(config.block_tag(), "div");
        assert_eq!(config.text_block_classes, ["copy"]);
        assert!(config.placeholder_css().is_some());
    }
}
