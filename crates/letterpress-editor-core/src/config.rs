//! Editor construction options.
//!
//! Deserialized from the outer application's plain config object. Every
//! field is optional and falls back to its default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::{BLOCK_CLASS, HOST_CLASS, HeadingLevel};
use crate::dom::ElementOptions;

/// Tag used for new Text Blocks. Fixed for the editor's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockTag {
    #[default]
    #[serde(rename = "p", alias = "paragraph")]
    Paragraph,
    #[serde(rename = "div", alias = "division")]
    Division,
}

impl BlockTag {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Paragraph => "p",
            Self::Division => "div",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub default_block_tag: BlockTag,
    pub container_style: BTreeMap<String, String>,
    pub text_block_style: BTreeMap<String, String>,
    pub text_block_classes: Vec<String>,
    pub heading_level1_style: BTreeMap<String, String>,
    pub heading_level1_classes: Vec<String>,
    pub heading_level2_style: BTreeMap<String, String>,
    pub heading_level2_classes: Vec<String>,
    pub image_style: BTreeMap<String, String>,
    pub image_classes: Vec<String>,
    /// Shown on an empty, unfocused first block. Empty disables it.
    pub empty_placeholder: String,
}

impl EditorConfig {
    pub fn block_tag(&self) -> &'static str {
        self.default_block_tag.tag()
    }

    pub fn host_options(&self) -> ElementOptions {
        ElementOptions::new()
            .class(HOST_CLASS)
            .styles(&self.container_style)
    }

    pub fn text_block_options(&self) -> ElementOptions {
        ElementOptions::new()
            .class(BLOCK_CLASS)
            .classes(self.text_block_classes.iter().cloned())
            .styles(&self.text_block_style)
    }

    pub fn heading_options(&self, level: HeadingLevel) -> ElementOptions {
        let (style, classes) = match level {
            HeadingLevel::One => (&self.heading_level1_style, &self.heading_level1_classes),
            HeadingLevel::Two => (&self.heading_level2_style, &self.heading_level2_classes),
        };
        ElementOptions::new()
            .classes(classes.iter().cloned())
            .styles(style)
    }

    pub fn image_options(&self) -> ElementOptions {
        ElementOptions::new()
            .classes(self.image_classes.iter().cloned())
            .styles(&self.image_style)
    }

    /// Style rule that shows `empty_placeholder` in an empty first block
    /// while the editor is not focused.
    pub fn placeholder_css(&self) -> Option<String> {
        if self.empty_placeholder.is_empty() {
            return None;
        }
        let content = self
            .empty_placeholder
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\a ");
        Some(format!(
            ".{HOST_CLASS}:not(:focus) > :first-child:only-child:has(> br:only-child)::before \
             {{ content: \"{content}\"; opacity: 0.5; pointer-events: none; }}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.block_tag(), "p");
        assert_eq!(config.placeholder_css(), None);
    }

    #[test]
    fn test_block_tag_aliases() {
        use serde::de::IntoDeserializer;
        use serde::de::value::{Error, StrDeserializer};

        for (input, expected) in [
            ("p", BlockTag::Paragraph),
            ("paragraph", BlockTag::Paragraph),
            ("div", BlockTag::Division),
            ("division", BlockTag::Division),
        ] {
            let de: StrDeserializer<'_, Error> = input.into_deserializer();
            assert_eq!(BlockTag::deserialize(de).unwrap(), expected);
        }
    }

    #[test]
    fn test_text_block_options_force_block_class() {
        let config = EditorConfig {
            text_block_classes: vec!["body".into(), BLOCK_CLASS.into()],
            ..Default::default()
        };
        let options = config.text_block_options();
        assert_eq!(
            options.class_attribute().as_deref(),
            Some("letterpress-block body")
        );
    }

    #[test]
    fn test_placeholder_css_escapes() {
        let config = EditorConfig {
            empty_placeholder: "Say \"hi\"".into(),
            ..Default::default()
        };
        let css = config.placeholder_css().unwrap();
        assert!(css.contains(r#"content: "Say \"hi\"""#));
        assert!(css.starts_with(".letterpress-editor:not(:focus)"));
    }
}
