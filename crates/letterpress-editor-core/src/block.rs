//! Block kinds and the well-known class names that mark them.

/// Class on the contenteditable inner host.
pub const HOST_CLASS: &str = "letterpress-editor";

/// Class force-added to every Text Block.
pub const BLOCK_CLASS: &str = "letterpress-block";

/// Class on non-editable Container Blocks.
pub const CONTAINER_CLASS: &str = "letterpress-container";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadingLevel {
    One,
    Two,
}

impl HeadingLevel {
    pub fn tag(self) -> &'static str {
        match self {
            Self::One => "h1",
            Self::Two => "h2",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h1" => Some(Self::One),
            "h2" => Some(Self::Two),
            _ => None,
        }
    }
}

/// The flat set of blocks a document is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Text,
    Heading(HeadingLevel),
    /// Non-editable wrapper around exactly one embed.
    Container,
}

impl BlockKind {
    /// Text and Heading blocks hold inline content and can take the caret.
    pub fn is_editable(self) -> bool {
        !matches!(self, Self::Container)
    }

    pub fn is_heading(self) -> bool {
        matches!(self, Self::Heading(_))
    }
}

/// What a Container Block wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Embed {
    Image { src: String, alt: String },
    HorizontalRule,
}

impl Embed {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Image { .. } => "img",
            Self::HorizontalRule => "hr",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_tags() {
        assert_eq!(HeadingLevel::from_tag(HeadingLevel::One.tag()), Some(HeadingLevel::One));
        assert_eq!(HeadingLevel::from_tag("h3"), None);
    }

    #[test]
    fn test_block_kind_predicates() {
        assert!(BlockKind::Text.is_editable());
        assert!(BlockKind::Heading(HeadingLevel::Two).is_heading());
        assert!(!BlockKind::Container.is_editable());
    }
}
