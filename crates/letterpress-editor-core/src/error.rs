//! Error types for the editor core.
//!
//! None of these cross an event-handler boundary: handlers log and swallow
//! them. Only [`SnapshotError`] reaches the public surface, through
//! [`Editor::load`](crate::Editor::load).

use std::borrow::Cow;

use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};

/// Rejection reasons from [`validate_url`](crate::validate_url).
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlError {
    #[error("no URL was entered")]
    Empty,
    #[error("a URL needs at least one dot")]
    MissingDot,
}

/// Structural failures on the mirror tree.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DomError {
    /// The node is no longer connected to the document.
    #[error("node is detached from the document")]
    Detached,
    #[error("expected an element node")]
    NotAnElement,
}

/// Why a snapshot passed to `load` was rejected.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("snapshot is not well-formed: {message}")]
    #[diagnostic(code(letterpress::snapshot::parse))]
    Parse {
        message: String,
        #[source_code]
        src: NamedSource<Cow<'static, str>>,
        #[label("here")]
        location: SourceSpan,
    },

    #[error("snapshot contains no element")]
    #[diagnostic(code(letterpress::snapshot::missing_root))]
    MissingRoot,

    #[error("snapshot root <{tag}> does not carry the `{class}` class")]
    #[diagnostic(
        code(letterpress::snapshot::not_editor_root),
        help("only markup produced by `serialize` can be loaded")
    )]
    NotEditorRoot { tag: String, class: &'static str },
}

impl SnapshotError {
    /// Build a parse error pointing at a 1-based line/column in `source`.
    pub fn parse(message: impl Into<String>, source: String, line: usize, column: usize) -> Self {
        let offset = SourceOffset::from_location(&source, line, column);
        Self::Parse {
            message: message.into(),
            src: NamedSource::new("snapshot", Cow::Owned(source)),
            location: SourceSpan::new(offset, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_points_at_location() {
        let err = SnapshotError::parse("unexpected end", "ab\ncd".to_string(), 2, 2);
        match err {
            SnapshotError::Parse { location, .. } => assert_eq!(location.offset(), 4),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_not_editor_root_message() {
        let err = SnapshotError::NotEditorRoot {
            tag: "section".into(),
            class: "letterpress-editor",
        };
        assert_eq!(
            err.to_string(),
            "snapshot root <section> does not carry the `letterpress-editor` class"
        );
    }
}
