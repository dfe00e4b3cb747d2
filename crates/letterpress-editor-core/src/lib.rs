//! letterpress-editor-core: the email editor without a browser.
//!
//! This crate provides:
//! - `Dom` - an arena mirror of the editable subtree
//! - `Document` - the block document under the inner host
//! - `Inline` - the flattened inline model edits run against
//! - `Editor` - event handlers, toolbar actions and snapshots
//! - `EditToolbar` / `InsertToolbar` - toolbar state driven by the editor

pub mod actions;
pub mod block;
pub mod config;
pub mod document;
pub mod dom;
pub mod editor;
pub mod error;
pub mod html;
pub mod inline;
pub mod selection;
pub mod text_helpers;
pub mod toolbar;
pub mod types;
pub mod url;

#[cfg(test)]
mod testing;

pub use actions::{
    BeforeInputResult, EditorAction, EditorEffect, InputType, Key, KeydownResult, Modifiers,
};
pub use block::{BLOCK_CLASS, BlockKind, CONTAINER_CLASS, Embed, HOST_CLASS, HeadingLevel};
pub use config::{BlockTag, EditorConfig};
pub use document::{BlockPoint, Document};
pub use dom::{Dom, ElementOptions, NodeData, NodeId, Position};
pub use editor::{Editor, ToolbarAnchor};
pub use error::{DomError, SnapshotError, UrlError};
pub use inline::{Inline, Marks};
pub use selection::{DomRange, Selection, SelectionState};
pub use smol_str::SmolStr;
pub use toolbar::{
    ButtonId, ButtonState, EditToolbar, InsertToolbar, Toolbar, ToolbarButton, ToolbarInput,
    ToolbarKind,
};
pub use types::{Point, Rect, Size};
pub use url::validate_url;
