//! Browser DOM layer for the letterpress email editor.
//!
//! Renders a core [`Editor`] into a page, translates platform events into
//! core handler calls and keeps the platform selection in step with the
//! mirror. It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `element`: building elements from core `ElementOptions`
//! - `cursor`: Selection API handling and offset conversion
//! - `dom_sync`: mirror → DOM projection, diffed per block
//! - `toolbar`: toolbar elements reflecting core toolbar state
//! - `events`, `clipboard`: event data extraction
//! - `mount`: listener wiring and the render cycle
//!
//! # Re-exports
//!
//! This crate re-exports `letterpress-editor-core` for convenience, so
//! consumers only need to depend on `letterpress-editor-browser`.

// Re-export core crate
pub use letterpress_editor_core;
pub use letterpress_editor_core::*;

pub mod clipboard;
pub mod cursor;
pub mod dom_sync;
pub mod element;
pub mod events;
pub mod mount;
pub mod toolbar;

pub use mount::MountedEditor;
