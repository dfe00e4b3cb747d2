//! JsEditor - the main editor wrapper for JavaScript.

use std::rc::Rc;

use letterpress_editor_browser::MountedEditor;
use letterpress_editor_core::{Editor, EditorConfig};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::types::JsEditorConfig;

enum Slot {
    Detached(Editor),
    Mounted(MountedEditor),
}

/// The main editor instance exposed to JavaScript.
///
/// Holds the document whether or not it is currently on the page.
#[wasm_bindgen]
pub struct JsEditor {
    slot: Option<Slot>,
}

#[wasm_bindgen]
impl JsEditor {
    /// Create an editor. `config` is a plain object; omit it for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsEditor, JsError> {
        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value::<JsEditorConfig>(config)
                .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?
                .into()
        };
        Ok(Self {
            slot: Some(Slot::Detached(Editor::new(config))),
        })
    }

    /// Render into `container`. `on_change` is called after every edit.
    pub fn mount(
        &mut self,
        container: &HtmlElement,
        on_change: Option<js_sys::Function>,
    ) -> Result<(), JsError> {
        let editor = match self.slot.take() {
            Some(Slot::Detached(editor)) => editor,
            Some(Slot::Mounted(mounted)) => {
                self.slot = Some(Slot::Mounted(mounted));
                return Err(JsError::new("Editor is already mounted"));
            }
            None => return Err(JsError::new("Editor is in an invalid state")),
        };

        let callback = on_change.map(|f| -> Rc<dyn Fn()> {
            Rc::new(move || {
                if let Err(err) = f.call0(&JsValue::NULL) {
                    tracing::warn!(target: "letterpress::editor", ?err, "onChange threw");
                }
            })
        });

        // Keep the document if mounting fails part way.
        let snapshot = editor.clone();
        match MountedEditor::mount(container, editor, callback) {
            Ok(mounted) => {
                self.slot = Some(Slot::Mounted(mounted));
                Ok(())
            }
            Err(err) => {
                self.slot = Some(Slot::Detached(snapshot));
                Err(JsError::new(&format!("Mount failed: {:?}", err)))
            }
        }
    }

    /// Remove the editor from the page. The document is kept.
    pub fn unmount(&mut self) {
        self.slot = match self.slot.take() {
            Some(Slot::Mounted(mounted)) => Some(Slot::Detached(mounted.unmount())),
            other => other,
        };
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        matches!(self.slot, Some(Slot::Mounted(_)))
    }

    pub fn focus(&self) -> Result<(), JsError> {
        match &self.slot {
            Some(Slot::Mounted(mounted)) => mounted
                .focus()
                .map_err(|err| JsError::new(&format!("Focus failed: {:?}", err))),
            _ => Err(JsError::new("Editor is not mounted")),
        }
    }

    /// The document as HTML, with `contenteditable` set to `editable`
    /// (false when omitted).
    pub fn serialize(&self, editable: Option<bool>) -> String {
        let editable = editable.unwrap_or(false);
        match &self.slot {
            Some(Slot::Detached(editor)) => editor.serialize(editable),
            Some(Slot::Mounted(mounted)) => mounted.serialize(editable),
            None => String::new(),
        }
    }

    /// Replace the document with a snapshot from `serialize`. Returns false,
    /// leaving the document untouched, when `html` is not one.
    pub fn load(&mut self, html: &str) -> bool {
        let result = match &mut self.slot {
            Some(Slot::Detached(editor)) => editor.load(html),
            Some(Slot::Mounted(mounted)) => mounted.load(html),
            None => return false,
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(target: "letterpress::editor", error = %err, "snapshot rejected");
                false
            }
        }
    }
}
