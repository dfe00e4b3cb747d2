//! A core `Editor` attached to a page.
//!
//! Every listener follows the same cycle: pull the platform selection into
//! the mirror, run one core handler, then `finish`, which re-renders the host
//! and the toolbars, pushes the selection back and runs queued effects.
//! Listeners skip events that arrive while another one holds the state, such
//! as the blur caused by focusing the host from a toolbar input.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo_timers::callback::Timeout;
use letterpress_editor_core::{
    BeforeInputResult, Editor, EditorEffect, Key, KeydownResult, NodeId, Rect, Size,
    SnapshotError, ToolbarAnchor, ToolbarKind,
};
use wasm_bindgen::{JsCast, JsValue};

use crate::clipboard::paste_text;
use crate::cursor::{SelectionBridge, caret_offset_in};
use crate::dom_sync::DomSync;
use crate::events::{input_data, input_type, key_and_modifiers, target_node};
use crate::toolbar::ToolbarView;

const KINDS: [ToolbarKind; 2] = [ToolbarKind::Edit, ToolbarKind::Insert];

struct View {
    sync: DomSync,
    edit: ToolbarView,
    insert: ToolbarView,
}

impl View {
    fn toolbar(&self, kind: ToolbarKind) -> &ToolbarView {
        match kind {
            ToolbarKind::Edit => &self.edit,
            ToolbarKind::Insert => &self.insert,
        }
    }

    fn active_input(&self) -> Option<ToolbarKind> {
        let active: web_sys::Node = gloo_utils::document().active_element()?.into();
        KINDS
            .into_iter()
            .find(|&kind| self.toolbar(kind).input_contains(&active))
    }
}

struct EditorState {
    editor: Editor,
    view: View,
    composing_block: Option<NodeId>,
}

impl EditorState {
    fn bridge(&self) -> SelectionBridge<'_> {
        SelectionBridge {
            dom: self.editor.dom(),
            host: self.editor.host(),
            host_el: self.view.sync.host_element().as_ref(),
        }
    }

    /// Mirror the platform selection. While a toolbar input has focus the
    /// document has no selection of its own.
    fn pull_selection(&mut self) {
        let selection = match self.view.active_input() {
            Some(_) => None,
            None => self.bridge().read(),
        };
        self.editor.set_selection(selection);
    }

    /// Project the editor onto the page and run its effects. Returns whether
    /// the document changed.
    fn finish(&mut self) -> bool {
        if let Err(err) = self.view.sync.render(self.editor.dom(), self.editor.host()) {
            tracing::error!(target: "letterpress::browser", ?err, "host render failed");
        }
        for kind in KINDS {
            self.render_toolbar(kind);
        }
        if self.view.active_input().is_none() {
            if let Some(selection) = self.editor.selection() {
                if let Err(err) = self.bridge().write(selection) {
                    tracing::debug!(target: "letterpress::selection", ?err, "selection write failed");
                }
            }
        }

        let mut changed = false;
        for effect in self.editor.take_effects() {
            match effect {
                EditorEffect::FocusInput(kind) => {
                    let input = self.view.toolbar(kind).input().clone();
                    Timeout::new(0, move || {
                        if let Err(err) = input.focus() {
                            tracing::debug!(target: "letterpress::browser", ?err, "input focus failed");
                        }
                    })
                    .forget();
                }
                EditorEffect::ScrollIntoView(block) => {
                    if let Some(el) = self.view.sync.element_for(block).cloned() {
                        Timeout::new(0, move || scroll_if_hidden(&el)).forget();
                    }
                }
                EditorEffect::Alert(message) => {
                    Timeout::new(0, move || {
                        if let Err(err) = gloo_utils::window().alert_with_message(&message) {
                            tracing::warn!(target: "letterpress::browser", ?err, "alert failed");
                        }
                    })
                    .forget();
                }
                EditorEffect::Changed => changed = true,
            }
        }
        changed
    }

    fn render_toolbar(&mut self, kind: ToolbarKind) {
        self.view.toolbar(kind).render(self.editor.toolbar(kind));
        let Some(anchor) = self
            .editor
            .toolbar_anchor(kind)
            .and_then(|anchor| self.anchor_rect(anchor))
        else {
            return;
        };
        let view = self.view.toolbar(kind);
        let size = view.measure();
        self.editor.place_toolbar(kind, anchor, size, viewport());
        view.set_position(self.editor.toolbar(kind).frame().position);
    }

    fn anchor_rect(&self, anchor: ToolbarAnchor) -> Option<Rect> {
        let rect = match anchor {
            ToolbarAnchor::Range(range) => self.bridge().range(range)?.get_bounding_client_rect(),
            ToolbarAnchor::Block(block) => self.view.sync.element_for(block)?.get_bounding_client_rect(),
        };
        Some(Rect::new(rect.x(), rect.y(), rect.width(), rect.height()))
    }

    fn remove(&self) {
        self.view.sync.host_element().remove();
        self.view.edit.remove();
        self.view.insert.remove();
    }
}

fn viewport() -> Size {
    let window = gloo_utils::window();
    let width = window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|h| h.as_f64()).unwrap_or(0.0);
    Size::new(width, height)
}

fn scroll_if_hidden(el: &web_sys::Element) {
    let bottom = el.get_bounding_client_rect().bottom();
    if bottom > viewport().height {
        el.scroll_into_view();
    }
}

type Shared = Rc<RefCell<EditorState>>;
type ChangeCallback = Option<Rc<dyn Fn()>>;

fn prevent_default_options(phase: EventListenerPhase) -> EventListenerOptions {
    EventListenerOptions {
        phase,
        passive: false,
    }
}

/// Attach `handler` to `target` wrapped in the pull / handle / finish cycle.
fn listen<F>(
    target: &web_sys::EventTarget,
    event_type: &'static str,
    options: EventListenerOptions,
    shared: &Shared,
    on_change: &ChangeCallback,
    handler: F,
) -> EventListener
where
    F: Fn(&mut EditorState, &web_sys::Event) + 'static,
{
    let shared = shared.clone();
    let on_change = on_change.clone();
    EventListener::new_with_options(target, event_type, options, move |event| {
        let changed = {
            let Ok(mut state) = shared.try_borrow_mut() else {
                tracing::trace!(target: "letterpress::browser", event_type, "skipped nested event");
                return;
            };
            handler(&mut *state, event);
            state.finish()
        };
        if changed {
            if let Some(callback) = &on_change {
                callback();
            }
        }
    })
}

/// An editor rendered into a page container.
pub struct MountedEditor {
    state: Shared,
    listeners: Vec<EventListener>,
    style: Option<web_sys::Element>,
}

impl MountedEditor {
    /// Render `editor` into `container` and start listening.
    ///
    /// `on_change` runs after every event that changed the document.
    pub fn mount(
        container: &web_sys::Element,
        editor: Editor,
        on_change: Option<Rc<dyn Fn()>>,
    ) -> Result<Self, JsValue> {
        let document = gloo_utils::document();
        let sync = DomSync::new(&document, editor.dom(), editor.host())?;
        let edit = ToolbarView::build(&document, editor.toolbar(ToolbarKind::Edit))?;
        let insert = ToolbarView::build(&document, editor.toolbar(ToolbarKind::Insert))?;
        container.append_child(sync.host_element())?;

        let style = match editor.config().placeholder_css() {
            Some(css) => {
                let el = document.create_element("style")?;
                el.set_text_content(Some(&css));
                gloo_utils::head().append_child(&el)?;
                Some(el)
            }
            None => None,
        };

        let blocks = editor.document().blocks().len();
        let state = Rc::new(RefCell::new(EditorState {
            editor,
            view: View { sync, edit, insert },
            composing_block: None,
        }));
        state.borrow_mut().finish();

        let listeners = Self::attach(&state, &on_change);
        tracing::info!(target: "letterpress::browser", blocks, "editor mounted");
        Ok(Self {
            state,
            listeners,
            style,
        })
    }

    fn attach(state: &Shared, on_change: &ChangeCallback) -> Vec<EventListener> {
        let (host, edit_root, edit_input, insert_root, insert_input) = {
            let state = state.borrow();
            let view = &state.view;
            (
                web_sys::EventTarget::from(view.sync.host_element().clone()),
                web_sys::EventTarget::from(view.edit.root().clone()),
                web_sys::EventTarget::from(view.edit.input().clone()),
                web_sys::EventTarget::from(view.insert.root().clone()),
                web_sys::EventTarget::from(view.insert.input().clone()),
            )
        };
        let document: web_sys::EventTarget = gloo_utils::document().into();
        let window: web_sys::EventTarget = gloo_utils::window().into();
        let bubble = EventListenerOptions::default;
        let active = || prevent_default_options(EventListenerPhase::Bubble);

        let mut listeners = vec![
            listen(&host, "keydown", active(), state, on_change, |state, event| {
                let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                    return;
                };
                state.pull_selection();
                let (key, modifiers) = key_and_modifiers(event);
                if state.editor.handle_keydown(&key, modifiers) == KeydownResult::Handled {
                    event.prevent_default();
                }
            }),
            listen(&host, "beforeinput", active(), state, on_change, |state, event| {
                let Some(event) = event.dyn_ref::<web_sys::InputEvent>() else {
                    return;
                };
                state.pull_selection();
                let data = input_data(event);
                let result = state
                    .editor
                    .handle_beforeinput(&input_type(event), data.as_deref());
                if result == BeforeInputResult::Handled {
                    event.prevent_default();
                }
            }),
            // Inputs the editor passed through have now been applied by the
            // platform; read the edited block back into the mirror.
            listen(&host, "input", bubble(), state, on_change, |state, _| {
                if state.editor.is_composing() {
                    return;
                }
                let Some(block) = state.editor.pending_reimport() else {
                    return;
                };
                let Some(el) = state.view.sync.element_for(block).cloned() else {
                    return;
                };
                let caret = caret_offset_in(&el).unwrap_or(0);
                // The platform may have touched neighbouring blocks too.
                state.view.sync.reset();
                state.editor.reimport_block(block, &el.inner_html(), caret);
            }),
            listen(&host, "keyup", bubble(), state, on_change, |state, event| {
                let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                    return;
                };
                state.pull_selection();
                state.editor.handle_keyup(&Key::parse(&event.key()));
            }),
            listen(&host, "click", bubble(), state, on_change, |state, _| {
                state.pull_selection();
                state.editor.handle_click(false);
            }),
            listen(&host, "mouseup", bubble(), state, on_change, |state, _| {
                state.pull_selection();
                state.editor.handle_mouseup();
            }),
            listen(&host, "paste", active(), state, on_change, |state, event| {
                event.prevent_default();
                let text = event
                    .dyn_ref::<web_sys::ClipboardEvent>()
                    .and_then(paste_text);
                state.pull_selection();
                if let Some(text) = text {
                    state.editor.handle_paste(&text);
                }
            }),
            listen(&host, "compositionstart", bubble(), state, on_change, |state, _| {
                state.pull_selection();
                state.editor.begin_composition();
                state.composing_block = state.editor.block_at_anchor();
            }),
            listen(&host, "compositionend", bubble(), state, on_change, |state, _| {
                let Some(block) = state.composing_block.take() else {
                    state.editor.end_composition(state.editor.host(), "", 0);
                    return;
                };
                let Some(el) = state.view.sync.element_for(block).cloned() else {
                    return;
                };
                let caret = caret_offset_in(&el).unwrap_or(0);
                state.view.sync.invalidate(block);
                state.editor.end_composition(block, &el.inner_html(), caret);
            }),
            // Resource errors do not bubble.
            listen(
                &host,
                "error",
                EventListenerOptions::run_in_capture_phase(),
                state,
                on_change,
                |state, event| {
                    let Some(node) = target_node(event) else {
                        return;
                    };
                    if !node.is_instance_of::<web_sys::HtmlImageElement>() {
                        return;
                    }
                    let image = state.bridge().to_mirror(&node, 0);
                    if let Some(image) = image {
                        state.editor.handle_image_error(image.node);
                    }
                },
            ),
            listen(&document, "selectionchange", bubble(), state, on_change, |state, _| {
                let in_edit_toolbar = gloo_utils::document()
                    .active_element()
                    .is_some_and(|el| state.view.edit.contains(&el));
                state.pull_selection();
                state.editor.handle_selection_change(in_edit_toolbar);
            }),
            listen(&window, "scroll", bubble(), state, on_change, |_, _| {}),
            listen(&window, "resize", bubble(), state, on_change, |_, _| {}),
        ];

        for (kind, root, input) in [
            (ToolbarKind::Edit, &edit_root, &edit_input),
            (ToolbarKind::Insert, &insert_root, &insert_input),
        ] {
            // Keep the document selection while a button is pressed.
            listeners.push(listen(root, "mousedown", active(), state, on_change, move |state, event| {
                let on_input = target_node(event)
                    .is_some_and(|node| state.view.toolbar(kind).input_contains(&node));
                if !on_input {
                    event.prevent_default();
                }
            }));
            listeners.push(listen(root, "click", bubble(), state, on_change, move |state, event| {
                let Some(button) = target_node(event)
                    .and_then(|node| state.view.toolbar(kind).button_at(&node))
                else {
                    return;
                };
                state.pull_selection();
                if !state.editor.click_button(kind, button) {
                    tracing::debug!(target: "letterpress::browser", button = button.name(), "disabled button clicked");
                }
            }));
            listeners.push(listen(input, "keydown", active(), state, on_change, move |state, event| {
                let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                    return;
                };
                match event.key().as_str() {
                    "Enter" => {
                        event.prevent_default();
                        let value = state.view.toolbar(kind).input().value();
                        state.editor.set_input_value(kind, &value);
                        state.editor.commit_input(kind);
                    }
                    "Escape" => {
                        event.prevent_default();
                        state.editor.dismiss_input(kind);
                    }
                    _ => return,
                }
                if !state.editor.toolbar(kind).input().is_visible() {
                    // The input's blur re-enters and is skipped.
                    if let Err(err) = state.view.sync.host_element().focus() {
                        tracing::debug!(target: "letterpress::browser", ?err, "host focus failed");
                    }
                }
            }));
            listeners.push(listen(input, "input", bubble(), state, on_change, move |state, _| {
                let value = state.view.toolbar(kind).input().value();
                state.editor.set_input_value(kind, &value);
            }));
            listeners.push(listen(input, "blur", bubble(), state, on_change, move |state, _| {
                state.editor.dismiss_input(kind);
            }));
        }
        listeners
    }

    /// Inner host HTML, with `contenteditable` set to `editable`.
    pub fn serialize(&self, editable: bool) -> String {
        self.state.borrow().editor.serialize(editable)
    }

    /// Replace the document with a snapshot. On error nothing changes.
    pub fn load(&self, html: &str) -> Result<(), SnapshotError> {
        let mut state = self.state.borrow_mut();
        state.editor.load(html)?;
        state.view.sync.reset();
        state.finish();
        Ok(())
    }

    pub fn focus(&self) -> Result<(), JsValue> {
        let state = self.state.borrow();
        state.view.sync.host_element().focus()
    }

    /// Read access to the core editor.
    pub fn with_editor<R>(&self, f: impl FnOnce(&Editor) -> R) -> R {
        f(&self.state.borrow().editor)
    }

    /// Detach from the page and hand back the editor.
    pub fn unmount(self) -> Editor {
        let Self {
            state,
            listeners,
            style,
        } = self;
        drop(listeners);
        if let Some(style) = style {
            style.remove();
        }
        state.borrow().remove();
        tracing::info!(target: "letterpress::browser", "editor unmounted");
        match Rc::try_unwrap(state) {
            Ok(cell) => cell.into_inner().editor,
            Err(shared) => {
                let editor = shared.borrow().editor.clone();
                editor
            }
        }
    }
}
