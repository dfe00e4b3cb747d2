//! Clipboard access for the paste pipeline.
//!
//! Only the plain-text flavor is ever read; rich HTML on the clipboard is
//! dropped.

/// Plain text carried by a paste event.
pub fn paste_text(event: &web_sys::ClipboardEvent) -> Option<String> {
    let dt = event.clipboard_data()?;
    match dt.get_data("text/plain") {
        Ok(text) if !text.is_empty() => Some(text),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!(target: "letterpress::browser", ?err, "clipboard read failed");
            None
        }
    }
}
