//! Clipboard integration
//!
//! The "speak selection" trigger reads highlighted text from here. On
//! X11/Wayland that is the primary selection; elsewhere (or when the
//! primary selection is unavailable) the regular clipboard is used.

use crate::{Result, TtsError};
use arboard::Clipboard;
use log::debug;

/// Get text from system clipboard
pub fn get_from_clipboard() -> Result<String> {
    debug!("Getting text from clipboard");

    let mut clipboard = Clipboard::new()
        .map_err(|e| TtsError::Clipboard(format!("Failed to open clipboard: {}", e)))?;

    clipboard
        .get_text()
        .map_err(|e| TtsError::Clipboard(format!("Failed to get from clipboard: {}", e)))
}

/// Get the currently highlighted text
#[cfg(all(unix, not(target_os = "macos")))]
pub fn get_selection() -> Result<String> {
    use arboard::{GetExtLinux, LinuxClipboardKind};

    debug!("Getting text from primary selection");

    let mut clipboard = Clipboard::new()
        .map_err(|e| TtsError::Clipboard(format!("Failed to open clipboard: {}", e)))?;

    match clipboard
        .get()
        .clipboard(LinuxClipboardKind::Primary)
        .text()
    {
        Ok(text) => Ok(text),
        Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
        Err(e) => {
            debug!("Primary selection unavailable ({}), using clipboard", e);
            get_from_clipboard()
        }
    }
}

/// Get the currently highlighted text
#[cfg(not(all(unix, not(target_os = "macos"))))]
pub fn get_selection() -> Result<String> {
    get_from_clipboard()
}
