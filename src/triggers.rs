//! Host triggers
//!
//! The ways a user asks for speech: the highlighted text, the line the
//! cursor is on, or text given directly. Each refuses blank text with its
//! own diagnostic and makes no request in that case.

use crate::messages::{
    CURRENT_LINE_EMPTY, MAX_PREVIEW_LENGTH, NO_TEXT_GIVEN, NO_TEXT_SELECTED, SPEAKING_PREFIX,
};
use crate::speech::{SpeakPipeline, TtsResult};
use log::debug;
use unicode_width::UnicodeWidthChar;

/// What a trigger did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The text was handed to the pipeline
    Spoken(TtsResult),
    /// Nothing was sent; carries the diagnostic for the user
    NothingToSpeak(&'static str),
}

/// Speak the highlighted text
pub fn speak_selection(pipeline: &SpeakPipeline, selection: &str) -> TriggerOutcome {
    if selection.trim().is_empty() {
        debug!("Speak selection: nothing selected");
        return TriggerOutcome::NothingToSpeak(NO_TEXT_SELECTED);
    }
    TriggerOutcome::Spoken(speak_text(pipeline, selection))
}

/// Speak text passed in by the caller
pub fn speak_input(pipeline: &SpeakPipeline, text: &str) -> TriggerOutcome {
    if text.trim().is_empty() {
        debug!("Speak: input is blank");
        return TriggerOutcome::NothingToSpeak(NO_TEXT_GIVEN);
    }
    TriggerOutcome::Spoken(speak_text(pipeline, text))
}

/// Speak line `line` (0-based) of `document`
pub fn speak_line(pipeline: &SpeakPipeline, document: &str, line: usize) -> TriggerOutcome {
    let text = document.lines().nth(line).unwrap_or("");
    if text.trim().is_empty() {
        debug!("Speak line: line {} is empty", line);
        return TriggerOutcome::NothingToSpeak(CURRENT_LINE_EMPTY);
    }
    TriggerOutcome::Spoken(speak_text(pipeline, text))
}

/// Show the preview notice, then speak
///
/// The notice goes out before the network round-trip so the user gets
/// immediate feedback.
pub fn speak_text(pipeline: &SpeakPipeline, text: &str) -> TtsResult {
    pipeline.notify(&format!("{}{}", SPEAKING_PREFIX, preview(text)));
    pipeline.speak(text)
}

/// Shorten `text` to at most [`MAX_PREVIEW_LENGTH`] display columns
///
/// Truncated previews end in "...". Wide characters count as two columns.
pub fn preview(text: &str) -> String {
    let mut width = 0;
    let mut out = String::new();

    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > MAX_PREVIEW_LENGTH {
            out.push_str("...");
            return out;
        }
        width += w;
        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_preview_unchanged() {
        assert_eq!(preview("Hello world"), "Hello world");
    }

    #[test]
    fn test_exact_length_not_truncated() {
        let text = "a".repeat(MAX_PREVIEW_LENGTH);
        assert_eq!(preview(&text), text);
    }

    #[test]
    fn test_long_preview_truncated() {
        let text = "b".repeat(MAX_PREVIEW_LENGTH + 10);
        let shown = preview(&text);
        assert_eq!(shown, format!("{}...", "b".repeat(MAX_PREVIEW_LENGTH)));
    }

    #[test]
    fn test_wide_characters_count_double() {
        let text = "世".repeat(30);
        let shown = preview(&text);
        assert_eq!(shown, format!("{}...", "世".repeat(25)));
    }
}
