//! Speak pipeline
//!
//! Stop whatever is playing, fetch audio with retries, decode it, play it.
//! Every outcome comes back as a [`TtsResult`]; nothing escapes `speak` as
//! an error.

use super::decoder::decode;
use super::player::AudioPlayer;
use super::retry::RetryOrchestrator;
use super::Notifier;
use crate::settings::{SharedSettings, Settings};
use crate::Result;
use log::{debug, error, info};
use std::sync::Arc;

/// Terminal outcome of one `speak` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TtsResult {
    /// Audio was fetched and played (or was cancelled by a newer call)
    Success,
    /// Human-readable reason the text was not spoken
    Failure(String),
}

impl TtsResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TtsResult::Success)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TtsResult::Success => None,
            TtsResult::Failure(message) => Some(message),
        }
    }
}

/// Top-level text-to-speech pipeline
///
/// Share it behind an `Arc` when more than one caller may speak; a new
/// `speak` always tears down the previous call's playback first.
pub struct SpeakPipeline {
    settings: SharedSettings,
    retry: RetryOrchestrator,
    player: AudioPlayer,
    notifier: Arc<dyn Notifier>,
}

impl SpeakPipeline {
    pub fn new(
        settings: SharedSettings,
        retry: RetryOrchestrator,
        player: AudioPlayer,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            retry,
            player,
            notifier,
        }
    }

    /// Speak `text`, returning once playback has ended
    ///
    /// Settings are captured once at the start; edits made while this call
    /// is running apply to the next call.
    pub fn speak(&self, text: &str) -> TtsResult {
        self.player.stop();

        let settings = self.settings.snapshot();
        debug!(
            "Speaking {} chars via {} (timeout {} ms, {} attempts)",
            text.len(),
            settings.endpoint_url,
            settings.timeout_ms,
            settings.max_retries
        );

        match self.fetch_and_play(text, &settings) {
            Ok(()) => {
                info!("Speech completed");
                TtsResult::Success
            }
            Err(e) => {
                error!("Speech failed: {}", e);
                TtsResult::Failure(e.to_string())
            }
        }
    }

    /// Network phase is retried; decode and playback failures are final
    fn fetch_and_play(&self, text: &str, settings: &Settings) -> Result<()> {
        let response = self.retry.run(text, settings)?;
        let audio = decode(response)?;
        self.player.play(audio)
    }

    /// Stop current playback, if any
    pub fn stop(&self) {
        self.player.stop();
    }

    /// Whether audio is playing right now
    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    /// Replace the settings used by subsequent calls
    ///
    /// Invalid settings are rejected and the current ones stay in effect.
    pub fn update_settings(&self, settings: Settings) -> Result<()> {
        settings.validate()?;
        self.settings.replace(settings);
        Ok(())
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> Settings {
        self.settings.snapshot()
    }

    /// Send a notice through the host's notifier
    pub fn notify(&self, message: &str) {
        self.notifier.notify(message);
    }
}
