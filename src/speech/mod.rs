//! Remote speech synthesis and playback
//!
//! Text goes out to the synthesis API through [`request::RequestExecutor`],
//! attempts are driven by [`retry::RetryOrchestrator`], the reply is turned
//! into playable audio by [`decoder`], and [`player::AudioPlayer`] plays it.
//! [`pipeline::SpeakPipeline`] ties them together.

pub mod backends;
pub mod decoder;
pub mod language;
pub mod pipeline;
pub mod player;
pub mod request;
pub mod retry;

pub use decoder::{decode, AudioResource};
pub use language::{FixedLanguage, LanguageDetector, ServerDetects};
pub use pipeline::{SpeakPipeline, TtsResult};
pub use player::{AudioOutput, AudioPlayer, PlaybackEnd, PlaybackHandle};
pub use request::{
    CancelToken, RawResponse, RequestExecutor, SynthesisRequest, SynthesisResponse, Transport,
};
pub use retry::RetryOrchestrator;

use log::info;

/// Receives transient user-facing notices
///
/// Retry progress, the "Speaking: ..." preview and final failures are
/// reported through this. Hosts show them however they like.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

impl<F> Notifier for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// Notifier that writes notices to the log
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!("{}", message);
    }
}
