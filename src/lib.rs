//! Sermo - remote text-to-speech client
//!
//! Sends text to a Sermo synthesis API, plays the audio it returns, and
//! retries transient failures with a linear backoff.

pub mod clipboard;
pub mod error;
pub mod messages;
pub mod platform;
pub mod settings;
pub mod speech;
pub mod triggers;

pub use error::{Result, TtsError};
pub use settings::{Settings, SharedSettings};
pub use speech::{SpeakPipeline, TtsResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "sermo";
