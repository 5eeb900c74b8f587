//! Audio output using rodio
//!
//! Each playback gets its own thread that opens the default output device
//! and keeps it open until the handle is dropped. The caller waits on the
//! sink; `stop()` ends the sink early.
//!
//! rodio ends a source quietly when decoding or the device fails partway
//! through. When the decoder knows the clip's length, a sink that drains
//! well before that length is reported as a playback error.
//!
//! On WSL the PulseAudio server exposed by WSLg is picked up automatically.

use crate::platform::setup_pulse_server;
use crate::speech::decoder::AudioResource;
use crate::speech::player::{AudioOutput, PlaybackEnd, PlaybackHandle};
use crate::{Result, TtsError};
use log::{debug, info};
use rodio::{Decoder, OutputStream, Sink, Source};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Allowed shortfall between a clip's length and its measured playback time
const TRUNCATION_SLACK: Duration = Duration::from_millis(500);

/// Plays audio on the default output device
pub struct RodioOutput;

impl RodioOutput {
    /// Prepare the audio environment
    ///
    /// The device itself is opened per playback, so a missing device shows
    /// up as a playback error rather than failing here.
    pub fn new() -> Result<Self> {
        setup_pulse_server()?;
        info!("Audio output ready");
        Ok(Self)
    }
}

impl AudioOutput for RodioOutput {
    fn start(&self, resource: AudioResource) -> Result<Box<dyn PlaybackHandle>> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(Arc<Sink>, Option<Duration>)>>();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let mime_type = resource.mime_type().to_string();
        let label = mime_type.clone();

        thread::Builder::new()
            .name("sermo-playback".to_string())
            .spawn(move || {
                let (_stream, stream_handle) = match OutputStream::try_default() {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(TtsError::Playback(format!(
                            "No audio output device: {}",
                            e
                        ))));
                        return;
                    }
                };

                let sink = match Sink::try_new(&stream_handle) {
                    Ok(sink) => sink,
                    Err(e) => {
                        let _ = ready_tx.send(Err(TtsError::Playback(e.to_string())));
                        return;
                    }
                };

                let source = match Decoder::new(Cursor::new(resource.into_bytes())) {
                    Ok(source) => source,
                    Err(e) => {
                        let _ = ready_tx.send(Err(TtsError::Playback(format!(
                            "Cannot decode {}: {}",
                            mime_type, e
                        ))));
                        return;
                    }
                };

                let expected = source.total_duration();
                sink.append(source);
                if ready_tx.send(Ok((Arc::new(sink), expected))).is_err() {
                    return;
                }

                // Keep the output stream open until the handle goes away
                let _ = done_rx.recv();
                debug!("Playback thread exiting");
            })
            .map_err(|e| TtsError::Playback(format!("Failed to start playback thread: {}", e)))?;

        let (sink, expected) = ready_rx
            .recv()
            .map_err(|_| TtsError::Playback("Playback thread exited".to_string()))??;
        debug!("Playing {} (length {:?})", label, expected);

        Ok(Box::new(RodioHandle {
            sink,
            expected,
            started: Instant::now(),
            stopped: AtomicBool::new(false),
            done: Mutex::new(Some(done_tx)),
        }))
    }
}

/// Handle to one rodio playback
struct RodioHandle {
    sink: Arc<Sink>,
    stopped: AtomicBool,

    /// Clip length as reported by the decoder, when it knows
    expected: Option<Duration>,
    started: Instant,

    /// Dropping this lets the playback thread close the device
    done: Mutex<Option<Sender<()>>>,
}

impl PlaybackHandle for RodioHandle {
    fn wait(&self) -> Result<PlaybackEnd> {
        self.sink.sleep_until_end();
        if self.stopped.load(Ordering::SeqCst) {
            return Ok(PlaybackEnd::Stopped);
        }
        check_complete(self.expected, self.started.elapsed())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.sink.stop();
    }
}

/// Treat a clip that drained well short of its length as a failure
fn check_complete(expected: Option<Duration>, elapsed: Duration) -> Result<PlaybackEnd> {
    match expected {
        Some(length) if elapsed + TRUNCATION_SLACK < length => Err(TtsError::Playback(format!(
            "playback ended after {:.1}s of {:.1}s",
            elapsed.as_secs_f32(),
            length.as_secs_f32()
        ))),
        _ => Ok(PlaybackEnd::Finished),
    }
}

impl Drop for RodioHandle {
    fn drop(&mut self) {
        self.sink.stop();
        if let Ok(mut done) = self.done.lock() {
            done.take();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_playback_finishes() {
        let end = check_complete(Some(Duration::from_secs(2)), Duration::from_millis(2010)).unwrap();
        assert_eq!(end, PlaybackEnd::Finished);
    }

    #[test]
    fn test_unknown_length_finishes() {
        let end = check_complete(None, Duration::from_millis(10)).unwrap();
        assert_eq!(end, PlaybackEnd::Finished);
    }

    #[test]
    fn test_small_shortfall_is_tolerated() {
        let end = check_complete(Some(Duration::from_secs(2)), Duration::from_millis(1700)).unwrap();
        assert_eq!(end, PlaybackEnd::Finished);
    }

    #[test]
    fn test_truncated_playback_is_an_error() {
        let err = check_complete(Some(Duration::from_secs(3)), Duration::from_millis(800)).unwrap_err();
        assert!(matches!(err, TtsError::Playback(_)));
        assert!(err.to_string().contains("0.8s of 3.0s"));
    }
}
