//! Single-slot audio player
//!
//! At most one playback is alive at a time. Starting a new one stops the
//! previous one first, and every exit path (finished, failed, stopped)
//! releases the handle.

use super::decoder::AudioResource;
use crate::Result;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How a playback ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// The audio played to the end
    Finished,
    /// `stop()` was called before the end
    Stopped,
}

/// A live playback
pub trait PlaybackHandle: Send + Sync {
    /// Block until the audio ends, fails, or is stopped
    fn wait(&self) -> Result<PlaybackEnd>;

    /// Stop playback; `wait()` then returns `Stopped`
    fn stop(&self);
}

/// Audio device backend
pub trait AudioOutput: Send + Sync {
    /// Begin playing `resource`
    ///
    /// Fails with `TtsError::Playback` if the device or decoder rejects it.
    fn start(&self, resource: AudioResource) -> Result<Box<dyn PlaybackHandle>>;
}

struct ActivePlayback {
    id: u64,
    handle: Arc<dyn PlaybackHandle>,
}

/// Owns the one playback slot
pub struct AudioPlayer {
    output: Box<dyn AudioOutput>,
    current: Mutex<Option<ActivePlayback>>,
    next_id: AtomicU64,
}

impl AudioPlayer {
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        Self {
            output,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ActivePlayback>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Play `resource`, blocking until it finishes
    ///
    /// Any playback already in progress is stopped first. Being stopped by
    /// a later `stop()` or `play()` is a silent cancellation and returns Ok.
    pub fn play(&self, resource: AudioResource) -> Result<()> {
        let (id, handle) = {
            let mut slot = self.slot();
            if let Some(previous) = slot.take() {
                debug!("Stopping playback {} before starting a new one", previous.id);
                previous.handle.stop();
            }

            let handle: Arc<dyn PlaybackHandle> = Arc::from(self.output.start(resource)?);
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            *slot = Some(ActivePlayback {
                id,
                handle: Arc::clone(&handle),
            });
            (id, handle)
        };

        debug!("Playback {} started", id);
        let outcome = handle.wait();
        self.release(id);

        match outcome {
            Ok(PlaybackEnd::Finished) => {
                debug!("Playback {} finished", id);
                Ok(())
            }
            Ok(PlaybackEnd::Stopped) => {
                debug!("Playback {} was stopped", id);
                Ok(())
            }
            Err(e) => {
                debug!("Playback {} failed: {}", id, e);
                Err(e)
            }
        }
    }

    /// Stop the current playback, if any
    pub fn stop(&self) {
        if let Some(active) = self.slot().take() {
            debug!("Stopping playback {}", active.id);
            active.handle.stop();
        }
    }

    /// Whether a playback currently occupies the slot
    pub fn is_playing(&self) -> bool {
        self.slot().is_some()
    }

    /// Free the slot if it still holds playback `id`
    fn release(&self, id: u64) {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|active| active.id == id) {
            *slot = None;
        }
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
