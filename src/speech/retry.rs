//! Bounded retry around the request executor
//!
//! Attempts run strictly one after another. After a failed attempt `k`
//! (when more attempts remain) a progress notice is emitted and the loop
//! waits `RETRY_DELAY_BASE * k` before the next one.

use super::request::{RequestExecutor, SynthesisResponse};
use super::Notifier;
use crate::messages::{retry_notice, RETRY_DELAY_BASE};
use crate::settings::Settings;
use crate::{Result, TtsError};
use log::{debug, error, warn};
use std::sync::Arc;
use std::time::Duration;

/// Function used to wait between attempts
pub type Sleeper = Box<dyn Fn(Duration) + Send + Sync>;

/// Drives up to `max_retries` attempts of the executor
pub struct RetryOrchestrator {
    executor: RequestExecutor,
    notifier: Arc<dyn Notifier>,
    delay_base: Duration,
    sleep: Sleeper,
}

impl RetryOrchestrator {
    pub fn new(executor: RequestExecutor, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            executor,
            notifier,
            delay_base: RETRY_DELAY_BASE,
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Override the backoff base (default one second)
    pub fn with_delay_base(mut self, delay_base: Duration) -> Self {
        self.delay_base = delay_base;
        self
    }

    /// Replace the function used to wait between attempts
    pub fn with_sleeper(mut self, sleep: Sleeper) -> Self {
        self.sleep = sleep;
        self
    }

    /// Wait that follows failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay_base * attempt
    }

    /// Synthesize `text`, retrying failed attempts
    ///
    /// With `max_retries == 0` no request is made and the result is
    /// `RetriesExhausted(None)`. Otherwise the final failure wraps the last
    /// attempt's error.
    pub fn run(&self, text: &str, settings: &Settings) -> Result<SynthesisResponse> {
        let max_retries = settings.max_retries;

        for attempt in 1..=max_retries {
            debug!("Synthesis attempt {}/{}", attempt, max_retries);

            let err = match self.executor.execute(text, settings) {
                Ok(response) => {
                    debug!("Attempt {} succeeded", attempt);
                    return Ok(response);
                }
                Err(e) => e,
            };

            if attempt == max_retries {
                error!("Giving up after {} attempts: {}", attempt, err);
                return Err(TtsError::RetriesExhausted(Some(Box::new(err))));
            }

            warn!("Attempt {}/{} failed: {}", attempt, max_retries, err);
            self.notifier.notify(&retry_notice(attempt, max_retries));
            (self.sleep)(self.backoff(attempt));
        }

        debug!("No attempts allowed (max_retries = 0)");
        Err(TtsError::RetriesExhausted(None))
    }
}
