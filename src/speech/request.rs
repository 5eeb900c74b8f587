//! Single synthesis request with a hard timeout
//!
//! The executor makes exactly one attempt. It does not retry and it never
//! touches playback; those belong to the retry orchestrator and the player.

use super::language::{LanguageDetector, ServerDetects};
use crate::messages::http_error_message;
use crate::settings::Settings;
use crate::{Result, TtsError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Request body sent to the synthesis API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisRequest {
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Successful synthesis payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisResponse {
    /// Audio bytes served directly as `audio/*` or `application/octet-stream`
    Raw { bytes: Vec<u8>, content_type: String },

    /// JSON body carrying base64 audio and its format tag (e.g. "wav")
    Base64 { audio: String, format: String },
}

/// JSON form of a successful reply
#[derive(Debug, Deserialize)]
struct EncodedAudio {
    audio: String,
    #[serde(rename = "audioFormat")]
    audio_format: String,
}

/// JSON form of an error reply: `{ "error": { "message": "..." } }`
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Status, content type and body of an HTTP reply, before interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Cancellation flag shared with an in-flight request
///
/// Set by the executor when the attempt's timeout fires. Transports check
/// it and give up early; anything they return afterwards is dropped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Network layer that delivers one request to the synthesis endpoint
pub trait Transport: Send + Sync {
    /// POST `request` as JSON to `url` and return the raw reply
    ///
    /// `timeout` is the attempt's budget. Implementations must return soon
    /// after it expires or once `cancel` is set: the executor waits for
    /// `post` to return before the next attempt can start.
    fn post(
        &self,
        url: &str,
        request: &SynthesisRequest,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<RawResponse>;
}

/// Issues one synthesis request and interprets the reply
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    language: Arc<dyn LanguageDetector>,
}

impl RequestExecutor {
    /// Create an executor over the given transport
    ///
    /// Language detection is left to the server until a detector is set.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            language: Arc::new(ServerDetects),
        }
    }

    /// Use a language classifier to fill the request's `language` field
    pub fn with_language_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.language = detector;
        self
    }

    /// Build a fresh request body for `text`
    pub fn build_request(&self, text: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: text.to_string(),
            language: self.language.detect(text),
        }
    }

    /// Make one attempt to synthesize `text`
    ///
    /// Fails with `Timeout` if no reply arrives within `settings.timeout_ms`,
    /// `Http` for non-success statuses, `Transport` for network failures and
    /// `Decode` when a success body cannot be understood.
    pub fn execute(&self, text: &str, settings: &Settings) -> Result<SynthesisResponse> {
        let request = self.build_request(text);
        let raw = self.dispatch(request, &settings.endpoint_url, settings.timeout())?;
        interpret(raw)
    }

    /// Run the transport on a worker thread and wait at most `timeout`
    ///
    /// On timeout the in-flight call is cancelled and the worker is joined
    /// before returning, so attempts never overlap.
    fn dispatch(&self, request: SynthesisRequest, url: &str, timeout: Duration) -> Result<RawResponse> {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();

        let transport = Arc::clone(&self.transport);
        let worker_cancel = cancel.clone();
        let url = url.to_string();

        debug!("POST {} ({} chars, timeout {:?})", url, request.text.len(), timeout);

        let worker = thread::Builder::new()
            .name("sermo-request".to_string())
            .spawn(move || {
                let result = transport.post(&url, &request, timeout, &worker_cancel);
                if worker_cancel.is_cancelled() {
                    debug!("Discarding reply that arrived after timeout");
                    return;
                }
                // Receiver may already be gone if the timeout raced us
                let _ = tx.send(result);
            })
            .map_err(|e| TtsError::Transport(format!("Failed to start request: {}", e)))?;

        let outcome = match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                warn!("Request to synthesis API timed out after {:?}", timeout);
                Err(TtsError::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(TtsError::Transport("Request worker exited unexpectedly".to_string()))
            }
        };

        let started = Instant::now();
        if worker.join().is_err() {
            warn!("Request worker panicked");
        }
        if cancel.is_cancelled() {
            debug!("Cancelled request wound down after {:?}", started.elapsed());
        }

        outcome
    }
}

/// Turn a raw reply into a synthesis payload or a typed error
///
/// Success bodies typed `audio/*` or `application/octet-stream` are raw
/// audio; anything else must be the JSON `{audio, audioFormat}` form.
pub fn interpret(raw: RawResponse) -> Result<SynthesisResponse> {
    if !(200..300).contains(&raw.status) {
        return Err(http_error(raw.status, &raw.body));
    }

    if let Some(content_type) = raw.content_type.as_deref() {
        let mime = content_type.split(';').next().unwrap_or("").trim();
        if mime.starts_with("audio/") || mime == "application/octet-stream" {
            debug!("Received {} bytes of {}", raw.body.len(), mime);
            return Ok(SynthesisResponse::Raw {
                bytes: raw.body,
                content_type: mime.to_string(),
            });
        }
    }

    let encoded: EncodedAudio = serde_json::from_slice(&raw.body)
        .map_err(|e| TtsError::Decode(format!("Malformed synthesis response: {}", e)))?;

    debug!(
        "Received {} base64 chars of {} audio",
        encoded.audio.len(),
        encoded.audio_format
    );

    Ok(SynthesisResponse::Base64 {
        audio: encoded.audio,
        format: encoded.audio_format,
    })
}

/// Build the error for a non-success status
///
/// Prefers the server's own message; falls back to the status table with
/// the numeric status appended.
pub fn http_error(status: u16, body: &[u8]) -> TtsError {
    let server_message = serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty());

    let message = match server_message {
        Some(message) => message,
        None => format!("{} ({})", http_error_message(status), status),
    };

    debug!("HTTP {}: {}", status, message);
    TtsError::Http { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::language::FixedLanguage;
    use crate::speech::retry::RetryOrchestrator;
    use std::sync::atomic::AtomicUsize;

    fn raw(status: u16, content_type: Option<&str>, body: &[u8]) -> RawResponse {
        RawResponse {
            status,
            content_type: content_type.map(str::to_string),
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_request_body_omits_missing_language() {
        let request = SynthesisRequest {
            text: "Hello".to_string(),
            language: None,
        };
        assert_eq!(serde_json::to_string(&request).unwrap(), r#"{"text":"Hello"}"#);

        let request = SynthesisRequest {
            text: "Hallo".to_string(),
            language: Some("de".to_string()),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"text":"Hallo","language":"de"}"#
        );
    }

    #[test]
    fn test_interpret_base64_payload() {
        let body = br#"{"audio":"UklGRg==","audioFormat":"wav"}"#;
        let response = interpret(raw(200, Some("application/json"), body)).unwrap();
        assert_eq!(
            response,
            SynthesisResponse::Base64 {
                audio: "UklGRg==".to_string(),
                format: "wav".to_string(),
            }
        );
    }

    #[test]
    fn test_interpret_raw_audio() {
        let response = interpret(raw(200, Some("audio/mpeg; charset=binary"), b"ID3")).unwrap();
        assert_eq!(
            response,
            SynthesisResponse::Raw {
                bytes: b"ID3".to_vec(),
                content_type: "audio/mpeg".to_string(),
            }
        );
    }

    #[test]
    fn test_interpret_octet_stream_as_raw() {
        let response = interpret(raw(200, Some("application/octet-stream"), b"OggS")).unwrap();
        assert_eq!(
            response,
            SynthesisResponse::Raw {
                bytes: b"OggS".to_vec(),
                content_type: "application/octet-stream".to_string(),
            }
        );
    }

    #[test]
    fn test_interpret_malformed_success_body() {
        let err = interpret(raw(200, Some("application/json"), b"<html>")).unwrap_err();
        assert!(matches!(err, TtsError::Decode(_)));
    }

    #[test]
    fn test_server_error_message_wins() {
        let body = br#"{"error":{"message":"Voice model not loaded"}}"#;
        let err = http_error(500, body);
        assert_eq!(err.to_string(), "Voice model not loaded");
    }

    #[test]
    fn test_status_table_fallback() {
        let err = http_error(404, b"");
        assert!(err.to_string().contains("not found"));

        let err = http_error(429, b"{}");
        assert!(err.to_string().contains("rate limited"));

        let err = http_error(500, b"Internal Server Error");
        assert!(err.to_string().contains("500"));

        let err = http_error(418, br#"{"error":{}}"#);
        assert_eq!(err.to_string(), "Request failed (418)");
    }

    struct SlowTransport {
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Transport for SlowTransport {
        fn post(
            &self,
            _url: &str,
            _request: &SynthesisRequest,
            _timeout: Duration,
            _cancel: &CancelToken,
        ) -> Result<RawResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            Ok(raw(200, Some("audio/wav"), b"RIFF"))
        }
    }

    #[test]
    fn test_timeout_discards_late_reply() {
        let transport = Arc::new(SlowTransport {
            delay: Duration::from_millis(300),
            calls: AtomicUsize::new(0),
        });
        let executor = RequestExecutor::new(transport.clone());
        let settings = Settings {
            timeout_ms: 20,
            ..Settings::default()
        };

        let err = executor.execute("Hello", &settings).unwrap_err();
        assert!(matches!(err, TtsError::Timeout));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    /// Ignores cancellation and records how many calls overlap
    struct StubbornTransport {
        delay: Duration,
        live: AtomicUsize,
        max_live: AtomicUsize,
    }

    impl Transport for StubbornTransport {
        fn post(
            &self,
            _url: &str,
            _request: &SynthesisRequest,
            _timeout: Duration,
            _cancel: &CancelToken,
        ) -> Result<RawResponse> {
            let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_live.fetch_max(live, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.live.fetch_sub(1, Ordering::SeqCst);
            Ok(raw(200, Some("audio/wav"), b"RIFF"))
        }
    }

    #[test]
    fn test_timed_out_attempts_never_overlap() {
        let transport = Arc::new(StubbornTransport {
            delay: Duration::from_millis(300),
            live: AtomicUsize::new(0),
            max_live: AtomicUsize::new(0),
        });
        let retry = RetryOrchestrator::new(RequestExecutor::new(transport.clone()), Arc::new(|_: &str| {}))
            .with_delay_base(Duration::from_millis(10));
        let settings = Settings {
            timeout_ms: 50,
            max_retries: 3,
            ..Settings::default()
        };

        let err = retry.run("Hello", &settings).unwrap_err();

        assert_eq!(err.to_string(), "Failed after multiple attempts: Request timed out");
        assert_eq!(transport.max_live.load(Ordering::SeqCst), 1);
        assert_eq!(transport.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reply_within_timeout() {
        let transport = Arc::new(SlowTransport {
            delay: Duration::from_millis(0),
            calls: AtomicUsize::new(0),
        });
        let executor = RequestExecutor::new(transport);

        let response = executor.execute("Hello", &Settings::default()).unwrap();
        assert!(matches!(response, SynthesisResponse::Raw { .. }));
    }

    #[test]
    fn test_language_detector_fills_request() {
        let executor = RequestExecutor::new(Arc::new(SlowTransport {
            delay: Duration::from_millis(0),
            calls: AtomicUsize::new(0),
        }))
        .with_language_detector(Arc::new(FixedLanguage("fr".to_string())));

        let request = executor.build_request("Bonjour");
        assert_eq!(request.language.as_deref(), Some("fr"));
    }
}
