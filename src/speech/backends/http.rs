//! HTTP transport using reqwest
//!
//! Sends the synthesis request as a JSON POST. The per-request timeout is
//! passed through to reqwest so the worker thread does not linger long
//! after the executor has given up on it.

use crate::speech::request::{CancelToken, RawResponse, SynthesisRequest, Transport};
use crate::{Result, TtsError};
use log::debug;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Blocking HTTP transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with a fresh connection pool
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sermo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TtsError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        debug!("HTTP transport created");
        Ok(Self { client })
    }

    fn map_error(e: reqwest::Error) -> TtsError {
        if e.is_timeout() {
            TtsError::Timeout
        } else if e.is_connect() {
            TtsError::Transport(format!("Could not connect to synthesis API: {}", e))
        } else {
            TtsError::Transport(e.to_string())
        }
    }
}

impl Transport for HttpTransport {
    fn post(
        &self,
        url: &str,
        request: &SynthesisRequest,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<RawResponse> {
        if cancel.is_cancelled() {
            return Err(TtsError::Timeout);
        }

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(request)
            .send()
            .map_err(Self::map_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        debug!("HTTP {} ({:?})", status, content_type);

        if cancel.is_cancelled() {
            return Err(TtsError::Timeout);
        }

        let body = response.bytes().map_err(Self::map_error)?.to_vec();

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
