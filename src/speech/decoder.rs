//! Synthesis response decoding
//!
//! Pure and synchronous: turns a response payload into bytes plus a MIME
//! type that an audio output can play.

use super::request::SynthesisResponse;
use crate::{Result, TtsError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;

/// Playable audio held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioResource {
    bytes: Vec<u8>,
    mime_type: String,
}

impl AudioResource {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Convert a synthesis response into an audio resource
pub fn decode(response: SynthesisResponse) -> Result<AudioResource> {
    let resource = match response {
        SynthesisResponse::Raw {
            bytes,
            content_type,
        } => AudioResource::new(bytes, content_type),
        SynthesisResponse::Base64 { audio, format } => {
            // Line-wrapped base64 is common; strip whitespace before decoding
            let compact: String = audio.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            let bytes = STANDARD
                .decode(compact.as_bytes())
                .map_err(|e| TtsError::Decode(format!("Invalid base64 audio: {}", e)))?;
            AudioResource::new(bytes, format!("audio/{}", format.trim()))
        }
    };

    if resource.is_empty() {
        return Err(TtsError::Decode("Audio payload is empty".to_string()));
    }

    debug!(
        "Decoded {} bytes of {}",
        resource.len(),
        resource.mime_type()
    );
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_round_trip() {
        let original = b"RIFF\x24\x00\x00\x00WAVEfmt \x10\x00\x00\x00".to_vec();
        let response = SynthesisResponse::Base64 {
            audio: STANDARD.encode(&original),
            format: "wav".to_string(),
        };

        let resource = decode(response).unwrap();
        assert_eq!(resource.bytes(), original.as_slice());
        assert_eq!(resource.mime_type(), "audio/wav");
    }

    #[test]
    fn test_wrapped_base64() {
        let response = SynthesisResponse::Base64 {
            audio: "UklG\nRg==\n".to_string(),
            format: "wav".to_string(),
        };
        assert_eq!(decode(response).unwrap().bytes(), b"RIFF");
    }

    #[test]
    fn test_raw_bytes_keep_content_type() {
        let response = SynthesisResponse::Raw {
            bytes: b"OggS".to_vec(),
            content_type: "audio/ogg".to_string(),
        };

        let resource = decode(response).unwrap();
        assert_eq!(resource.mime_type(), "audio/ogg");
        assert_eq!(resource.into_bytes(), b"OggS".to_vec());
    }

    #[test]
    fn test_malformed_base64() {
        let response = SynthesisResponse::Base64 {
            audio: "not*base64!".to_string(),
            format: "wav".to_string(),
        };
        assert!(matches!(decode(response), Err(TtsError::Decode(_))));
    }

    #[test]
    fn test_empty_audio() {
        let response = SynthesisResponse::Base64 {
            audio: String::new(),
            format: "wav".to_string(),
        };
        assert!(matches!(decode(response), Err(TtsError::Decode(_))));
    }
}
