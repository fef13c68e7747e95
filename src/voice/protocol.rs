//! Voice API wire protocol.
//!
//! # Protocol Overview
//!
//! 1. Connect to `wss://{host}/v1/autosuggest[-with-coordinates]?{options}&voice-language=..&key=..`
//! 2. Send `StartRecognition` with the audio format
//! 3. Receive `RecognitionStarted`, then stream binary little-endian PCM frames
//! 4. Receive exactly one of `Suggestions`, `Error` or `W3WError`
//!
//! The server may instead close the socket with a JSON `{code,message}`
//! payload in the close reason.

use serde::{Deserialize, Serialize};

use super::audio::AudioStreamConfig;
use crate::api_string::ToApiString;
use crate::error::{ApiError, W3wError, NETWORK_ERROR_CODE};
use crate::text::{ErrorDetail, SuggestionDto};

pub const VOICE_API_VERSION: &str = "v1";

/// Close code used for every client-initiated shutdown.
pub const NORMAL_CLOSE: u16 = 1000;

/// Reported when the stream ends without a close frame.
pub const ABNORMAL_CLOSE: u16 = 1006;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioFormat {
    #[serde(rename = "type")]
    pub format_type: &'static str,
    pub encoding: String,
    pub sample_rate: u32,
}

// ============================================================================
// Client Messages (sent TO the voice API)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "message")]
pub enum ClientMessage {
    StartRecognition { audio_format: AudioFormat },
}

impl ClientMessage {
    pub fn start_recognition(config: &AudioStreamConfig) -> Self {
        Self::StartRecognition {
            audio_format: AudioFormat {
                format_type: "raw",
                encoding: config.encoding.to_api_string(),
                sample_rate: config.sample_rate,
            },
        }
    }
}

// ============================================================================
// Server Messages (received FROM the voice API)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "message")]
pub enum ServerMessage {
    /// The recognizer is ready; audio may flow.
    RecognitionStarted,

    Suggestions {
        #[serde(default)]
        suggestions: Vec<SuggestionDto>,
    },

    /// Speech recognition failed server side.
    Error {
        #[serde(rename = "type", default)]
        kind: String,
        #[serde(default)]
        code: Option<i32>,
        #[serde(default)]
        reason: String,
    },

    /// A what3words API error, classified like text API errors.
    #[serde(rename = "W3WError")]
    W3wError { error: ErrorDetail },

    #[serde(other)]
    Unknown,
}

/// JSON payload some servers put in the close reason.
#[derive(Debug, Deserialize)]
struct CloseReason {
    code: String,
    #[serde(default)]
    message: String,
}

/// Error reported for a close the client did not ask for.
///
/// A non-normal close whose reason parses as `{code,message}` keeps that code;
/// everything else is a network error carrying the raw reason.
pub fn close_error(code: u16, reason: &str) -> W3wError {
    if code != NORMAL_CLOSE && !reason.is_empty() {
        if let Ok(parsed) = serde_json::from_str::<CloseReason>(reason) {
            return W3wError::Connection(ApiError::new(parsed.code, parsed.message));
        }
    }
    let message = if reason.is_empty() {
        format!("socket closed with code {}", code)
    } else {
        reason.to_string()
    };
    W3wError::Connection(ApiError::new(NETWORK_ERROR_CODE, message))
}

/// Binary frame for a buffer of samples: 16-bit little-endian.
pub fn pcm_frame(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
