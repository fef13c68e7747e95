//! Error taxonomy shared by the text and voice datasources.
//!
//! The server reports failures as `{"error":{"code","message"}}`. The code is
//! classified into a [`W3wError`] variant by [`W3wError::from_code`], which is
//! total: unknown codes land in [`W3wError::Unknown`] with the original code
//! and message preserved.

use std::fmt;

use thiserror::Error;

/// Machine code plus human-readable message, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

pub const NETWORK_ERROR_CODE: &str = "NetworkError";
pub const UNKNOWN_ERROR_CODE: &str = "UnknownError";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum W3wError {
    #[error("{0}")]
    BadCoordinates(ApiError),
    #[error("{0}")]
    BadLanguage(ApiError),
    #[error("{0}")]
    BadWords(ApiError),
    #[error("{0}")]
    BadInput(ApiError),
    #[error("{0}")]
    BadNResults(ApiError),
    #[error("{0}")]
    BadNFocusResults(ApiError),
    #[error("{0}")]
    BadFocus(ApiError),
    #[error("{0}")]
    BadClipToCircle(ApiError),
    #[error("{0}")]
    BadClipToBoundingBox(ApiError),
    #[error("{0}")]
    BadClipToCountry(ApiError),
    #[error("{0}")]
    BadClipToPolygon(ApiError),
    #[error("{0}")]
    BadInputType(ApiError),
    #[error("{0}")]
    BadBoundingBox(ApiError),
    #[error("{0}")]
    BadBoundingBoxTooBig(ApiError),
    #[error("{0}")]
    InternalServerError(ApiError),
    #[error("{0}")]
    InvalidKey(ApiError),
    #[error("{0}")]
    SuspendedKey(ApiError),
    #[error("{0}")]
    InvalidApiVersion(ApiError),
    #[error("{0}")]
    InvalidReferrer(ApiError),
    #[error("{0}")]
    InvalidIpAddress(ApiError),
    #[error("{0}")]
    InvalidAppCredentials(ApiError),
    #[error("{0}")]
    QuotaExceeded(ApiError),
    #[error("{0}")]
    SdkError(ApiError),

    /// Transport failure: DNS, connect, TLS, timeout, reset.
    #[error("{0}")]
    Network(ApiError),

    /// Unrecognized code, undecodable payload, or a guaranteed field missing.
    #[error("{0}")]
    Unknown(ApiError),

    /// Server-side speech recognition failure reported by an `Error` voice message.
    #[error("streaming error ({kind}): {reason}")]
    Streaming {
        kind: String,
        code: Option<i32>,
        reason: String,
    },

    /// The voice socket failed or was closed by the peer.
    #[error("connection error: {0}")]
    Connection(ApiError),
}

/// Coarse grouping of [`W3wError`] kinds by how a caller can recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed caller input; fix the request.
    Validation,
    /// Key or app credentials rejected; needs operator action.
    Authorization,
    Quota,
    /// Retry after a delay.
    Server,
    /// Retry immediately or with backoff.
    Transport,
    Unknown,
}

impl W3wError {
    /// Map a wire `{code, message}` pair to its error kind. Never fails.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let payload = ApiError::new(code, message);
        match code {
            "BadCoordinates" => W3wError::BadCoordinates(payload),
            "BadLanguage" => W3wError::BadLanguage(payload),
            "BadWords" => W3wError::BadWords(payload),
            "BadInput" => W3wError::BadInput(payload),
            "BadNResults" => W3wError::BadNResults(payload),
            "BadNFocusResults" => W3wError::BadNFocusResults(payload),
            "BadFocus" => W3wError::BadFocus(payload),
            "BadClipToCircle" => W3wError::BadClipToCircle(payload),
            "BadClipToBoundingBox" => W3wError::BadClipToBoundingBox(payload),
            "BadClipToCountry" => W3wError::BadClipToCountry(payload),
            "BadClipToPolygon" => W3wError::BadClipToPolygon(payload),
            "BadInputType" => W3wError::BadInputType(payload),
            "BadBoundingBox" => W3wError::BadBoundingBox(payload),
            "BadBoundingBoxTooBig" => W3wError::BadBoundingBoxTooBig(payload),
            "InternalServerError" => W3wError::InternalServerError(payload),
            "InvalidKey" => W3wError::InvalidKey(payload),
            "SuspendedKey" => W3wError::SuspendedKey(payload),
            "InvalidApiVersion" => W3wError::InvalidApiVersion(payload),
            "InvalidReferrer" => W3wError::InvalidReferrer(payload),
            "InvalidIpAddress" => W3wError::InvalidIpAddress(payload),
            "InvalidAppCredentials" => W3wError::InvalidAppCredentials(payload),
            "QuotaExceeded" => W3wError::QuotaExceeded(payload),
            "SdkError" => W3wError::SdkError(payload),
            NETWORK_ERROR_CODE => W3wError::Network(payload),
            _ => W3wError::Unknown(payload),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        W3wError::Network(ApiError::new(NETWORK_ERROR_CODE, message))
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        W3wError::Unknown(ApiError::new(UNKNOWN_ERROR_CODE, message))
    }

    /// Machine code of this error. Streaming errors report their `type`.
    pub fn code(&self) -> &str {
        match self {
            W3wError::Streaming { kind, .. } => kind,
            other => other.payload().map_or("", |p| p.code.as_str()),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            W3wError::Streaming { reason, .. } => reason,
            other => other.payload().map_or("", |p| p.message.as_str()),
        }
    }

    fn payload(&self) -> Option<&ApiError> {
        use W3wError::*;
        match self {
            BadCoordinates(p) | BadLanguage(p) | BadWords(p) | BadInput(p) | BadNResults(p)
            | BadNFocusResults(p) | BadFocus(p) | BadClipToCircle(p) | BadClipToBoundingBox(p)
            | BadClipToCountry(p) | BadClipToPolygon(p) | BadInputType(p) | BadBoundingBox(p)
            | BadBoundingBoxTooBig(p) | InternalServerError(p) | InvalidKey(p)
            | SuspendedKey(p) | InvalidApiVersion(p) | InvalidReferrer(p)
            | InvalidIpAddress(p) | InvalidAppCredentials(p) | QuotaExceeded(p) | SdkError(p)
            | Network(p) | Unknown(p) | Connection(p) => Some(p),
            Streaming { .. } => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        use W3wError::*;
        match self {
            BadCoordinates(_) | BadLanguage(_) | BadWords(_) | BadInput(_) | BadNResults(_)
            | BadNFocusResults(_) | BadFocus(_) | BadClipToCircle(_) | BadClipToBoundingBox(_)
            | BadClipToCountry(_) | BadClipToPolygon(_) | BadInputType(_) | BadBoundingBox(_)
            | BadBoundingBoxTooBig(_) => ErrorCategory::Validation,
            InvalidKey(_) | SuspendedKey(_) | InvalidApiVersion(_) | InvalidReferrer(_)
            | InvalidIpAddress(_) | InvalidAppCredentials(_) => ErrorCategory::Authorization,
            QuotaExceeded(_) => ErrorCategory::Quota,
            InternalServerError(_) | SdkError(_) | Streaming { .. } => ErrorCategory::Server,
            Network(_) | Connection(_) => ErrorCategory::Transport,
            Unknown(_) => ErrorCategory::Unknown,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Server | ErrorCategory::Transport
        )
    }
}

pub type W3wResult<T> = Result<T, W3wError>;

/// Misuse of the voice client's lifecycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceClientError {
    #[error("voice client is not initialized; call initialize() first")]
    NotInitialized,
    #[error("invalid voice endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("voice client needs a Tokio runtime")]
    NoRuntime,
}
