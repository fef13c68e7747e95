use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_TEXT_ENDPOINT: &str = "https://api.what3words.com/v3/";
pub const DEFAULT_VOICE_HOST: &str = "voiceapi.what3words.com";
pub const API_KEY_ENV: &str = "W3W_API_KEY";

/// Identity of the calling app, sent so keys restricted to an app are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub package_name: String,
    /// Colon-separated upper-case SHA-1 of the signing certificate,
    /// see [`crate::helpers::signature_digest`].
    pub certificate_digest: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_key: String,

    /// Base URL for the text API; operation paths are appended to it.
    pub text_endpoint: String,

    /// Host of the voice API; the socket URL is `wss://{voice_host}/v1/...`.
    /// A value carrying its own scheme (`ws://127.0.0.1:9000`) is used as-is.
    pub voice_host: String,

    /// Extra headers merged into every text request. These override defaults.
    pub headers: HashMap<String, String>,

    pub app_identity: Option<AppIdentity>,

    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            text_endpoint: DEFAULT_TEXT_ENDPOINT.to_string(),
            voice_host: DEFAULT_VOICE_HOST.to_string(),
            headers: HashMap::new(),
            app_identity: None,
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Config from `W3W_API_KEY`, loading `.env` first if one exists.
    /// Returns `None` when the key is unset or empty.
    pub fn from_env() -> Option<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }

    pub fn with_text_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.text_endpoint = endpoint.into();
        self
    }

    pub fn with_voice_host(mut self, host: impl Into<String>) -> Self {
        self.voice_host = host.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_app_identity(mut self, identity: AppIdentity) -> Self {
        self.app_identity = Some(identity);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
