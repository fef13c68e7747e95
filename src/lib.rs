//! Client library for the what3words text and voice APIs.
//!
//! - [`TextDataSource`]: HTTP operations (convert, autosuggest, grid section, languages)
//! - [`VoiceDataSource`] / [`VoiceClient`]: speech-to-address over a WebSocket
//! - [`AutosuggestHelper`]: debounced autosuggest for text fields
//!
//! Every operation returns a [`W3wResult`]; the library logs through the
//! `log` facade and never installs a logger itself.

pub mod api_string;
pub mod config;
pub mod error;
pub mod helpers;
pub mod text;
pub mod types;
pub mod voice;

pub use config::{AppIdentity, ClientConfig};
pub use error::{ApiError, ErrorCategory, VoiceClientError, W3wError, W3wResult};
pub use helpers::AutosuggestHelper;
pub use text::{TextApi, TextDataSource};
pub use types::{
    Address, AutosuggestOptions, Circle, Coordinates, Country, Distance, GridSection, InputType,
    Language, Line, Polygon, ProprietaryLanguage, Rectangle, Rfc5646Language, SourceApi,
    Suggestion,
};
pub use voice::{AudioSource, AudioStream, AudioStreamConfig, VoiceClient, VoiceDataSource};
