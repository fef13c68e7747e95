//! Voice API datasource.
//!
//! Audio goes up a WebSocket as raw PCM; one list of suggestions (or one
//! error) comes back per session. See [`VoiceClient`] for the lifecycle.

mod audio;
mod client;
mod datasource;
mod protocol;
mod state_machine;

pub use audio::{AudioEncoding, AudioSource, AudioStream, AudioStreamConfig};
pub use client::{voice_url, StatusCallback, VoiceClient};
pub use datasource::{VoiceDataSource, TERMINATED_BY_USER, VOICE_LANGUAGES};
pub use protocol::{close_error, pcm_frame, NORMAL_CLOSE, VOICE_API_VERSION};
pub use state_machine::{State, ABORTED_BY_NEW_REQUEST};
