use std::collections::HashSet;

use super::audio::AudioSource;
use super::client::VoiceClient;
use super::protocol::VOICE_API_VERSION;
use super::state_machine::State;
use crate::config::ClientConfig;
use crate::error::{VoiceClientError, W3wResult};
use crate::types::{AutosuggestOptions, Language, Rfc5646Language, Suggestion};

pub const TERMINATED_BY_USER: &str = "Terminated by user";

/// Languages the voice recognizer accepts.
pub const VOICE_LANGUAGES: [Rfc5646Language; 13] = [
    Rfc5646Language::Ar,
    Rfc5646Language::ZhHans,
    Rfc5646Language::De,
    Rfc5646Language::EnAu,
    Rfc5646Language::EnCa,
    Rfc5646Language::EnGb,
    Rfc5646Language::EnIn,
    Rfc5646Language::EnUs,
    Rfc5646Language::EsEs,
    Rfc5646Language::EsMx,
    Rfc5646Language::Hi,
    Rfc5646Language::Ja,
    Rfc5646Language::Ko,
];

/// Speech-to-address autosuggest over a single [`VoiceClient`].
pub struct VoiceDataSource {
    client: VoiceClient,
}

impl VoiceDataSource {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: VoiceClient::new(config),
        }
    }

    pub fn library_version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn api_version() -> &'static str {
        VOICE_API_VERSION
    }

    /// Recognize speech from `audio` and report matching addresses once.
    ///
    /// Any session still running on this datasource is aborted first.
    pub fn autosuggest(
        &mut self,
        audio: impl AudioSource,
        language: &Language,
        options: Option<&AutosuggestOptions>,
        on_result: impl FnOnce(W3wResult<Vec<Suggestion>>) + Send + 'static,
    ) -> Result<(), VoiceClientError> {
        self.client
            .initialize(language, options, audio)?
            .open_and_start_recognition(on_result)
    }

    /// Stop the running session, if any. Its callback is not invoked.
    pub fn terminate(&mut self) {
        if let Err(e) = self.client.close(TERMINATED_BY_USER) {
            log::debug!("Nothing to terminate: {}", e);
        }
    }

    pub fn available_languages(&self) -> HashSet<Rfc5646Language> {
        VOICE_LANGUAGES.into_iter().collect()
    }

    pub fn state(&self) -> State {
        self.client.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_languages_are_the_voice_set() {
        let source = VoiceDataSource::new(&ClientConfig::new("KEY"));
        let languages = source.available_languages();

        assert_eq!(languages.len(), 13);
        assert!(languages.contains(&Rfc5646Language::ZhHans));
        assert!(languages.contains(&Rfc5646Language::EnGb));
        assert!(!languages.contains(&Rfc5646Language::FrFr));
    }

    #[test]
    fn terminate_before_autosuggest_is_harmless() {
        let mut source = VoiceDataSource::new(&ClientConfig::new("KEY"));
        source.terminate();
        assert_eq!(source.state(), State::Idle);
    }

    #[test]
    fn versions() {
        assert_eq!(VoiceDataSource::api_version(), "v1");
        assert!(!VoiceDataSource::library_version().is_empty());
    }
}
