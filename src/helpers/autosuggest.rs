//! Autosuggest-as-you-type.
//!
//! Each keystroke calls [`AutosuggestHelper::update`]. Input is checked
//! against the three word address patterns, the previous pending query is
//! cancelled, and the new one fires after [`DEBOUNCE`] unless it is itself
//! superseded first. Only the latest query ever reaches a callback.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::pattern::{did_you_mean_3wa, is_possible_3wa, reformat_3wa};
use crate::error::W3wError;
use crate::text::TextApi;
use crate::types::{AutosuggestOptions, SourceApi, Suggestion};

/// Quiet period after the last keystroke before a query is sent.
pub const DEBOUNCE: Duration = Duration::from_millis(250);

pub type OnSuggestion = Box<dyn FnOnce(Suggestion) + Send + 'static>;
pub type OnError = Box<dyn FnOnce(W3wError) + Send + 'static>;

/// What `update` decided to do with the raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Query {
    /// Send as typed.
    Exact(String),
    /// Reformatted from loose delimiters; report only an exact match.
    DidYouMean(String),
    /// Nothing address-like; answer with an empty list.
    None,
}

fn classify_input(text: &str, allow_flexible_delimiters: bool) -> Query {
    if is_possible_3wa(text) {
        Query::Exact(text.to_string())
    } else if did_you_mean_3wa(text) {
        let reformatted = reformat_3wa(text);
        if allow_flexible_delimiters {
            Query::Exact(reformatted)
        } else {
            Query::DidYouMean(reformatted)
        }
    } else {
        Query::None
    }
}

fn same_words(a: &str, b: &str) -> bool {
    a.trim_start_matches('/').to_lowercase() == b.trim_start_matches('/').to_lowercase()
}

/// Queries run on spawned tasks, so the helper must be used from within a
/// Tokio runtime.
pub struct AutosuggestHelper {
    api: Arc<dyn TextApi>,
    options: Option<AutosuggestOptions>,
    allow_flexible_delimiters: bool,
    pending: Option<CancellationToken>,
}

impl AutosuggestHelper {
    pub fn new(api: Arc<dyn TextApi>) -> Self {
        Self {
            api,
            options: None,
            allow_flexible_delimiters: false,
            pending: None,
        }
    }

    /// Options applied to every subsequent query and selection report.
    pub fn options(&mut self, options: AutosuggestOptions) -> &mut Self {
        self.options = Some(options);
        self
    }

    /// When enabled, `filled count soap` style input is queried as
    /// `filled.count.soap` and its results go to `on_success` instead of the
    /// did-you-mean callback. Off by default.
    pub fn allow_flexible_delimiters(&mut self, allow: bool) -> &mut Self {
        self.allow_flexible_delimiters = allow;
        self
    }

    /// Drop the pending query, if any, without invoking its callbacks.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    /// Feed the latest input.
    ///
    /// - `on_success` receives the suggestions, or an empty list immediately
    ///   when the input cannot be an address.
    /// - `on_failure` receives API errors; they are dropped if it is `None`.
    /// - `on_did_you_mean` receives the single suggestion equal to loosely
    ///   delimited input, if the server returns one. `on_success` is not
    ///   called for such input.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime with address-like input.
    pub fn update(
        &mut self,
        text: &str,
        on_success: impl FnOnce(Vec<Suggestion>) + Send + 'static,
        on_failure: Option<OnError>,
        on_did_you_mean: Option<OnSuggestion>,
    ) {
        self.cancel();

        let query = classify_input(text, self.allow_flexible_delimiters);
        let (input, did_you_mean) = match query {
            Query::Exact(input) => (input, false),
            Query::DidYouMean(input) => (input, true),
            Query::None => {
                log::trace!("Autosuggest: {:?} is not address-like", text);
                on_success(Vec::new());
                return;
            }
        };

        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let api = self.api.clone();
        let options = self.options.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(DEBOUNCE) => {}
            }

            log::debug!("Autosuggest: querying {:?}", input);
            let result = api.autosuggest(&input, options.as_ref()).await;

            // Superseded while the request was in flight
            if token.is_cancelled() {
                log::trace!("Autosuggest: dropping stale result for {:?}", input);
                return;
            }

            match result {
                Ok(suggestions) if did_you_mean => {
                    let matched = suggestions
                        .into_iter()
                        .find(|s| same_words(&s.address.words, &input));
                    if let (Some(suggestion), Some(callback)) = (matched, on_did_you_mean) {
                        callback(suggestion);
                    }
                }
                Ok(suggestions) => on_success(suggestions),
                Err(err) => {
                    log::warn!("Autosuggest failed for {:?}: {}", input, err);
                    if let Some(callback) = on_failure {
                        callback(err);
                    }
                }
            }
        });
    }

    /// Report the selection in the background and hand `suggestion` straight back.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn selected(
        &self,
        raw_input: &str,
        suggestion: Suggestion,
        on_success: impl FnOnce(Suggestion) + Send + 'static,
    ) {
        self.spawn_selection_report(raw_input, &suggestion);
        on_success(suggestion);
    }

    /// Report the selection, then resolve the suggestion's coordinates.
    ///
    /// The resolved suggestion keeps every original field and gains a center.
    /// Conversion counts against the API plan's quota.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn selected_with_coordinates(
        &self,
        raw_input: &str,
        suggestion: Suggestion,
        on_success: impl FnOnce(Suggestion) + Send + 'static,
        on_failure: Option<OnError>,
    ) {
        let api = self.api.clone();
        let options = self.options.clone();
        let raw_input = raw_input.to_string();

        tokio::spawn(async move {
            report_selection(api.as_ref(), &raw_input, &suggestion, options.as_ref()).await;

            match api.convert_to_coordinates(&suggestion.address.words).await {
                Ok(center) => on_success(suggestion.with_center(center)),
                Err(err) => {
                    log::warn!(
                        "Failed to resolve coordinates for {}: {}",
                        suggestion.address.words,
                        err
                    );
                    if let Some(callback) = on_failure {
                        callback(err);
                    }
                }
            }
        });
    }

    fn spawn_selection_report(&self, raw_input: &str, suggestion: &Suggestion) {
        let api = self.api.clone();
        let options = self.options.clone();
        let raw_input = raw_input.to_string();
        let suggestion = suggestion.clone();

        tokio::spawn(async move {
            report_selection(api.as_ref(), &raw_input, &suggestion, options.as_ref()).await;
        });
    }
}

impl Drop for AutosuggestHelper {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn report_selection(
    api: &dyn TextApi,
    raw_input: &str,
    suggestion: &Suggestion,
    options: Option<&AutosuggestOptions>,
) {
    if let Err(e) = api
        .autosuggest_selection(
            raw_input,
            &suggestion.address.words,
            suggestion.rank,
            SourceApi::Text,
            options,
        )
        .await
    {
        log::debug!("Selection report failed (ignored): {}", e);
    }
}
