//! Client-side helpers built on top of the text API.

mod autosuggest;
mod pattern;
mod signature;

pub use autosuggest::{AutosuggestHelper, OnError, OnSuggestion, DEBOUNCE};
pub use pattern::{did_you_mean_3wa, is_possible_3wa, reformat_3wa, search_possible_3wa};
pub use signature::signature_digest;
