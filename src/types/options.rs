//! Autosuggest request options.

use serde::{Deserialize, Serialize};

use super::address::Country;
use super::geometry::{Circle, Coordinates, Polygon, Rectangle};
use super::language::Language;

/// Hint describing where the autosuggest input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputType {
    Text,
    VoconHybrid,
    NmdpAsr,
    GenericVoice,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::VoconHybrid => "vocon-hybrid",
            InputType::NmdpAsr => "nmdp-asr",
            InputType::GenericVoice => "generic-voice",
        }
    }
}

/// Which API produced the suggestion a user selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceApi {
    Text,
    Voice,
}

impl SourceApi {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceApi::Text => "text",
            SourceApi::Voice => "voice",
        }
    }
}

/// Immutable autosuggest configuration. Unset fields are left to server defaults
/// (e.g. three results).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutosuggestOptions {
    pub n_results: Option<u32>,
    pub n_focus_results: Option<u32>,
    pub focus: Option<Coordinates>,
    pub clip_to_country: Vec<Country>,
    pub clip_to_circle: Option<Circle>,
    pub clip_to_bounding_box: Option<Rectangle>,
    pub clip_to_polygon: Option<Polygon>,
    pub input_type: Option<InputType>,
    pub language: Option<Language>,
    pub prefer_land: Option<bool>,
    /// Routes the request to the `-with-coordinates` endpoint.
    pub include_coordinates: bool,
}

impl AutosuggestOptions {
    pub fn builder() -> AutosuggestOptionsBuilder {
        AutosuggestOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AutosuggestOptionsBuilder {
    options: AutosuggestOptions,
}

impl AutosuggestOptionsBuilder {
    pub fn n_results(mut self, n: u32) -> Self {
        self.options.n_results = Some(n);
        self
    }

    pub fn n_focus_results(mut self, n: u32) -> Self {
        self.options.n_focus_results = Some(n);
        self
    }

    pub fn focus(mut self, focus: Coordinates) -> Self {
        self.options.focus = Some(focus);
        self
    }

    pub fn clip_to_country(mut self, countries: Vec<Country>) -> Self {
        self.options.clip_to_country = countries;
        self
    }

    pub fn clip_to_circle(mut self, circle: Circle) -> Self {
        self.options.clip_to_circle = Some(circle);
        self
    }

    pub fn clip_to_bounding_box(mut self, bounding_box: Rectangle) -> Self {
        self.options.clip_to_bounding_box = Some(bounding_box);
        self
    }

    pub fn clip_to_polygon(mut self, polygon: Polygon) -> Self {
        self.options.clip_to_polygon = Some(polygon);
        self
    }

    pub fn input_type(mut self, input_type: InputType) -> Self {
        self.options.input_type = Some(input_type);
        self
    }

    pub fn language(mut self, language: impl Into<Language>) -> Self {
        self.options.language = Some(language.into());
        self
    }

    pub fn prefer_land(mut self, prefer_land: bool) -> Self {
        self.options.prefer_land = Some(prefer_land);
        self
    }

    pub fn include_coordinates(mut self, include: bool) -> Self {
        self.options.include_coordinates = include;
        self
    }

    pub fn build(self) -> AutosuggestOptions {
        self.options
    }
}
