//! Domain values rendered into the textual forms the API expects in query
//! parameters. Every function here is pure.

use std::collections::BTreeMap;

use crate::types::{
    AutosuggestOptions, Circle, Coordinates, Country, Language, Polygon, Rectangle,
};
use crate::voice::AudioEncoding;

pub trait ToApiString {
    fn to_api_string(&self) -> String;
}

impl ToApiString for Coordinates {
    fn to_api_string(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

impl ToApiString for Polygon {
    fn to_api_string(&self) -> String {
        self.points
            .iter()
            .map(ToApiString::to_api_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl ToApiString for Circle {
    fn to_api_string(&self) -> String {
        format!(
            "{},{},{}",
            self.center.lat,
            self.center.lng,
            self.radius.km()
        )
    }
}

impl ToApiString for Rectangle {
    fn to_api_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.southwest.lat, self.southwest.lng, self.northeast.lat, self.northeast.lng
        )
    }
}

/// An absent bounding box renders as the empty string.
impl ToApiString for Option<Rectangle> {
    fn to_api_string(&self) -> String {
        self.as_ref()
            .map(ToApiString::to_api_string)
            .unwrap_or_default()
    }
}

impl ToApiString for [Country] {
    fn to_api_string(&self) -> String {
        self.iter()
            .map(|c| c.two_letter_code.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl ToApiString for AudioEncoding {
    fn to_api_string(&self) -> String {
        self.as_str().to_string()
    }
}

/// Value of the `voice-language` query parameter. Mandarin is `cmn` on the voice API.
pub fn voice_language_code(language: &Language) -> String {
    match language.w3w_code() {
        "zh" => "cmn".to_string(),
        other => other.to_string(),
    }
}

/// The `language`/`locale` pair sent for a language. A locale, when known,
/// replaces the language code.
pub fn language_param(language: &Language) -> (&'static str, String) {
    match language.w3w_locale() {
        Some(locale) => ("locale", locale.to_string()),
        None => ("language", language.w3w_code().to_string()),
    }
}

/// Autosuggest options as kebab-case query parameters. Unset options are omitted.
pub fn to_query_map(options: &AutosuggestOptions) -> BTreeMap<&'static str, String> {
    let mut map = BTreeMap::new();

    if let Some(n) = options.n_results {
        map.insert("n-results", n.to_string());
    }
    if let Some(focus) = &options.focus {
        map.insert("focus", focus.to_api_string());
    }
    if let Some(language) = &options.language {
        let (key, value) = language_param(language);
        map.insert(key, value);
    }
    if let Some(n) = options.n_focus_results {
        map.insert("n-focus-results", n.to_string());
    }
    if !options.clip_to_country.is_empty() {
        map.insert(
            "clip-to-country",
            options.clip_to_country.as_slice().to_api_string(),
        );
    }
    if let Some(circle) = &options.clip_to_circle {
        map.insert("clip-to-circle", circle.to_api_string());
    }
    if let Some(polygon) = &options.clip_to_polygon {
        map.insert("clip-to-polygon", polygon.to_api_string());
    }
    if let Some(bbox) = &options.clip_to_bounding_box {
        map.insert("clip-to-bounding-box", bbox.to_api_string());
    }
    if let Some(input_type) = options.input_type {
        map.insert("input-type", input_type.as_str().to_string());
    }
    if let Some(prefer_land) = options.prefer_land {
        map.insert("prefer-land", prefer_land.to_string());
    }

    map
}
