//! Text API datasource.
//!
//! Every operation issues exactly one HTTP GET and suspends the calling task
//! for that round trip. Callers on latency-sensitive tasks should spawn it.

mod client;
mod dto;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::api_string::{language_param, to_query_map, ToApiString};
use crate::config::ClientConfig;
use crate::error::W3wResult;
use crate::helpers::is_possible_3wa;
use crate::types::{
    Address, AutosuggestOptions, Coordinates, GridSection, Language, ProprietaryLanguage,
    Rectangle, SourceApi, Suggestion,
};

pub use client::{
    wrapper_user_agent, HttpTextClient, API_KEY_HEADER, APP_CERT_HEADER, APP_PACKAGE_HEADER,
    WRAPPER_HEADER,
};
pub(crate) use dto::{suggestions_to_domain, ErrorDetail, SuggestionDto};
pub use dto::MappingError;

/// Version of the text API this library speaks.
pub const TEXT_API_VERSION: &str = "v3";

/// The text operations the autosuggest helper depends on.
#[async_trait]
pub trait TextApi: Send + Sync + 'static {
    async fn convert_to_3wa(
        &self,
        coordinates: Coordinates,
        language: &Language,
    ) -> W3wResult<Address>;

    async fn convert_to_coordinates(&self, words: &str) -> W3wResult<Coordinates>;

    async fn autosuggest(
        &self,
        input: &str,
        options: Option<&AutosuggestOptions>,
    ) -> W3wResult<Vec<Suggestion>>;

    async fn grid_section(&self, bounding_box: &Rectangle) -> W3wResult<GridSection>;

    async fn available_languages(&self) -> W3wResult<HashSet<ProprietaryLanguage>>;

    /// Best-effort report of which suggestion the user picked.
    async fn autosuggest_selection(
        &self,
        raw_input: &str,
        selection: &str,
        rank: u32,
        source_api: SourceApi,
        options: Option<&AutosuggestOptions>,
    ) -> W3wResult<()>;
}

pub struct TextDataSource {
    client: HttpTextClient,
}

impl TextDataSource {
    pub fn new(config: &ClientConfig) -> W3wResult<Self> {
        Ok(Self {
            client: HttpTextClient::new(config)?,
        })
    }

    pub fn library_version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub async fn convert_to_3wa_with_headers(
        &self,
        coordinates: Coordinates,
        language: &Language,
        headers: &HashMap<String, String>,
    ) -> W3wResult<Address> {
        let (language_key, language_value) = language_param(language);
        let query = [
            ("coordinates", coordinates.to_api_string()),
            (language_key, language_value),
        ];
        let response: dto::AddressResponse =
            self.client.get("convert-to-3wa", &query, headers).await?;
        Ok(response.to_domain()?)
    }

    /// The full address record for `words`, including square and nearest place.
    pub async fn convert_to_address(&self, words: &str) -> W3wResult<Address> {
        self.convert_to_address_with_headers(words, &HashMap::new())
            .await
    }

    pub async fn convert_to_address_with_headers(
        &self,
        words: &str,
        headers: &HashMap<String, String>,
    ) -> W3wResult<Address> {
        let query = [("words", words.to_string())];
        let response: dto::AddressResponse = self
            .client
            .get("convert-to-coordinates", &query, headers)
            .await?;
        Ok(response.to_domain()?)
    }

    pub async fn convert_to_coordinates_with_headers(
        &self,
        words: &str,
        headers: &HashMap<String, String>,
    ) -> W3wResult<Coordinates> {
        let address = self.convert_to_address_with_headers(words, headers).await?;
        Ok(address
            .center
            .ok_or(MappingError::MissingField("coordinates"))?)
    }

    /// Routes to `autosuggest-with-coordinates` when the options ask for
    /// coordinates, otherwise to `autosuggest`.
    pub async fn autosuggest_with_headers(
        &self,
        input: &str,
        options: Option<&AutosuggestOptions>,
        headers: &HashMap<String, String>,
    ) -> W3wResult<Vec<Suggestion>> {
        let path = match options {
            Some(o) if o.include_coordinates => "autosuggest-with-coordinates",
            _ => "autosuggest",
        };

        let mut query = vec![("input", input.to_string())];
        if let Some(options) = options {
            query.extend(to_query_map(options));
        }

        let response: dto::AutosuggestResponse = self.client.get(path, &query, headers).await?;
        Ok(suggestions_to_domain(&response.suggestions)?)
    }

    pub async fn grid_section_with_headers(
        &self,
        bounding_box: &Rectangle,
        headers: &HashMap<String, String>,
    ) -> W3wResult<GridSection> {
        let query = [("bounding-box", bounding_box.to_api_string())];
        let response: dto::GridSectionResponse =
            self.client.get("grid-section", &query, headers).await?;
        Ok(response.to_domain()?)
    }

    pub async fn available_languages_with_headers(
        &self,
        headers: &HashMap<String, String>,
    ) -> W3wResult<HashSet<ProprietaryLanguage>> {
        let response: dto::AvailableLanguagesResponse = self
            .client
            .get("available-languages", &[], headers)
            .await?;
        Ok(response.to_domain()?)
    }

    /// Whether `words` is a real three word address.
    ///
    /// Input that cannot be an address is rejected locally without a request.
    pub async fn is_valid_3wa(&self, words: &str) -> W3wResult<bool> {
        self.is_valid_3wa_with_headers(words, &HashMap::new()).await
    }

    pub async fn is_valid_3wa_with_headers(
        &self,
        words: &str,
        headers: &HashMap<String, String>,
    ) -> W3wResult<bool> {
        if !is_possible_3wa(words) {
            return Ok(false);
        }
        let wanted = words.replace('/', "");
        let suggestions = self.autosuggest_with_headers(words, None, headers).await?;
        Ok(suggestions
            .iter()
            .any(|s| s.address.words.replace('/', "").to_lowercase() == wanted.to_lowercase()))
    }
}

#[async_trait]
impl TextApi for TextDataSource {
    async fn convert_to_3wa(
        &self,
        coordinates: Coordinates,
        language: &Language,
    ) -> W3wResult<Address> {
        self.convert_to_3wa_with_headers(coordinates, language, &HashMap::new())
            .await
    }

    async fn convert_to_coordinates(&self, words: &str) -> W3wResult<Coordinates> {
        self.convert_to_coordinates_with_headers(words, &HashMap::new())
            .await
    }

    async fn autosuggest(
        &self,
        input: &str,
        options: Option<&AutosuggestOptions>,
    ) -> W3wResult<Vec<Suggestion>> {
        self.autosuggest_with_headers(input, options, &HashMap::new())
            .await
    }

    async fn grid_section(&self, bounding_box: &Rectangle) -> W3wResult<GridSection> {
        self.grid_section_with_headers(bounding_box, &HashMap::new())
            .await
    }

    async fn available_languages(&self) -> W3wResult<HashSet<ProprietaryLanguage>> {
        self.available_languages_with_headers(&HashMap::new()).await
    }

    async fn autosuggest_selection(
        &self,
        raw_input: &str,
        selection: &str,
        rank: u32,
        source_api: SourceApi,
        options: Option<&AutosuggestOptions>,
    ) -> W3wResult<()> {
        let mut query = vec![
            ("raw-input", raw_input.to_string()),
            ("selection", selection.to_string()),
            ("rank", rank.to_string()),
            ("source-api", source_api.as_str().to_string()),
        ];
        if let Some(options) = options {
            query.extend(to_query_map(options));
        }
        self.client
            .get_discarding_body("autosuggest-selection", &query, &HashMap::new())
            .await
    }
}
