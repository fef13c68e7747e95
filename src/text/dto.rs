//! Wire DTOs for the text API and their mapping into domain types.
//!
//! Every DTO field is optional so that decoding never fails on a missing
//! field; the mapping step decides which fields the protocol guarantees and
//! reports [`MappingError::MissingField`] when one is absent.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::error::{ApiError, W3wError};
use crate::types::{
    Address, Coordinates, Country, Distance, GridSection, Language, Line, ProprietaryLanguage,
    Rectangle, Suggestion,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("response is missing required field `{0}`")]
    MissingField(&'static str),
}

impl From<MappingError> for W3wError {
    fn from(err: MappingError) -> Self {
        W3wError::Unknown(ApiError::new("MissingField", err.to_string()))
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, MappingError> {
    value.ok_or(MappingError::MissingField(field))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatesDto {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl CoordinatesDto {
    fn to_domain(&self) -> Result<Coordinates, MappingError> {
        Ok(Coordinates::new(
            required(self.lat, "lat")?,
            required(self.lng, "lng")?,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SquareDto {
    pub southwest: Option<CoordinatesDto>,
    pub northeast: Option<CoordinatesDto>,
}

impl SquareDto {
    fn to_domain(&self) -> Result<Rectangle, MappingError> {
        let southwest = required(self.southwest.as_ref(), "southwest")?.to_domain()?;
        let northeast = required(self.northeast.as_ref(), "northeast")?.to_domain()?;
        Ok(Rectangle::new(southwest, northeast))
    }
}

/// Body of `convert-to-3wa` and `convert-to-coordinates`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub country: Option<String>,
    pub square: Option<SquareDto>,
    pub nearest_place: Option<String>,
    pub coordinates: Option<CoordinatesDto>,
    pub words: Option<String>,
    pub language: Option<String>,
    pub locale: Option<String>,
    pub map: Option<String>,
}

impl AddressResponse {
    pub fn to_domain(&self) -> Result<Address, MappingError> {
        let words = required(self.words.clone(), "words")?;
        let center = required(self.coordinates.as_ref(), "coordinates")?.to_domain()?;
        let square = self.square.as_ref().map(SquareDto::to_domain).transpose()?;
        let language = required(self.language.clone(), "language")?;
        let country = required(self.country.clone(), "country")?;

        Ok(Address {
            words,
            nearest_place: self.nearest_place.clone().unwrap_or_default(),
            center: Some(center),
            square,
            language: Language::Proprietary(ProprietaryLanguage::new(
                language,
                self.locale.clone(),
            )),
            country: Country::new(country),
        })
    }
}

/// One autosuggest result. The voice API sends the same shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionDto {
    pub country: Option<String>,
    pub nearest_place: Option<String>,
    pub words: Option<String>,
    pub rank: Option<u32>,
    pub language: Option<String>,
    pub locale: Option<String>,
    pub distance_to_focus_km: Option<f64>,
    pub square: Option<SquareDto>,
    pub coordinates: Option<CoordinatesDto>,
}

impl SuggestionDto {
    pub fn to_domain(&self) -> Result<Suggestion, MappingError> {
        let words = required(self.words.clone(), "words")?;
        let rank = required(self.rank, "rank")?;
        let language = required(self.language.clone(), "language")?;
        let country = required(self.country.clone(), "country")?;
        let center = self
            .coordinates
            .as_ref()
            .map(CoordinatesDto::to_domain)
            .transpose()?;
        let square = self.square.as_ref().map(SquareDto::to_domain).transpose()?;

        Ok(Suggestion {
            address: Address {
                words,
                nearest_place: self.nearest_place.clone().unwrap_or_default(),
                center,
                square,
                language: Language::Proprietary(ProprietaryLanguage::new(
                    language,
                    self.locale.clone(),
                )),
                country: Country::new(country),
            },
            rank,
            distance_to_focus: self.distance_to_focus_km.map(Distance::from_km),
        })
    }
}

pub fn suggestions_to_domain(dtos: &[SuggestionDto]) -> Result<Vec<Suggestion>, MappingError> {
    dtos.iter().map(SuggestionDto::to_domain).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutosuggestResponse {
    #[serde(default)]
    pub suggestions: Vec<SuggestionDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineDto {
    pub start: Option<CoordinatesDto>,
    pub end: Option<CoordinatesDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridSectionResponse {
    pub lines: Option<Vec<LineDto>>,
}

impl GridSectionResponse {
    pub fn to_domain(&self) -> Result<GridSection, MappingError> {
        let lines = required(self.lines.as_ref(), "lines")?
            .iter()
            .map(|line| {
                Ok(Line {
                    start: required(line.start.as_ref(), "start")?.to_domain()?,
                    end: required(line.end.as_ref(), "end")?.to_domain()?,
                })
            })
            .collect::<Result<Vec<_>, MappingError>>()?;
        Ok(GridSection { lines })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleDto {
    pub native_name: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDto {
    pub native_name: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub locales: Option<Vec<LocaleDto>>,
}

impl LanguageDto {
    /// The base language followed by one entry per locale it offers.
    pub fn to_domain(&self) -> Result<Vec<ProprietaryLanguage>, MappingError> {
        let code = required(self.code.clone(), "code")?;
        let mut languages = vec![ProprietaryLanguage {
            code: code.clone(),
            locale: None,
            name: self.name.clone(),
            native_name: self.native_name.clone(),
        }];

        for locale in self.locales.iter().flatten() {
            languages.push(ProprietaryLanguage {
                code: code.clone(),
                locale: Some(required(locale.code.clone(), "locale code")?),
                name: locale.name.clone(),
                native_name: locale.native_name.clone(),
            });
        }

        Ok(languages)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailableLanguagesResponse {
    pub languages: Option<Vec<LanguageDto>>,
}

impl AvailableLanguagesResponse {
    pub fn to_domain(&self) -> Result<HashSet<ProprietaryLanguage>, MappingError> {
        let mut set = HashSet::new();
        for dto in required(self.languages.as_ref(), "languages")? {
            set.extend(dto.to_domain()?);
        }
        Ok(set)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// `{"error":{"code","message"}}`, the failure body of every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

impl ErrorResponse {
    pub fn to_domain(&self) -> W3wError {
        W3wError::from_code(&self.error.code, self.error.message.clone())
    }
}
