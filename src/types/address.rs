use serde::{Deserialize, Serialize};

use super::geometry::{Coordinates, Distance, Rectangle};
use super::language::Language;

/// An ISO 3166-1 alpha-2 country code. `ZZ` is used for addresses at sea.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Country {
    pub two_letter_code: String,
}

impl Country {
    pub fn new(two_letter_code: impl Into<String>) -> Self {
        Self {
            two_letter_code: two_letter_code.into(),
        }
    }
}

/// A three word address.
///
/// `center` and `square` are absent when the address came from an
/// autosuggest call that did not request coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Words joined by `.`, without the `///` prefix.
    pub words: String,
    pub nearest_place: String,
    pub center: Option<Coordinates>,
    pub square: Option<Rectangle>,
    pub language: Language,
    pub country: Country,
}

impl Address {
    /// The address in its display form, `///word.word.word`.
    pub fn display_words(&self) -> String {
        format!("///{}", self.words)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub address: Address,
    /// 1-based position in the result list.
    pub rank: u32,
    /// Only present when a focus was supplied.
    pub distance_to_focus: Option<Distance>,
}

impl Suggestion {
    /// Copy of this suggestion with `center` resolved; every other field is kept.
    pub fn with_center(&self, center: Coordinates) -> Self {
        let mut address = self.address.clone();
        address.center = Some(center);
        Self {
            address,
            rank: self.rank,
            distance_to_focus: self.distance_to_focus,
        }
    }
}
