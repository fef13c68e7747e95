//! Domain value types.
//!
//! Everything here is an immutable value created either from caller input or
//! by mapping a wire DTO; none of it performs I/O.

mod address;
mod geometry;
mod language;
mod options;

pub use address::{Address, Country, Suggestion};
pub use geometry::{Circle, Coordinates, Distance, GridSection, Line, Polygon, Rectangle};
pub use language::{Language, ProprietaryLanguage, Rfc5646Language};
pub use options::{AutosuggestOptions, AutosuggestOptionsBuilder, InputType, SourceApi};
