//! The closed set of seasonal buckets that select a schema and a model.

use crate::error::UnknownSeason;
use helios_domain::constants::{FALL, SPRING, SUMMER, WINTER};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

/// A seasonal bucket. Parsing is case-insensitive; the canonical key is lowercase.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    AsRefStr,
    IntoStaticStr,
    EnumString,
    EnumIter,
    EnumCount,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Canonicalizes raw caller input: surrounding whitespace is ignored, case is not significant.
    ///
    /// # Errors
    /// Returns [`UnknownSeason`] for anything outside winter/spring/summer/fall.
    pub fn parse(input: &str) -> Result<Self, UnknownSeason> {
        Self::from_str(input.trim()).map_err(|_| UnknownSeason::new(input))
    }

    /// Lowercase lookup key (`"winter"`).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Winter => WINTER,
            Self::Spring => SPRING,
            Self::Summer => SUMMER,
            Self::Fall => FALL,
        }
    }

    /// Capitalized label used in responses (`"Winter"`).
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall => "Fall",
        }
    }
}
