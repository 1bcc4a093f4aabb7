//! Regional release-date records used for certification lookup.
//!
//! # Invariants
//! - Every field is optional or defaulted so partial documents still decode.
//! - Unknown release type codes are preserved as raw integers.

use super::null_as_default;
use serde::{Deserialize, Serialize};

/// Release channel codes published by the metadata provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseType {
    Premiere,
    TheatricalLimited,
    Theatrical,
    Digital,
    Physical,
    Tv,
}

impl ReleaseType {
    pub fn code(self) -> i64 {
        match self {
            Self::Premiere => 1,
            Self::TheatricalLimited => 2,
            Self::Theatrical => 3,
            Self::Digital => 4,
            Self::Physical => 5,
            Self::Tv => 6,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Premiere),
            2 => Some(Self::TheatricalLimited),
            3 => Some(Self::Theatrical),
            4 => Some(Self::Digital),
            5 => Some(Self::Physical),
            6 => Some(Self::Tv),
            _ => None,
        }
    }
}

/// `GET /movie/{id}/release_dates` response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<RegionReleases>,
}

/// All releases of one movie in one region.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegionReleases {
    /// ISO 3166-1 alpha-2 region code.
    #[serde(default, deserialize_with = "null_as_default")]
    pub iso_3166_1: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_dates: Vec<ReleaseDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReleaseDate {
    /// Raw provider code; see [`ReleaseType::from_code`].
    #[serde(rename = "type")]
    pub release_type: Option<i64>,
    pub certification: Option<String>,
    pub release_date: Option<String>,
    pub iso_639_1: Option<String>,
    pub note: Option<String>,
}

impl ReleaseDate {
    pub fn kind(&self) -> Option<ReleaseType> {
        self.release_type.and_then(ReleaseType::from_code)
    }

    /// Certification trimmed, or `None` when missing or blank.
    pub fn trimmed_certification(&self) -> Option<&str> {
        self.certification
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}
