//! Certification lookup over regional release dates.
//!
//! # Invariants
//! - Pure: no I/O, no caching; recomputed on every call.
//! - Missing region, empty entries or blank certifications yield `None`.

use crate::model::release::{ReleaseInfo, ReleaseType};

/// Region used when the caller has no preference.
pub const DEFAULT_REGION: &str = "US";

/// Release channels consulted in priority order.
pub const CERTIFICATION_PREFERENCE: [ReleaseType; 6] = [
    ReleaseType::Theatrical,
    ReleaseType::TheatricalLimited,
    ReleaseType::Tv,
    ReleaseType::Digital,
    ReleaseType::Physical,
    ReleaseType::Premiere,
];

/// Picks the certification for `region` from a release-dates document.
///
/// The first non-blank certification of the highest-priority channel wins;
/// when no preferred channel has one, the first non-blank certification in
/// document order is used. Returned strings are trimmed.
pub fn select_certification(info: &ReleaseInfo, region: &str) -> Option<String> {
    let region = info
        .results
        .iter()
        .find(|entry| entry.iso_3166_1 == region)?;

    CERTIFICATION_PREFERENCE
        .iter()
        .find_map(|preferred| {
            region
                .release_dates
                .iter()
                .filter(|date| date.kind() == Some(*preferred))
                .find_map(|date| date.trimmed_certification())
        })
        .or_else(|| {
            region
                .release_dates
                .iter()
                .find_map(|date| date.trimmed_certification())
        })
        .map(str::to_string)
}

/// [`select_certification`] for [`DEFAULT_REGION`].
pub fn select_default_certification(info: &ReleaseInfo) -> Option<String> {
    select_certification(info, DEFAULT_REGION)
}
