//! Movie detail projection.
//!
//! # Responsibility
//! - Fetch details and release dates together.
//! - Derive display values (year, certification, money text, joined lists).
//!
//! # Invariants
//! - A failed release-dates fetch only loses the certification.
//! - A failed details fetch fails the whole projection.

use crate::certification::{select_certification, DEFAULT_REGION};
use crate::metadata::{CatalogResult, MovieCatalog};
use crate::model::movie::{MovieDetails, MovieId};
use crate::model::saved::poster_url;
use log::warn;

const LIST_SEPARATOR: &str = " ・ ";

/// Display-ready detail record.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetailSummary {
    pub movie_id: MovieId,
    pub title: Option<String>,
    pub year: Option<String>,
    pub certification: Option<String>,
    pub runtime_minutes: Option<u32>,
    /// Vote average rounded to a whole number out of 10.
    pub rating: u8,
    pub vote_count: u64,
    pub popularity: u64,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub genres: Vec<String>,
    /// `$X.X million`; absent when the provider has no figure.
    pub budget_text: Option<String>,
    pub revenue_text: Option<String>,
    pub countries: Option<String>,
    pub companies: Option<String>,
    pub poster_url: Option<String>,
}

impl MovieDetailSummary {
    pub fn build(
        details: &MovieDetails,
        certification: Option<String>,
        image_base_url: &str,
    ) -> Self {
        Self {
            movie_id: details.id,
            title: details.title.clone(),
            year: release_year(details.release_date.as_deref()),
            certification,
            runtime_minutes: details.runtime,
            rating: details.vote_average.unwrap_or(0.0).round().clamp(0.0, 10.0) as u8,
            vote_count: details.vote_count.unwrap_or(0),
            popularity: details.popularity.unwrap_or(0.0).round().max(0.0) as u64,
            overview: details.overview.clone().filter(|text| !text.trim().is_empty()),
            status: details.status.clone(),
            genres: details
                .genres
                .iter()
                .filter_map(|genre| genre.name.clone())
                .collect(),
            budget_text: format_millions(details.budget),
            revenue_text: format_millions(details.revenue),
            countries: join_names(
                details
                    .production_countries
                    .iter()
                    .filter_map(|c| c.name.as_deref()),
            ),
            companies: join_names(
                details
                    .production_companies
                    .iter()
                    .filter_map(|c| c.name.as_deref()),
            ),
            poster_url: poster_url(image_base_url, details.poster_path.as_deref()),
        }
    }
}

/// Loads detail projections from a catalog.
pub struct MovieDetailService<C> {
    catalog: C,
    image_base_url: String,
    region: String,
}

impl<C: MovieCatalog> MovieDetailService<C> {
    pub fn new(catalog: C, image_base_url: impl Into<String>) -> Self {
        Self {
            catalog,
            image_base_url: image_base_url.into(),
            region: DEFAULT_REGION.to_string(),
        }
    }

    /// Region whose certification is shown.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub async fn load(&self, movie_id: MovieId) -> CatalogResult<MovieDetailSummary> {
        let (details, release_info) = tokio::join!(
            self.catalog.fetch_movie_details(movie_id),
            self.catalog.fetch_release_info(movie_id)
        );
        let details = details?;

        let certification = match release_info {
            Ok(info) => select_certification(&info, &self.region),
            Err(err) => {
                warn!(
                    "event=movie_detail module=service status=degraded movie_id={movie_id} missing=certification error={err}"
                );
                None
            }
        };

        Ok(MovieDetailSummary::build(
            &details,
            certification,
            &self.image_base_url,
        ))
    }
}

fn release_year(release_date: Option<&str>) -> Option<String> {
    release_date
        .and_then(|date| date.split('-').next())
        .map(str::trim)
        .filter(|year| !year.is_empty())
        .map(str::to_string)
}

/// Formats dollars as `$X.X million`; zero means unknown at the provider.
fn format_millions(amount: Option<u64>) -> Option<String> {
    amount
        .filter(|value| *value > 0)
        .map(|value| format!("${:.1} million", value as f64 / 1_000_000.0))
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    let joined = names
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR);
    (!joined.is_empty()).then_some(joined)
}
