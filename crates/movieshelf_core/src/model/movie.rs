//! Movie records returned by the metadata provider.

use super::null_as_default;
use serde::{Deserialize, Serialize};

/// External provider movie identifier.
pub type MovieId = i64;

/// Movie summary as returned by listing and search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub original_language: Option<String>,
    pub overview: Option<String>,
    /// Relative CDN path such as `/abc.jpg`.
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    /// `YYYY-MM-DD`, sometimes empty for unreleased titles.
    pub release_date: Option<String>,
    /// Provider score on a 0-10 scale.
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub popularity: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<i64>,
    pub adult: Option<bool>,
}

/// One page of a listing or search response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MoviePage {
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Movie>,
    pub total_pages: Option<u32>,
    pub total_results: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCountry {
    pub iso_3166_1: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCompany {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub logo_path: Option<String>,
    pub origin_country: Option<String>,
}

/// Full movie detail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: MovieId,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    /// Minutes.
    pub runtime: Option<u32>,
    /// US dollars; the provider reports `0` when unknown.
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub popularity: Option<f64>,
    pub imdb_id: Option<String>,
    pub homepage: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub production_countries: Vec<ProductionCountry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub production_companies: Vec<ProductionCompany>,
}

impl MovieDetails {
    /// Genre ids in provider order, matching the `genre_ids` listing shape.
    pub fn genre_ids(&self) -> Vec<i64> {
        self.genres.iter().map(|genre| genre.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{MovieDetails, MoviePage};

    #[test]
    fn listing_page_tolerates_missing_and_null_fields() {
        let page: MoviePage = serde_json::from_str(
            r#"{"page":1,"results":[{"id":7,"title":"Heat","genre_ids":null},{"id":8}]}"#,
        )
        .unwrap();
        assert_eq!(page.results.len(), 2);
        assert!(page.results[0].genre_ids.is_empty());
        assert_eq!(page.results[1].title, None);
        assert_eq!(page.total_results, None);
    }

    #[test]
    fn details_expose_genre_ids_in_order() {
        let details: MovieDetails = serde_json::from_str(
            r#"{"id":1,"genres":[{"id":18,"name":"Drama"},{"id":80,"name":"Crime"}],"production_countries":null}"#,
        )
        .unwrap();
        assert_eq!(details.genre_ids(), vec![18, 80]);
        assert!(details.production_countries.is_empty());
    }

    #[test]
    fn details_tolerate_missing_names() {
        let details: MovieDetails = serde_json::from_str(
            r#"{"id":2,"genres":[{"id":18,"name":null},{"id":80}],
                "production_countries":[{"iso_3166_1":"FR","name":null}],
                "production_companies":[{"id":9,"name":null,"logo_path":null}]}"#,
        )
        .unwrap();
        assert_eq!(details.genre_ids(), vec![18, 80]);
        assert_eq!(details.genres[0].name, None);
        assert_eq!(details.production_countries[0].name, None);
        assert_eq!(details.production_companies[0].name, None);
    }
}
