use std::collections::BTreeMap;

use serde::Serialize;

use super::Movie;

const MISSING_YEAR: &str = "None";
const MISSING_GENRE: &str = "Unknown";

/// Movie counts per release year and per genre
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogStatistics {
    pub total: usize,
    pub by_year: BTreeMap<String, usize>,
    pub by_genre: BTreeMap<String, usize>,
}

impl CatalogStatistics {
    pub fn from_movies<'a>(movies: impl IntoIterator<Item = &'a Movie>) -> Self {
        let mut stats = Self::default();

        for movie in movies {
            stats.total += 1;

            let year = movie
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| MISSING_YEAR.to_string());
            *stats.by_year.entry(year).or_default() += 1;

            let genre = movie
                .genre
                .as_deref()
                .filter(|g| !g.trim().is_empty())
                .unwrap_or(MISSING_GENRE)
                .to_string();
            *stats.by_genre.entry(genre).or_default() += 1;
        }

        stats
    }
}
