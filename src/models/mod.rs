mod movie;
mod recommendation;
mod refresh;
mod statistics;

pub use movie::{Embedding, Movie, MovieId};
pub use recommendation::{FallbackReason, Recommendation, KEYWORD_MATCH_SCORE};
pub use refresh::{RefreshEntry, RefreshOutcome, RefreshReport, SkipReason};
pub use statistics::CatalogStatistics;
