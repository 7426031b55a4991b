use std::fmt::Display;

use super::Movie;

/// Fixed score reported for keyword matches
///
/// Not comparable with cosine scores; a keyword match is identified by the
/// `Degraded` variant, never by this value.
pub const KEYWORD_MATCH_SCORE: f32 = 0.7;

/// Why the resolver could not rank by embeddings
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// No embedding provider credential configured
    ProviderUnconfigured,
    /// No movie has a stored embedding yet
    NoStoredEmbeddings,
    /// The embedding store could not be read
    StoreUnavailable(String),
    /// Embedding the prompt failed
    ProviderFailed(String),
    /// Every stored embedding was unusable for this prompt
    NoComparableEmbeddings,
}

impl Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::ProviderUnconfigured => {
                write!(f, "the embedding provider is not configured")
            }
            FallbackReason::NoStoredEmbeddings => write!(
                f,
                "no embeddings are available; run `moviereviews compute-embeddings` to improve results"
            ),
            FallbackReason::StoreUnavailable(e) => {
                write!(f, "stored embeddings could not be read ({})", e)
            }
            FallbackReason::ProviderFailed(e) => {
                write!(f, "the embedding provider could not be reached ({})", e)
            }
            FallbackReason::NoComparableEmbeddings => {
                write!(f, "no stored embedding could be compared with the prompt")
            }
        }
    }
}

/// Result of resolving a prompt to a movie
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    /// Best match by embedding similarity
    Found { movie: Movie, score: f32 },
    /// Text match used because semantic ranking was unavailable
    Degraded {
        movie: Movie,
        score: f32,
        reason: FallbackReason,
    },
    /// Nothing matched
    NotFound {
        prompt: String,
        reason: Option<FallbackReason>,
    },
}

impl Recommendation {
    pub fn movie(&self) -> Option<&Movie> {
        match self {
            Recommendation::Found { movie, .. } | Recommendation::Degraded { movie, .. } => {
                Some(movie)
            }
            Recommendation::NotFound { .. } => None,
        }
    }

    pub fn score(&self) -> Option<f32> {
        match self {
            Recommendation::Found { score, .. } | Recommendation::Degraded { score, .. } => {
                Some(*score)
            }
            Recommendation::NotFound { .. } => None,
        }
    }

    /// Human-readable note to show next to the result
    pub fn message(&self) -> Option<String> {
        match self {
            Recommendation::Found { .. } => None,
            Recommendation::Degraded { reason, .. } => {
                Some(format!("Using text search because {}.", reason))
            }
            Recommendation::NotFound {
                prompt,
                reason: Some(reason),
            } => Some(format!(
                "No movies found matching: '{}' ({}).",
                prompt, reason
            )),
            Recommendation::NotFound { prompt, reason: None } => {
                Some(format!("No movies found matching: '{}'.", prompt))
            }
        }
    }
}
