pub mod catalog;
pub mod compare;
pub mod embeddings;
pub mod pacing;
pub mod recommendations;
pub mod refresh;
pub mod scheduler;
pub mod similarity;

pub use recommendations::RecommendationResolver;
pub use refresh::EmbeddingRefreshJob;
