use crate::{
    db::MovieRepository,
    error::{AppError, AppResult},
    models::{Movie, MovieId},
    services::{embeddings::EmbeddingProvider, similarity::cosine_similarity},
};

/// Similarities between two movies and a prompt
#[derive(Debug, Clone, PartialEq)]
pub struct PromptComparison {
    pub first: Movie,
    pub second: Movie,
    pub prompt: String,
    /// Similarity between the two movie descriptions
    pub between_movies: f32,
    pub first_to_prompt: f32,
    pub second_to_prompt: f32,
}

impl PromptComparison {
    /// The movie whose description is closer to the prompt; the second on a tie
    pub fn closer_to_prompt(&self) -> &Movie {
        if self.first_to_prompt > self.second_to_prompt {
            &self.first
        } else {
            &self.second
        }
    }
}

/// Picks a movie for `title`: exact title, then case-insensitive substring,
/// then the first catalog entry other than `exclude`
fn resolve_title<'a>(catalog: &'a [Movie], title: &str, exclude: Option<MovieId>) -> Option<&'a Movie> {
    let needle = title.to_lowercase();

    catalog
        .iter()
        .find(|m| m.title == title)
        .or_else(|| {
            catalog
                .iter()
                .find(|m| m.title.to_lowercase().contains(&needle))
        })
        .or_else(|| {
            tracing::info!(title = %title, "No similar movie found, using catalog order");
            catalog.iter().find(|m| Some(m.id) != exclude)
        })
}

/// Embeds two movie descriptions and a prompt and compares them pairwise
///
/// Descriptions are embedded fresh rather than read from the store so the
/// comparison reflects the current provider model.
pub async fn compare_with_prompt(
    movies: &dyn MovieRepository,
    provider: &dyn EmbeddingProvider,
    first_title: &str,
    second_title: &str,
    prompt: &str,
) -> AppResult<PromptComparison> {
    let catalog = movies.list_movies(None).await?;

    let first = resolve_title(&catalog, first_title, None)
        .ok_or_else(|| AppError::NotFound("The catalog is empty".to_string()))?
        .clone();
    let second = resolve_title(&catalog, second_title, Some(first.id))
        .ok_or_else(|| AppError::NotFound("The catalog has only one movie".to_string()))?
        .clone();

    tracing::info!(first = %first.title, second = %second.title, "Selected movies for comparison");

    let first_embedding = provider.embed(&first.description).await?;
    let second_embedding = provider.embed(&second.description).await?;
    let prompt_embedding = provider.embed(prompt).await?;

    Ok(PromptComparison {
        between_movies: cosine_similarity(&first_embedding, &second_embedding)?,
        first_to_prompt: cosine_similarity(&prompt_embedding, &first_embedding)?,
        second_to_prompt: cosine_similarity(&prompt_embedding, &second_embedding)?,
        first,
        second,
        prompt: prompt.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryMovieRepository;
    use crate::services::embeddings::MockEmbeddingProvider;

    fn catalog() -> Vec<Movie> {
        vec![
            Movie::new(1, "Batman", "A superhero fights crime in Gotham"),
            Movie::new(2, "The Lego Movie", "An animated adventure"),
            Movie::new(3, "Inception", "A thief who steals corporate secrets"),
        ]
    }

    #[test]
    fn test_resolve_title_exact() {
        let movies = catalog();
        assert_eq!(resolve_title(&movies, "Inception", None).unwrap().id, 3);
    }

    #[test]
    fn test_resolve_title_substring() {
        let movies = catalog();
        assert_eq!(resolve_title(&movies, "lego movie", None).unwrap().id, 2);
    }

    #[test]
    fn test_resolve_title_falls_back_to_catalog_order() {
        let movies = catalog();
        assert_eq!(resolve_title(&movies, "Alien", None).unwrap().id, 1);
        assert_eq!(resolve_title(&movies, "Alien", Some(1)).unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_compare_with_prompt() {
        let repo = InMemoryMovieRepository::new(catalog());
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().returning(|text| {
            Ok(match text {
                "A superhero fights crime in Gotham" => vec![0.9, 0.1],
                "An animated adventure" => vec![0.2, 0.9],
                _ => vec![1.0, 0.0],
            })
        });

        let comparison = compare_with_prompt(
            &repo,
            &provider,
            "Batman",
            "Lego Movie",
            "superhero movie with action and adventure",
        )
        .await
        .unwrap();

        assert_eq!(comparison.first.title, "Batman");
        assert_eq!(comparison.second.title, "The Lego Movie");
        assert!(comparison.first_to_prompt > comparison.second_to_prompt);
        assert_eq!(comparison.closer_to_prompt().title, "Batman");
        assert_eq!(
            comparison.between_movies,
            cosine_similarity(&[0.9, 0.1], &[0.2, 0.9]).unwrap()
        );
    }

    #[tokio::test]
    async fn test_compare_needs_two_movies() {
        let repo = InMemoryMovieRepository::new(vec![Movie::new(1, "Batman", "Gotham")]);
        let provider = MockEmbeddingProvider::new();

        let result = compare_with_prompt(&repo, &provider, "Batman", "Batman Returns", "bats").await;
        // "Batman Returns" has no exact match; substring search finds nothing, fallback excludes id 1
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
