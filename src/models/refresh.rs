use std::fmt::Display;

use super::MovieId;

/// Why a selected movie was not embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyDescription,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyDescription => write!(f, "no description"),
        }
    }
}

/// What happened to one movie during a refresh run
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated,
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshEntry {
    pub movie_id: MovieId,
    pub title: String,
    pub outcome: RefreshOutcome,
}

/// Summary of one refresh run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub entries: Vec<RefreshEntry>,
}

impl RefreshReport {
    pub fn record(&mut self, movie_id: MovieId, title: &str, outcome: RefreshOutcome) {
        self.entries.push(RefreshEntry {
            movie_id,
            title: title.to_string(),
            outcome,
        });
    }

    /// Number of movies selected for this run
    pub fn selected(&self) -> usize {
        self.entries.len()
    }

    /// Number of movies whose embedding was written
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, RefreshOutcome::Updated))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RefreshOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RefreshOutcome::Failed(_)))
    }

    /// Failed movies with their error messages
    pub fn failures(&self) -> impl Iterator<Item = (MovieId, &str)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            RefreshOutcome::Failed(error) => Some((e.movie_id, error.as_str())),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&RefreshOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = RefreshReport::default();
        report.record(1, "Batman", RefreshOutcome::Updated);
        report.record(2, "Untitled", RefreshOutcome::Skipped(SkipReason::EmptyDescription));
        report.record(3, "Lego Movie", RefreshOutcome::Failed("timeout".to_string()));
        report.record(4, "Inception", RefreshOutcome::Updated);

        assert_eq!(report.selected(), 4);
        assert_eq!(report.updated(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures().collect::<Vec<_>>(), vec![(3, "timeout")]);
    }
}
