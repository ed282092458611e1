use rand::Rng;

use exam_core::model::{BandScore, CompletedScores, SectionKind, SectionScores};

/// Produces a score for a finished section.
///
/// The runner only ever asks once per section; implementations do not need to
/// be idempotent themselves.
pub trait ScoreEstimator: Send + Sync {
    fn estimate(&self, section: SectionKind) -> BandScore;
}

/// Placeholder estimator drawing uniformly from the half-step band scale.
///
/// No answers are graded.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBandEstimator;

impl ScoreEstimator for RandomBandEstimator {
    fn estimate(&self, _section: SectionKind) -> BandScore {
        let r: f64 = rand::rng().random();
        BandScore::from_unit(r)
    }
}

/// Always returns the same score.
#[derive(Debug, Clone, Copy)]
pub struct FixedEstimator(pub BandScore);

impl ScoreEstimator for FixedEstimator {
    fn estimate(&self, _section: SectionKind) -> BandScore {
        self.0
    }
}

/// Records at most one score per section using an injected estimator.
pub struct ScoreAggregator {
    estimator: Box<dyn ScoreEstimator>,
    scores: SectionScores,
}

impl ScoreAggregator {
    #[must_use]
    pub fn new(estimator: Box<dyn ScoreEstimator>) -> Self {
        Self {
            estimator,
            scores: SectionScores::new(),
        }
    }

    /// Score `section` unless it already has a score; returns the stored value.
    ///
    /// The estimator is not consulted on repeat calls.
    pub fn record_score(&mut self, section: SectionKind) -> BandScore {
        if let Some(existing) = self.scores.get(section) {
            return existing;
        }
        let estimate = self.estimator.estimate(section);
        self.scores.record(section, estimate)
    }

    #[must_use]
    pub fn scores(&self) -> &SectionScores {
        &self.scores
    }

    #[must_use]
    pub fn completed(&self) -> CompletedScores {
        self.scores.completed()
    }

    pub(crate) fn reset(&mut self) {
        self.scores.clear();
    }
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::new(Box::new(RandomBandEstimator))
    }
}

impl std::fmt::Debug for ScoreAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreAggregator")
            .field("scores", &self.scores)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingEstimator {
        calls: Arc<AtomicUsize>,
    }

    impl ScoreEstimator for CountingEstimator {
        fn estimate(&self, _section: SectionKind) -> BandScore {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            BandScore::from_unit(if n == 0 { 0.0 } else { 0.99 })
        }
    }

    #[test]
    fn random_scores_stay_on_scale() {
        let estimator = RandomBandEstimator;
        for _ in 0..500 {
            let value = estimator.estimate(SectionKind::Reading).value();
            assert!((5.0..=9.0).contains(&value));
            assert_eq!((value * 2.0).fract(), 0.0);
        }
    }

    #[test]
    fn record_score_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut aggregator = ScoreAggregator::new(Box::new(CountingEstimator {
            calls: Arc::clone(&calls),
        }));

        let first = aggregator.record_score(SectionKind::Listening);
        for _ in 0..5 {
            assert_eq!(aggregator.record_score(SectionKind::Listening), first);
        }
        assert_eq!(first.value(), 5.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_clears_scores() {
        let mut aggregator = ScoreAggregator::new(Box::new(FixedEstimator(BandScore::MAX)));
        aggregator.record_score(SectionKind::Speaking);
        assert_eq!(aggregator.completed().speaking, 9.0);
        aggregator.reset();
        assert!(aggregator.scores().is_empty());
    }
}
