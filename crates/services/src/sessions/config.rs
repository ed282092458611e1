use std::collections::{BTreeMap, HashSet};

use exam_core::Clock;
use exam_core::model::{AuthContext, CompletedScores, ExamVariant, Section, SectionKind};

use crate::error::SessionError;
use crate::presentation::{NoopPresentation, PresentationModeController};
use crate::question_bank::QuestionBank;
use crate::scoring::{RandomBandEstimator, ScoreEstimator};

/// Invoked once with the final scores when a session completes.
pub type CompletionCallback = Box<dyn FnOnce(CompletedScores) + Send>;

/// Everything a host hands over to start an exam session.
pub struct SessionConfig {
    pub(crate) variant: ExamVariant,
    pub(crate) bank: QuestionBank,
    pub(crate) candidate: AuthContext,
    pub(crate) clock: Clock,
    pub(crate) duration_overrides_secs: BTreeMap<SectionKind, u32>,
    pub(crate) estimator: Box<dyn ScoreEstimator>,
    pub(crate) presentation: Box<dyn PresentationModeController>,
    pub(crate) on_complete: Option<CompletionCallback>,
}

impl SessionConfig {
    /// Defaults: guest candidate, system clock, random placeholder scores, no
    /// presentation mode, no completion callback.
    #[must_use]
    pub fn new(variant: ExamVariant, bank: QuestionBank) -> Self {
        Self {
            variant,
            bank,
            candidate: AuthContext::guest(),
            clock: Clock::default_clock(),
            duration_overrides_secs: BTreeMap::new(),
            estimator: Box::new(RandomBandEstimator),
            presentation: Box::new(NoopPresentation),
            on_complete: None,
        }
    }

    #[must_use]
    pub fn with_candidate(mut self, candidate: AuthContext) -> Self {
        self.candidate = candidate;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Host override for one section, in seconds. Takes precedence over the
    /// variant's minute overrides. Zero means "no override".
    #[must_use]
    pub fn with_section_duration_secs(mut self, section: SectionKind, secs: u32) -> Self {
        if secs == 0 {
            self.duration_overrides_secs.remove(&section);
        } else {
            self.duration_overrides_secs.insert(section, secs);
        }
        self
    }

    /// Change the variant's own duration for one section, in minutes. A host
    /// override in seconds still wins over it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Variant` for a zero duration or a section the
    /// variant does not have.
    pub fn with_section_minutes(
        mut self,
        section: SectionKind,
        minutes: u32,
    ) -> Result<Self, SessionError> {
        self.variant = self.variant.with_duration_override(section, minutes)?;
        Ok(self)
    }

    /// Same duration for every section; handy for drills and tests.
    #[must_use]
    pub fn with_uniform_duration_secs(self, secs: u32) -> Self {
        SectionKind::ALL
            .into_iter()
            .fold(self, |cfg, kind| cfg.with_section_duration_secs(kind, secs))
    }

    #[must_use]
    pub fn with_estimator(mut self, estimator: impl ScoreEstimator + 'static) -> Self {
        self.estimator = Box::new(estimator);
        self
    }

    #[must_use]
    pub fn with_presentation(
        mut self,
        presentation: impl PresentationModeController + 'static,
    ) -> Self {
        self.presentation = Box::new(presentation);
        self
    }

    #[must_use]
    pub fn on_complete(mut self, callback: impl FnOnce(CompletedScores) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn variant(&self) -> &ExamVariant {
        &self.variant
    }

    /// Seconds allotted to `section`: host override, then variant override,
    /// then the kind default.
    #[must_use]
    pub fn duration_secs(&self, section: SectionKind) -> u32 {
        self.duration_overrides_secs
            .get(&section)
            .copied()
            .unwrap_or_else(|| self.variant.duration_secs(section))
    }

    /// Materialise the variant's sections from the bank.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSections` for a variant without sections,
    /// `SessionError::EmptySection` when the bank has nothing for one of them
    /// and `SessionError::DuplicateQuestion` when two of its questions share
    /// an id.
    pub(crate) fn build_sections(&self) -> Result<Vec<Section>, SessionError> {
        let variant_id = self.variant.id();
        if self.variant.sections().is_empty() {
            return Err(SessionError::NoSections(variant_id));
        }

        let mut seen = HashSet::new();
        let duplicate = self
            .variant
            .sections()
            .iter()
            .flat_map(|&kind| self.bank.questions(kind))
            .find(|question| !seen.insert(question.id()));
        if let Some(question) = duplicate {
            return Err(SessionError::DuplicateQuestion(question.id()));
        }

        self.variant
            .sections()
            .iter()
            .map(|&kind| {
                let questions = self.bank.questions(kind);
                if questions.is_empty() {
                    return Err(SessionError::EmptySection {
                        variant: variant_id,
                        section: kind,
                    });
                }
                Ok(Section::new(
                    kind,
                    self.duration_secs(kind),
                    questions.to_vec(),
                    self.variant.display_title(kind),
                ))
            })
            .collect()
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("variant", &self.variant.id())
            .field("questions", &self.bank.len())
            .field("candidate", &self.candidate)
            .field("duration_overrides_secs", &self.duration_overrides_secs)
            .field("has_on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}
