use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{debug, info, trace};

use exam_core::model::{
    AnswerStore, AuthContext, CompletedScores, ExamVariant, Question, QuestionId, Section,
    SectionKind, SectionScores, SessionId, SessionPhase, WordCount,
};
use exam_core::{Clock, format_countdown};

use super::clock::{SectionClock, TickOutcome};
use super::config::{CompletionCallback, SessionConfig};
use super::progress::{ProgressMeter, SessionProgress};
use super::view::{SectionReport, SessionReport};
use crate::error::SessionError;
use crate::presentation::PresentationMode;
use crate::scoring::ScoreAggregator;

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

/// What moved after a navigation call or a clock tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Same section, next question (new index).
    NextQuestion(usize),
    /// The previous section was scored and `SectionKind` is now current.
    NextSection(SectionKind),
    /// The last section was scored and the session is finished.
    Completed(CompletedScores),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A single timed exam attempt.
///
/// Owns the section sequence, the countdown, the answers and the scores.
/// All mutation goes through the methods below; the host drives ticks and
/// user input into it one at a time.
pub struct ExamSession {
    id: SessionId,
    variant: ExamVariant,
    candidate: AuthContext,
    sections: Vec<Section>,
    current_section: Option<usize>,
    current_question: usize,
    clock: SectionClock,
    answers: AnswerStore,
    scores: ScoreAggregator,
    phase: SessionPhase,
    progress: ProgressMeter,
    presentation: PresentationMode,
    on_complete: Option<CompletionCallback>,
    wall_clock: Clock,
    started_at: Option<DateTime<Utc>>,
    report: Option<SessionReport>,
}

impl ExamSession {
    /// Build a session and show the variant's rules.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSections` or `SessionError::EmptySection` when
    /// the configuration cannot produce a runnable exam.
    pub fn start(config: SessionConfig) -> Result<Self, SessionError> {
        let sections = config.build_sections()?;
        let SessionConfig {
            variant,
            candidate,
            clock,
            estimator,
            presentation,
            on_complete,
            ..
        } = config;

        let mut session = Self {
            id: SessionId::generate(),
            variant,
            candidate,
            sections,
            current_section: None,
            current_question: 0,
            clock: SectionClock::new(),
            answers: AnswerStore::new(),
            scores: ScoreAggregator::new(estimator),
            phase: SessionPhase::NotStarted,
            progress: ProgressMeter::default(),
            presentation: PresentationMode::new(presentation),
            on_complete,
            wall_clock: clock,
            started_at: None,
            report: None,
        };
        session.phase = session.phase.transition(SessionPhase::RulesShown)?;
        info!(
            session = %session.id,
            variant = %session.variant.id(),
            sections = session.sections.len(),
            "exam session created"
        );
        Ok(session)
    }

    //
    // ─── BRIEFING ──────────────────────────────────────────────────────────────
    //

    /// Switch the briefing to the section-structure view.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` unless the rules are showing.
    pub fn show_structure(&mut self) -> Result<(), SessionError> {
        self.phase = self.phase.transition(SessionPhase::StructureShown)?;
        Ok(())
    }

    /// Switch the briefing back to the rules view.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` unless a briefing view is showing.
    pub fn show_rules(&mut self) -> Result<(), SessionError> {
        if !self.phase.is_briefing() {
            return Err(exam_core::model::PhaseError {
                from: self.phase,
                to: SessionPhase::RulesShown,
            }
            .into());
        }
        self.phase = self.phase.transition(SessionPhase::RulesShown)?;
        Ok(())
    }

    /// Start the first section: arm its clock, set its milestone and request
    /// presentation mode. Call this from the user's start action.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` when the session is not in a briefing view.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        self.phase = self.phase.transition(SessionPhase::InProgress)?;
        self.started_at = Some(self.wall_clock.now());
        self.enter_section(0);
        // Refusal is logged inside; the exam runs either way.
        self.presentation.enter();
        info!(session = %self.id, "exam session started");
        Ok(())
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    /// Store the current answer for a question. Any text is accepted for any
    /// question kind.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after completion and
    /// `SessionError::NotInProgress` before the session begins.
    pub fn set_answer(
        &mut self,
        question_id: QuestionId,
        value: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.answers.set(question_id, value);
        Ok(())
    }

    /// Store an answer for the question currently shown and return its id.
    ///
    /// # Errors
    ///
    /// Same as [`ExamSession::set_answer`].
    pub fn answer_current(
        &mut self,
        value: impl Into<String>,
    ) -> Result<QuestionId, SessionError> {
        let section = self.ensure_in_progress()?;
        let question_id = self.sections[section]
            .question(self.current_question)
            .map(Question::id)
            .ok_or(SessionError::NotInProgress)?;
        self.answers.set(question_id, value);
        Ok(question_id)
    }

    /// Stored answer, or `""` for questions never answered.
    #[must_use]
    pub fn answer(&self, question_id: QuestionId) -> &str {
        self.answers.get(question_id)
    }

    /// Word count of the stored answer against the question's word guidance.
    #[must_use]
    pub fn word_count(&self, question_id: QuestionId) -> WordCount {
        let limit = self.find_question(question_id).and_then(Question::max_words);
        WordCount::measure(self.answers.get(question_id), limit)
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Move to the next question, or finish the section from its last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` / `SessionError::Completed` when
    /// no section is running.
    pub fn next_question(&mut self) -> Result<Transition, SessionError> {
        let section = self.ensure_in_progress()?;
        let last = self.sections[section].question_count().saturating_sub(1);
        if self.current_question < last {
            self.current_question += 1;
            debug!(session = %self.id, question = self.current_question, "next question");
            return Ok(Transition::NextQuestion(self.current_question));
        }

        self.clock.disarm();
        self.advance_section()
    }

    /// Close the current section: score it, then move to the next section or
    /// finish the session if it was the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` / `SessionError::Completed` when
    /// no section is running.
    pub fn advance_section(&mut self) -> Result<Transition, SessionError> {
        let index = self.ensure_in_progress()?;
        let finished = self.sections[index].kind();
        let score = self.scores.record_score(finished);
        info!(session = %self.id, section = %finished, %score, "section finished");

        if index + 1 >= self.sections.len() {
            return Ok(Transition::Completed(self.finish()));
        }

        self.enter_section(index + 1);
        Ok(Transition::NextSection(self.sections[index + 1].kind()))
    }

    /// Feed one second of elapsed time.
    ///
    /// Ticks outside an in-progress section, or after the clock was disarmed,
    /// change nothing and return `None`. When the countdown reaches zero the
    /// section is closed exactly as if its last question had been passed.
    pub fn tick(&mut self) -> Option<Transition> {
        if self.phase != SessionPhase::InProgress {
            return None;
        }
        match self.clock.tick() {
            TickOutcome::Idle => None,
            TickOutcome::Running(remaining) => {
                trace!(session = %self.id, remaining, "tick");
                None
            }
            TickOutcome::Expired => {
                info!(session = %self.id, section = ?self.current_kind(), "section time expired");
                self.advance_section().ok()
            }
        }
    }

    /// Go back to the rules view, discarding answers, scores and timing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` for a finished session; hosts start a
    /// new one instead.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        self.phase = self.phase.transition(SessionPhase::RulesShown)?;
        self.teardown();
        self.id = SessionId::generate();
        self.current_section = None;
        self.current_question = 0;
        self.clock.reset();
        self.answers.clear();
        self.scores.reset();
        self.progress = ProgressMeter::default();
        self.started_at = None;
        info!(session = %self.id, "exam session restarted");
        Ok(())
    }

    /// Stop the clock and leave presentation mode without changing the phase.
    ///
    /// For hosts navigating away from a running exam; also runs on drop.
    pub fn teardown(&mut self) {
        self.clock.disarm();
        self.presentation.exit();
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn variant(&self) -> &ExamVariant {
        &self.variant
    }

    #[must_use]
    pub fn candidate(&self) -> &AuthContext {
        &self.candidate
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn current_section_index(&self) -> Option<usize> {
        self.current_section
    }

    /// The running section; `None` before begin and after completion.
    #[must_use]
    pub fn current_section(&self) -> Option<&Section> {
        if self.phase != SessionPhase::InProgress {
            return None;
        }
        self.current_section.and_then(|i| self.sections.get(i))
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_question
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current_section()
            .and_then(|section| section.question(self.current_question))
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.clock.remaining_secs()
    }

    /// Remaining time formatted for display.
    #[must_use]
    pub fn remaining_display(&self) -> String {
        format_countdown(self.clock.remaining_secs())
    }

    #[must_use]
    pub fn is_clock_armed(&self) -> bool {
        self.clock.is_armed()
    }

    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        self.progress.percent()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            percent: self.progress.percent(),
            section_index: self.current_section,
            section_count: self.sections.len(),
            question_index: self.current_question,
            question_count: self.current_section().map_or(0, Section::question_count),
            answered: self.answers.len(),
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn scores(&self) -> &SectionScores {
        self.scores.scores()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    #[must_use]
    pub fn is_presenting(&self) -> bool {
        self.presentation.is_active()
    }

    /// Available once the session completes.
    #[must_use]
    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn ensure_in_progress(&self) -> Result<usize, SessionError> {
        match (self.phase, self.current_section) {
            (SessionPhase::InProgress, Some(index)) => Ok(index),
            (SessionPhase::Completed, _) => Err(SessionError::Completed),
            _ => Err(SessionError::NotInProgress),
        }
    }

    fn current_kind(&self) -> Option<SectionKind> {
        self.current_section().map(Section::kind)
    }

    fn enter_section(&mut self, index: usize) {
        let section = &self.sections[index];
        self.current_section = Some(index);
        self.current_question = 0;
        self.clock.arm(section.duration_secs());
        self.progress.enter_section(section.kind());
        info!(
            session = %self.id,
            section = %section.kind(),
            title = section.display_title(),
            duration = %format_countdown(section.duration_secs()),
            progress = self.progress.percent(),
            "section started"
        );
    }

    fn finish(&mut self) -> CompletedScores {
        self.clock.disarm();
        self.phase = SessionPhase::Completed;
        self.progress.complete();
        self.presentation.exit();

        let completed = self.scores.completed();
        self.report = Some(self.build_report(completed));
        info!(session = %self.id, ?completed, "exam session completed");

        if let Some(callback) = self.on_complete.take() {
            callback(completed);
        }
        completed
    }

    fn build_report(&self, scores: CompletedScores) -> SessionReport {
        let completed_at = self.wall_clock.now();
        let sections = self
            .sections
            .iter()
            .map(|section| SectionReport {
                kind: section.kind(),
                title: section.display_title().to_string(),
                answered: section
                    .questions()
                    .iter()
                    .filter(|q| !self.answers.get(q.id()).trim().is_empty())
                    .count(),
                total: section.question_count(),
                score: scores.get(section.kind()),
            })
            .collect();

        SessionReport {
            session_id: self.id,
            variant: self.variant.id(),
            candidate: self.candidate.clone(),
            started_at: self.started_at.unwrap_or(completed_at),
            completed_at,
            scores,
            sections,
        }
    }

    fn find_question(&self, question_id: QuestionId) -> Option<&Question> {
        self.sections
            .iter()
            .flat_map(Section::questions)
            .find(|q| q.id() == question_id)
    }
}

impl Drop for ExamSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("id", &self.id)
            .field("variant", &self.variant.id())
            .field("phase", &self.phase)
            .field("current_section", &self.current_section)
            .field("current_question", &self.current_question)
            .field("remaining_secs", &self.clock.remaining_secs())
            .field("progress", &self.progress.percent())
            .field("answers_len", &self.answers.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{BandScore, QuestionKind, VariantId};
    use exam_core::time::fixed_clock;
    use std::sync::{Arc, Mutex};

    use crate::question_bank::QuestionBank;
    use crate::scoring::FixedEstimator;

    fn bank(per_section: u64) -> QuestionBank {
        let mut bank = QuestionBank::new();
        for (n, kind) in SectionKind::ALL.into_iter().enumerate() {
            for i in 0..per_section {
                let id = QuestionId::new(100 * (n as u64 + 1) + i);
                let question = Question::open(id, QuestionKind::FillInBlank, "Fill ___").unwrap();
                bank.push(kind, question);
            }
        }
        bank
    }

    fn config(variant: VariantId, per_section: u64) -> SessionConfig {
        SessionConfig::new(ExamVariant::builtin(variant), bank(per_section))
            .with_clock(fixed_clock())
            .with_estimator(FixedEstimator(BandScore::new(6.5).unwrap()))
    }

    #[test]
    fn starts_on_rules_without_a_section() {
        let session = ExamSession::start(config(VariantId::IeltsAcademic, 1)).unwrap();
        assert_eq!(session.phase(), SessionPhase::RulesShown);
        assert_eq!(session.current_section_index(), None);
        assert!(session.scores().is_empty());
        assert_eq!(session.progress_percent(), 0);
    }

    #[test]
    fn briefing_toggles_then_begins() {
        let mut session = ExamSession::start(config(VariantId::Toefl, 1)).unwrap();
        session.show_structure().unwrap();
        assert_eq!(session.phase(), SessionPhase::StructureShown);
        session.show_rules().unwrap();
        session.show_structure().unwrap();
        session.begin().unwrap();

        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.current_section_index(), Some(0));
        assert_eq!(session.remaining_secs(), 36 * 60);
        assert_eq!(session.remaining_display(), "36:00");
        assert_eq!(session.progress_percent(), 25);
        assert!(session.is_presenting());
        assert!(session.show_rules().is_err());
    }

    #[test]
    fn answers_require_a_running_section() {
        let mut session = ExamSession::start(config(VariantId::IeltsAcademic, 1)).unwrap();
        let err = session.set_answer(QuestionId::new(100), "x").unwrap_err();
        assert!(matches!(err, SessionError::NotInProgress));

        session.begin().unwrap();
        session.set_answer(QuestionId::new(100), "first").unwrap();
        session.set_answer(QuestionId::new(100), "second draft").unwrap();
        // Ids outside the session are accepted too.
        session.set_answer(QuestionId::new(9_999), "stray").unwrap();
        assert_eq!(session.answer(QuestionId::new(100)), "second draft");
        assert_eq!(session.answer(QuestionId::new(12_345)), "");
        assert_eq!(session.word_count(QuestionId::new(100)).words, 2);
    }

    #[test]
    fn current_answer_follows_navigation() {
        let mut session = ExamSession::start(config(VariantId::IeltsAcademic, 2)).unwrap();
        assert!(matches!(
            session.answer_current("early"),
            Err(SessionError::NotInProgress)
        ));
        session.begin().unwrap();

        assert_eq!(session.answer_current("one").unwrap(), QuestionId::new(100));
        session.next_question().unwrap();
        session.next_question().unwrap();
        assert_eq!(session.answer_current("two").unwrap(), QuestionId::new(200));
        assert_eq!(session.answer(QuestionId::new(100)), "one");
        assert_eq!(session.answer(QuestionId::new(200)), "two");
    }

    #[test]
    fn next_question_moves_within_section_then_advances() {
        let mut session = ExamSession::start(config(VariantId::IeltsAcademic, 2)).unwrap();
        session.begin().unwrap();

        assert_eq!(session.next_question().unwrap(), Transition::NextQuestion(1));
        assert_eq!(session.scores().len(), 0);

        let t = session.next_question().unwrap();
        assert_eq!(t, Transition::NextSection(SectionKind::Reading));
        assert_eq!(session.current_question_index(), 0);
        assert_eq!(session.progress_percent(), 50);
        assert_eq!(session.scores().get(SectionKind::Listening).unwrap().value(), 6.5);
        assert_eq!(session.remaining_secs(), 3600);
    }

    #[test]
    fn timeout_closes_section_like_navigation() {
        let mut session = ExamSession::start(
            config(VariantId::IeltsAcademic, 1).with_uniform_duration_secs(2),
        )
        .unwrap();
        session.begin().unwrap();

        assert_eq!(session.tick(), None);
        assert_eq!(session.remaining_secs(), 1);
        assert_eq!(
            session.tick(),
            Some(Transition::NextSection(SectionKind::Reading))
        );
        assert!(session.scores().is_recorded(SectionKind::Listening));
        assert_eq!(session.current_section_index(), Some(1));
        assert_eq!(session.remaining_secs(), 2);
    }

    #[test]
    fn ticks_after_disarm_are_ignored() {
        let mut session = ExamSession::start(
            config(VariantId::IeltsAcademic, 1).with_uniform_duration_secs(5),
        )
        .unwrap();
        session.begin().unwrap();
        session.tick();
        session.teardown();
        let before = session.remaining_secs();
        for _ in 0..20 {
            assert_eq!(session.tick(), None);
        }
        assert_eq!(session.remaining_secs(), before);
        assert_eq!(session.current_section_index(), Some(0));
        assert!(!session.is_presenting());
    }

    #[test]
    fn completion_reports_all_four_keys_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let mut session = ExamSession::start(
            config(VariantId::SatMath, 1).on_complete(move |scores| {
                sink.lock().unwrap().push(scores);
            }),
        )
        .unwrap();
        session.begin().unwrap();

        let t = session.next_question().unwrap();
        let Transition::Completed(scores) = t else {
            panic!("expected completion, got {t:?}");
        };
        assert_eq!(scores.reading, 6.5);
        assert_eq!(scores.listening, 0.0);
        assert_eq!(scores.writing, 0.0);
        assert_eq!(scores.speaking, 0.0);

        assert!(session.next_question().is_err());
        assert_eq!(session.tick(), None);
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(session.progress_percent(), 100);
        assert!(!session.is_presenting());
        assert!(matches!(session.restart(), Err(SessionError::Completed)));
    }

    #[test]
    fn restart_clears_the_attempt() {
        let mut session = ExamSession::start(config(VariantId::IeltsGeneral, 1)).unwrap();
        let first_id = session.id();
        session.begin().unwrap();
        session.set_answer(QuestionId::new(100), "draft").unwrap();
        session.next_question().unwrap();

        session.restart().unwrap();
        assert_ne!(session.id(), first_id);
        assert_eq!(session.phase(), SessionPhase::RulesShown);
        assert!(session.answers().is_empty());
        assert!(session.scores().is_empty());
        assert_eq!(session.progress_percent(), 0);
        assert_eq!(session.current_section_index(), None);
        assert!(!session.is_clock_armed());
    }

    #[test]
    fn report_counts_answered_questions() {
        let mut session = ExamSession::start(config(VariantId::Gre, 2)).unwrap();
        session.begin().unwrap();
        session.set_answer(QuestionId::new(200), "ans").unwrap();
        session.set_answer(QuestionId::new(201), "   ").unwrap();
        while !session.is_complete() {
            session.next_question().unwrap();
        }
        let report = session.report().unwrap();
        assert_eq!(report.variant, VariantId::Gre);
        assert_eq!(report.sections.len(), 2);
        assert_eq!(report.sections[0].answered, 1);
        assert_eq!(report.total_questions(), 4);
        assert_eq!(report.started_at, report.completed_at);
    }
}
