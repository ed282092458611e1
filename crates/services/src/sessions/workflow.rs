use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use exam_core::model::{QuestionId, SessionPhase, WordCount};

use super::service::{ExamSession, Transition};
use super::view::SessionReport;
use crate::error::SessionError;

/// Input from the host while a session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerCommand {
    /// Answer whichever question is current when the command is handled.
    AnswerCurrent(String),
    Answer { question_id: QuestionId, value: String },
    Next,
    /// The host is navigating away; the attempt is abandoned.
    Quit,
}

/// Notifications for the host's view.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerEvent {
    Tick { remaining_secs: u32 },
    /// An answer was stored; `words` is measured against the question's
    /// word guidance, if any.
    Answered {
        question_id: QuestionId,
        words: WordCount,
    },
    Transition(Transition),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(SessionReport),
    Abandoned,
}

/// Repeating one-second timer scoped to a running session.
///
/// Held only while the session is in progress; dropping it cancels every
/// pending tick. Late wakeups yield a single tick, never a burst.
pub struct SessionTicker {
    interval: Interval,
}

impl SessionTicker {
    #[must_use]
    pub fn start(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Drives an `ExamSession` from a ticker and a stream of host commands.
///
/// Ticks and commands are handled one at a time on the calling task, so a tick
/// (and any section change it causes) finishes before the next input is read.
#[derive(Debug, Clone)]
pub struct ExamRunner {
    tick_period: Duration,
}

impl Default for ExamRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ExamRunner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Run the session until it completes or the host quits.
    ///
    /// Begins the session if it is still in a briefing view. A closed command
    /// channel counts as `Quit`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the session cannot begin (already completed,
    /// or never started).
    pub async fn run(
        &self,
        session: &mut ExamSession,
        mut commands: mpsc::Receiver<RunnerCommand>,
        events: Option<mpsc::UnboundedSender<RunnerEvent>>,
    ) -> Result<RunOutcome, SessionError> {
        if session.phase().is_briefing() {
            session.begin()?;
        }
        match session.phase() {
            SessionPhase::InProgress => {}
            SessionPhase::Completed => return Err(SessionError::Completed),
            _ => return Err(SessionError::NotInProgress),
        }

        let emit = |event: RunnerEvent| {
            if let Some(tx) = &events {
                // A host that stopped listening does not stop the exam.
                let _ = tx.send(event);
            }
        };

        let mut ticker = SessionTicker::start(self.tick_period);
        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(RunnerCommand::AnswerCurrent(value)) => {
                        let question_id = session.answer_current(value)?;
                        let words = session.word_count(question_id);
                        emit(RunnerEvent::Answered { question_id, words });
                    }
                    Some(RunnerCommand::Answer { question_id, value }) => {
                        session.set_answer(question_id, value)?;
                        let words = session.word_count(question_id);
                        emit(RunnerEvent::Answered { question_id, words });
                    }
                    Some(RunnerCommand::Next) => {
                        let transition = session.next_question()?;
                        emit(RunnerEvent::Transition(transition));
                    }
                    Some(RunnerCommand::Quit) | None => {
                        session.teardown();
                        info!(session = %session.id(), "exam session abandoned");
                        return Ok(RunOutcome::Abandoned);
                    }
                },
                () = ticker.tick() => {
                    let transition = session.tick();
                    emit(RunnerEvent::Tick { remaining_secs: session.remaining_secs() });
                    if let Some(transition) = transition {
                        emit(RunnerEvent::Transition(transition));
                    }
                }
            }

            if session.is_complete() {
                drop(ticker);
                debug!(session = %session.id(), "ticker released");
                return session
                    .report()
                    .cloned()
                    .map(RunOutcome::Completed)
                    .ok_or(SessionError::Completed);
            }
        }
    }
}
