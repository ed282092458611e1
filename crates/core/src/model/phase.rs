use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot move session from {from} to {to}")]
pub struct PhaseError {
    pub from: SessionPhase,
    pub to: SessionPhase,
}

/// Coarse lifecycle stage of an exam session.
///
/// ```text
/// not-started -> rules-shown <-> structure-shown -> in-progress -> completed
/// ```
///
/// `restart` returns an unfinished session to `rules-shown`; `completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    #[default]
    NotStarted,
    RulesShown,
    StructureShown,
    InProgress,
    Completed,
}

impl SessionPhase {
    #[must_use]
    pub fn can_transition_to(self, next: SessionPhase) -> bool {
        use SessionPhase::{Completed, InProgress, NotStarted, RulesShown, StructureShown};
        matches!(
            (self, next),
            (NotStarted, RulesShown)
                | (RulesShown, StructureShown)
                | (StructureShown, RulesShown)
                | (RulesShown | StructureShown, InProgress)
                | (InProgress, Completed)
                | (RulesShown | InProgress, RulesShown)
        )
    }

    /// Checked transition.
    ///
    /// # Errors
    ///
    /// Returns `PhaseError` when the table does not allow `self -> next`.
    pub fn transition(self, next: SessionPhase) -> Result<SessionPhase, PhaseError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PhaseError {
                from: self,
                to: next,
            })
        }
    }

    /// Rules or structure view, before the clock starts.
    #[must_use]
    pub fn is_briefing(self) -> bool {
        matches!(self, SessionPhase::RulesShown | SessionPhase::StructureShown)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::NotStarted => "not-started",
            SessionPhase::RulesShown => "rules-shown",
            SessionPhase::StructureShown => "structure-shown",
            SessionPhase::InProgress => "in-progress",
            SessionPhase::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
