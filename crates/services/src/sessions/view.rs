use chrono::{DateTime, Utc};
use serde::Serialize;

use exam_core::model::{AuthContext, CompletedScores, SectionKind, SessionId, VariantId};

/// Outcome of one section in a finished session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub kind: SectionKind,
    pub title: String,
    pub answered: usize,
    pub total: usize,
    pub score: f64,
}

/// Record of a completed exam attempt, handed to the host for storage or display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub variant: VariantId,
    pub candidate: AuthContext,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub scores: CompletedScores,
    pub sections: Vec<SectionReport>,
}

impl SessionReport {
    /// Questions with a stored answer, across all sections.
    #[must_use]
    pub fn answered(&self) -> usize {
        self.sections.iter().map(|s| s.answered).sum()
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(|s| s.total).sum()
    }

    /// Mean of the scored sections, rounded to the nearest half band.
    #[must_use]
    pub fn overall_band(&self) -> Option<f64> {
        if self.sections.is_empty() {
            return None;
        }
        let sum: f64 = self.sections.iter().map(|s| s.score).sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / self.sections.len() as f64;
        Some((mean * 2.0).round() / 2.0)
    }

    /// Pretty JSON for hosts that persist or print the report.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
