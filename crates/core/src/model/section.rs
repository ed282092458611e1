use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::question::Question;

//
// ─── SECTION KIND ──────────────────────────────────────────────────────────────
//

/// One of the four timed exam parts.
///
/// Variants are declared in canonical exam order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Listening,
    Reading,
    Writing,
    Speaking,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Listening,
        SectionKind::Reading,
        SectionKind::Writing,
        SectionKind::Speaking,
    ];

    /// Duration used when neither the host nor the variant specify one.
    #[must_use]
    pub fn default_duration_secs(self) -> u32 {
        match self {
            SectionKind::Listening | SectionKind::Reading | SectionKind::Writing => 1800,
            SectionKind::Speaking => 900,
        }
    }

    /// Progress percentage shown once this section becomes current.
    ///
    /// Fixed per kind so progress stays comparable across variants.
    #[must_use]
    pub fn milestone_percent(self) -> u8 {
        match self {
            SectionKind::Listening => 25,
            SectionKind::Reading => 50,
            SectionKind::Writing => 75,
            SectionKind::Speaking => 90,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Listening => "listening",
            SectionKind::Reading => "reading",
            SectionKind::Writing => "writing",
            SectionKind::Speaking => "speaking",
        }
    }

    /// Generic title used when a variant does not relabel the section.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Listening => "Listening",
            SectionKind::Reading => "Reading",
            SectionKind::Writing => "Writing",
            SectionKind::Speaking => "Speaking",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a section.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section: {0}")]
pub struct ParseSectionError(pub String);

impl FromStr for SectionKind {
    type Err = ParseSectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "listening" => Ok(SectionKind::Listening),
            "reading" => Ok(SectionKind::Reading),
            "writing" => Ok(SectionKind::Writing),
            "speaking" => Ok(SectionKind::Speaking),
            other => Err(ParseSectionError(other.to_string())),
        }
    }
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// A timed block of questions as presented in one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    kind: SectionKind,
    duration_secs: u32,
    questions: Vec<Question>,
    display_title: String,
}

impl Section {
    /// A zero duration falls back to the kind's default.
    #[must_use]
    pub fn new(
        kind: SectionKind,
        duration_secs: u32,
        questions: Vec<Question>,
        display_title: impl Into<String>,
    ) -> Self {
        let duration_secs = if duration_secs == 0 {
            kind.default_duration_secs()
        } else {
            duration_secs
        };
        Self {
            kind,
            duration_secs,
            questions,
            display_title: display_title.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn display_title(&self) -> &str {
        &self.display_title
    }
}
