use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::section::SectionKind;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VariantError {
    #[error("unknown exam variant: {0}")]
    Unknown(String),

    #[error("duration override for {section} must be > 0 minutes")]
    ZeroDuration { section: SectionKind },

    #[error("{section} is not part of {variant}")]
    SectionNotApplicable {
        variant: VariantId,
        section: SectionKind,
    },
}

//
// ─── VARIANT ID ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantId {
    IeltsAcademic,
    IeltsGeneral,
    Toefl,
    Pte,
    Gre,
    Gmat,
    Sat,
    SatMath,
    SatEnglish,
}

impl VariantId {
    pub const ALL: [VariantId; 9] = [
        VariantId::IeltsAcademic,
        VariantId::IeltsGeneral,
        VariantId::Toefl,
        VariantId::Pte,
        VariantId::Gre,
        VariantId::Gmat,
        VariantId::Sat,
        VariantId::SatMath,
        VariantId::SatEnglish,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VariantId::IeltsAcademic => "ielts-academic",
            VariantId::IeltsGeneral => "ielts-general",
            VariantId::Toefl => "toefl",
            VariantId::Pte => "pte",
            VariantId::Gre => "gre",
            VariantId::Gmat => "gmat",
            VariantId::Sat => "sat",
            VariantId::SatMath => "sat-math",
            VariantId::SatEnglish => "sat-english",
        }
    }

    /// Human-readable exam name.
    #[must_use]
    pub fn exam_name(self) -> &'static str {
        match self {
            VariantId::IeltsAcademic => "IELTS Academic",
            VariantId::IeltsGeneral => "IELTS General Training",
            VariantId::Toefl => "TOEFL iBT",
            VariantId::Pte => "PTE Academic",
            VariantId::Gre => "GRE General Test",
            VariantId::Gmat => "GMAT Focus",
            VariantId::Sat => "SAT",
            VariantId::SatMath => "SAT Math",
            VariantId::SatEnglish => "SAT Reading & Writing",
        }
    }

    /// Name used as the prefix of section titles.
    fn family_name(self) -> &'static str {
        if self.is_sat() { "SAT" } else { self.exam_name() }
    }

    fn is_sat(self) -> bool {
        matches!(self, VariantId::Sat | VariantId::SatMath | VariantId::SatEnglish)
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantId {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        // Bare "ielts" is how the practice pages refer to the academic module.
        if wanted == "ielts" || wanted == "academic" {
            return Ok(VariantId::IeltsAcademic);
        }
        VariantId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or(VariantError::Unknown(wanted))
    }
}

//
// ─── EXAM VARIANT ──────────────────────────────────────────────────────────────
//

/// A concrete exam configuration: which sections apply, their rules and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamVariant {
    id: VariantId,
    sections: Vec<SectionKind>,
    rules: Vec<String>,
    duration_overrides_mins: BTreeMap<SectionKind, u32>,
    titles: BTreeMap<SectionKind, String>,
}

impl ExamVariant {
    /// Create a variant with the given sections.
    ///
    /// Sections are deduplicated and put in canonical exam order so progress
    /// milestones always increase. An empty list is accepted here; starting a
    /// session with it is what fails.
    #[must_use]
    pub fn new(
        id: VariantId,
        sections: impl IntoIterator<Item = SectionKind>,
        rules: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut sections: Vec<SectionKind> = sections.into_iter().collect();
        sections.sort();
        sections.dedup();
        Self {
            id,
            sections,
            rules: rules.into_iter().map(Into::into).collect(),
            duration_overrides_mins: BTreeMap::new(),
            titles: BTreeMap::new(),
        }
    }

    /// The built-in configuration for an exam family.
    #[must_use]
    pub fn builtin(id: VariantId) -> Self {
        use SectionKind::{Listening, Reading, Speaking, Writing};

        let variant = match id {
            VariantId::IeltsAcademic | VariantId::IeltsGeneral => Self::new(
                id,
                [Listening, Reading, Writing, Speaking],
                IELTS_RULES.iter().copied(),
            )
            .with_override_unchecked(Listening, 30)
            .with_override_unchecked(Reading, 60)
            .with_override_unchecked(Writing, 60)
            .with_override_unchecked(Speaking, 15),
            VariantId::Toefl => Self::new(
                id,
                [Listening, Reading, Writing, Speaking],
                TOEFL_RULES.iter().copied(),
            )
            .with_override_unchecked(Listening, 36)
            .with_override_unchecked(Reading, 35)
            .with_override_unchecked(Writing, 29)
            .with_override_unchecked(Speaking, 16),
            VariantId::Pte => Self::new(
                id,
                [Listening, Reading, Writing, Speaking],
                PTE_RULES.iter().copied(),
            ),
            VariantId::Gre => Self::new(id, [Reading, Writing], GRE_RULES.iter().copied())
                .with_title_unchecked(Reading, "Verbal Reasoning")
                .with_title_unchecked(Writing, "Analytical Writing")
                .with_override_unchecked(Writing, 30),
            VariantId::Gmat => Self::new(id, [Reading, Writing], GMAT_RULES.iter().copied())
                .with_title_unchecked(Reading, "Verbal Reasoning")
                .with_title_unchecked(Writing, "Data Insights")
                .with_override_unchecked(Reading, 45)
                .with_override_unchecked(Writing, 45),
            VariantId::Sat => Self::new(id, [Reading, Writing], SAT_RULES.iter().copied()),
            VariantId::SatMath => Self::new(id, [Reading], SAT_RULES.iter().copied()),
            VariantId::SatEnglish => Self::new(id, [Writing], SAT_RULES.iter().copied()),
        };

        if id.is_sat() {
            variant
                .with_title_unchecked(Reading, "Math")
                .with_title_unchecked(Writing, "English")
        } else {
            variant
        }
    }

    /// All built-in variants in declaration order.
    #[must_use]
    pub fn catalog() -> Vec<Self> {
        VariantId::ALL.into_iter().map(Self::builtin).collect()
    }

    /// Override the duration of one section, in minutes.
    ///
    /// # Errors
    ///
    /// Returns `VariantError::ZeroDuration` for a zero override and
    /// `VariantError::SectionNotApplicable` for sections outside the variant.
    pub fn with_duration_override(
        mut self,
        section: SectionKind,
        minutes: u32,
    ) -> Result<Self, VariantError> {
        if minutes == 0 {
            return Err(VariantError::ZeroDuration { section });
        }
        if !self.applies_to(section) {
            return Err(VariantError::SectionNotApplicable {
                variant: self.id,
                section,
            });
        }
        self.duration_overrides_mins.insert(section, minutes);
        Ok(self)
    }

    fn with_override_unchecked(mut self, section: SectionKind, minutes: u32) -> Self {
        self.duration_overrides_mins.insert(section, minutes);
        self
    }

    fn with_title_unchecked(mut self, section: SectionKind, title: &str) -> Self {
        if self.applies_to(section) {
            self.titles.insert(section, title.to_string());
        }
        self
    }

    #[must_use]
    pub fn id(&self) -> VariantId {
        self.id
    }

    #[must_use]
    pub fn sections(&self) -> &[SectionKind] {
        &self.sections
    }

    #[must_use]
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    #[must_use]
    pub fn applies_to(&self, section: SectionKind) -> bool {
        self.sections.contains(&section)
    }

    /// Duration override in minutes, if one is configured.
    #[must_use]
    pub fn duration_override_mins(&self, section: SectionKind) -> Option<u32> {
        self.duration_overrides_mins.get(&section).copied()
    }

    /// Effective section duration: variant override, else the kind default.
    #[must_use]
    pub fn duration_secs(&self, section: SectionKind) -> u32 {
        self.duration_override_mins(section)
            .map_or_else(|| section.default_duration_secs(), |m| m.saturating_mul(60))
    }

    #[must_use]
    pub fn display_title(&self, section: SectionKind) -> String {
        let label = self
            .titles
            .get(&section)
            .map_or(section.title(), String::as_str);
        format!("{} {label}", self.id.family_name())
    }

    /// Short description of what the section covers for this exam.
    #[must_use]
    pub fn description(&self, section: SectionKind) -> &'static str {
        match (self.id.is_sat(), section) {
            (true, SectionKind::Reading) => {
                "Algebra, advanced math, problem solving and data analysis, geometry and trigonometry."
            }
            (true, SectionKind::Writing) => {
                "Reading comprehension, craft and structure, expression of ideas and standard English conventions."
            }
            (_, SectionKind::Listening) => {
                "Recorded conversations and talks followed by comprehension questions. Each recording plays once."
            }
            (_, SectionKind::Reading) => {
                "Passages of increasing difficulty with multiple-choice and completion questions."
            }
            (_, SectionKind::Writing) => {
                "Timed essay tasks. Plan, write and review your response within the word guidance."
            }
            (_, SectionKind::Speaking) => {
                "Spoken responses to prompts. Prepare briefly, then answer clearly and at length."
            }
        }
    }
}

const IELTS_RULES: &[&str] = &[
    "The test has four parts taken in order: Listening, Reading, Writing and Speaking.",
    "Each section is timed separately and moves on automatically when time runs out.",
    "You cannot return to a section once it has finished.",
    "Recordings in the Listening section are played once only.",
    "Word counts for writing tasks are guidance; longer answers are still accepted.",
];

const TOEFL_RULES: &[&str] = &[
    "Sections run in a fixed order and each has its own timer.",
    "Answers are saved as you type; you may change them until the section ends.",
    "Speaking prompts give short preparation time before the response window.",
];

const PTE_RULES: &[&str] = &[
    "The test is taken in a single sitting with timed parts.",
    "Some items are scored on several skills at once.",
    "Do not pause between items; the timer keeps running.",
];

const GRE_RULES: &[&str] = &[
    "Verbal Reasoning and Analytical Writing are timed independently.",
    "You may move between questions within a section but not between sections.",
];

const GMAT_RULES: &[&str] = &[
    "Each section is timed and adaptive to your performance.",
    "Unanswered questions at the end of a section are counted as incorrect.",
];

const SAT_RULES: &[&str] = &[
    "Math and English are timed modules taken in order.",
    "A calculator is allowed for the entire Math section.",
    "There is no penalty for guessing; answer every question.",
];
