use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use exam_core::model::{Question, QuestionId, QuestionKind, QuestionOption, SectionKind};

use crate::error::BankError;

/// Questions available to sessions, grouped by section kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionBank {
    questions: BTreeMap<SectionKind, Vec<Question>>,
}

#[derive(Debug, Deserialize)]
struct BankFile {
    #[serde(default)]
    listening: Vec<QuestionDraft>,
    #[serde(default)]
    reading: Vec<QuestionDraft>,
    #[serde(default)]
    writing: Vec<QuestionDraft>,
    #[serde(default)]
    speaking: Vec<QuestionDraft>,
}

#[derive(Debug, Deserialize)]
struct QuestionDraft {
    id: u64,
    kind: QuestionKind,
    text: String,
    #[serde(default)]
    options: Vec<QuestionOption>,
    #[serde(default)]
    max_words: Option<u32>,
}

impl QuestionDraft {
    fn validate(self) -> Result<Question, BankError> {
        Ok(Question::new(
            QuestionId::new(self.id),
            self.kind,
            self.text,
            self.options,
            self.max_words,
        )?)
    }
}

impl QuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a bank authored in TOML, one array of tables per section.
    ///
    /// ```toml
    /// [[reading]]
    /// id = 201
    /// kind = "multiple-choice"
    /// text = "What is the main idea of the passage?"
    /// options = [{ id = "a", text = "..." }, { id = "b", text = "..." }]
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `BankError` for malformed TOML, invalid questions, or ids that
    /// repeat anywhere in the bank.
    pub fn from_toml_str(raw: &str) -> Result<Self, BankError> {
        let file: BankFile = toml::from_str(raw)?;
        let mut bank = Self::new();
        let mut seen = HashSet::new();
        for (kind, drafts) in [
            (SectionKind::Listening, file.listening),
            (SectionKind::Reading, file.reading),
            (SectionKind::Writing, file.writing),
            (SectionKind::Speaking, file.speaking),
        ] {
            for draft in drafts {
                if !seen.insert(draft.id) {
                    return Err(BankError::DuplicateId(draft.id));
                }
                bank.push(kind, draft.validate()?);
            }
        }
        Ok(bank)
    }

    /// Read and parse a TOML bank from disk.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Read` when the file cannot be read, otherwise as
    /// [`QuestionBank::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| BankError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Built-in practice content used when the host supplies no bank.
    ///
    /// # Panics
    ///
    /// Panics if the built-in bank does not parse.
    #[must_use]
    pub fn sample() -> Self {
        Self::from_toml_str(SAMPLE_BANK).expect("built-in sample bank should parse")
    }

    pub fn push(&mut self, kind: SectionKind, question: Question) {
        self.questions.entry(kind).or_default().push(question);
    }

    #[must_use]
    pub fn questions(&self, kind: SectionKind) -> &[Question] {
        self.questions.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const SAMPLE_BANK: &str = r#"
[[listening]]
id = 101
kind = "multiple-choice"
text = "Why is the caller phoning the accommodation office?"
options = [
    { id = "a", text = "To cancel a booking" },
    { id = "b", text = "To ask about room prices" },
    { id = "c", text = "To report a maintenance problem" },
]

[[listening]]
id = 102
kind = "fill-in-blank"
text = "The library reopens on ______ after the holiday."

[[reading]]
id = 201
kind = "multiple-choice"
text = "According to the passage, what first drove the growth of urban beekeeping?"
options = [
    { id = "a", text = "Government subsidies" },
    { id = "b", text = "Declining rural bee populations" },
    { id = "c", text = "Demand from local restaurants" },
    { id = "d", text = "A change in planning law" },
]

[[reading]]
id = 202
kind = "fill-in-blank"
text = "Researchers measured hive health by counting ______ per frame."

[[writing]]
id = 301
kind = "essay"
text = "The chart shows household spending in three countries. Summarise the information by selecting and reporting the main features."
max_words = 150

[[writing]]
id = 302
kind = "essay"
text = "Some people think universities should focus on job skills. To what extent do you agree or disagree?"
max_words = 250

[[speaking]]
id = 401
kind = "speaking-prompt"
text = "Describe a place you visited that you would like to return to."

[[speaking]]
id = 402
kind = "speaking-prompt"
text = "How has technology changed the way people in your country travel?"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_covers_every_section() {
        assert!(QuestionBank::from_toml_str(SAMPLE_BANK).is_ok());
        let bank = QuestionBank::sample();
        for kind in SectionKind::ALL {
            assert_eq!(bank.questions(kind).len(), 2, "{kind}");
        }
        assert_eq!(bank.len(), 8);
        let essay = &bank.questions(SectionKind::Writing)[1];
        assert_eq!(essay.max_words(), Some(250));
    }

    #[test]
    fn missing_sections_are_empty() {
        let bank = QuestionBank::from_toml_str(
            r#"
            [[speaking]]
            id = 1
            kind = "speaking-prompt"
            text = "Talk about your hometown."
            "#,
        )
        .unwrap();
        assert!(bank.questions(SectionKind::Reading).is_empty());
        assert_eq!(bank.questions(SectionKind::Speaking).len(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected_across_sections() {
        let err = QuestionBank::from_toml_str(
            r#"
            [[reading]]
            id = 5
            kind = "fill-in-blank"
            text = "A ____"

            [[writing]]
            id = 5
            kind = "essay"
            text = "Discuss."
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, BankError::DuplicateId(5)));
    }

    #[test]
    fn invalid_question_surfaces_question_error() {
        let err = QuestionBank::from_toml_str(
            r#"
            [[listening]]
            id = 9
            kind = "multiple-choice"
            text = "Pick"
            options = [{ id = "a", text = "only one" }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, BankError::Question(_)));
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let err = QuestionBank::from_toml_str(
            r#"
            [[listening]]
            id = 9
            kind = "matching"
            text = "Match"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, BankError::Parse(_)));
    }
}
