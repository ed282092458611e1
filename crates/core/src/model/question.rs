use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has empty text")]
    EmptyText { id: QuestionId },

    #[error("multiple-choice question {id} needs at least two options, got {count}")]
    TooFewOptions { id: QuestionId, count: usize },

    #[error("question {id} is not multiple-choice and cannot carry options")]
    UnexpectedOptions { id: QuestionId },

    #[error("question {id} has duplicate option id {option}")]
    DuplicateOption { id: QuestionId, option: String },

    #[error("word limit on question {id} must be > 0 and only set for essays")]
    InvalidWordLimit { id: QuestionId },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    FillInBlank,
    Essay,
    SpeakingPrompt,
}

/// A selectable choice on a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

impl QuestionOption {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A single prompt inside a section.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    text: String,
    options: Vec<QuestionOption>,
    max_words: Option<u32>,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is blank, the options do not match
    /// the kind, or a word limit is set on something other than an essay.
    pub fn new(
        id: QuestionId,
        kind: QuestionKind,
        text: impl Into<String>,
        options: Vec<QuestionOption>,
        max_words: Option<u32>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText { id });
        }

        match kind {
            QuestionKind::MultipleChoice => {
                if options.len() < 2 {
                    return Err(QuestionError::TooFewOptions {
                        id,
                        count: options.len(),
                    });
                }
                for (i, option) in options.iter().enumerate() {
                    if options[..i].iter().any(|o| o.id == option.id) {
                        return Err(QuestionError::DuplicateOption {
                            id,
                            option: option.id.clone(),
                        });
                    }
                }
            }
            _ if !options.is_empty() => return Err(QuestionError::UnexpectedOptions { id }),
            _ => {}
        }

        match (kind, max_words) {
            (_, None) => {}
            (QuestionKind::Essay, Some(limit)) if limit > 0 => {}
            _ => return Err(QuestionError::InvalidWordLimit { id }),
        }

        Ok(Self {
            id,
            kind,
            text,
            options,
            max_words,
        })
    }

    /// Shorthand for a free-text question without options.
    ///
    /// # Errors
    ///
    /// Same as [`Question::new`].
    pub fn open(
        id: QuestionId,
        kind: QuestionKind,
        text: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        Self::new(id, kind, text, Vec::new(), None)
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    #[must_use]
    pub fn max_words(&self) -> Option<u32> {
        self.max_words
    }
}
