use std::collections::HashMap;

use crate::model::ids::QuestionId;

/// Current answer per question for one session.
///
/// Entries are upserted on every edit and only dropped by [`AnswerStore::clear`],
/// which the session calls when it (re)starts. Values are stored as typed;
/// nothing checks them against the question kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    answers: HashMap<QuestionId, String>,
}

impl AnswerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, question_id: QuestionId, value: impl Into<String>) {
        self.answers.insert(question_id, value.into());
    }

    /// Stored answer, or `""` when the question was never touched.
    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> &str {
        self.answers.get(&question_id).map_or("", String::as_str)
    }

    #[must_use]
    pub fn contains(&self, question_id: QuestionId) -> bool {
        self.answers.contains_key(&question_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &str)> {
        self.answers.iter().map(|(id, v)| (*id, v.as_str()))
    }
}

/// Number of whitespace-separated words in `text`.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Word count of an answer measured against an optional limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordCount {
    pub words: usize,
    pub limit: Option<u32>,
}

impl WordCount {
    #[must_use]
    pub fn measure(text: &str, limit: Option<u32>) -> Self {
        Self {
            words: word_count(text),
            limit,
        }
    }

    /// True when a limit exists and the answer goes past it. Informational only.
    #[must_use]
    pub fn is_over_limit(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.words > usize::try_from(limit).unwrap_or(usize::MAX))
    }
}
