//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{
    PhaseError, QuestionError, QuestionId, SectionKind, VariantError, VariantId,
};

/// Errors emitted by `ExamSession`.
///
/// `NoSections`, `EmptySection` and `DuplicateQuestion` are configuration
/// errors: the session is never created, so it cannot advance into a broken
/// section.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("exam variant {0} has no applicable sections")]
    NoSections(VariantId),
    #[error("{section} section of {variant} has no questions")]
    EmptySection {
        variant: VariantId,
        section: SectionKind,
    },
    #[error("question id {0} is used more than once in this exam")]
    DuplicateQuestion(QuestionId),
    #[error("session is not in progress")]
    NotInProgress,
    #[error("session already completed")]
    Completed,
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error(transparent)]
    Variant(#[from] VariantError),
}

impl SessionError {
    /// True for errors that come from the exam configuration rather than from
    /// calling an operation in the wrong phase.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SessionError::NoSections(_)
                | SessionError::EmptySection { .. }
                | SessionError::DuplicateQuestion(_)
                | SessionError::Variant(_)
        )
    }
}

/// The host could not enter or leave presentation mode.
///
/// Always recovered locally; the session logs it and carries on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PresentationError {
    #[error("presentation mode is not supported here")]
    Unsupported,
    #[error("presentation mode request was denied: {0}")]
    Denied(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors emitted while loading a question bank.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("failed to read question bank {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error("question id {0} appears more than once in the bank")]
    DuplicateId(u64),
}
