use thiserror::Error;

use crate::model::{PhaseError, QuestionError, ScoreError, VariantError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Variant(#[from] VariantError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Phase(#[from] PhaseError),
}
