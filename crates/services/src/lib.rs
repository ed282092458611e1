#![forbid(unsafe_code)]

pub mod error;
pub mod presentation;
pub mod question_bank;
pub mod scoring;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use error::{BankError, PresentationError, SessionError};
pub use presentation::{NoopPresentation, PresentationModeController};
pub use question_bank::QuestionBank;
pub use scoring::{FixedEstimator, RandomBandEstimator, ScoreAggregator, ScoreEstimator};

pub use sessions::{
    ExamRunner, ExamSession, RunOutcome, RunnerCommand, RunnerEvent, SessionConfig,
    SessionReport, Transition,
};
