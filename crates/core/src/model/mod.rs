mod answer;
mod auth;
mod ids;
mod phase;
mod question;
mod score;
mod section;
mod variant;

pub use ids::{ParseIdError, QuestionId, SessionId};

pub use answer::{AnswerStore, WordCount, word_count};
pub use auth::AuthContext;
pub use phase::{PhaseError, SessionPhase};
pub use question::{Question, QuestionError, QuestionKind, QuestionOption};
pub use score::{BandScore, CompletedScores, ScoreError, SectionScores};
pub use section::{ParseSectionError, Section, SectionKind};
pub use variant::{ExamVariant, VariantError, VariantId};
