mod clock;
mod config;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use clock::{SectionClock, TickOutcome};
pub use config::{CompletionCallback, SessionConfig};
pub use progress::{COMPLETION_PERCENT, SessionProgress};
pub use service::{ExamSession, Transition};
pub use view::{SectionReport, SessionReport};
pub use workflow::{ExamRunner, RunOutcome, RunnerCommand, RunnerEvent, SessionTicker};
