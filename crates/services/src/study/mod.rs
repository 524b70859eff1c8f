mod progress;
mod service;

// Public API of the study subsystem.
pub use crate::error::StudyError;
pub use progress::FlushOutcome;
pub use service::{SessionAnswerResult, StudyFlowService, StudyOptions};
