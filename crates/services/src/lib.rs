#![forbid(unsafe_code)]

pub mod auth;
pub mod cache;
pub mod error;
pub mod module_service;
pub mod study;
pub mod term_service;

pub use study_core::Clock;

pub use error::{AuthError, ModuleServiceError, StudyError, TermServiceError};

pub use auth::AuthSession;
pub use cache::TermListCache;
pub use module_service::ModuleService;
pub use study::{FlushOutcome, SessionAnswerResult, StudyFlowService, StudyOptions};
pub use term_service::TermService;
