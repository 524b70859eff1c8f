//! Shared error types for the services crate.

use thiserror::Error;

use backend::BackendError;
use study_core::model::{ModuleError, RegistrationError, TermError, TermId};
use study_core::session::SessionError;

/// Errors emitted by `AuthSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted by `TermService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TermServiceError {
    #[error("term {0} is not in the cached list")]
    UnknownTerm(TermId),
    #[error(transparent)]
    Term(#[from] TermError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted by `ModuleService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModuleServiceError {
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted by `StudyFlowService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyError {
    #[error("term {0} is not part of this session")]
    UnknownTerm(TermId),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
