use std::sync::Arc;

use async_trait::async_trait;

use study_core::model::{
    Credentials, ModuleId, ModuleInfo, ModulePatch, ModuleSummary, NewModule, NewTerm,
    ProgressStatus, Registration, Term, TermId, TermPatch, UserProfile,
};

use crate::error::BackendError;
use crate::http::HttpStore;
use crate::memory::InMemoryBackend;

/// Store contract for a module's terms.
#[async_trait]
pub trait TermStore: Send + Sync {
    /// Fetch all terms belonging to a module.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for an unknown module, or other
    /// backend errors.
    async fn list_terms(&self, module_id: &ModuleId) -> Result<Vec<Term>, BackendError>;

    /// Create a term; the backend assigns the id.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the term cannot be stored.
    async fn create_term(
        &self,
        module_id: &ModuleId,
        term: &NewTerm,
    ) -> Result<Term, BackendError>;

    /// Apply a partial update (text fields and/or the starred flag).
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for an unknown term.
    async fn update_term(&self, id: &TermId, patch: &TermPatch) -> Result<(), BackendError>;

    /// Delete a term.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for an unknown term.
    async fn delete_term(&self, id: &TermId) -> Result<(), BackendError>;
}

/// Store contract for per-term mastery status.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Fetch the current status; `Ok(None)` when no record exists yet.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` for transport failures.
    async fn term_status(&self, id: &TermId) -> Result<Option<ProgressStatus>, BackendError>;

    /// Persist a new status for the term.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the update cannot be stored.
    async fn set_term_status(
        &self,
        id: &TermId,
        status: ProgressStatus,
    ) -> Result<(), BackendError>;
}

/// Store contract for the module catalog.
#[async_trait]
pub trait ModuleStore: Send + Sync {
    /// List the authenticated user's own modules.
    async fn list_modules(&self) -> Result<Vec<ModuleSummary>, BackendError>;

    /// List public community modules, optionally filtered by a search query.
    async fn community_modules(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<ModuleSummary>, BackendError>;

    /// Fetch one module's detail view, including its terms.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for an unknown module.
    async fn get_module(&self, id: &ModuleId) -> Result<ModuleInfo, BackendError>;

    /// Create a module owned by the authenticated user.
    async fn create_module(&self, module: &NewModule) -> Result<ModuleSummary, BackendError>;

    /// Apply a partial update to a module.
    async fn update_module(&self, id: &ModuleId, patch: &ModulePatch)
    -> Result<(), BackendError>;

    /// Delete a module and its terms.
    async fn delete_module(&self, id: &ModuleId) -> Result<(), BackendError>;
}

/// Store contract for authentication.
///
/// The HTTP implementation keeps the session in a cookie jar, so these calls
/// have side effects on subsequent requests from the same store.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn register(&self, registration: &Registration) -> Result<(), BackendError>;

    async fn login(&self, credentials: &Credentials) -> Result<(), BackendError>;

    async fn logout(&self) -> Result<(), BackendError>;

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` when the session has expired.
    async fn current_user(&self) -> Result<UserProfile, BackendError>;
}

/// Aggregates the store traits behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Backend {
    pub modules: Arc<dyn ModuleStore>,
    pub terms: Arc<dyn TermStore>,
    pub progress: Arc<dyn ProgressStore>,
    pub auth: Arc<dyn AuthStore>,
}

impl Backend {
    /// A backend held entirely in process memory, for tests and prototyping.
    #[must_use]
    pub fn in_memory() -> Self {
        let store = InMemoryBackend::new();
        Self {
            modules: Arc::new(store.clone()),
            terms: Arc::new(store.clone()),
            progress: Arc::new(store.clone()),
            auth: Arc::new(store),
        }
    }

    /// A backend talking HTTP to the study service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the base url is invalid or the HTTP client
    /// cannot be built.
    pub fn http(base_url: &str) -> Result<Self, BackendError> {
        let store = Arc::new(HttpStore::new(base_url)?);
        Ok(Self {
            modules: store.clone(),
            terms: store.clone(),
            progress: store.clone(),
            auth: store,
        })
    }
}
