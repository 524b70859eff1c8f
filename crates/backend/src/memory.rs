//! In-memory backend used by tests and offline prototyping.
//!
//! Implements every store trait over a single mutex-guarded state, so one
//! clone-able value can stand in for the whole HTTP service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use study_core::model::{
    Credentials, ModuleId, ModuleInfo, ModulePatch, ModuleProgressCounts, ModuleSummary,
    NewModule, NewTerm, ProgressStatus, Registration, Term, TermId, TermPatch, UserId,
    UserProfile,
};

use crate::error::BackendError;
use crate::store::{AuthStore, ModuleStore, ProgressStore, TermStore};

#[derive(Debug, Clone)]
struct ModuleRecord {
    id: ModuleId,
    title: String,
    description: Option<String>,
    is_private: bool,
    terms: Vec<Term>,
}

#[derive(Debug, Default)]
struct State {
    modules: Vec<ModuleRecord>,
    progress: HashMap<TermId, ProgressStatus>,
    users: Vec<UserProfile>,
    current_user: Option<UserProfile>,
    next_module: u32,
    next_term: u32,
    fail_term_updates: bool,
    fail_progress_updates: bool,
}

/// Process-local stand-in for the study service.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("backend state lock poisoned")
    }

    /// Creates a module with the given `(term, definition)` pairs and returns
    /// its id.
    pub fn seed_module(&self, title: &str, pairs: &[(&str, &str)]) -> ModuleId {
        let mut state = self.state();
        state.next_module += 1;
        let module_id = ModuleId::new(format!("m{}", state.next_module));

        let terms = pairs
            .iter()
            .map(|(term, definition)| {
                state.next_term += 1;
                Term {
                    id: TermId::new(format!("t{}", state.next_term)),
                    term: (*term).to_owned(),
                    definition: (*definition).to_owned(),
                    is_starred: false,
                }
            })
            .collect();

        state.modules.push(ModuleRecord {
            id: module_id.clone(),
            title: title.to_owned(),
            description: None,
            is_private: false,
            terms,
        });
        module_id
    }

    /// When set, `update_term` and `delete_term` fail with a 500-style error.
    /// Used to exercise rollback paths.
    pub fn fail_term_updates(&self, fail: bool) {
        self.state().fail_term_updates = fail;
    }

    /// When set, `set_term_status` fails. Used to exercise flush reporting.
    pub fn fail_progress_updates(&self, fail: bool) {
        self.state().fail_progress_updates = fail;
    }

    /// Recorded status for a term, bypassing the trait for assertions.
    #[must_use]
    pub fn status_of(&self, id: &TermId) -> Option<ProgressStatus> {
        self.state().progress.get(id).copied()
    }
}

fn injected_failure() -> BackendError {
    BackendError::HttpStatus(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
}

fn summary(record: &ModuleRecord) -> ModuleSummary {
    ModuleSummary {
        id: record.id.clone(),
        title: record.title.clone(),
        description: record.description.clone(),
        terms_count: record.terms.len() as u32,
        is_private: record.is_private,
    }
}

impl State {
    fn module(&self, id: &ModuleId) -> Result<&ModuleRecord, BackendError> {
        self.modules
            .iter()
            .find(|m| &m.id == id)
            .ok_or(BackendError::NotFound)
    }

    fn term_mut(&mut self, id: &TermId) -> Result<&mut Term, BackendError> {
        self.modules
            .iter_mut()
            .flat_map(|m| m.terms.iter_mut())
            .find(|t| &t.id == id)
            .ok_or(BackendError::NotFound)
    }
}

//
// ─── STORE IMPLEMENTATIONS ─────────────────────────────────────────────────────
//

#[async_trait]
impl TermStore for InMemoryBackend {
    async fn list_terms(&self, module_id: &ModuleId) -> Result<Vec<Term>, BackendError> {
        let state = self.state();
        Ok(state.module(module_id)?.terms.clone())
    }

    async fn create_term(
        &self,
        module_id: &ModuleId,
        term: &NewTerm,
    ) -> Result<Term, BackendError> {
        let mut state = self.state();
        state.next_term += 1;
        let id = TermId::new(format!("t{}", state.next_term));
        let stored = term.clone().assign_id(id);

        let record = state
            .modules
            .iter_mut()
            .find(|m| &m.id == module_id)
            .ok_or(BackendError::NotFound)?;
        record.terms.push(stored.clone());
        Ok(stored)
    }

    async fn update_term(&self, id: &TermId, patch: &TermPatch) -> Result<(), BackendError> {
        let mut state = self.state();
        if state.fail_term_updates {
            return Err(injected_failure());
        }
        state.term_mut(id)?.apply_patch(patch);
        Ok(())
    }

    async fn delete_term(&self, id: &TermId) -> Result<(), BackendError> {
        let mut state = self.state();
        if state.fail_term_updates {
            return Err(injected_failure());
        }
        for record in &mut state.modules {
            if let Some(pos) = record.terms.iter().position(|t| &t.id == id) {
                record.terms.remove(pos);
                state.progress.remove(id);
                return Ok(());
            }
        }
        Err(BackendError::NotFound)
    }
}

#[async_trait]
impl ProgressStore for InMemoryBackend {
    async fn term_status(&self, id: &TermId) -> Result<Option<ProgressStatus>, BackendError> {
        Ok(self.state().progress.get(id).copied())
    }

    async fn set_term_status(
        &self,
        id: &TermId,
        status: ProgressStatus,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        if state.fail_progress_updates {
            return Err(injected_failure());
        }
        state.progress.insert(id.clone(), status);
        Ok(())
    }
}

#[async_trait]
impl ModuleStore for InMemoryBackend {
    async fn list_modules(&self) -> Result<Vec<ModuleSummary>, BackendError> {
        Ok(self.state().modules.iter().map(summary).collect())
    }

    async fn community_modules(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<ModuleSummary>, BackendError> {
        let state = self.state();
        let needle = query.map(str::to_lowercase);
        Ok(state
            .modules
            .iter()
            .filter(|m| !m.is_private)
            .filter(|m| match &needle {
                Some(q) => m.title.to_lowercase().contains(q),
                None => true,
            })
            .map(summary)
            .collect())
    }

    async fn get_module(&self, id: &ModuleId) -> Result<ModuleInfo, BackendError> {
        let state = self.state();
        let record = state.module(id)?;

        let mut progress = ModuleProgressCounts::default();
        for term in &record.terms {
            match state.progress.get(&term.id).copied().unwrap_or_default() {
                ProgressStatus::NotStarted => progress.not_started += 1,
                ProgressStatus::InProgress => progress.in_progress += 1,
                ProgressStatus::Completed => progress.completed += 1,
            }
        }
        progress.completed_terms = progress.completed;

        Ok(ModuleInfo {
            title: record.title.clone(),
            description: record.description.clone(),
            terms_count: record.terms.len() as u32,
            is_private: record.is_private,
            progress: Some(progress),
            owner_name: state.current_user.as_ref().map(|u| u.username.clone()),
            owner_img: None,
            is_owner: Some(true),
            is_collected: None,
            terms: record.terms.clone(),
        })
    }

    async fn create_module(&self, module: &NewModule) -> Result<ModuleSummary, BackendError> {
        let mut state = self.state();
        state.next_module += 1;
        let record = ModuleRecord {
            id: ModuleId::new(format!("m{}", state.next_module)),
            title: module.title().to_owned(),
            description: module.description().map(str::to_owned),
            is_private: module.is_private(),
            terms: Vec::new(),
        };
        let out = summary(&record);
        state.modules.push(record);
        Ok(out)
    }

    async fn update_module(
        &self,
        id: &ModuleId,
        patch: &ModulePatch,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        let record = state
            .modules
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or(BackendError::NotFound)?;
        if let Some(title) = &patch.title {
            record.title = title.clone();
        }
        if let Some(description) = &patch.description {
            record.description = Some(description.clone());
        }
        if let Some(is_private) = patch.is_private {
            record.is_private = is_private;
        }
        Ok(())
    }

    async fn delete_module(&self, id: &ModuleId) -> Result<(), BackendError> {
        let mut state = self.state();
        let pos = state
            .modules
            .iter()
            .position(|m| &m.id == id)
            .ok_or(BackendError::NotFound)?;
        let record = state.modules.remove(pos);
        for term in &record.terms {
            state.progress.remove(&term.id);
        }
        Ok(())
    }
}

#[async_trait]
impl AuthStore for InMemoryBackend {
    async fn register(&self, registration: &Registration) -> Result<(), BackendError> {
        let mut state = self.state();
        let profile = UserProfile {
            id: UserId::new(format!("u{}", state.users.len() + 1)),
            username: registration.username().to_owned(),
            email: registration.email().to_owned(),
            image: None,
        };
        state.users.push(profile);
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<(), BackendError> {
        let mut state = self.state();
        let profile = state
            .users
            .iter()
            .find(|u| u.email == credentials.email)
            .cloned()
            .unwrap_or_else(|| UserProfile {
                id: UserId::new("u0"),
                username: credentials.email.clone(),
                email: credentials.email.clone(),
                image: None,
            });
        state.current_user = Some(profile);
        Ok(())
    }

    async fn logout(&self) -> Result<(), BackendError> {
        self.state().current_user = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<UserProfile, BackendError> {
        self.state()
            .current_user
            .clone()
            .ok_or(BackendError::Unauthorized)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_module_lists_its_terms() {
        let backend = InMemoryBackend::new();
        let id = backend.seed_module("Animals", &[("cat", "кот"), ("dog", "собака")]);

        let terms = backend.list_terms(&id).await.unwrap();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].term, "cat");
        assert_eq!(terms[1].definition, "собака");
    }

    #[tokio::test]
    async fn unknown_module_is_not_found() {
        let backend = InMemoryBackend::new();
        let err = backend.list_terms(&ModuleId::new("nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn star_patch_round_trips() {
        let backend = InMemoryBackend::new();
        let id = backend.seed_module("Animals", &[("cat", "кот")]);
        let term_id = backend.list_terms(&id).await.unwrap()[0].id.clone();

        backend
            .update_term(&term_id, &TermPatch::star(true))
            .await
            .unwrap();
        assert!(backend.list_terms(&id).await.unwrap()[0].is_starred);
    }

    #[tokio::test]
    async fn injected_failure_blocks_term_updates() {
        let backend = InMemoryBackend::new();
        let id = backend.seed_module("Animals", &[("cat", "кот")]);
        let term_id = backend.list_terms(&id).await.unwrap()[0].id.clone();

        backend.fail_term_updates(true);
        let err = backend
            .update_term(&term_id, &TermPatch::star(true))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::HttpStatus(_)));
        assert!(!backend.list_terms(&id).await.unwrap()[0].is_starred);
    }

    #[tokio::test]
    async fn progress_defaults_to_absent_and_persists() {
        let backend = InMemoryBackend::new();
        let id = backend.seed_module("Animals", &[("cat", "кот")]);
        let term_id = backend.list_terms(&id).await.unwrap()[0].id.clone();

        assert_eq!(backend.term_status(&term_id).await.unwrap(), None);

        backend
            .set_term_status(&term_id, ProgressStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(
            backend.term_status(&term_id).await.unwrap(),
            Some(ProgressStatus::InProgress)
        );
    }

    #[tokio::test]
    async fn module_info_counts_progress() {
        let backend = InMemoryBackend::new();
        let id = backend.seed_module("Animals", &[("cat", "кот"), ("dog", "собака")]);
        let term_id = backend.list_terms(&id).await.unwrap()[0].id.clone();
        backend
            .set_term_status(&term_id, ProgressStatus::Completed)
            .await
            .unwrap();

        let info = backend.get_module(&id).await.unwrap();
        let progress = info.progress.unwrap();
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.not_started, 1);
        assert_eq!(progress.completed_terms, 1);
        assert_eq!(progress.percent_complete(), 50);
    }

    #[tokio::test]
    async fn community_listing_filters_private_and_by_query() {
        let backend = InMemoryBackend::new();
        backend.seed_module("Spanish verbs", &[]);
        let hidden = backend.seed_module("Secret", &[]);
        backend
            .update_module(
                &hidden,
                &ModulePatch {
                    is_private: Some(true),
                    ..ModulePatch::default()
                },
            )
            .await
            .unwrap();

        let all = backend.community_modules(None).await.unwrap();
        assert_eq!(all.len(), 1);

        let hits = backend.community_modules(Some("SPAN")).await.unwrap();
        assert_eq!(hits.len(), 1);
        let misses = backend.community_modules(Some("french")).await.unwrap();
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_module_drops_its_progress() {
        let backend = InMemoryBackend::new();
        let id = backend.seed_module("Animals", &[("cat", "кот")]);
        let term_id = backend.list_terms(&id).await.unwrap()[0].id.clone();
        backend
            .set_term_status(&term_id, ProgressStatus::Completed)
            .await
            .unwrap();

        backend.delete_module(&id).await.unwrap();
        assert_eq!(backend.status_of(&term_id), None);
        assert!(backend.get_module(&id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn auth_session_lifecycle() {
        let backend = InMemoryBackend::new();
        let registration =
            Registration::new("sam", "sam@example.com", "longenough").unwrap();
        backend.register(&registration).await.unwrap();

        assert!(matches!(
            backend.current_user().await.unwrap_err(),
            BackendError::Unauthorized
        ));

        backend
            .login(&Credentials {
                email: "sam@example.com".into(),
                password: "longenough".into(),
            })
            .await
            .unwrap();
        assert_eq!(backend.current_user().await.unwrap().username, "sam");

        backend.logout().await.unwrap();
        assert!(backend.current_user().await.is_err());
    }
}
