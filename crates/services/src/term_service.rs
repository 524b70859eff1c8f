use std::sync::Arc;

use backend::store::TermStore;
use study_core::model::{ModuleId, Term, TermDraft, TermId, TermPatch};

use crate::cache::TermListCache;
use crate::error::TermServiceError;

/// Orchestrates term authoring against the backend with optimistic edits.
///
/// Updates and deletes are applied to the cached list first so the UI can
/// react immediately; if the backend call then fails, the cache is rolled
/// back to its previous state and the error is surfaced.
#[derive(Clone)]
pub struct TermService {
    terms: Arc<dyn TermStore>,
    cache: Arc<TermListCache>,
}

impl TermService {
    #[must_use]
    pub fn new(terms: Arc<dyn TermStore>) -> Self {
        Self {
            terms,
            cache: Arc::new(TermListCache::new()),
        }
    }

    /// Fetches a module's terms from the backend and refreshes the cache.
    ///
    /// # Errors
    ///
    /// Returns `TermServiceError::Backend` if the fetch fails.
    pub async fn list_terms(&self, module_id: &ModuleId) -> Result<Vec<Term>, TermServiceError> {
        let terms = self.terms.list_terms(module_id).await?;
        self.cache.put(module_id.clone(), terms.clone());
        Ok(terms)
    }

    /// The cached list, without touching the backend.
    #[must_use]
    pub fn cached_terms(&self, module_id: &ModuleId) -> Option<Vec<Term>> {
        self.cache.get(module_id)
    }

    /// Validates a draft and creates the term on the backend.
    ///
    /// # Errors
    ///
    /// Returns `TermServiceError::Term` for validation failures and
    /// `TermServiceError::Backend` if persistence fails.
    pub async fn create_term(
        &self,
        module_id: &ModuleId,
        draft: TermDraft,
    ) -> Result<Term, TermServiceError> {
        let new_term = draft.validate()?;
        let term = self.terms.create_term(module_id, &new_term).await?;
        self.cache.push_term(module_id, term.clone());
        Ok(term)
    }

    /// Applies a patch optimistically, rolling the cache back on failure.
    ///
    /// # Errors
    ///
    /// Returns `TermServiceError::UnknownTerm` when the term is not in any
    /// cached list and `TermServiceError::Backend` if the backend rejects
    /// the update (after the rollback).
    pub async fn update_term(
        &self,
        term_id: &TermId,
        patch: TermPatch,
    ) -> Result<(), TermServiceError> {
        let previous = self
            .cache
            .apply_patch(term_id, &patch)
            .ok_or_else(|| TermServiceError::UnknownTerm(term_id.clone()))?;

        if let Err(err) = self.terms.update_term(term_id, &patch).await {
            log::warn!("term update failed, rolling back cache: {err}");
            self.cache.restore_term(previous);
            return Err(err.into());
        }
        Ok(())
    }

    /// Flips a term's starred flag, optimistically.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`TermService::update_term`].
    pub async fn toggle_star(&self, term_id: &TermId) -> Result<bool, TermServiceError> {
        let module_id = self
            .cache
            .module_of(term_id)
            .ok_or_else(|| TermServiceError::UnknownTerm(term_id.clone()))?;
        let starred = self
            .cache
            .get(&module_id)
            .and_then(|terms| terms.iter().find(|t| &t.id == term_id).map(|t| t.is_starred))
            .ok_or_else(|| TermServiceError::UnknownTerm(term_id.clone()))?;

        let next = !starred;
        self.update_term(term_id, TermPatch::star(next)).await?;
        Ok(next)
    }

    /// Deletes a term optimistically, reinserting it on failure.
    ///
    /// # Errors
    ///
    /// Returns `TermServiceError::UnknownTerm` when the term is not cached
    /// and `TermServiceError::Backend` if the delete fails (after rollback).
    pub async fn delete_term(&self, term_id: &TermId) -> Result<(), TermServiceError> {
        let removed = self
            .cache
            .remove_term(term_id)
            .ok_or_else(|| TermServiceError::UnknownTerm(term_id.clone()))?;

        if let Err(err) = self.terms.delete_term(term_id).await {
            log::warn!("term delete failed, rolling back cache: {err}");
            self.cache.reinsert(removed);
            return Err(err.into());
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use backend::InMemoryBackend;

    async fn seeded() -> (TermService, InMemoryBackend, ModuleId) {
        let store = InMemoryBackend::new();
        let module_id = store.seed_module("Animals", &[("cat", "кот"), ("dog", "собака")]);
        let service = TermService::new(Arc::new(store.clone()));
        service.list_terms(&module_id).await.unwrap();
        (service, store, module_id)
    }

    #[tokio::test]
    async fn create_term_validates_and_caches() {
        let (service, _store, module_id) = seeded().await;

        let draft = TermDraft {
            term: " bird ".into(),
            definition: " птица ".into(),
        };
        let term = service.create_term(&module_id, draft).await.unwrap();
        assert_eq!(term.term, "bird");

        let cached = service.cached_terms(&module_id).unwrap();
        assert_eq!(cached.len(), 3);
        assert_eq!(cached[2].definition, "птица");
    }

    #[tokio::test]
    async fn create_term_rejects_blank_input() {
        let (service, _store, module_id) = seeded().await;

        let draft = TermDraft {
            term: "  ".into(),
            definition: "x".into(),
        };
        let err = service.create_term(&module_id, draft).await.unwrap_err();
        assert!(matches!(err, TermServiceError::Term(_)));
    }

    #[tokio::test]
    async fn toggle_star_persists_and_updates_cache() {
        let (service, store, module_id) = seeded().await;
        let term_id = service.cached_terms(&module_id).unwrap()[0].id.clone();

        assert!(service.toggle_star(&term_id).await.unwrap());
        assert!(service.cached_terms(&module_id).unwrap()[0].is_starred);

        let persisted = store.list_terms(&module_id).await.unwrap();
        assert!(persisted[0].is_starred);

        assert!(!service.toggle_star(&term_id).await.unwrap());
    }

    #[tokio::test]
    async fn failed_update_rolls_the_cache_back() {
        let (service, store, module_id) = seeded().await;
        let term_id = service.cached_terms(&module_id).unwrap()[0].id.clone();

        store.fail_term_updates(true);
        let err = service.toggle_star(&term_id).await.unwrap_err();
        assert!(matches!(err, TermServiceError::Backend(_)));
        assert!(!service.cached_terms(&module_id).unwrap()[0].is_starred);
    }

    #[tokio::test]
    async fn failed_delete_reinserts_at_original_position() {
        let (service, store, module_id) = seeded().await;
        let term_id = service.cached_terms(&module_id).unwrap()[0].id.clone();

        store.fail_term_updates(true);
        service.delete_term(&term_id).await.unwrap_err();

        let cached = service.cached_terms(&module_id).unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].id, term_id);
    }

    #[tokio::test]
    async fn delete_removes_from_backend_and_cache() {
        let (service, store, module_id) = seeded().await;
        let term_id = service.cached_terms(&module_id).unwrap()[0].id.clone();

        service.delete_term(&term_id).await.unwrap();
        assert_eq!(service.cached_terms(&module_id).unwrap().len(), 1);
        assert_eq!(store.list_terms(&module_id).await.unwrap().len(), 1);
    }
}
