use std::sync::{Arc, Mutex, MutexGuard};

use backend::store::ModuleStore;
use study_core::model::{ModuleError, ModuleId, ModuleInfo, ModulePatch, ModuleSummary, NewModule};

use crate::error::ModuleServiceError;

/// Orchestrates the module catalog: the user's own list, the community
/// listing, and module authoring.
///
/// The owned-module list is cached after the first fetch; deletes are applied
/// to that cache optimistically and rolled back when the backend refuses.
#[derive(Clone)]
pub struct ModuleService {
    modules: Arc<dyn ModuleStore>,
    owned: Arc<Mutex<Option<Vec<ModuleSummary>>>>,
}

impl ModuleService {
    #[must_use]
    pub fn new(modules: Arc<dyn ModuleStore>) -> Self {
        Self {
            modules,
            owned: Arc::new(Mutex::new(None)),
        }
    }

    fn owned(&self) -> MutexGuard<'_, Option<Vec<ModuleSummary>>> {
        self.owned.lock().expect("module cache lock poisoned")
    }

    /// The user's modules, fetched once and then served from cache.
    ///
    /// # Errors
    ///
    /// Returns `ModuleServiceError::Backend` if the fetch fails.
    pub async fn my_modules(&self) -> Result<Vec<ModuleSummary>, ModuleServiceError> {
        if let Some(cached) = self.owned().clone() {
            return Ok(cached);
        }
        let modules = self.modules.list_modules().await?;
        *self.owned() = Some(modules.clone());
        Ok(modules)
    }

    /// Forces the next `my_modules` call to hit the backend.
    pub fn invalidate(&self) {
        *self.owned() = None;
    }

    /// Public community modules, optionally filtered by a search query.
    ///
    /// Never cached: the catalog belongs to other users and changes under us.
    ///
    /// # Errors
    ///
    /// Returns `ModuleServiceError::Backend` if the fetch fails.
    pub async fn community(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<ModuleSummary>, ModuleServiceError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        Ok(self.modules.community_modules(query).await?)
    }

    /// One module's detail view, including its terms.
    ///
    /// # Errors
    ///
    /// Returns `ModuleServiceError::Backend` (not-found included) on failure.
    pub async fn get(&self, id: &ModuleId) -> Result<ModuleInfo, ModuleServiceError> {
        Ok(self.modules.get_module(id).await?)
    }

    /// Validates and creates a module, appending it to the cached list.
    ///
    /// # Errors
    ///
    /// Returns `ModuleServiceError::Module` for an empty title and
    /// `ModuleServiceError::Backend` if persistence fails.
    pub async fn create(
        &self,
        title: &str,
        description: Option<String>,
        is_private: bool,
    ) -> Result<ModuleSummary, ModuleServiceError> {
        let new_module = NewModule::new(title, description, is_private)?;
        let summary = self.modules.create_module(&new_module).await?;
        if let Some(cached) = self.owned().as_mut() {
            cached.push(summary.clone());
        }
        Ok(summary)
    }

    /// Applies a partial update and invalidates the cached list.
    ///
    /// # Errors
    ///
    /// Returns `ModuleServiceError::Module` when the patch would blank the
    /// title and `ModuleServiceError::Backend` if the update fails.
    pub async fn update(
        &self,
        id: &ModuleId,
        patch: ModulePatch,
    ) -> Result<(), ModuleServiceError> {
        if let Some(title) = &patch.title
            && title.trim().is_empty()
        {
            return Err(ModuleError::EmptyTitle.into());
        }
        self.modules.update_module(id, &patch).await?;
        self.invalidate();
        Ok(())
    }

    /// Deletes a module optimistically, restoring the cache entry on failure.
    ///
    /// # Errors
    ///
    /// Returns `ModuleServiceError::Backend` if the delete fails (after the
    /// rollback).
    pub async fn delete(&self, id: &ModuleId) -> Result<(), ModuleServiceError> {
        let removed = {
            let mut owned = self.owned();
            owned.as_mut().and_then(|cached| {
                cached
                    .iter()
                    .position(|m| &m.id == id)
                    .map(|pos| (pos, cached.remove(pos)))
            })
        };

        if let Err(err) = self.modules.delete_module(id).await {
            log::warn!("module delete failed, rolling back cache: {err}");
            if let (Some((pos, summary)), Some(cached)) = (removed, self.owned().as_mut()) {
                cached.insert(pos.min(cached.len()), summary);
            }
            return Err(err.into());
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
