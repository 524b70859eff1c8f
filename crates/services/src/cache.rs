//! Per-module term list cache backing the optimistic edit flow.
//!
//! Edits are applied to the cached list before the backend call; each
//! mutating method hands back what it replaced so the caller can roll the
//! cache back when the backend rejects the change.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use study_core::model::{ModuleId, Term, TermId, TermPatch};

/// A removed term together with where it sat, for rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedTerm {
    pub module_id: ModuleId,
    pub position: usize,
    pub term: Term,
}

/// Thread-safe cache of term lists keyed by module.
#[derive(Debug, Default)]
pub struct TermListCache {
    entries: Mutex<HashMap<ModuleId, Vec<Term>>>,
}

impl TermListCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ModuleId, Vec<Term>>> {
        self.entries.lock().expect("term cache lock poisoned")
    }

    /// Replaces the cached list for a module.
    pub fn put(&self, module_id: ModuleId, terms: Vec<Term>) {
        self.entries().insert(module_id, terms);
    }

    /// Cached list for a module, if one has been fetched.
    #[must_use]
    pub fn get(&self, module_id: &ModuleId) -> Option<Vec<Term>> {
        self.entries().get(module_id).cloned()
    }

    /// Drops the cached list for a module.
    pub fn invalidate(&self, module_id: &ModuleId) {
        self.entries().remove(module_id);
    }

    /// Finds the module a cached term belongs to.
    #[must_use]
    pub fn module_of(&self, term_id: &TermId) -> Option<ModuleId> {
        self.entries()
            .iter()
            .find(|(_, terms)| terms.iter().any(|t| &t.id == term_id))
            .map(|(module_id, _)| module_id.clone())
    }

    /// Appends a freshly created term to its module's cached list, if cached.
    pub fn push_term(&self, module_id: &ModuleId, term: Term) {
        if let Some(terms) = self.entries().get_mut(module_id) {
            terms.push(term);
        }
    }

    /// Applies a patch to a cached term, returning the pre-patch term for
    /// rollback. `None` when the term is not cached.
    #[must_use]
    pub fn apply_patch(&self, term_id: &TermId, patch: &TermPatch) -> Option<Term> {
        let mut entries = self.entries();
        let term = entries
            .values_mut()
            .flat_map(|terms| terms.iter_mut())
            .find(|t| &t.id == term_id)?;
        let previous = term.clone();
        term.apply_patch(patch);
        Some(previous)
    }

    /// Puts a previously patched term back.
    pub fn restore_term(&self, term: Term) {
        let mut entries = self.entries();
        if let Some(slot) = entries
            .values_mut()
            .flat_map(|terms| terms.iter_mut())
            .find(|t| t.id == term.id)
        {
            *slot = term;
        }
    }

    /// Removes a term from its cached list, returning it with its position
    /// for rollback. `None` when the term is not cached.
    #[must_use]
    pub fn remove_term(&self, term_id: &TermId) -> Option<RemovedTerm> {
        let mut entries = self.entries();
        for (module_id, terms) in entries.iter_mut() {
            if let Some(position) = terms.iter().position(|t| &t.id == term_id) {
                return Some(RemovedTerm {
                    module_id: module_id.clone(),
                    position,
                    term: terms.remove(position),
                });
            }
        }
        None
    }

    /// Reinserts a removed term at its original position.
    pub fn reinsert(&self, removed: RemovedTerm) {
        let mut entries = self.entries();
        if let Some(terms) = entries.get_mut(&removed.module_id) {
            let position = removed.position.min(terms.len());
            terms.insert(position, removed.term);
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn term(id: &str, word: &str) -> Term {
        Term {
            id: TermId::new(id),
            term: word.to_owned(),
            definition: format!("def-{word}"),
            is_starred: false,
        }
    }

    fn seeded() -> (TermListCache, ModuleId) {
        let cache = TermListCache::new();
        let module_id = ModuleId::new("m1");
        cache.put(module_id.clone(), vec![term("t1", "cat"), term("t2", "dog")]);
        (cache, module_id)
    }

    #[test]
    fn patch_returns_previous_state_for_rollback() {
        let (cache, module_id) = seeded();

        let previous = cache
            .apply_patch(&TermId::new("t1"), &TermPatch::star(true))
            .unwrap();
        assert!(!previous.is_starred);
        assert!(cache.get(&module_id).unwrap()[0].is_starred);

        cache.restore_term(previous);
        assert!(!cache.get(&module_id).unwrap()[0].is_starred);
    }

    #[test]
    fn patching_an_uncached_term_is_a_no_op() {
        let (cache, _) = seeded();
        assert!(
            cache
                .apply_patch(&TermId::new("missing"), &TermPatch::star(true))
                .is_none()
        );
    }

    #[test]
    fn remove_and_reinsert_round_trip() {
        let (cache, module_id) = seeded();

        let removed = cache.remove_term(&TermId::new("t1")).unwrap();
        assert_eq!(removed.position, 0);
        assert_eq!(cache.get(&module_id).unwrap().len(), 1);

        cache.reinsert(removed);
        let terms = cache.get(&module_id).unwrap();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].id, TermId::new("t1"));
    }

    #[test]
    fn module_of_locates_cached_terms() {
        let (cache, module_id) = seeded();
        assert_eq!(cache.module_of(&TermId::new("t2")), Some(module_id));
        assert_eq!(cache.module_of(&TermId::new("missing")), None);
    }

    #[test]
    fn invalidate_drops_the_list() {
        let (cache, module_id) = seeded();
        cache.invalidate(&module_id);
        assert!(cache.get(&module_id).is_none());
    }
}
