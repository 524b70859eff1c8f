use std::sync::Arc;

use backend::store::{Backend, ModuleStore, ProgressStore, TermStore};
use study_core::Clock;
use study_core::flashcards::FlashcardDeck;
use study_core::generator::StudyMode;
use study_core::model::{ModuleId, ModuleInfo, Term, TermId, TermPatch};
use study_core::session::{Answer, AnswerOutcome, StudySession};

use super::progress::{FlushOutcome, fold_status, per_term_results};
use crate::error::StudyError;

/// Options for entering a study session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudyOptions {
    /// Restrict the session to starred terms.
    pub starred_only: bool,
}

/// Result of answering one question through the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAnswerResult {
    pub outcome: AnswerOutcome,
    /// Set when this answer completed the session and progress was flushed.
    pub flush: Option<FlushOutcome>,
}

/// Orchestrates study sessions: fetches the term snapshot, runs the session,
/// and flushes per-term progress when it completes.
#[derive(Clone)]
pub struct StudyFlowService {
    clock: Clock,
    modules: Arc<dyn ModuleStore>,
    terms: Arc<dyn TermStore>,
    progress: Arc<dyn ProgressStore>,
}

impl StudyFlowService {
    #[must_use]
    pub fn new(
        clock: Clock,
        modules: Arc<dyn ModuleStore>,
        terms: Arc<dyn TermStore>,
        progress: Arc<dyn ProgressStore>,
    ) -> Self {
        Self {
            clock,
            modules,
            terms,
            progress,
        }
    }

    /// Wires the service to an assembled backend.
    #[must_use]
    pub fn from_backend(clock: Clock, backend: &Backend) -> Self {
        Self::new(
            clock,
            backend.modules.clone(),
            backend.terms.clone(),
            backend.progress.clone(),
        )
    }

    async fn snapshot(
        &self,
        module_id: &ModuleId,
        options: StudyOptions,
    ) -> Result<Vec<Term>, StudyError> {
        let mut terms = self.terms.list_terms(module_id).await?;
        if options.starred_only {
            terms.retain(|t| t.is_starred);
        }
        Ok(terms)
    }

    /// Starts a quiz or test session over a module's current terms.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Backend` when the term fetch fails and
    /// `StudyError::Session` when no questions can be generated (no terms,
    /// an empty starred filter, or flashcard mode — use
    /// [`StudyFlowService::start_flashcards`] for that).
    pub async fn start(
        &self,
        module_id: &ModuleId,
        mode: StudyMode,
        options: StudyOptions,
    ) -> Result<StudySession, StudyError> {
        let terms = self.snapshot(module_id, options).await?;
        log::info!(
            "starting {mode} session over {} terms of module {module_id}",
            terms.len()
        );
        let session = StudySession::new(terms, mode, &mut rand::rng(), self.clock.now())?;
        Ok(session)
    }

    /// Builds a shuffled flashcard deck over a module's current terms.
    ///
    /// An empty module yields an empty deck rather than an error; the caller
    /// surfaces the empty state.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Backend` when the term fetch fails.
    pub async fn start_flashcards(
        &self,
        module_id: &ModuleId,
        options: StudyOptions,
    ) -> Result<FlashcardDeck, StudyError> {
        let terms = self.snapshot(module_id, StudyOptions::default()).await?;
        let mut deck = FlashcardDeck::new(terms, &mut rand::rng());
        if options.starred_only {
            deck.set_starred_only(true);
        }
        Ok(deck)
    }

    /// The module header shown above a running session.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Backend` on fetch failure.
    pub async fn module_overview(&self, module_id: &ModuleId) -> Result<ModuleInfo, StudyError> {
        Ok(self.modules.get_module(module_id).await?)
    }

    /// Scores an answer, advances the session, and flushes progress if this
    /// answer completed it.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Session` for a finished session or a mismatched
    /// answer shape. Flush failures are reported in the result, not as
    /// errors.
    pub async fn answer_current(
        &self,
        session: &mut StudySession,
        answer: &Answer,
    ) -> Result<SessionAnswerResult, StudyError> {
        let outcome = session.submit_answer(answer, self.clock.now())?;

        let flush = if outcome.is_session_complete {
            Some(self.flush_progress(session).await)
        } else {
            None
        };

        Ok(SessionAnswerResult { outcome, flush })
    }

    /// Pushes one status update per answered term, folding that term's
    /// answers over its stored status.
    ///
    /// Best-effort: failed reads or writes are logged and counted, and the
    /// remaining terms are still flushed.
    pub async fn flush_progress(&self, session: &StudySession) -> FlushOutcome {
        let mut outcome = FlushOutcome::default();

        for (term_id, results) in per_term_results(session.answers()) {
            let initial = match self.progress.term_status(&term_id).await {
                Ok(status) => status.unwrap_or_default(),
                Err(err) => {
                    log::warn!("progress read failed for term {term_id}: {err}");
                    outcome.failed += 1;
                    continue;
                }
            };

            let status = fold_status(initial, &results);
            match self.progress.set_term_status(&term_id, status).await {
                Ok(()) => outcome.updated += 1,
                Err(err) => {
                    log::warn!("progress write failed for term {term_id}: {err}");
                    outcome.failed += 1;
                }
            }
        }

        log::info!(
            "flushed session progress: {} updated, {} failed",
            outcome.updated,
            outcome.failed
        );
        outcome
    }

    /// Regenerates the session's questions and clears its state.
    pub fn retry(&self, session: &mut StudySession) {
        session.retry(&mut rand::rng(), self.clock.now());
    }

    /// Toggles a star from inside a session, optimistically.
    ///
    /// The snapshot is updated first; if the backend rejects the patch the
    /// toggle is undone and the error surfaced.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::UnknownTerm` when the term is not in the session
    /// and `StudyError::Backend` when persistence fails (after rollback).
    pub async fn toggle_star(
        &self,
        session: &mut StudySession,
        term_id: &TermId,
    ) -> Result<bool, StudyError> {
        let starred = session
            .toggle_star(term_id)
            .ok_or_else(|| StudyError::UnknownTerm(term_id.clone()))?;

        if let Err(err) = self
            .terms
            .update_term(term_id, &TermPatch::star(starred))
            .await
        {
            log::warn!("star update failed, reverting session snapshot: {err}");
            session.toggle_star(term_id);
            return Err(err.into());
        }
        Ok(starred)
    }

    /// Toggles a star from the flashcard view, optimistically.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`StudyFlowService::toggle_star`].
    pub async fn toggle_deck_star(
        &self,
        deck: &mut FlashcardDeck,
        term_id: &TermId,
    ) -> Result<bool, StudyError> {
        let starred = deck
            .toggle_star(term_id)
            .ok_or_else(|| StudyError::UnknownTerm(term_id.clone()))?;

        if let Err(err) = self
            .terms
            .update_term(term_id, &TermPatch::star(starred))
            .await
        {
            log::warn!("star update failed, reverting deck snapshot: {err}");
            deck.toggle_star(term_id);
            return Err(err.into());
        }
        Ok(starred)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
