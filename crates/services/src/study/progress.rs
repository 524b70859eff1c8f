//! Folds a session's answer log into per-term status updates.

use study_core::model::{ProgressStatus, TermId};
use study_core::session::AnswerRecord;

/// Result of flushing a completed session's progress to the backend.
///
/// Flushing is best-effort: a failed term update is counted and logged, never
/// fatal, so a flaky network cannot lose the rest of the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    pub updated: usize,
    pub failed: usize,
}

impl FlushOutcome {
    /// True when every answered term was persisted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Groups the answer log by term, preserving first-seen order and the order
/// of answers within each term.
#[must_use]
pub fn per_term_results(records: &[AnswerRecord]) -> Vec<(TermId, Vec<bool>)> {
    let mut grouped: Vec<(TermId, Vec<bool>)> = Vec::new();
    for record in records {
        match grouped.iter_mut().find(|(id, _)| *id == record.term_id) {
            Some((_, results)) => results.push(record.correct),
            None => grouped.push((record.term_id.clone(), vec![record.correct])),
        }
    }
    grouped
}

/// Applies a term's answers to its stored status, one step per answer.
#[must_use]
pub fn fold_status(initial: ProgressStatus, results: &[bool]) -> ProgressStatus {
    results
        .iter()
        .fold(initial, |status, &correct| status.apply(correct))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
