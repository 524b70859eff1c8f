//! Flashcard browsing: a shuffled deck stepped through card by card.
//!
//! No questions are generated in this mode; the deck tracks position, a flip
//! flag per card, and an optional starred-only filter.

use rand::Rng;

use crate::model::{Term, TermId};
use crate::sampling::shuffled;

/// A shuffled deck of flashcards for one module.
#[derive(Debug, Clone)]
pub struct FlashcardDeck {
    cards: Vec<Term>,
    index: usize,
    flipped: bool,
    starred_only: bool,
}

impl FlashcardDeck {
    /// Builds a deck from a term snapshot, shuffling once up front.
    #[must_use]
    pub fn new<R: Rng + ?Sized>(terms: Vec<Term>, rng: &mut R) -> Self {
        Self {
            cards: shuffled(&terms, rng),
            index: 0,
            flipped: false,
            starred_only: false,
        }
    }

    fn visible(&self) -> Vec<&Term> {
        self.cards
            .iter()
            .filter(|t| !self.starred_only || t.is_starred)
            .collect()
    }

    /// Number of cards under the current filter.
    #[must_use]
    pub fn len(&self) -> usize {
        self.visible().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-based position within the filtered deck.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    #[must_use]
    pub fn starred_only(&self) -> bool {
        self.starred_only
    }

    /// The card currently shown, or `None` when the filter leaves nothing.
    #[must_use]
    pub fn current(&self) -> Option<&Term> {
        self.visible().get(self.index).copied()
    }

    /// The text facing the user: term, or definition when flipped.
    #[must_use]
    pub fn face(&self) -> Option<&str> {
        self.current().map(|t| {
            if self.flipped {
                t.definition.as_str()
            } else {
                t.term.as_str()
            }
        })
    }

    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    /// Advances to the next card, clamped at the end; resets the flip.
    pub fn next(&mut self) {
        let len = self.len();
        if len > 0 {
            self.index = (self.index + 1).min(len - 1);
        }
        self.flipped = false;
    }

    /// Steps back to the previous card, clamped at the start; resets the flip.
    pub fn prev(&mut self) {
        self.index = self.index.saturating_sub(1);
        self.flipped = false;
    }

    /// Switches the starred-only filter and restarts from the first card.
    pub fn set_starred_only(&mut self, starred_only: bool) {
        self.starred_only = starred_only;
        self.index = 0;
        self.flipped = false;
    }

    /// Flips the starred flag in the local snapshot, returning the new state.
    pub fn toggle_star(&mut self, id: &TermId) -> Option<bool> {
        self.cards
            .iter_mut()
            .find(|t| t.id == *id)
            .map(Term::toggle_star)
    }
}

/// Derives a hint for a written or flashcard prompt.
///
/// Single word: the first character for short words, the first three
/// otherwise, followed by an ellipsis. Multiple words: the first half of the
/// words.
#[must_use]
pub fn hint(text: &str) -> String {
    let words: Vec<&str> = text.trim().split(' ').collect();
    if let [word] = words.as_slice() {
        let take = if word.chars().count() <= 4 { 1 } else { 3 };
        let prefix: String = word.chars().take(take).collect();
        return format!("{prefix}...");
    }
    let half = words.len().div_ceil(2);
    format!("{}…", words[..half].join(" "))
}
