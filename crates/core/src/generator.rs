//! Procedural question generation for quiz and test sessions.
//!
//! Turns a flat term list into an ordered sequence of typed questions.
//! Questions are ephemeral: regenerated from the current term snapshot at
//! session start (and on retry) and never persisted.

use std::fmt;

use rand::Rng;
use uuid::Uuid;

use crate::model::Term;
use crate::sampling::{distractors, shuffled};

/// Probability that a test-mode term becomes a multiple-choice question.
pub const MC_PROBABILITY: f64 = 0.6;

/// Incorrect options offered alongside the correct one.
pub const MAX_DISTRACTORS: usize = 3;

/// Maximum number of pairs in a matching question.
pub const MATCHING_POOL_SIZE: usize = 6;

//
// ─── STUDY MODE ────────────────────────────────────────────────────────────────
//

/// Practice mode selected when entering a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyMode {
    /// Browse shuffled cards directly; no questions are generated.
    Flashcards,
    /// One multiple-choice question per term.
    Quiz,
    /// Mixed multiple-choice, written-recall, and matching questions.
    Test,
}

impl StudyMode {
    /// Parses a mode name as it appears in URLs and CLI flags.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flashcards" => Some(Self::Flashcards),
            "quiz" => Some(Self::Quiz),
            "test" => Some(Self::Test),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flashcards => "flashcards",
            Self::Quiz => "quiz",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Ephemeral identifier for a generated question.
///
/// Used as a render/reset key; never sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuestionId(Uuid);

impl QuestionId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single generated question.
#[derive(Debug, Clone, PartialEq)]
pub enum Question {
    /// Type the definition, given the term.
    Written { id: QuestionId, term: Term },
    /// Type the term, given the definition.
    WrittenReverse { id: QuestionId, term: Term },
    /// Pick the correct definition among shuffled options.
    MultipleChoice {
        id: QuestionId,
        term: Term,
        options: Vec<String>,
    },
    /// Pair up to six terms with their definitions; scored per pair.
    Matching { id: QuestionId, pairs: Vec<Term> },
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        match self {
            Self::Written { id, .. }
            | Self::WrittenReverse { id, .. }
            | Self::MultipleChoice { id, .. }
            | Self::Matching { id, .. } => *id,
        }
    }

    /// Number of independently scored sub-answers this question contributes.
    ///
    /// One for every question type except matching, which counts each pair.
    #[must_use]
    pub fn scoreable_units(&self) -> usize {
        match self {
            Self::Matching { pairs, .. } => pairs.len(),
            _ => 1,
        }
    }
}

//
// ─── GENERATION ────────────────────────────────────────────────────────────────
//

/// Generates the question sequence for a mode.
///
/// Flashcard mode produces no questions; empty input produces an empty
/// sequence for every mode, and the caller is expected to surface an empty
/// state instead of starting a session.
#[must_use]
pub fn generate<R: Rng + ?Sized>(terms: &[Term], mode: StudyMode, rng: &mut R) -> Vec<Question> {
    match mode {
        StudyMode::Flashcards => Vec::new(),
        StudyMode::Quiz => generate_quiz(terms, rng),
        StudyMode::Test => generate_test(terms, rng),
    }
}

/// Quiz mode: one multiple-choice question per term, in shuffled order.
///
/// Each option set holds the correct definition plus up to three distractors,
/// so its size is `min(N, 4)`. A single-term module degenerates to one option.
#[must_use]
pub fn generate_quiz<R: Rng + ?Sized>(terms: &[Term], rng: &mut R) -> Vec<Question> {
    shuffled(terms, rng)
        .into_iter()
        .map(|term| {
            let options = choice_options(terms, &term, rng);
            Question::MultipleChoice {
                id: QuestionId::random(),
                term,
                options,
            }
        })
        .collect()
}

/// Test mode: a randomized mix of question shapes.
///
/// Per shuffled term, with probability [`MC_PROBABILITY`] emit a
/// multiple-choice question, otherwise a written question in a 50/50 forward
/// or reverse direction. With two or more terms, exactly one matching
/// question is inserted at the midpoint, holding a sub-shuffle of the first
/// `min(N, 6)` already-shuffled terms.
#[must_use]
pub fn generate_test<R: Rng + ?Sized>(terms: &[Term], rng: &mut R) -> Vec<Question> {
    if terms.is_empty() {
        return Vec::new();
    }

    let order = shuffled(terms, rng);
    let mut questions = Vec::with_capacity(order.len() + 1);

    for term in &order {
        let question = if rng.random_bool(MC_PROBABILITY) {
            let options = choice_options(terms, term, rng);
            Question::MultipleChoice {
                id: QuestionId::random(),
                term: term.clone(),
                options,
            }
        } else if rng.random_bool(0.5) {
            Question::Written {
                id: QuestionId::random(),
                term: term.clone(),
            }
        } else {
            Question::WrittenReverse {
                id: QuestionId::random(),
                term: term.clone(),
            }
        };
        questions.push(question);
    }

    if terms.len() >= 2 {
        let insert_at = (questions.len() / 2).max(1);
        let pool = &order[..order.len().min(MATCHING_POOL_SIZE)];
        questions.insert(
            insert_at,
            Question::Matching {
                id: QuestionId::random(),
                pairs: shuffled(pool, rng),
            },
        );
    }

    questions
}

/// Builds the shuffled option set for one multiple-choice question.
fn choice_options<R: Rng + ?Sized>(terms: &[Term], correct: &Term, rng: &mut R) -> Vec<String> {
    use rand::seq::SliceRandom;

    let mut options = distractors(terms, &correct.id, MAX_DISTRACTORS, rng);
    options.push(correct.definition.clone());
    options.shuffle(rng);
    options
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
