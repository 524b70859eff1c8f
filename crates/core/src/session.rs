//! In-memory study session: steps through generated questions, scores
//! answers, and records the per-term answer log used for progress updates.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use crate::generator::{self, Question, QuestionId, StudyMode};
use crate::model::{Term, TermId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no terms available for session")]
    Empty,

    #[error("session already completed")]
    Completed,

    #[error("answer does not match the current question type")]
    AnswerMismatch,
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// User input for the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Free text for written questions; compared case-insensitively after
    /// trimming.
    Text(String),
    /// The chosen option text for a multiple-choice question; compared
    /// verbatim against the correct definition.
    Choice(String),
    /// `(term text, definition given)` pairings for a matching question.
    /// Unpaired terms simply score as incorrect.
    Pairs(Vec<(String, String)>),
}

/// One answer-log entry; matching questions append one entry per pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub term_id: TermId,
    pub correct: bool,
}

/// Outcome of submitting one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    /// Correct sub-answers awarded (0 or 1 except for matching questions).
    pub correct_units: u32,
    /// Scoreable sub-answers this question carried.
    pub total_units: u32,
    /// True exactly when this submission finished the session.
    pub is_session_complete: bool,
}

/// Aggregated view of session progress, useful for a header display.
///
/// `total` and `answered` count questions, weighting a matching question as
/// one; the score counts each matching pair separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub percent: u8,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One run through a generated question sequence for quiz or test mode.
///
/// Holds a snapshot of the module's terms for the duration of the session;
/// star toggles mutate the snapshot but never scoring or progress.
pub struct StudySession {
    terms: Vec<Term>,
    mode: StudyMode,
    questions: Vec<Question>,
    current: usize,
    score: u32,
    answers: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl StudySession {
    /// Creates a session and generates its question sequence.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic in tests.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when no terms are provided (or when the
    /// mode generates no questions, as flashcard mode does — use
    /// [`crate::flashcards::FlashcardDeck`] for that mode instead).
    pub fn new<R: Rng + ?Sized>(
        terms: Vec<Term>,
        mode: StudyMode,
        rng: &mut R,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let questions = generator::generate(&terms, mode, rng);
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            terms,
            mode,
            questions,
            current: 0,
            score: 0,
            answers: Vec::new(),
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Total scoreable sub-answers across the whole session.
    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.questions
            .iter()
            .map(|q| q.scoreable_units() as u32)
            .sum()
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.current.min(total);
        let percent = if total == 0 {
            0
        } else {
            ((answered as f64 / total as f64) * 100.0).round() as u8
        };
        SessionProgress {
            total,
            answered,
            remaining: total - answered,
            percent,
            is_complete: self.is_complete(),
        }
    }

    /// Looks up a term from the session snapshot.
    #[must_use]
    pub fn term(&self, id: &TermId) -> Option<&Term> {
        self.terms.iter().find(|t| t.id == *id)
    }

    /// Flips the starred flag in the local snapshot, returning the new state,
    /// or `None` when the term is not part of this session.
    ///
    /// Orthogonal to question flow: never touches score or the answer log.
    pub fn toggle_star(&mut self, id: &TermId) -> Option<bool> {
        self.terms
            .iter_mut()
            .find(|t| t.id == *id)
            .map(Term::toggle_star)
    }

    /// Scores the answer for the current question and advances the session.
    ///
    /// Appends one answer-log entry per term touched (matching questions
    /// append one per pair) and adds the number of correct sub-answers to the
    /// score. Submitting the answer for the last question transitions the
    /// session to its finished state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after the session has finished and
    /// `SessionError::AnswerMismatch` when the answer shape does not fit the
    /// current question.
    pub fn submit_answer(
        &mut self,
        answer: &Answer,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerOutcome, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let question = self
            .questions
            .get(self.current)
            .ok_or(SessionError::Completed)?;

        let question_id = question.id();
        let total_units = question.scoreable_units() as u32;
        let mut records = Vec::with_capacity(total_units as usize);

        match (question, answer) {
            (Question::Written { term, .. }, Answer::Text(given)) => {
                records.push(AnswerRecord {
                    term_id: term.id.clone(),
                    correct: text_matches(&term.definition, given),
                });
            }
            (Question::WrittenReverse { term, .. }, Answer::Text(given)) => {
                records.push(AnswerRecord {
                    term_id: term.id.clone(),
                    correct: text_matches(&term.term, given),
                });
            }
            (Question::MultipleChoice { term, .. }, Answer::Choice(chosen)) => {
                records.push(AnswerRecord {
                    term_id: term.id.clone(),
                    correct: *chosen == term.definition,
                });
            }
            (Question::Matching { pairs, .. }, Answer::Pairs(given)) => {
                for pair in pairs {
                    let matched = given
                        .iter()
                        .find(|(term_text, _)| *term_text == pair.term)
                        .is_some_and(|(_, definition)| {
                            text_matches(&pair.definition, definition)
                        });
                    records.push(AnswerRecord {
                        term_id: pair.id.clone(),
                        correct: matched,
                    });
                }
            }
            _ => return Err(SessionError::AnswerMismatch),
        }

        let correct_units = records.iter().filter(|r| r.correct).count() as u32;
        self.score += correct_units;
        self.answers.extend(records);

        self.current += 1;
        if self.current >= self.questions.len() {
            self.completed_at = Some(answered_at);
        }

        Ok(AnswerOutcome {
            question_id,
            correct_units,
            total_units,
            is_session_complete: self.is_complete(),
        })
    }

    /// Restarts the session: regenerates the questions from a fresh,
    /// independently sampled shuffle and clears index, score, and log.
    ///
    /// Functionally equivalent to re-entering the session with the same term
    /// snapshot.
    pub fn retry<R: Rng + ?Sized>(&mut self, rng: &mut R, now: DateTime<Utc>) {
        self.questions = generator::generate(&self.terms, self.mode, rng);
        self.current = 0;
        self.score = 0;
        self.answers.clear();
        self.started_at = now;
        self.completed_at = None;
    }
}

impl fmt::Debug for StudySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudySession")
            .field("mode", &self.mode)
            .field("terms_len", &self.terms.len())
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

/// Case-insensitive comparison on trimmed text, for written answers.
fn text_matches(expected: &str, given: &str) -> bool {
    given.trim().to_lowercase() == expected.trim().to_lowercase()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn term(id: u32, word: &str, definition: &str) -> Term {
        Term {
            id: TermId::new(format!("t{id}")),
            term: word.to_owned(),
            definition: definition.to_owned(),
            is_starred: false,
        }
    }

    fn animal_terms() -> Vec<Term> {
        vec![
            term(1, "cat", "кот"),
            term(2, "dog", "собака"),
            term(3, "bird", "птица"),
            term(4, "fish", "рыба"),
        ]
    }

    fn correct_answer(question: &Question) -> Answer {
        match question {
            Question::Written { term, .. } => Answer::Text(term.definition.clone()),
            Question::WrittenReverse { term, .. } => Answer::Text(term.term.clone()),
            Question::MultipleChoice { term, .. } => Answer::Choice(term.definition.clone()),
            Question::Matching { pairs, .. } => Answer::Pairs(
                pairs
                    .iter()
                    .map(|p| (p.term.clone(), p.definition.clone()))
                    .collect(),
            ),
        }
    }

    #[test]
    fn empty_term_list_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = StudySession::new(Vec::new(), StudyMode::Quiz, &mut rng, fixed_now())
            .unwrap_err();
        assert_eq!(err, SessionError::Empty);
    }

    #[test]
    fn quiz_over_four_terms_scores_four_of_four() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session =
            StudySession::new(animal_terms(), StudyMode::Quiz, &mut rng, fixed_now()).unwrap();

        assert_eq!(session.questions().len(), 4);
        assert_eq!(session.max_score(), 4);
        for q in session.questions() {
            let Question::MultipleChoice { options, .. } = q else {
                panic!("quiz emits only multiple-choice");
            };
            assert_eq!(options.len(), 4);
        }

        while !session.is_complete() {
            let answer = correct_answer(session.current_question().unwrap());
            let outcome = session.submit_answer(&answer, fixed_now()).unwrap();
            assert_eq!(outcome.correct_units, 1);
        }

        assert_eq!(session.score(), 4);
        assert_eq!(session.answers().len(), 4);
        assert!(session.answers().iter().all(|a| a.correct));
        assert_eq!(session.completed_at(), Some(fixed_now()));
    }

    #[test]
    fn single_term_quiz_scores_one_of_one() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = StudySession::new(
            vec![term(1, "cat", "кот")],
            StudyMode::Quiz,
            &mut rng,
            fixed_now(),
        )
        .unwrap();

        let Question::MultipleChoice { options, .. } = session.current_question().unwrap() else {
            panic!("expected multiple-choice");
        };
        assert_eq!(options.len(), 1);

        let outcome = session
            .submit_answer(&Answer::Choice("кот".into()), fixed_now())
            .unwrap();
        assert!(outcome.is_session_complete);
        assert_eq!(session.score(), 1);
        assert_eq!(session.max_score(), 1);
    }

    #[test]
    fn full_test_answered_correctly_reaches_max_score() {
        let mut rng = StdRng::seed_from_u64(3);
        let terms: Vec<Term> = (0..8)
            .map(|i| term(i, &format!("w{i}"), &format!("d{i}")))
            .collect();
        let mut session =
            StudySession::new(terms, StudyMode::Test, &mut rng, fixed_now()).unwrap();
        let max = session.max_score();

        while !session.is_complete() {
            let answer = correct_answer(session.current_question().unwrap());
            session.submit_answer(&answer, fixed_now()).unwrap();
        }
        assert_eq!(session.score(), max);
    }

    #[test]
    fn written_answers_ignore_case_and_whitespace() {
        let mut rng = StdRng::seed_from_u64(4);
        // Force a written question by driving the session manually.
        let t = term(1, "Cat", "Кот");
        let mut session =
            StudySession::new(vec![t], StudyMode::Test, &mut rng, fixed_now()).unwrap();

        let answer = match session.current_question().unwrap() {
            Question::Written { .. } => Answer::Text("  кОт ".into()),
            Question::WrittenReverse { .. } => Answer::Text(" cAt  ".into()),
            Question::MultipleChoice { term, .. } => Answer::Choice(term.definition.clone()),
            Question::Matching { .. } => panic!("single term cannot produce matching"),
        };
        let outcome = session.submit_answer(&answer, fixed_now()).unwrap();
        assert_eq!(outcome.correct_units, 1);
    }

    #[test]
    fn choice_answers_compare_verbatim() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session =
            StudySession::new(animal_terms(), StudyMode::Quiz, &mut rng, fixed_now()).unwrap();

        let Question::MultipleChoice { term, options, .. } =
            session.current_question().unwrap().clone()
        else {
            panic!("expected multiple-choice");
        };
        let wrong = options
            .iter()
            .find(|o| **o != term.definition)
            .unwrap()
            .clone();

        let outcome = session
            .submit_answer(&Answer::Choice(wrong), fixed_now())
            .unwrap();
        assert_eq!(outcome.correct_units, 0);
        assert_eq!(session.answers()[0].term_id, term.id);
        assert!(!session.answers()[0].correct);
    }

    #[test]
    fn matching_awards_partial_credit_per_pair() {
        let terms = animal_terms();
        let pairs = terms.clone();
        let mut session = StudySession {
            terms,
            mode: StudyMode::Test,
            questions: vec![Question::Matching {
                id: QuestionId::random(),
                pairs,
            }],
            current: 0,
            score: 0,
            answers: Vec::new(),
            started_at: fixed_now(),
            completed_at: None,
        };

        // Two right, one swapped pair, one left unpaired.
        let given = Answer::Pairs(vec![
            ("cat".into(), "кот".into()),
            ("dog".into(), "собака".into()),
            ("bird".into(), "рыба".into()),
        ]);
        let outcome = session.submit_answer(&given, fixed_now()).unwrap();

        assert_eq!(outcome.total_units, 4);
        assert_eq!(outcome.correct_units, 2);
        assert_eq!(session.score(), 2);
        assert_eq!(session.answers().len(), 4);
        assert!(outcome.is_session_complete);
    }

    #[test]
    fn mismatched_answer_shape_is_an_error() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut session =
            StudySession::new(animal_terms(), StudyMode::Quiz, &mut rng, fixed_now()).unwrap();

        let err = session
            .submit_answer(&Answer::Text("кот".into()), fixed_now())
            .unwrap_err();
        assert_eq!(err, SessionError::AnswerMismatch);
        // A rejected answer must not advance or log anything.
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn submitting_after_completion_is_an_error() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = StudySession::new(
            vec![term(1, "cat", "кот")],
            StudyMode::Quiz,
            &mut rng,
            fixed_now(),
        )
        .unwrap();

        session
            .submit_answer(&Answer::Choice("кот".into()), fixed_now())
            .unwrap();
        let err = session
            .submit_answer(&Answer::Choice("кот".into()), fixed_now())
            .unwrap_err();
        assert_eq!(err, SessionError::Completed);
    }

    #[test]
    fn retry_resets_state_and_resamples_order() {
        let mut rng = StdRng::seed_from_u64(8);
        let terms: Vec<Term> = (0..6)
            .map(|i| term(i, &format!("w{i}"), &format!("d{i}")))
            .collect();
        let mut session =
            StudySession::new(terms, StudyMode::Quiz, &mut rng, fixed_now()).unwrap();

        while !session.is_complete() {
            let answer = correct_answer(session.current_question().unwrap());
            session.submit_answer(&answer, fixed_now()).unwrap();
        }
        assert_eq!(session.score(), 6);

        let later = fixed_now() + chrono::Duration::minutes(5);
        session.retry(&mut rng, later);

        assert_eq!(session.score(), 0);
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());
        assert!(!session.is_complete());
        assert_eq!(session.started_at(), later);
        assert_eq!(session.questions().len(), 6);
    }

    #[test]
    fn toggle_star_updates_snapshot_only() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut session =
            StudySession::new(animal_terms(), StudyMode::Quiz, &mut rng, fixed_now()).unwrap();

        let id = TermId::new("t1");
        assert_eq!(session.toggle_star(&id), Some(true));
        assert!(session.term(&id).unwrap().is_starred);
        assert_eq!(session.score(), 0);
        assert!(session.answers().is_empty());

        assert_eq!(session.toggle_star(&TermId::new("missing")), None);
    }

    #[test]
    fn progress_weights_matching_as_one_question() {
        let terms = animal_terms();
        let mut session = StudySession {
            terms: terms.clone(),
            mode: StudyMode::Test,
            questions: vec![
                Question::Written {
                    id: QuestionId::random(),
                    term: terms[0].clone(),
                },
                Question::Matching {
                    id: QuestionId::random(),
                    pairs: terms.clone(),
                },
            ],
            current: 0,
            score: 0,
            answers: Vec::new(),
            started_at: fixed_now(),
            completed_at: None,
        };

        assert_eq!(session.progress().total, 2);
        assert_eq!(session.max_score(), 5);

        session
            .submit_answer(&Answer::Text("кот".into()), fixed_now())
            .unwrap();
        let progress = session.progress();
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.percent, 50);
        assert!(!progress.is_complete);
    }
}
