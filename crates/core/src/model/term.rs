use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::TermId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TermError {
    #[error("term text cannot be empty")]
    EmptyTerm,

    #[error("definition cannot be empty")]
    EmptyDefinition,
}

//
// ─── TERM TYPES ────────────────────────────────────────────────────────────────
//

/// Unvalidated term input, as received from a form or CLI prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDraft {
    pub term: String,
    pub definition: String,
}

impl TermDraft {
    /// Validates and trims the draft.
    ///
    /// # Errors
    ///
    /// Returns `TermError` if either side is empty or whitespace-only.
    pub fn validate(self) -> Result<NewTerm, TermError> {
        let term = self.term.trim().to_owned();
        if term.is_empty() {
            return Err(TermError::EmptyTerm);
        }
        let definition = self.definition.trim().to_owned();
        if definition.is_empty() {
            return Err(TermError::EmptyDefinition);
        }
        Ok(NewTerm { term, definition })
    }
}

/// A validated term/definition pair not yet assigned an id by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTerm {
    pub term: String,
    pub definition: String,
}

impl NewTerm {
    /// Attaches a backend-assigned id, producing a full `Term`.
    #[must_use]
    pub fn assign_id(self, id: TermId) -> Term {
        Term {
            id,
            term: self.term,
            definition: self.definition,
            is_starred: false,
        }
    }
}

/// A term/definition study unit belonging to a module.
///
/// Invariant: `id` is unique within a module's term set (backend-enforced).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub term: String,
    pub definition: String,
    #[serde(default, rename = "isStarred")]
    pub is_starred: bool,
}

impl Term {
    /// Flips the starred flag, returning the new state.
    pub fn toggle_star(&mut self) -> bool {
        self.is_starred = !self.is_starred;
        self.is_starred
    }

    /// Applies a partial update in place.
    pub fn apply_patch(&mut self, patch: &TermPatch) {
        if let Some(term) = &patch.term {
            self.term = term.clone();
        }
        if let Some(definition) = &patch.definition {
            self.definition = definition.clone();
        }
        if let Some(is_starred) = patch.is_starred {
            self.is_starred = is_starred;
        }
    }
}

/// Partial update for a term; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TermPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(rename = "isStarred", skip_serializing_if = "Option::is_none")]
    pub is_starred: Option<bool>,
}

impl TermPatch {
    /// A patch that only changes the starred flag.
    #[must_use]
    pub fn star(is_starred: bool) -> Self {
        Self {
            is_starred: Some(is_starred),
            ..Self::default()
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(term: &str, definition: &str) -> TermDraft {
        TermDraft {
            term: term.to_owned(),
            definition: definition.to_owned(),
        }
    }

    #[test]
    fn draft_rejects_empty_term() {
        let err = draft("   ", "a definition").validate().unwrap_err();
        assert_eq!(err, TermError::EmptyTerm);
    }

    #[test]
    fn draft_rejects_empty_definition() {
        let err = draft("cat", " ").validate().unwrap_err();
        assert_eq!(err, TermError::EmptyDefinition);
    }

    #[test]
    fn draft_trims_and_assigns_id() {
        let term = draft("  cat ", " кот  ")
            .validate()
            .unwrap()
            .assign_id(TermId::new("t1"));

        assert_eq!(term.id, TermId::new("t1"));
        assert_eq!(term.term, "cat");
        assert_eq!(term.definition, "кот");
        assert!(!term.is_starred);
    }

    #[test]
    fn toggle_star_flips_state() {
        let mut term = draft("dog", "собака")
            .validate()
            .unwrap()
            .assign_id(TermId::new("t2"));

        assert!(term.toggle_star());
        assert!(!term.toggle_star());
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut term = draft("dog", "собака")
            .validate()
            .unwrap()
            .assign_id(TermId::new("t2"));

        term.apply_patch(&TermPatch::star(true));
        assert!(term.is_starred);
        assert_eq!(term.term, "dog");

        term.apply_patch(&TermPatch {
            definition: Some("пёс".into()),
            ..TermPatch::default()
        });
        assert_eq!(term.definition, "пёс");
        assert!(term.is_starred);
    }

    #[test]
    fn term_deserializes_with_missing_star_flag() {
        let term: Term =
            serde_json::from_str(r#"{"id":"t1","term":"cat","definition":"кот"}"#).unwrap();
        assert!(!term.is_starred);
    }

    #[test]
    fn star_patch_serializes_only_the_flag() {
        let json = serde_json::to_string(&TermPatch::star(true)).unwrap();
        assert_eq!(json, r#"{"isStarred":true}"#);
    }
}
