use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ModuleId;
use crate::model::term::Term;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,
}

//
// ─── MODULE TYPES ──────────────────────────────────────────────────────────────
//

/// Validated input for creating a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModule {
    title: String,
    description: Option<String>,
    is_private: bool,
}

impl NewModule {
    /// Creates a new module draft.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        is_private: bool,
    ) -> Result<Self, ModuleError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyTitle);
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            title: title.trim().to_owned(),
            description,
            is_private,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn is_private(&self) -> bool {
        self.is_private
    }
}

/// Partial update for a module; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
}

/// List-view shape of a module, as returned by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSummary {
    pub id: ModuleId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub terms_count: u32,
    #[serde(default)]
    pub is_private: bool,
}

/// Aggregate per-status term counts for a module, shown in session headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleProgressCounts {
    pub not_started: u32,
    pub in_progress: u32,
    pub completed: u32,
    #[serde(rename = "completedTerms")]
    pub completed_terms: u32,
}

impl ModuleProgressCounts {
    /// Share of completed terms, rounded to whole percent. Zero terms → 0.
    #[must_use]
    pub fn percent_complete(&self) -> u8 {
        let total = self.not_started + self.in_progress + self.completed;
        if total == 0 {
            return 0;
        }
        let pct = f64::from(self.completed) / f64::from(total) * 100.0;
        pct.round().clamp(0.0, 100.0) as u8
    }
}

/// Detail-view shape of a module, including the owner display data and the
/// term list used to build study sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub terms_count: u32,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub progress: Option<ModuleProgressCounts>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_img: Option<String>,
    #[serde(default)]
    pub is_owner: Option<bool>,
    #[serde(default)]
    pub is_collected: Option<bool>,
    #[serde(default)]
    pub terms: Vec<Term>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
