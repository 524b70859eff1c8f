use serde::{Deserialize, Serialize};

/// Per-user, per-term mastery state.
///
/// Moves exactly one step along `not_started → in_progress → completed` per
/// answer: forward on a correct answer, backward on an incorrect one, clamped
/// at both ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    /// One step forward along the mastery chain, clamped at `Completed`.
    #[must_use]
    pub fn advanced(self) -> Self {
        match self {
            Self::NotStarted => Self::InProgress,
            Self::InProgress | Self::Completed => Self::Completed,
        }
    }

    /// One step backward along the mastery chain, clamped at `NotStarted`.
    #[must_use]
    pub fn stepped_back(self) -> Self {
        match self {
            Self::NotStarted | Self::InProgress => Self::NotStarted,
            Self::Completed => Self::InProgress,
        }
    }

    /// Applies one answer outcome: forward on correct, backward otherwise.
    #[must_use]
    pub fn apply(self, correct: bool) -> Self {
        if correct {
            self.advanced()
        } else {
            self.stepped_back()
        }
    }

    /// Wire name used by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}
