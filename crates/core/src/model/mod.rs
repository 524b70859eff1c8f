mod ids;
mod module;
mod progress;
mod term;
mod user;

pub use ids::{ModuleId, TermId, UserId};
pub use module::{
    ModuleError, ModuleInfo, ModulePatch, ModuleProgressCounts, ModuleSummary, NewModule,
};
pub use progress::ProgressStatus;
pub use term::{NewTerm, Term, TermDraft, TermError, TermPatch};
pub use user::{Credentials, Registration, RegistrationError, UserProfile};
