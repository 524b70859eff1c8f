#![forbid(unsafe_code)]

//! Client-side seam for the study backend.
//!
//! All durable state (modules, terms, progress, users) lives in a separate
//! HTTP service; this crate defines the store traits the rest of the client
//! programs against, the `reqwest`-based implementation of those traits, and
//! an in-memory implementation for tests.

pub mod error;
pub mod http;
pub mod memory;
pub mod store;

pub use error::BackendError;
pub use http::HttpStore;
pub use memory::InMemoryBackend;
pub use store::{AuthStore, Backend, ModuleStore, ProgressStore, TermStore};
