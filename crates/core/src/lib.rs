#![forbid(unsafe_code)]

pub mod flashcards;
pub mod generator;
pub mod model;
pub mod sampling;
pub mod session;
pub mod time;

pub use time::Clock;
