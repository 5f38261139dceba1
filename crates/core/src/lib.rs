//! `tonerdesk-core`: shared building blocks for the console crates.
//!
//! Identifiers and the error model only; no routing or session logic.

pub mod error;
pub mod id;

pub use error::{ConsoleError, ConsoleResult};
pub use id::{SessionId, UserId};
