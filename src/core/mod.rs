//! Core types for slimload
//!
//! Currently this is the error system:
//! - [`SlimError`] - enumerated failures that stop an operation
//! - [`ErrorContext`] - user-facing wrapper with details and suggestions
//! - [`user_friendly_error`] - convert any [`anyhow::Error`] for CLI display
//!
//! Operations return [`anyhow::Result`] and build their errors from
//! [`SlimError`] variants, adding context with `anyhow::Context` on the way
//! up. The CLI converts whatever reaches `main` with [`user_friendly_error`].

pub mod error;

pub use error::{ErrorContext, SlimError, user_friendly_error};
