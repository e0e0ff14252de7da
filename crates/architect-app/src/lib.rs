//! Composition root: configuration, logging-only hooks and the runtime that
//! owns the store and its watchers.

pub mod error;
pub mod hooks;
pub mod runtime;

pub use error::{AppError, AppResult};
pub use hooks::LoggingHooks;
pub use runtime::ArchitectRuntime;
