//! Watchers that turn committed store changes into asynchronous
//! reconciliation hook calls.

pub mod hooks;
pub mod set;
pub mod watcher;

pub use hooks::{HookError, HookResult, NoopHooks, ReconciliationHookSet, ReconciliationHooks};
pub use set::{WatcherSet, WatcherSetPerfSnapshot};
pub use watcher::{ResourceStateWatcher, WatcherConfig, WatcherPerfSnapshot};
