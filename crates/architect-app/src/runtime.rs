use std::sync::Arc;

use architect_config::ArchitectConfig;
use architect_store::ArchitectStore;
use architect_watcher::{ReconciliationHookSet, WatcherConfig, WatcherSet, WatcherSetPerfSnapshot};

use crate::error::{AppError, AppResult};

/// Owns the store and the watchers attached to it.
///
/// The store is shared with intent sources through [`ArchitectRuntime::store`];
/// there is no global instance.
#[derive(Debug)]
pub struct ArchitectRuntime {
    store: Arc<ArchitectStore>,
    watchers: WatcherSet,
}

impl ArchitectRuntime {
    /// Must be called from within a tokio runtime.
    pub fn bootstrap(config: &ArchitectConfig, hooks: ReconciliationHookSet) -> AppResult<Self> {
        let watcher_runtime = config.watcher_runtime();
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(AppError::Bootstrap(
                "watchers require a running tokio runtime".to_owned(),
            ));
        }

        let store = Arc::new(ArchitectStore::default());
        let watchers = WatcherSet::attach(
            &store,
            hooks,
            WatcherConfig {
                observe_requested_status: watcher_runtime.observe_requested_status,
                observe_actual_status: watcher_runtime.observe_actual_status,
            },
        );
        tracing::info!(
            observe_requested_status = watcher_runtime.observe_requested_status,
            observe_actual_status = watcher_runtime.observe_actual_status,
            "architect runtime started"
        );

        Ok(Self { store, watchers })
    }

    pub fn store(&self) -> Arc<ArchitectStore> {
        Arc::clone(&self.store)
    }

    pub fn watchers(&self) -> &WatcherSet {
        &self.watchers
    }

    pub fn perf_snapshot(&self) -> WatcherSetPerfSnapshot {
        self.watchers.perf_snapshot()
    }

    /// Stops dispatching and returns the final watcher counters.
    pub fn shutdown(self) -> WatcherSetPerfSnapshot {
        self.watchers.abort();
        let perf = self.watchers.perf_snapshot();
        let total = perf.total();
        tracing::info!(
            changes_received = total.changes_received_total,
            hooks_failed = total.hooks_failed_total,
            hooks_panicked = total.hooks_panicked_total,
            "architect runtime stopped"
        );
        perf
    }
}
