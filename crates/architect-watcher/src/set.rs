use architect_protocol::{Connection, SegmentInstance, Worker};
use architect_store::ArchitectStore;

use crate::hooks::ReconciliationHookSet;
use crate::watcher::{ResourceStateWatcher, WatcherConfig, WatcherPerfSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatcherSetPerfSnapshot {
    pub connections: WatcherPerfSnapshot,
    pub workers: WatcherPerfSnapshot,
    pub segment_instances: WatcherPerfSnapshot,
}

impl WatcherSetPerfSnapshot {
    pub fn total(&self) -> WatcherPerfSnapshot {
        self.connections
            .merge(self.workers)
            .merge(self.segment_instances)
    }
}

/// The three per-kind watchers, attached together at startup.
#[derive(Debug)]
pub struct WatcherSet {
    connections: ResourceStateWatcher<Connection>,
    workers: ResourceStateWatcher<Worker>,
    segment_instances: ResourceStateWatcher<SegmentInstance>,
}

impl WatcherSet {
    pub fn attach(
        store: &ArchitectStore,
        hooks: ReconciliationHookSet,
        config: WatcherConfig,
    ) -> Self {
        Self {
            connections: ResourceStateWatcher::attach(store, hooks.connections, config),
            workers: ResourceStateWatcher::attach(store, hooks.workers, config),
            segment_instances: ResourceStateWatcher::attach(store, hooks.segment_instances, config),
        }
    }

    pub fn connections(&self) -> &ResourceStateWatcher<Connection> {
        &self.connections
    }

    pub fn workers(&self) -> &ResourceStateWatcher<Worker> {
        &self.workers
    }

    pub fn segment_instances(&self) -> &ResourceStateWatcher<SegmentInstance> {
        &self.segment_instances
    }

    pub fn perf_snapshot(&self) -> WatcherSetPerfSnapshot {
        WatcherSetPerfSnapshot {
            connections: self.connections.perf_snapshot(),
            workers: self.workers.perf_snapshot(),
            segment_instances: self.segment_instances.perf_snapshot(),
        }
    }

    pub fn abort(&self) {
        self.connections.abort();
        self.workers.abort();
        self.segment_instances.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use architect_protocol::{Connection, ConnectionId, SegmentInstance, Worker};
    use architect_store::ArchitectStore;
    use tokio::time::{sleep, timeout};

    use super::{WatcherSet, WatcherSetPerfSnapshot};
    use crate::hooks::ReconciliationHookSet;
    use crate::watcher::WatcherConfig;

    const TEST_TIMEOUT: Duration = Duration::from_secs(2);

    async fn settled(watchers: &WatcherSet, hooks: u64) -> WatcherSetPerfSnapshot {
        timeout(TEST_TIMEOUT, async {
            loop {
                let snapshot = watchers.perf_snapshot();
                if snapshot.total().hooks_succeeded_total == hooks {
                    return snapshot;
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("watchers settle")
    }

    #[tokio::test]
    async fn each_kind_is_dispatched_by_its_own_watcher() {
        let store = ArchitectStore::default();
        let watchers = WatcherSet::attach(
            &store,
            ReconciliationHookSet::default(),
            WatcherConfig::default(),
        );

        store
            .add_connection(Connection::new("c1", ""))
            .expect("add c1");
        store.add_worker(Worker::new("w1", "c1")).expect("add w1");
        store
            .add_segment_instance(SegmentInstance::new("s1", "w1"))
            .expect("add s1");
        store
            .remove_connection(&ConnectionId::new("c1"))
            .expect("remove c1");

        let snapshot = settled(&watchers, 6).await;
        assert_eq!(snapshot.connections.hooks_succeeded_total, 2);
        assert_eq!(snapshot.workers.hooks_succeeded_total, 2);
        assert_eq!(snapshot.segment_instances.hooks_succeeded_total, 2);
        assert_eq!(snapshot.total().last_sequence_seen, 6);
    }
}
