use std::sync::{Arc, Mutex};
use std::time::Duration;

use architect_app::ArchitectRuntime;
use architect_config::parse_config;
use architect_protocol::{
    Connection, ConnectionId, ResourceActualStatus, ResourceRequestedStatus, SegmentInstance,
    SegmentInstanceId, Worker, WorkerId,
};
use architect_watcher::{HookResult, ReconciliationHookSet, ReconciliationHooks};
use async_trait::async_trait;
use tokio::time::{sleep, timeout};

const TEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
struct Journal {
    entries: Mutex<Vec<String>>,
}

impl Journal {
    fn record(&self, entry: String) {
        self.entries.lock().expect("journal lock").push(entry);
    }

    fn sorted(&self) -> Vec<String> {
        let mut entries = self.entries.lock().expect("journal lock").clone();
        entries.sort();
        entries
    }
}

struct JournalHooks(Arc<Journal>);

#[async_trait]
impl ReconciliationHooks<Connection> for JournalHooks {
    async fn on_removed(&self, connection: &Connection) -> HookResult<()> {
        self.0.record(format!("connection removed {}", connection.id));
        Ok(())
    }
}

#[async_trait]
impl ReconciliationHooks<Worker> for JournalHooks {
    async fn on_added(&self, worker: &Worker) -> HookResult<()> {
        self.0.record(format!("worker added {}", worker.id));
        Ok(())
    }

    async fn on_requested_status(
        &self,
        worker: &Worker,
        _previous: ResourceRequestedStatus,
    ) -> HookResult<()> {
        self.0.record(format!(
            "worker {} requested {}",
            worker.id, worker.state.requested_status
        ));
        Ok(())
    }
}

#[async_trait]
impl ReconciliationHooks<SegmentInstance> for JournalHooks {
    async fn on_actual_status(
        &self,
        instance: &SegmentInstance,
        _previous: ResourceActualStatus,
    ) -> HookResult<()> {
        self.0.record(format!(
            "segment {} actual {}",
            instance.id, instance.state.actual_status
        ));
        Ok(())
    }

    async fn on_orphaned(&self, instance: &SegmentInstance) -> HookResult<()> {
        self.0.record(format!("segment orphaned {}", instance.id));
        Ok(())
    }
}

fn journal_hooks(journal: &Arc<Journal>) -> ReconciliationHookSet {
    ReconciliationHookSet::default()
        .with_connections(Arc::new(JournalHooks(Arc::clone(journal))))
        .with_workers(Arc::new(JournalHooks(Arc::clone(journal))))
        .with_segment_instances(Arc::new(JournalHooks(Arc::clone(journal))))
}

async fn wait_for_entries(journal: &Journal, count: usize) -> Vec<String> {
    timeout(TEST_TIMEOUT, async {
        loop {
            let entries = journal.sorted();
            if entries.len() >= count {
                return entries;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("hooks record their entries")
}

#[tokio::test]
async fn bootstrap_wires_all_three_watchers_to_the_store() {
    let journal = Arc::new(Journal::default());
    let config = parse_config("").expect("default config");
    let runtime = ArchitectRuntime::bootstrap(&config, journal_hooks(&journal)).expect("bootstrap");
    let store = runtime.store();

    store
        .add_connection(Connection::new("c1", "10.0.0.7:4000"))
        .expect("add c1");
    store
        .add_workers([Worker::new("w1", "c1"), Worker::new("w2", "c1")])
        .expect("add workers");
    store
        .set_worker_requested_status(&WorkerId::new("w1"), ResourceRequestedStatus::Created)
        .expect("request w1");
    store
        .add_segment_instance(SegmentInstance::new("s1", "w1").with_pipeline("p1", "sink"))
        .expect("add s1");
    store
        .set_segment_instance_actual_status(
            &SegmentInstanceId::new("s1"),
            ResourceActualStatus::Running,
        )
        .expect("s1 running");
    store
        .remove_connection(&ConnectionId::new("c1"))
        .expect("remove c1");

    assert_eq!(
        wait_for_entries(&journal, 6).await,
        [
            "connection removed c1",
            "segment orphaned s1",
            "segment s1 actual Running",
            "worker added w1",
            "worker added w2",
            "worker w1 requested Created",
        ]
    );
    assert_eq!(store.get_total::<Worker>(), 0);
    assert_eq!(store.orphaned_segment_instances().len(), 1);

    let perf = runtime.shutdown();
    assert_eq!(perf.total().hooks_failed_total, 0);
    assert_eq!(perf.workers.changes_received_total, 5);
}

#[tokio::test]
async fn disabled_status_observation_is_honored_from_config() {
    let journal = Arc::new(Journal::default());
    let config = parse_config(
        r#"
        [watcher]
        observe_requested_status = false
        "#,
    )
    .expect("parse config");
    let runtime = ArchitectRuntime::bootstrap(&config, journal_hooks(&journal)).expect("bootstrap");
    let store = runtime.store();

    store
        .add_connection(Connection::new("c1", ""))
        .expect("add c1");
    store.add_worker(Worker::new("w1", "c1")).expect("add w1");
    store
        .set_worker_requested_status(&WorkerId::new("w1"), ResourceRequestedStatus::Stopped)
        .expect("request w1");

    timeout(TEST_TIMEOUT, async {
        while runtime.perf_snapshot().workers.changes_received_total < 2 {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("worker changes observed");

    assert_eq!(wait_for_entries(&journal, 1).await, ["worker added w1"]);
    assert_eq!(runtime.perf_snapshot().workers.changes_skipped_total, 1);
}
