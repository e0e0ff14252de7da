use architect_protocol::{ConnectionId, Resource, StoreError, StoreResult, Worker, WorkerId};

use crate::events::CascadeEvent;
use crate::table::EntityTable;

#[derive(Debug, Clone, Default)]
pub struct WorkerSlice {
    table: EntityTable<Worker>,
}

impl WorkerSlice {
    pub fn table(&self) -> &EntityTable<Worker> {
        &self.table
    }

    pub(crate) fn table_mut(&mut self) -> &mut EntityTable<Worker> {
        &mut self.table
    }

    /// Segment membership is derived from segment instances, so any ids the
    /// caller supplied are dropped on insert.
    pub fn add(&mut self, mut worker: Worker) -> StoreResult<()> {
        worker.assigned_segment_ids.clear();
        self.table.add(worker)
    }

    pub fn remove(&mut self, id: &WorkerId) -> StoreResult<Worker> {
        let worker = self
            .table
            .get(id)
            .ok_or_else(|| StoreError::not_found::<Worker>(id))?;
        if !worker.assigned_segment_ids.is_empty() {
            return Err(StoreError::PreconditionFailed {
                kind: Worker::KIND,
                id: id.to_string(),
                dependents: worker
                    .assigned_segment_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            });
        }
        self.table.remove(id)
    }

    pub fn by_machine_id(&self, machine_id: &ConnectionId) -> Vec<Worker> {
        self.table
            .iter()
            .filter(|worker| &worker.machine_id == machine_id)
            .cloned()
            .collect()
    }

    /// Checks that `event` can be applied without touching any state.
    pub fn validate(&self, event: &CascadeEvent) -> StoreResult<()> {
        match event {
            CascadeEvent::ConnectionRemoved { .. } => Ok(()),
            CascadeEvent::SegmentInstanceAdded { id, worker_id } => {
                if self.table.contains(worker_id) {
                    Ok(())
                } else {
                    Err(StoreError::invariant_violation(format!(
                        "no matching Worker with ID: {worker_id} for SegmentInstance {id}"
                    )))
                }
            }
            CascadeEvent::SegmentInstanceRemoved { id, worker_id } => {
                if self.table.contains(worker_id) {
                    Ok(())
                } else {
                    Err(StoreError::invariant_violation(format!(
                        "must drop all SegmentInstances before removing a Worker (SegmentInstance {id} references missing Worker {worker_id})"
                    )))
                }
            }
        }
    }

    /// Applies a cascade event and returns the workers it removed.
    ///
    /// Connection loss tears workers down even when segment instances are
    /// still assigned; only explicit [`WorkerSlice::remove`] is guarded.
    pub fn apply(&mut self, event: &CascadeEvent) -> StoreResult<Vec<Worker>> {
        self.validate(event)?;
        match event {
            CascadeEvent::ConnectionRemoved { connection_id } => {
                let doomed: Vec<WorkerId> = self
                    .by_machine_id(connection_id)
                    .into_iter()
                    .map(|worker| worker.id)
                    .collect();
                doomed
                    .iter()
                    .map(|worker_id| self.table.remove(worker_id))
                    .collect()
            }
            CascadeEvent::SegmentInstanceAdded { id, worker_id } => {
                self.table.update(worker_id, |worker| {
                    worker.assigned_segment_ids.push(id.clone());
                })?;
                Ok(Vec::new())
            }
            CascadeEvent::SegmentInstanceRemoved { id, worker_id } => {
                self.table.update(worker_id, |worker| {
                    if let Some(index) = worker
                        .assigned_segment_ids
                        .iter()
                        .position(|assigned| assigned == id)
                    {
                        worker.assigned_segment_ids.remove(index);
                    }
                })?;
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use architect_protocol::{
        ConnectionId, ResourceKind, SegmentInstanceId, StoreError, Worker, WorkerId,
    };

    use super::WorkerSlice;
    use crate::events::CascadeEvent;

    fn segment_added(id: &str, worker_id: &str) -> CascadeEvent {
        CascadeEvent::SegmentInstanceAdded {
            id: SegmentInstanceId::new(id),
            worker_id: WorkerId::new(worker_id),
        }
    }

    fn segment_removed(id: &str, worker_id: &str) -> CascadeEvent {
        CascadeEvent::SegmentInstanceRemoved {
            id: SegmentInstanceId::new(id),
            worker_id: WorkerId::new(worker_id),
        }
    }

    fn assigned(slice: &WorkerSlice, worker_id: &str) -> Vec<String> {
        slice
            .table()
            .get(&WorkerId::new(worker_id))
            .map(|worker| {
                worker
                    .assigned_segment_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn add_drops_caller_supplied_segment_membership() {
        let mut slice = WorkerSlice::default();
        let mut worker = Worker::new("w1", "c1");
        worker.assigned_segment_ids.push(SegmentInstanceId::new("s-stale"));

        slice.add(worker).expect("add worker");

        assert!(assigned(&slice, "w1").is_empty());
    }

    #[test]
    fn remove_with_assigned_segments_fails_and_keeps_worker() {
        let mut slice = WorkerSlice::default();
        slice.add(Worker::new("w1", "c1")).expect("add worker");
        slice.apply(&segment_added("s1", "w1")).expect("assign s1");
        slice.apply(&segment_added("s2", "w1")).expect("assign s2");

        let error = slice
            .remove(&WorkerId::new("w1"))
            .expect_err("guarded remove should fail");

        assert_eq!(
            error,
            StoreError::PreconditionFailed {
                kind: ResourceKind::Worker,
                id: "w1".to_owned(),
                dependents: vec!["s1".to_owned(), "s2".to_owned()],
            }
        );
        assert_eq!(assigned(&slice, "w1"), ["s1", "s2"]);
    }

    #[test]
    fn connection_removed_tears_down_only_matching_workers() {
        let mut slice = WorkerSlice::default();
        slice.add(Worker::new("w1", "c1")).expect("add w1");
        slice.add(Worker::new("w2", "c2")).expect("add w2");
        slice.add(Worker::new("w3", "c1")).expect("add w3");
        slice.apply(&segment_added("s1", "w1")).expect("assign s1");

        let removed = slice
            .apply(&CascadeEvent::ConnectionRemoved {
                connection_id: ConnectionId::new("c1"),
            })
            .expect("cascade");

        assert_eq!(
            removed.iter().map(|w| w.id.as_str()).collect::<Vec<_>>(),
            ["w1", "w3"]
        );
        assert_eq!(
            slice
                .table()
                .ids()
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>(),
            ["w2"]
        );
    }

    #[test]
    fn segment_removal_is_idempotent_for_known_workers() {
        let mut slice = WorkerSlice::default();
        slice.add(Worker::new("w1", "c1")).expect("add worker");
        slice.apply(&segment_added("s1", "w1")).expect("assign s1");
        slice.apply(&segment_added("s2", "w1")).expect("assign s2");

        slice.apply(&segment_removed("s1", "w1")).expect("unassign s1");
        slice
            .apply(&segment_removed("s1", "w1"))
            .expect("repeat unassign is a no-op");

        assert_eq!(assigned(&slice, "w1"), ["s2"]);
    }

    #[test]
    fn segment_events_for_missing_workers_are_invariant_violations() {
        let mut slice = WorkerSlice::default();

        let added = slice
            .apply(&segment_added("s1", "ghost"))
            .expect_err("add against missing worker");
        let removed = slice
            .apply(&segment_removed("s1", "ghost"))
            .expect_err("remove against missing worker");

        assert!(matches!(added, StoreError::InvariantViolation(_)));
        assert!(matches!(
            removed,
            StoreError::InvariantViolation(message)
                if message.starts_with("must drop all SegmentInstances")
        ));
    }
}
