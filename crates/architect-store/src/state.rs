use std::collections::HashMap;

use architect_protocol::{
    Connection, ConnectionId, ResourceActualStatus, ResourceRequestedStatus, SegmentInstance,
    SegmentInstanceId, StoreError, StoreResult, Worker, WorkerId,
};

use crate::changes::{ChangeSet, ResourceChange};
use crate::connections::ConnectionSlice;
use crate::segment_instances::SegmentInstanceSlice;
use crate::table::StatusUpdate;
use crate::workers::WorkerSlice;

/// The three slices plus the rules tying them together.
///
/// Every intent validates before it mutates, so a failed call leaves the
/// state exactly as it found it. Net changes are recorded in the supplied
/// [`ChangeSet`] for publication once the caller commits.
#[derive(Debug, Clone, Default)]
pub struct ArchitectState {
    connections: ConnectionSlice,
    workers: WorkerSlice,
    segment_instances: SegmentInstanceSlice,
}

impl ArchitectState {
    pub fn connections(&self) -> &ConnectionSlice {
        &self.connections
    }

    pub fn workers(&self) -> &WorkerSlice {
        &self.workers
    }

    pub fn segment_instances(&self) -> &SegmentInstanceSlice {
        &self.segment_instances
    }

    pub fn add_connection(
        &mut self,
        connection: Connection,
        changes: &mut ChangeSet,
    ) -> StoreResult<()> {
        self.connections.add(connection.clone())?;
        changes.connections.push(ResourceChange::Added(connection));
        Ok(())
    }

    /// Removes the connection and every worker on it. Segment instances of
    /// those workers stay behind, flagged as orphaned.
    pub fn remove_connection(
        &mut self,
        id: &ConnectionId,
        changes: &mut ChangeSet,
    ) -> StoreResult<Connection> {
        let (connection, event) = self.connections.remove(id)?;
        let removed_workers = self.workers.apply(&event)?;
        let orphaned = self.segment_instances.mark_orphaned(
            removed_workers
                .iter()
                .flat_map(|worker| worker.assigned_segment_ids.iter()),
        );

        changes
            .connections
            .push(ResourceChange::Removed(connection.clone()));
        changes
            .workers
            .extend(removed_workers.into_iter().map(ResourceChange::Removed));
        changes
            .segment_instances
            .extend(orphaned.into_iter().map(ResourceChange::Orphaned));
        Ok(connection)
    }

    pub fn add_worker(&mut self, worker: Worker, changes: &mut ChangeSet) -> StoreResult<()> {
        let id = worker.id.clone();
        self.workers.add(worker)?;
        if let Some(added) = self.workers.table().get(&id) {
            changes.workers.push(ResourceChange::Added(added.clone()));
        }
        Ok(())
    }

    pub fn remove_worker(&mut self, id: &WorkerId, changes: &mut ChangeSet) -> StoreResult<Worker> {
        let removed = self.workers.remove(id)?;
        changes.workers.push(ResourceChange::Removed(removed.clone()));
        Ok(removed)
    }

    pub fn set_worker_requested_status(
        &mut self,
        id: &WorkerId,
        status: ResourceRequestedStatus,
        changes: &mut ChangeSet,
    ) -> StoreResult<Worker> {
        let update = self.workers.table_mut().set_requested_status(id, status)?;
        Ok(record_requested(update, status, &mut changes.workers))
    }

    pub fn set_worker_actual_status(
        &mut self,
        id: &WorkerId,
        status: ResourceActualStatus,
        changes: &mut ChangeSet,
    ) -> StoreResult<Worker> {
        let update = self.workers.table_mut().set_actual_status(id, status)?;
        Ok(record_actual(update, status, &mut changes.workers))
    }

    pub fn add_segment_instance(
        &mut self,
        instance: SegmentInstance,
        changes: &mut ChangeSet,
    ) -> StoreResult<()> {
        let event = self.segment_instances.prepare_add(&instance)?;
        self.workers.validate(&event)?;

        self.segment_instances.add(instance.clone())?;
        self.workers.apply(&event)?;
        changes
            .segment_instances
            .push(ResourceChange::Added(instance));
        Ok(())
    }

    /// Orphaned instances have no worker left to update and are removed
    /// directly; any other instance must still resolve its worker.
    pub fn remove_segment_instance(
        &mut self,
        id: &SegmentInstanceId,
        changes: &mut ChangeSet,
    ) -> StoreResult<SegmentInstance> {
        let event = self.segment_instances.prepare_remove(id)?;
        let removed = if self.segment_instances.is_orphaned(id) {
            self.segment_instances.remove(id)?
        } else {
            self.workers.validate(&event)?;
            let removed = self.segment_instances.remove(id)?;
            self.workers.apply(&event)?;
            removed
        };
        changes
            .segment_instances
            .push(ResourceChange::Removed(removed.clone()));
        Ok(removed)
    }

    pub fn set_segment_instance_requested_status(
        &mut self,
        id: &SegmentInstanceId,
        status: ResourceRequestedStatus,
        changes: &mut ChangeSet,
    ) -> StoreResult<SegmentInstance> {
        let update = self
            .segment_instances
            .table_mut()
            .set_requested_status(id, status)?;
        Ok(record_requested(update, status, &mut changes.segment_instances))
    }

    pub fn set_segment_instance_actual_status(
        &mut self,
        id: &SegmentInstanceId,
        status: ResourceActualStatus,
        changes: &mut ChangeSet,
    ) -> StoreResult<SegmentInstance> {
        let update = self
            .segment_instances
            .table_mut()
            .set_actual_status(id, status)?;
        Ok(record_actual(update, status, &mut changes.segment_instances))
    }

    /// Checks the cross-kind invariants: every worker's machine resolves,
    /// and worker membership lists mirror the non-orphaned segment
    /// instances pointing at them, each id exactly once.
    pub fn verify_invariants(&self) -> StoreResult<()> {
        for worker in self.workers.table().iter() {
            if !self.connections.table().contains(&worker.machine_id) {
                return Err(StoreError::invariant_violation(format!(
                    "Worker {} references missing Connection {}",
                    worker.id, worker.machine_id
                )));
            }
        }

        let mut expected: HashMap<&WorkerId, Vec<&SegmentInstanceId>> = HashMap::new();
        for instance in self.segment_instances.table().iter() {
            if self.segment_instances.is_orphaned(&instance.id) {
                continue;
            }
            if !self.workers.table().contains(&instance.worker_id) {
                return Err(StoreError::invariant_violation(format!(
                    "SegmentInstance {} references missing Worker {} without being flagged orphaned",
                    instance.id, instance.worker_id
                )));
            }
            expected
                .entry(&instance.worker_id)
                .or_default()
                .push(&instance.id);
        }

        for worker in self.workers.table().iter() {
            let mut assigned: Vec<&SegmentInstanceId> =
                worker.assigned_segment_ids.iter().collect();
            let mut owned = expected.remove(&worker.id).unwrap_or_default();
            assigned.sort();
            owned.sort();
            if assigned != owned {
                return Err(StoreError::invariant_violation(format!(
                    "Worker {} assignments {:?} do not match its SegmentInstances {:?}",
                    worker.id, assigned, owned
                )));
            }
        }
        Ok(())
    }
}

fn record_requested<R: Clone>(
    update: StatusUpdate<R, ResourceRequestedStatus>,
    status: ResourceRequestedStatus,
    changes: &mut Vec<ResourceChange<R>>,
) -> R {
    if update.changed(status) {
        changes.push(ResourceChange::RequestedStatusChanged {
            resource: update.resource.clone(),
            previous: update.previous,
        });
    }
    update.resource
}

fn record_actual<R: Clone>(
    update: StatusUpdate<R, ResourceActualStatus>,
    status: ResourceActualStatus,
    changes: &mut Vec<ResourceChange<R>>,
) -> R {
    if update.changed(status) {
        changes.push(ResourceChange::ActualStatusChanged {
            resource: update.resource.clone(),
            previous: update.previous,
        });
    }
    update.resource
}
