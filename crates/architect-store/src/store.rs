use std::collections::HashMap;
use std::sync::RwLock;

use architect_protocol::{
    Connection, ConnectionId, Resource, ResourceActualStatus, ResourceRequestedStatus,
    SegmentInstance, SegmentInstanceId, StoreResult, Worker, WorkerId,
};

use crate::change_bus::{ChangeBus, ChangeChannel, ChangeSubscription};
use crate::changes::ChangeSet;
use crate::state::ArchitectState;
use crate::table::EntityTable;

/// Resource kinds the store keeps a table and a change channel for.
pub trait StoredResource: Resource {
    fn table(state: &ArchitectState) -> &EntityTable<Self>;
    fn channel(bus: &ChangeBus) -> &ChangeChannel<Self>;
}

impl StoredResource for Connection {
    fn table(state: &ArchitectState) -> &EntityTable<Self> {
        state.connections().table()
    }

    fn channel(bus: &ChangeBus) -> &ChangeChannel<Self> {
        bus.connections()
    }
}

impl StoredResource for Worker {
    fn table(state: &ArchitectState) -> &EntityTable<Self> {
        state.workers().table()
    }

    fn channel(bus: &ChangeBus) -> &ChangeChannel<Self> {
        bus.workers()
    }
}

impl StoredResource for SegmentInstance {
    fn table(state: &ArchitectState) -> &EntityTable<Self> {
        state.segment_instances().table()
    }

    fn channel(bus: &ChangeBus) -> &ChangeChannel<Self> {
        bus.segment_instances()
    }
}

/// Process-wide handle to the resource state.
///
/// Mutations, cascades included, run under a single write lock and publish
/// their net changes before the lock is released, so change sequences follow
/// commit order. Queries take the read lock and return snapshots.
#[derive(Debug, Default)]
pub struct ArchitectStore {
    state: RwLock<ArchitectState>,
    changes: ChangeBus,
}

impl ArchitectStore {
    pub fn changes(&self) -> &ChangeBus {
        &self.changes
    }

    /// Every change committed after this call is delivered, in commit order.
    pub fn subscribe<R: StoredResource>(&self) -> ChangeSubscription<R> {
        R::channel(&self.changes).subscribe()
    }

    pub fn add_connection(&self, connection: Connection) -> StoreResult<()> {
        self.mutate(|state, changes| state.add_connection(connection, changes))
    }

    pub fn remove_connection(&self, id: &ConnectionId) -> StoreResult<Connection> {
        self.mutate(|state, changes| state.remove_connection(id, changes))
    }

    pub fn add_worker(&self, worker: Worker) -> StoreResult<()> {
        self.mutate(|state, changes| state.add_worker(worker, changes))
    }

    /// Adds workers one commit at a time so each insertion is observed on
    /// its own. Stops at the first failure; earlier workers stay added.
    pub fn add_workers(&self, workers: impl IntoIterator<Item = Worker>) -> StoreResult<()> {
        for worker in workers {
            self.add_worker(worker)?;
        }
        Ok(())
    }

    pub fn remove_worker(&self, id: &WorkerId) -> StoreResult<Worker> {
        self.mutate(|state, changes| state.remove_worker(id, changes))
    }

    pub fn set_worker_requested_status(
        &self,
        id: &WorkerId,
        status: ResourceRequestedStatus,
    ) -> StoreResult<Worker> {
        self.mutate(|state, changes| state.set_worker_requested_status(id, status, changes))
    }

    pub fn set_worker_actual_status(
        &self,
        id: &WorkerId,
        status: ResourceActualStatus,
    ) -> StoreResult<Worker> {
        self.mutate(|state, changes| state.set_worker_actual_status(id, status, changes))
    }

    pub fn add_segment_instance(&self, instance: SegmentInstance) -> StoreResult<()> {
        self.mutate(|state, changes| state.add_segment_instance(instance, changes))
    }

    pub fn remove_segment_instance(&self, id: &SegmentInstanceId) -> StoreResult<SegmentInstance> {
        self.mutate(|state, changes| state.remove_segment_instance(id, changes))
    }

    pub fn set_segment_instance_requested_status(
        &self,
        id: &SegmentInstanceId,
        status: ResourceRequestedStatus,
    ) -> StoreResult<SegmentInstance> {
        self.mutate(|state, changes| {
            state.set_segment_instance_requested_status(id, status, changes)
        })
    }

    pub fn set_segment_instance_actual_status(
        &self,
        id: &SegmentInstanceId,
        status: ResourceActualStatus,
    ) -> StoreResult<SegmentInstance> {
        self.mutate(|state, changes| state.set_segment_instance_actual_status(id, status, changes))
    }

    pub fn get_all<R: StoredResource>(&self) -> Vec<R> {
        self.read(|state| R::table(state).get_all())
    }

    pub fn get_by_id<R: StoredResource>(&self, id: &R::Id) -> Option<R> {
        self.read(|state| R::table(state).get(id).cloned())
    }

    pub fn get_by_ids<R: StoredResource>(&self, ids: &[R::Id]) -> Vec<R> {
        self.read(|state| R::table(state).get_by_ids(ids))
    }

    pub fn get_ids<R: StoredResource>(&self) -> Vec<R::Id> {
        self.read(|state| R::table(state).ids())
    }

    pub fn get_entities<R: StoredResource>(&self) -> HashMap<R::Id, R> {
        self.read(|state| {
            R::table(state)
                .iter()
                .map(|resource| (resource.id().clone(), resource.clone()))
                .collect()
        })
    }

    pub fn get_total<R: StoredResource>(&self) -> usize {
        self.read(|state| R::table(state).total())
    }

    pub fn workers_by_machine_id(&self, machine_id: &ConnectionId) -> Vec<Worker> {
        self.read(|state| state.workers().by_machine_id(machine_id))
    }

    /// Segment instances left behind by a connection cascade, awaiting
    /// cleanup by the reconciliation layer.
    pub fn orphaned_segment_instances(&self) -> Vec<SegmentInstance> {
        self.read(|state| state.segment_instances().orphaned())
    }

    pub fn snapshot(&self) -> ArchitectState {
        self.read(ArchitectState::clone)
    }

    pub fn verify_invariants(&self) -> StoreResult<()> {
        self.read(ArchitectState::verify_invariants)
    }

    fn read<T>(&self, query: impl FnOnce(&ArchitectState) -> T) -> T {
        let state = self
            .state
            .read()
            .expect("architect state lock poisoned");
        query(&*state)
    }

    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut ArchitectState, &mut ChangeSet) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut state = self
            .state
            .write()
            .expect("architect state lock poisoned");
        let mut changes = ChangeSet::default();
        let output = apply(&mut *state, &mut changes)?;
        if !changes.is_empty() {
            self.changes.publish(changes);
        }
        Ok(output)
    }
}
