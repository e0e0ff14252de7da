use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use architect_protocol::{
    Resource, ResourceActualStatus, ResourceRequestedStatus, StatefulResource, StoreError,
    StoreResult,
};

#[derive(Debug, Clone)]
struct Slot<R> {
    position: u64,
    resource: R,
}

/// Keyed collection of one resource kind.
///
/// Lookups go through a hash map; insertion order is tracked separately so
/// snapshots come back in the order resources were added.
#[derive(Debug, Clone)]
pub struct EntityTable<R: Resource> {
    entries: HashMap<R::Id, Slot<R>>,
    order: BTreeMap<u64, R::Id>,
    next_position: u64,
}

impl<R: Resource> Default for EntityTable<R> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_position: 0,
        }
    }
}

/// Result of overwriting one status field: the updated snapshot and the value
/// it replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate<R, S> {
    pub resource: R,
    pub previous: S,
}

impl<R, S: PartialEq> StatusUpdate<R, S> {
    pub fn changed(&self, current: S) -> bool {
        self.previous != current
    }
}

impl<R: Resource> EntityTable<R> {
    pub fn add(&mut self, resource: R) -> StoreResult<()> {
        match self.entries.entry(resource.id().clone()) {
            Entry::Occupied(slot) => Err(StoreError::already_exists::<R>(slot.key())),
            Entry::Vacant(slot) => {
                let position = self.next_position;
                self.next_position += 1;
                self.order.insert(position, slot.key().clone());
                slot.insert(Slot { position, resource });
                Ok(())
            }
        }
    }

    pub fn remove(&mut self, id: &R::Id) -> StoreResult<R> {
        let slot = self
            .entries
            .remove(id)
            .ok_or_else(|| StoreError::not_found::<R>(id))?;
        self.order.remove(&slot.position);
        Ok(slot.resource)
    }

    /// Applies `mutate` to one resource in place. The mutator must leave the
    /// resource id untouched.
    pub fn update<T>(&mut self, id: &R::Id, mutate: impl FnOnce(&mut R) -> T) -> StoreResult<T> {
        let slot = self
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found::<R>(id))?;
        let output = mutate(&mut slot.resource);
        debug_assert!(slot.resource.id() == id, "entity table mutator changed an id");
        Ok(output)
    }

    pub fn get(&self, id: &R::Id) -> Option<&R> {
        self.entries.get(id).map(|slot| &slot.resource)
    }

    pub fn contains(&self, id: &R::Id) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> + '_ {
        self.order
            .values()
            .filter_map(|id| self.entries.get(id))
            .map(|slot| &slot.resource)
    }

    pub fn get_all(&self) -> Vec<R> {
        self.iter().cloned().collect()
    }

    /// Unknown ids are skipped; the result follows the order of `ids`.
    pub fn get_by_ids(&self, ids: &[R::Id]) -> Vec<R> {
        ids.iter().filter_map(|id| self.get(id)).cloned().collect()
    }

    pub fn ids(&self) -> Vec<R::Id> {
        self.order.values().cloned().collect()
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R: StatefulResource> EntityTable<R> {
    pub fn set_requested_status(
        &mut self,
        id: &R::Id,
        status: ResourceRequestedStatus,
    ) -> StoreResult<StatusUpdate<R, ResourceRequestedStatus>> {
        self.update(id, |resource| {
            let previous = resource.state().requested_status;
            resource.state_mut().requested_status = status;
            StatusUpdate {
                resource: resource.clone(),
                previous,
            }
        })
    }

    pub fn set_actual_status(
        &mut self,
        id: &R::Id,
        status: ResourceActualStatus,
    ) -> StoreResult<StatusUpdate<R, ResourceActualStatus>> {
        self.update(id, |resource| {
            let previous = resource.state().actual_status;
            resource.state_mut().actual_status = status;
            StatusUpdate {
                resource: resource.clone(),
                previous,
            }
        })
    }
}
