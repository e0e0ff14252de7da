use std::collections::HashSet;

use architect_protocol::{SegmentInstance, SegmentInstanceId, StoreError, StoreResult};

use crate::events::CascadeEvent;
use crate::table::EntityTable;

#[derive(Debug, Clone, Default)]
pub struct SegmentInstanceSlice {
    table: EntityTable<SegmentInstance>,
    orphaned: HashSet<SegmentInstanceId>,
}

impl SegmentInstanceSlice {
    pub fn table(&self) -> &EntityTable<SegmentInstance> {
        &self.table
    }

    pub(crate) fn table_mut(&mut self) -> &mut EntityTable<SegmentInstance> {
        &mut self.table
    }

    /// Fails on duplicates without inserting; returns the event the worker
    /// slice must accept before [`SegmentInstanceSlice::add`] commits.
    pub fn prepare_add(&self, instance: &SegmentInstance) -> StoreResult<CascadeEvent> {
        if self.table.contains(&instance.id) {
            return Err(StoreError::already_exists::<SegmentInstance>(&instance.id));
        }
        Ok(CascadeEvent::SegmentInstanceAdded {
            id: instance.id.clone(),
            worker_id: instance.worker_id.clone(),
        })
    }

    pub fn add(&mut self, instance: SegmentInstance) -> StoreResult<()> {
        self.table.add(instance)
    }

    pub fn prepare_remove(&self, id: &SegmentInstanceId) -> StoreResult<CascadeEvent> {
        let instance = self
            .table
            .get(id)
            .ok_or_else(|| StoreError::not_found::<SegmentInstance>(id))?;
        Ok(CascadeEvent::SegmentInstanceRemoved {
            id: instance.id.clone(),
            worker_id: instance.worker_id.clone(),
        })
    }

    pub fn remove(&mut self, id: &SegmentInstanceId) -> StoreResult<SegmentInstance> {
        let removed = self.table.remove(id)?;
        self.orphaned.remove(id);
        Ok(removed)
    }

    /// Flags instances whose worker was torn down by a connection cascade.
    /// Unknown ids are ignored; returns snapshots of the newly flagged ones.
    pub fn mark_orphaned<'a>(
        &mut self,
        ids: impl IntoIterator<Item = &'a SegmentInstanceId>,
    ) -> Vec<SegmentInstance> {
        ids.into_iter()
            .filter_map(|id| {
                let instance = self.table.get(id)?;
                self.orphaned.insert(id.clone()).then(|| instance.clone())
            })
            .collect()
    }

    pub fn is_orphaned(&self, id: &SegmentInstanceId) -> bool {
        self.orphaned.contains(id)
    }

    pub fn orphaned(&self) -> Vec<SegmentInstance> {
        self.table
            .iter()
            .filter(|instance| self.orphaned.contains(&instance.id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use architect_protocol::{SegmentInstance, SegmentInstanceId, StoreError};

    use super::SegmentInstanceSlice;
    use crate::events::CascadeEvent;

    #[test]
    fn prepare_add_rejects_duplicates_before_any_cascade() {
        let mut slice = SegmentInstanceSlice::default();
        slice
            .add(SegmentInstance::new("s1", "w1"))
            .expect("add instance");

        let error = slice
            .prepare_add(&SegmentInstance::new("s1", "w2"))
            .expect_err("duplicate should be rejected");

        assert!(matches!(error, StoreError::AlreadyExists { .. }));
        assert_eq!(slice.table().total(), 1);
    }

    #[test]
    fn prepare_remove_carries_the_owning_worker() {
        let mut slice = SegmentInstanceSlice::default();
        slice
            .add(SegmentInstance::new("s1", "w1"))
            .expect("add instance");

        let event = slice
            .prepare_remove(&SegmentInstanceId::new("s1"))
            .expect("prepare remove");

        assert_eq!(
            event,
            CascadeEvent::SegmentInstanceRemoved {
                id: "s1".into(),
                worker_id: "w1".into(),
            }
        );
    }

    #[test]
    fn orphan_flags_are_reported_once_and_cleared_on_remove() {
        let mut slice = SegmentInstanceSlice::default();
        slice
            .add(SegmentInstance::new("s1", "w1"))
            .expect("add s1");
        slice
            .add(SegmentInstance::new("s2", "w1"))
            .expect("add s2");
        let s1 = SegmentInstanceId::new("s1");
        let ghost = SegmentInstanceId::new("ghost");

        let flagged = slice.mark_orphaned([&s1, &ghost]);
        let flagged_again = slice.mark_orphaned([&s1]);

        assert_eq!(flagged.len(), 1);
        assert!(flagged_again.is_empty());
        assert!(slice.is_orphaned(&s1));

        slice.remove(&s1).expect("remove orphan");
        assert!(!slice.is_orphaned(&s1));
        assert!(slice.orphaned().is_empty());
    }
}
