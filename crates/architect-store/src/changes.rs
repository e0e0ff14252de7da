use architect_protocol::{
    Connection, Resource, ResourceActualStatus, ResourceRequestedStatus, SegmentInstance, Worker,
};

/// A committed change to one resource, as seen by watchers.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceChange<R> {
    Added(R),
    RequestedStatusChanged {
        resource: R,
        previous: ResourceRequestedStatus,
    },
    ActualStatusChanged {
        resource: R,
        previous: ResourceActualStatus,
    },
    Removed(R),
    /// The resource's owner disappeared in a cascade; it stays in the store
    /// until someone removes it.
    Orphaned(R),
}

impl<R: Resource> ResourceChange<R> {
    pub fn resource(&self) -> &R {
        match self {
            Self::Added(resource)
            | Self::Removed(resource)
            | Self::Orphaned(resource)
            | Self::RequestedStatusChanged { resource, .. }
            | Self::ActualStatusChanged { resource, .. } => resource,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::RequestedStatusChanged { .. } => "requested_status_changed",
            Self::ActualStatusChanged { .. } => "actual_status_changed",
            Self::Removed(_) => "removed",
            Self::Orphaned(_) => "orphaned",
        }
    }
}

/// Net changes of one committed mutation, grouped by kind in commit order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub connections: Vec<ResourceChange<Connection>>,
    pub workers: Vec<ResourceChange<Worker>>,
    pub segment_instances: Vec<ResourceChange<SegmentInstance>>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty() && self.workers.is_empty() && self.segment_instances.is_empty()
    }
}
