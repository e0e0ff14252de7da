use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::ids::{ConnectionId, SegmentInstanceId, WorkerId};
use crate::status::ResourceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Connection,
    Worker,
    SegmentInstance,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connection => "Connection",
            Self::Worker => "Worker",
            Self::SegmentInstance => "SegmentInstance",
        };
        f.write_str(label)
    }
}

/// A keyed entity held by one of the store's tables.
pub trait Resource: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    const KIND: ResourceKind;

    fn id(&self) -> &Self::Id;
}

/// A resource carrying the requested/actual status pair.
pub trait StatefulResource: Resource {
    fn state(&self) -> &ResourceState;
    fn state_mut(&mut self) -> &mut ResourceState;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub peer_info: String,
}

impl Connection {
    pub fn new(id: impl Into<ConnectionId>, peer_info: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            peer_info: peer_info.into(),
        }
    }
}

impl Resource for Connection {
    type Id = ConnectionId;

    const KIND: ResourceKind = ResourceKind::Connection;

    fn id(&self) -> &ConnectionId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub machine_id: ConnectionId,
    #[serde(default)]
    pub worker_address: Vec<u8>,
    /// Segment instances scheduled on this worker, in assignment order.
    /// Owned by the store; kept in sync with segment instance add/remove.
    #[serde(default)]
    pub assigned_segment_ids: Vec<SegmentInstanceId>,
    #[serde(default)]
    pub state: ResourceState,
}

impl Worker {
    pub fn new(id: impl Into<WorkerId>, machine_id: impl Into<ConnectionId>) -> Self {
        Self {
            id: id.into(),
            machine_id: machine_id.into(),
            worker_address: Vec::new(),
            assigned_segment_ids: Vec::new(),
            state: ResourceState::default(),
        }
    }

    pub fn with_worker_address(mut self, worker_address: impl Into<Vec<u8>>) -> Self {
        self.worker_address = worker_address.into();
        self
    }
}

impl Resource for Worker {
    type Id = WorkerId;

    const KIND: ResourceKind = ResourceKind::Worker;

    fn id(&self) -> &WorkerId {
        &self.id
    }
}

impl StatefulResource for Worker {
    fn state(&self) -> &ResourceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ResourceState {
        &mut self.state
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentInstance {
    pub id: SegmentInstanceId,
    pub worker_id: WorkerId,
    #[serde(default)]
    pub pipeline_instance_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: ResourceState,
}

impl SegmentInstance {
    pub fn new(id: impl Into<SegmentInstanceId>, worker_id: impl Into<WorkerId>) -> Self {
        Self {
            id: id.into(),
            worker_id: worker_id.into(),
            pipeline_instance_id: String::new(),
            name: String::new(),
            state: ResourceState::default(),
        }
    }

    pub fn with_pipeline(
        mut self,
        pipeline_instance_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.pipeline_instance_id = pipeline_instance_id.into();
        self.name = name.into();
        self
    }
}

impl Resource for SegmentInstance {
    type Id = SegmentInstanceId;

    const KIND: ResourceKind = ResourceKind::SegmentInstance;

    fn id(&self) -> &SegmentInstanceId {
        &self.id
    }
}

impl StatefulResource for SegmentInstance {
    fn state(&self) -> &ResourceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ResourceState {
        &mut self.state
    }
}
