use architect_protocol::{ConnectionId, SegmentInstanceId, WorkerId};

/// Lifecycle events one slice raises for another to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeEvent {
    ConnectionRemoved {
        connection_id: ConnectionId,
    },
    SegmentInstanceAdded {
        id: SegmentInstanceId,
        worker_id: WorkerId,
    },
    SegmentInstanceRemoved {
        id: SegmentInstanceId,
        worker_id: WorkerId,
    },
}
