//! Resource model shared by the architect state store: ids, entities,
//! status codes and the store error type.

pub mod entities;
pub mod error;
pub mod ids;
pub mod status;

pub use entities::{Connection, Resource, ResourceKind, SegmentInstance, StatefulResource, Worker};
pub use error::{StatusCodeError, StoreError, StoreResult};
pub use ids::{ConnectionId, SegmentInstanceId, WorkerId};
pub use status::{ResourceActualStatus, ResourceRequestedStatus, ResourceState};
