//! In-memory normalized state for connections, workers and segment
//! instances, with the cascades that keep them consistent and a change bus
//! for reconciliation watchers.

pub mod change_bus;
pub mod changes;
pub mod connections;
pub mod events;
pub mod segment_instances;
pub mod state;
pub mod store;
pub mod table;
pub mod workers;

pub use change_bus::{ChangeBus, ChangeChannel, ChangeEnvelope, ChangeSubscription};
pub use changes::{ChangeSet, ResourceChange};
pub use events::CascadeEvent;
pub use state::ArchitectState;
pub use store::{ArchitectStore, StoredResource};
pub use table::{EntityTable, StatusUpdate};
