use architect_protocol::{Connection, ConnectionId, StoreResult};

use crate::events::CascadeEvent;
use crate::table::EntityTable;

#[derive(Debug, Clone, Default)]
pub struct ConnectionSlice {
    table: EntityTable<Connection>,
}

impl ConnectionSlice {
    pub fn table(&self) -> &EntityTable<Connection> {
        &self.table
    }

    pub fn add(&mut self, connection: Connection) -> StoreResult<()> {
        self.table.add(connection)
    }

    /// Removes the connection and hands back the event dependents must apply.
    /// Worker state is never touched here.
    pub fn remove(&mut self, id: &ConnectionId) -> StoreResult<(Connection, CascadeEvent)> {
        let removed = self.table.remove(id)?;
        let event = CascadeEvent::ConnectionRemoved {
            connection_id: removed.id.clone(),
        };
        Ok((removed, event))
    }
}
