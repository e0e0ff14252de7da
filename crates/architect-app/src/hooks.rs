use std::sync::Arc;

use architect_protocol::{Resource, ResourceActualStatus, ResourceRequestedStatus};
use architect_watcher::{HookResult, ReconciliationHookSet, ReconciliationHooks};
use async_trait::async_trait;

/// Hooks that only report what they see. Used by the binary until a
/// reconciliation policy is plugged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHooks;

impl LoggingHooks {
    pub fn hook_set() -> ReconciliationHookSet {
        ReconciliationHookSet {
            connections: Arc::new(Self),
            workers: Arc::new(Self),
            segment_instances: Arc::new(Self),
        }
    }
}

#[async_trait]
impl<R: Resource> ReconciliationHooks<R> for LoggingHooks {
    async fn on_added(&self, resource: &R) -> HookResult<()> {
        tracing::info!(kind = %R::KIND, resource_id = %resource.id(), "resource added");
        Ok(())
    }

    async fn on_requested_status(
        &self,
        resource: &R,
        previous: ResourceRequestedStatus,
    ) -> HookResult<()> {
        tracing::info!(
            kind = %R::KIND,
            resource_id = %resource.id(),
            previous = %previous,
            "requested status changed"
        );
        Ok(())
    }

    async fn on_actual_status(
        &self,
        resource: &R,
        previous: ResourceActualStatus,
    ) -> HookResult<()> {
        tracing::info!(
            kind = %R::KIND,
            resource_id = %resource.id(),
            previous = %previous,
            "actual status changed"
        );
        Ok(())
    }

    async fn on_removed(&self, resource: &R) -> HookResult<()> {
        tracing::info!(kind = %R::KIND, resource_id = %resource.id(), "resource removed");
        Ok(())
    }

    async fn on_orphaned(&self, resource: &R) -> HookResult<()> {
        tracing::warn!(
            kind = %R::KIND,
            resource_id = %resource.id(),
            "resource orphaned by connection removal; awaiting cleanup"
        );
        Ok(())
    }
}
