use std::sync::Arc;

use architect_protocol::{
    Connection, Resource, ResourceActualStatus, ResourceRequestedStatus, SegmentInstance, Worker,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("reconciliation hook failed: {0}")]
    Failed(String),
}

pub type HookResult<T> = Result<T, HookError>;

/// Reactions the policy layer attaches to one resource kind.
///
/// Every method defaults to a no-op, so implementors only override the
/// transitions they reconcile. Hooks receive a snapshot taken at commit
/// time; the store may have moved on by the time they run.
#[async_trait]
pub trait ReconciliationHooks<R: Resource>: Send + Sync {
    async fn on_added(&self, resource: &R) -> HookResult<()> {
        let _ = resource;
        Ok(())
    }

    async fn on_requested_status(
        &self,
        resource: &R,
        previous: ResourceRequestedStatus,
    ) -> HookResult<()> {
        let _ = (resource, previous);
        Ok(())
    }

    async fn on_actual_status(
        &self,
        resource: &R,
        previous: ResourceActualStatus,
    ) -> HookResult<()> {
        let _ = (resource, previous);
        Ok(())
    }

    async fn on_removed(&self, resource: &R) -> HookResult<()> {
        let _ = resource;
        Ok(())
    }

    /// Only segment instances are orphaned today.
    async fn on_orphaned(&self, resource: &R) -> HookResult<()> {
        let _ = resource;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait]
impl<R: Resource> ReconciliationHooks<R> for NoopHooks {}

/// One hooks object per stored kind, handed to the watcher set at startup.
#[derive(Clone)]
pub struct ReconciliationHookSet {
    pub connections: Arc<dyn ReconciliationHooks<Connection>>,
    pub workers: Arc<dyn ReconciliationHooks<Worker>>,
    pub segment_instances: Arc<dyn ReconciliationHooks<SegmentInstance>>,
}

impl Default for ReconciliationHookSet {
    fn default() -> Self {
        Self {
            connections: Arc::new(NoopHooks),
            workers: Arc::new(NoopHooks),
            segment_instances: Arc::new(NoopHooks),
        }
    }
}

impl ReconciliationHookSet {
    pub fn with_connections(mut self, hooks: Arc<dyn ReconciliationHooks<Connection>>) -> Self {
        self.connections = hooks;
        self
    }

    pub fn with_workers(mut self, hooks: Arc<dyn ReconciliationHooks<Worker>>) -> Self {
        self.workers = hooks;
        self
    }

    pub fn with_segment_instances(
        mut self,
        hooks: Arc<dyn ReconciliationHooks<SegmentInstance>>,
    ) -> Self {
        self.segment_instances = hooks;
        self
    }
}
