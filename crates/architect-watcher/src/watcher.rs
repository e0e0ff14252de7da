use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use architect_protocol::Resource;
use architect_store::{
    ArchitectStore, ChangeEnvelope, ChangeSubscription, ResourceChange, StoredResource,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::hooks::{HookResult, ReconciliationHooks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherConfig {
    pub observe_requested_status: bool,
    pub observe_actual_status: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            observe_requested_status: true,
            observe_actual_status: true,
        }
    }
}

impl WatcherConfig {
    fn observes<R>(&self, change: &ResourceChange<R>) -> bool {
        match change {
            ResourceChange::RequestedStatusChanged { .. } => self.observe_requested_status,
            ResourceChange::ActualStatusChanged { .. } => self.observe_actual_status,
            ResourceChange::Added(_) | ResourceChange::Removed(_) | ResourceChange::Orphaned(_) => {
                true
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatcherPerfSnapshot {
    pub changes_received_total: u64,
    pub changes_skipped_total: u64,
    pub hooks_started_total: u64,
    pub hooks_succeeded_total: u64,
    pub hooks_failed_total: u64,
    pub hooks_panicked_total: u64,
    pub hooks_cancelled_total: u64,
    pub last_sequence_seen: u64,
}

impl WatcherPerfSnapshot {
    pub fn hooks_finished_total(&self) -> u64 {
        self.hooks_succeeded_total
            + self.hooks_failed_total
            + self.hooks_panicked_total
            + self.hooks_cancelled_total
    }

    pub fn hooks_in_flight(&self) -> u64 {
        self.hooks_started_total
            .saturating_sub(self.hooks_finished_total())
    }

    pub(crate) fn merge(self, other: Self) -> Self {
        Self {
            changes_received_total: self.changes_received_total + other.changes_received_total,
            changes_skipped_total: self.changes_skipped_total + other.changes_skipped_total,
            hooks_started_total: self.hooks_started_total + other.hooks_started_total,
            hooks_succeeded_total: self.hooks_succeeded_total + other.hooks_succeeded_total,
            hooks_failed_total: self.hooks_failed_total + other.hooks_failed_total,
            hooks_panicked_total: self.hooks_panicked_total + other.hooks_panicked_total,
            hooks_cancelled_total: self.hooks_cancelled_total + other.hooks_cancelled_total,
            last_sequence_seen: self.last_sequence_seen.max(other.last_sequence_seen),
        }
    }
}

#[derive(Debug, Default)]
struct WatcherPerfCounters {
    changes_received_total: AtomicU64,
    changes_skipped_total: AtomicU64,
    hooks_started_total: AtomicU64,
    hooks_succeeded_total: AtomicU64,
    hooks_failed_total: AtomicU64,
    hooks_panicked_total: AtomicU64,
    hooks_cancelled_total: AtomicU64,
    last_sequence_seen: AtomicU64,
}

impl WatcherPerfCounters {
    fn snapshot(&self) -> WatcherPerfSnapshot {
        WatcherPerfSnapshot {
            changes_received_total: self.changes_received_total.load(Ordering::Relaxed),
            changes_skipped_total: self.changes_skipped_total.load(Ordering::Relaxed),
            hooks_started_total: self.hooks_started_total.load(Ordering::Relaxed),
            hooks_succeeded_total: self.hooks_succeeded_total.load(Ordering::Relaxed),
            hooks_failed_total: self.hooks_failed_total.load(Ordering::Relaxed),
            hooks_panicked_total: self.hooks_panicked_total.load(Ordering::Relaxed),
            hooks_cancelled_total: self.hooks_cancelled_total.load(Ordering::Relaxed),
            last_sequence_seen: self.last_sequence_seen.load(Ordering::Relaxed),
        }
    }
}

type Lane<R> = mpsc::UnboundedSender<ChangeEnvelope<R>>;

/// Runs the reconciliation hooks of one resource kind against the store's
/// change feed.
///
/// Every committed change reaches a hook. Changes to the same resource run
/// one after another in commit order; different resources run concurrently
/// with no ordering between them. A hook that never returns stalls later
/// hooks of its own resource only. Hook errors and panics are logged and
/// counted here and never reach the store.
#[derive(Debug)]
pub struct ResourceStateWatcher<R> {
    dispatch_task: JoinHandle<()>,
    perf: Arc<WatcherPerfCounters>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: StoredResource> ResourceStateWatcher<R> {
    /// Subscribes immediately, so every change committed after this call is
    /// observed. Must be called from within a tokio runtime.
    pub fn attach(
        store: &ArchitectStore,
        hooks: Arc<dyn ReconciliationHooks<R>>,
        config: WatcherConfig,
    ) -> Self {
        let subscription = store.subscribe::<R>();
        let perf = Arc::new(WatcherPerfCounters::default());
        let dispatch_task = tokio::spawn(dispatch_changes(
            subscription,
            hooks,
            config,
            Arc::clone(&perf),
        ));
        tracing::debug!(
            kind = %R::KIND,
            observe_requested_status = config.observe_requested_status,
            observe_actual_status = config.observe_actual_status,
            "resource state watcher attached"
        );

        Self {
            dispatch_task,
            perf,
            _resource: PhantomData,
        }
    }

    pub fn perf_snapshot(&self) -> WatcherPerfSnapshot {
        self.perf.snapshot()
    }

    /// True once the store's change feed has closed.
    pub fn is_finished(&self) -> bool {
        self.dispatch_task.is_finished()
    }

    /// Stops taking new changes. Hooks already queued are left to finish.
    pub fn abort(&self) {
        self.dispatch_task.abort();
    }
}

async fn dispatch_changes<R: StoredResource>(
    mut subscription: ChangeSubscription<R>,
    hooks: Arc<dyn ReconciliationHooks<R>>,
    config: WatcherConfig,
    perf: Arc<WatcherPerfCounters>,
) {
    let mut lanes: HashMap<R::Id, Lane<R>> = HashMap::new();
    while let Some(envelope) = subscription.recv().await {
        perf.changes_received_total.fetch_add(1, Ordering::Relaxed);
        perf.last_sequence_seen
            .fetch_max(envelope.sequence, Ordering::Relaxed);
        if !config.observes(&envelope.change) {
            perf.changes_skipped_total.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        let id = envelope.change.resource().id().clone();
        let closes_lane = matches!(envelope.change, ResourceChange::Removed(_));
        let lane = lanes
            .entry(id.clone())
            .or_insert_with(|| spawn_lane(Arc::clone(&hooks), Arc::clone(&perf)));
        if let Err(mpsc::error::SendError(envelope)) = lane.send(envelope) {
            let fresh = spawn_lane(Arc::clone(&hooks), Arc::clone(&perf));
            let _ = fresh.send(envelope);
            *lane = fresh;
        }
        if closes_lane {
            lanes.remove(&id);
        }
    }
    tracing::debug!(kind = %R::KIND, "store change feed closed; watcher stopping");
}

/// Serial hook runner for one resource. Exits once its sender is dropped
/// and the queue is drained.
fn spawn_lane<R: StoredResource>(
    hooks: Arc<dyn ReconciliationHooks<R>>,
    perf: Arc<WatcherPerfCounters>,
) -> Lane<R> {
    let (sender, mut queue) = mpsc::unbounded_channel::<ChangeEnvelope<R>>();
    tokio::spawn(async move {
        while let Some(envelope) = queue.recv().await {
            run_hook(Arc::clone(&hooks), envelope, &perf).await;
        }
    });
    sender
}

async fn run_hook<R: StoredResource>(
    hooks: Arc<dyn ReconciliationHooks<R>>,
    envelope: ChangeEnvelope<R>,
    perf: &WatcherPerfCounters,
) {
    let kind = R::KIND;
    let ChangeEnvelope {
        sequence, change, ..
    } = envelope;
    let change_label = change.label();
    let resource_id = change.resource().id().to_string();

    perf.hooks_started_total.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(
        kind = %kind,
        resource_id = %resource_id,
        change = change_label,
        sequence,
        "dispatching reconciliation hook"
    );

    // A separate task so a panicking hook surfaces as a JoinError.
    let invocation = tokio::spawn(async move { invoke_hook(hooks.as_ref(), change).await });
    match invocation.await {
        Ok(Ok(())) => {
            perf.hooks_succeeded_total.fetch_add(1, Ordering::Relaxed);
        }
        Ok(Err(error)) => {
            perf.hooks_failed_total.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                kind = %kind,
                resource_id = %resource_id,
                change = change_label,
                sequence,
                error = %error,
                "reconciliation hook failed"
            );
        }
        Err(join_error) if join_error.is_panic() => {
            perf.hooks_panicked_total.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                kind = %kind,
                resource_id = %resource_id,
                change = change_label,
                sequence,
                "reconciliation hook panicked"
            );
        }
        Err(_) => {
            perf.hooks_cancelled_total.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                kind = %kind,
                resource_id = %resource_id,
                change = change_label,
                sequence,
                "reconciliation hook cancelled"
            );
        }
    }
}

async fn invoke_hook<R: Resource>(
    hooks: &dyn ReconciliationHooks<R>,
    change: ResourceChange<R>,
) -> HookResult<()> {
    match change {
        ResourceChange::Added(resource) => hooks.on_added(&resource).await,
        ResourceChange::RequestedStatusChanged { resource, previous } => {
            hooks.on_requested_status(&resource, previous).await
        }
        ResourceChange::ActualStatusChanged { resource, previous } => {
            hooks.on_actual_status(&resource, previous).await
        }
        ResourceChange::Removed(resource) => hooks.on_removed(&resource).await,
        ResourceChange::Orphaned(resource) => hooks.on_orphaned(&resource).await,
    }
}
