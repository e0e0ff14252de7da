use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Instant;

use architect_protocol::{Connection, Resource, SegmentInstance, Worker};
use tokio::sync::mpsc;

use crate::changes::{ChangeSet, ResourceChange};

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEnvelope<R> {
    /// Store-wide commit sequence, shared by all kinds.
    pub sequence: u64,
    pub committed_at_monotonic_nanos: u64,
    pub change: ResourceChange<R>,
}

pub type ChangeSubscription<R> = mpsc::UnboundedReceiver<ChangeEnvelope<R>>;

/// Fan-out of one kind's changes to every live subscriber.
///
/// Each subscriber owns an unbounded queue, so publishing never blocks the
/// committing writer and never drops a change. Subscribers whose receiver
/// is gone are pruned on the next publish.
#[derive(Debug)]
pub struct ChangeChannel<R> {
    subscribers: RwLock<Vec<mpsc::UnboundedSender<ChangeEnvelope<R>>>>,
}

impl<R> Default for ChangeChannel<R> {
    fn default() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }
}

impl<R: Resource> ChangeChannel<R> {
    pub fn subscribe(&self) -> ChangeSubscription<R> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .write()
            .expect("store change subscriber lock poisoned")
            .push(sender);
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("store change subscriber lock poisoned")
            .iter()
            .filter(|sender| !sender.is_closed())
            .count()
    }

    fn send(&self, envelope: ChangeEnvelope<R>) {
        let mut subscribers = self
            .subscribers
            .write()
            .expect("store change subscriber lock poisoned");
        subscribers.retain(|sender| sender.send(envelope.clone()).is_ok());
    }
}

/// Per-kind fan-out of committed store changes.
#[derive(Debug)]
pub struct ChangeBus {
    next_sequence: AtomicU64,
    boot_instant: Instant,
    connections: ChangeChannel<Connection>,
    workers: ChangeChannel<Worker>,
    segment_instances: ChangeChannel<SegmentInstance>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self {
            next_sequence: AtomicU64::new(0),
            boot_instant: Instant::now(),
            connections: ChangeChannel::default(),
            workers: ChangeChannel::default(),
            segment_instances: ChangeChannel::default(),
        }
    }
}

impl ChangeBus {
    pub fn connections(&self) -> &ChangeChannel<Connection> {
        &self.connections
    }

    pub fn workers(&self) -> &ChangeChannel<Worker> {
        &self.workers
    }

    pub fn segment_instances(&self) -> &ChangeChannel<SegmentInstance> {
        &self.segment_instances
    }

    pub fn last_sequence(&self) -> u64 {
        self.next_sequence.load(Ordering::Relaxed)
    }

    pub fn publish(&self, changes: ChangeSet) {
        let ChangeSet {
            connections,
            workers,
            segment_instances,
        } = changes;
        for change in connections {
            self.connections.send(self.envelope(change));
        }
        for change in workers {
            self.workers.send(self.envelope(change));
        }
        for change in segment_instances {
            self.segment_instances.send(self.envelope(change));
        }
    }

    fn envelope<R>(&self, change: ResourceChange<R>) -> ChangeEnvelope<R> {
        ChangeEnvelope {
            sequence: self.next_sequence(),
            committed_at_monotonic_nanos: self.monotonic_nanos_since_bus_bootstrap(),
            change,
        }
    }

    fn next_sequence(&self) -> u64 {
        let mut current = self.next_sequence.load(Ordering::Relaxed);
        loop {
            let next = current
                .checked_add(1)
                .expect("store change sequence exhausted");
            match self.next_sequence.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    fn monotonic_nanos_since_bus_bootstrap(&self) -> u64 {
        let nanos = self.boot_instant.elapsed().as_nanos();
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }
}
