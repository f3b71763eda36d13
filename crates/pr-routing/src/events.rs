//! Typed event channel between the routing core and its host.

use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};

use pr_core::Point3;
use pr_snap::AlignmentType;
use tracing::trace;

use crate::session::RoutingMode;

/// Events buffered per subscriber before new ones are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Fan-out publisher over bounded `mpsc` channels.
///
/// Publishing never blocks. Each subscriber buffers at most `capacity`
/// events; while its buffer is full further events are dropped for that
/// subscriber only, so hosts should drain receivers once per frame.
/// Subscribers whose receiver has been dropped are pruned on the next publish.
#[derive(Debug)]
pub struct EventBus<E> {
    subscribers: Vec<SyncSender<E>>,
    capacity: usize,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl<E> EventBus<E> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            capacity: capacity.max(1),
        }
    }
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<E> {
        let (tx, rx) = sync_channel(self.capacity);
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, event: E) {
        self.subscribers
            .retain(|tx| match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    trace!("event dropped for a full subscriber");
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ModeChanged { from: RoutingMode, to: RoutingMode },
    PointCommitted { index: usize, position: Point3 },
    PointRemoved { index: usize },
    PreviewUpdated { position: Point3, applied: bool },
    AlignmentChanged { alignment: AlignmentType },
    PathFinished { system_id: String },
    PathCancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    Created { id: String },
    Replaced { id: String },
    Removed { id: String },
    Imported { count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_sees_events() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.publish(RegistryEvent::Imported { count: 2 });
        assert_eq!(a.try_recv().unwrap(), RegistryEvent::Imported { count: 2 });
        assert_eq!(b.try_recv().unwrap(), RegistryEvent::Imported { count: 2 });
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut bus: EventBus<SessionEvent> = EventBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        bus.publish(SessionEvent::PathCancelled);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(keep.try_recv().unwrap(), SessionEvent::PathCancelled);
    }

    #[test]
    fn slow_subscriber_keeps_only_capacity_events() {
        let mut bus = EventBus::with_capacity(3);
        let slow = bus.subscribe();
        for count in 0..10 {
            bus.publish(RegistryEvent::Imported { count });
        }
        assert_eq!(bus.subscriber_count(), 1);
        let kept: Vec<_> = slow.try_iter().collect();
        assert_eq!(
            kept,
            (0..3)
                .map(|count| RegistryEvent::Imported { count })
                .collect::<Vec<_>>()
        );

        // drained receivers accept events again
        bus.publish(RegistryEvent::Imported { count: 99 });
        assert_eq!(slow.try_recv().unwrap(), RegistryEvent::Imported { count: 99 });
    }

    #[test]
    fn full_and_dropped_subscribers_are_told_apart() {
        let mut bus = EventBus::with_capacity(1);
        let full = bus.subscribe();
        drop(bus.subscribe());
        bus.publish(SessionEvent::PathCancelled);
        bus.publish(SessionEvent::PathCancelled);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(full.try_iter().count(), 1);
    }
}
