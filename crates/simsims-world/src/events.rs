//! The place-event boundary between the simulation and its consumers.
//!
//! Every mutation of a [`Place`] is reported to an [`EventSink`] while the
//! place's lock is still held, so a sink sees the changes of one place in the
//! order they were applied. Sinks must therefore be quick and must never call
//! back into a place.
//!
//! [`Place`]: crate::place::Place

use std::sync::mpsc::{self, Receiver, Sender};

use simsims_types::PlaceEvent;

/// Receives place events as they happen.
///
/// Implementations are shared by every place and every transition thread,
/// hence the `Send + Sync` bound.
pub trait EventSink: Send + Sync {
    /// Called synchronously for each stored, retrieved, or discarded token.
    fn on_event(&self, event: &PlaceEvent);
}

/// A sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn on_event(&self, _event: &PlaceEvent) {}
}

/// Forwards events over a standard channel.
///
/// Sending never blocks. Once the receiver is dropped, events are discarded.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Sender<PlaceEvent>,
}

impl ChannelSink {
    /// Create a sink together with the receiving end of its channel.
    pub fn new() -> (Self, Receiver<PlaceEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn on_event(&self, event: &PlaceEvent) {
        // A closed receiver means nobody is listening any more.
        let _ = self.tx.send(*event);
    }
}

#[cfg(test)]
mod tests {
    use simsims_types::{PlaceChange, PlaceId, PlaceKind, ResourceState};

    use super::*;

    fn sample() -> PlaceEvent {
        PlaceEvent {
            place: PlaceId::new(PlaceKind::Barn, 0),
            change: PlaceChange::Added,
            resource: ResourceState::Food { quality: 0.25 },
            stored: 1,
        }
    }

    #[test]
    fn channel_sink_forwards_events() {
        let (sink, rx) = ChannelSink::new();
        sink.on_event(&sample());
        assert_eq!(rx.try_recv().ok(), Some(sample()));
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.on_event(&sample());
    }
}
