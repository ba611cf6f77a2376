//! Event channel built on crossbeam-channel.
//!
//! Senders are cloned into every parallel worker, so they must be cheap to
//! clone and safe to share across threads.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sending half handed to a pipeline via `with_events`.
#[derive(Clone, Debug)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event.
    ///
    /// A dropped receiver is not an error: progress reporting is optional
    /// and the run carries on without it.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receiving half held by the UI or test harness.
#[derive(Debug)]
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Iterate until every sender has been dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Take every event currently queued without blocking
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Factory for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create a channel for one or more runs.
    ///
    /// Unbounded: a run emits at most `2 * workers + 2` events, and workers
    /// never wait on a slow receiver.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WorkerEvent;
    use std::thread;

    #[test]
    fn events_cross_worker_threads() {
        let (sender, receiver) = EventChannel::new();

        thread::scope(|scope| {
            for chunk in 0..3 {
                let sender = sender.clone();
                scope.spawn(move || {
                    sender.send(Event::Worker(WorkerEvent::Started { chunk, len: 10 }));
                });
            }
        });

        let mut chunks: Vec<usize> = receiver
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                Event::Worker(WorkerEvent::Started { chunk, .. }) => Some(chunk),
                _ => None,
            })
            .collect();
        chunks.sort_unstable();

        assert_eq!(chunks, vec![0, 1, 2]);
    }

    #[test]
    fn iter_ends_when_senders_drop() {
        let (sender, receiver) = EventChannel::new();

        sender.send(Event::Worker(WorkerEvent::Started { chunk: 0, len: 1 }));
        sender.send(Event::Worker(WorkerEvent::Started { chunk: 1, len: 1 }));
        drop(sender);

        assert_eq!(receiver.iter().count(), 2);
        assert!(receiver.drain().is_empty());
    }

    #[test]
    fn send_after_receiver_drops_is_ignored() {
        let (sender, receiver) = EventChannel::new();
        drop(receiver);

        sender.send(Event::Worker(WorkerEvent::Started { chunk: 0, len: 1 }));
    }
}
