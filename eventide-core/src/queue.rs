//! The single FIFO event queue shared by every pipeline stage.
//!
//! The driver owns the queue and lends it (`&mut EventQueue`) to each handler
//! it dispatches to. Producers running on other threads (a remote brokerage
//! adapter, a live feed) push through an [`EventSender`]; their events are
//! committed to the queue in arrival order, interleaved with local pushes at
//! the moment they are observed. Nothing is reordered and nothing is dropped.

use crate::domain::Event;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use thiserror::Error;

/// The receiving side of the queue was dropped before the event could be sent.
#[derive(Debug, Error)]
#[error("event queue closed; {} event was not delivered", .0.kind())]
pub struct QueueClosed(pub Event);

/// FIFO queue of pipeline events.
#[derive(Debug)]
pub struct EventQueue {
    pending: VecDeque<Event>,
    remote_tx: Sender<Event>,
    remote_rx: Receiver<Event>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (remote_tx, remote_rx) = mpsc::channel();
        Self {
            pending: VecDeque::new(),
            remote_tx,
            remote_rx,
        }
    }

    /// Append an event to the back of the queue.
    ///
    /// Remote events that arrived earlier are committed first so that commit
    /// order matches arrival order.
    pub fn push(&mut self, event: impl Into<Event>) {
        self.absorb_remote();
        self.pending.push_back(event.into());
    }

    /// Pop the oldest event, or `None` if nothing is queued locally or remotely.
    pub fn pop(&mut self) -> Option<Event> {
        self.absorb_remote();
        self.pending.pop_front()
    }

    /// Number of events committed to the queue (remote events not yet observed
    /// are not counted).
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// A cloneable handle for producers on other threads.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.remote_tx.clone(),
        }
    }

    /// Block until one remote event arrives or `timeout` elapses.
    ///
    /// Returns `true` if an event was committed to the queue.
    pub fn wait_remote(&mut self, timeout: Duration) -> bool {
        match self.remote_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.pending.push_back(event);
                self.absorb_remote();
                true
            }
            // The queue holds its own sender, so the channel cannot disconnect
            // while `self` is alive.
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn absorb_remote(&mut self) {
        while let Ok(event) = self.remote_rx.try_recv() {
            self.pending.push_back(event);
        }
    }
}

/// Producer handle that funnels events from another thread into an [`EventQueue`].
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<Event>,
}

impl EventSender {
    pub fn send(&self, event: impl Into<Event>) -> Result<(), QueueClosed> {
        self.tx.send(event.into()).map_err(|e| QueueClosed(e.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketEvent, OrderEvent, OrderSide};
    use chrono::NaiveDate;

    fn market(step: usize) -> MarketEvent {
        MarketEvent {
            step,
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn fifo_order() {
        let mut queue = EventQueue::new();
        queue.push(market(0));
        queue.push(OrderEvent::market("SPY", 1, OrderSide::Buy));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().kind(), "MARKET");
        assert_eq!(queue.pop().unwrap().kind(), "ORDER");
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn remote_events_commit_in_arrival_order() {
        let mut queue = EventQueue::new();
        let sender = queue.sender();
        sender.send(market(0)).unwrap();
        queue.push(market(1));
        sender.send(market(2)).unwrap();

        let steps: Vec<usize> = std::iter::from_fn(|| queue.pop())
            .map(|e| match e {
                Event::Market(m) => m.step,
                other => panic!("unexpected {other}"),
            })
            .collect();
        assert_eq!(steps, vec![0, 1, 2]);
    }

    #[test]
    fn wait_remote_from_other_thread() {
        let mut queue = EventQueue::new();
        let sender = queue.sender();
        let handle = std::thread::spawn(move || {
            sender.send(market(7)).unwrap();
        });
        assert!(queue.wait_remote(Duration::from_secs(5)));
        handle.join().unwrap();
        assert!(matches!(queue.pop(), Some(Event::Market(m)) if m.step == 7));
    }

    #[test]
    fn wait_remote_times_out() {
        let mut queue = EventQueue::new();
        assert!(!queue.wait_remote(Duration::from_millis(5)));
    }

    #[test]
    fn send_after_drop_returns_event() {
        let queue = EventQueue::new();
        let sender = queue.sender();
        drop(queue);
        let err = sender.send(market(3)).unwrap_err();
        assert_eq!(err.0.kind(), "MARKET");
    }
}
