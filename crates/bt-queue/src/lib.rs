//! The single FIFO event queue that wires every component together.
//!
//! No priority, no deduplication, no persistence: events are dispatched in
//! strict insertion order, and anything enqueued while draining is appended
//! to the tail, so it is processed within the same drain cycle.

use std::collections::VecDeque;

use bt_types::Event;

#[derive(Debug, Default)]
pub struct EventQueue {
    inner: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.inner.push_back(event);
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.inner.pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_types::{now_truncated, MarketEvent, TraceId};

    fn market(symbol: &str) -> Event {
        Event::Market(MarketEvent {
            trace_id: TraceId::new(),
            timestamp: now_truncated(),
            symbol: symbol.into(),
            close: 1.0,
        })
    }

    #[test]
    fn preserves_fifo_insertion_order_across_variants() {
        let mut q = EventQueue::new();
        q.push(market("A"));
        q.push(market("B"));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop().unwrap().symbol(), "A");
        assert_eq!(q.pop().unwrap().symbol(), "B");
        assert!(q.pop().is_none());
    }

    #[test]
    fn enqueue_during_drain_lands_at_tail() {
        let mut q = EventQueue::new();
        q.push(market("A"));
        let first = q.pop().unwrap();
        q.push(market("B"));
        assert_eq!(first.symbol(), "A");
        assert_eq!(q.pop().unwrap().symbol(), "B");
    }
}
