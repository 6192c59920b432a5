//! Serialized vendor event queue

use bazaar_core::{ActorId, BuyLine, Gold, SellLine, Trader};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tracing::debug;

/// Something an actor (or the clock) asks of a vendor
#[derive(Debug, Clone, PartialEq)]
pub enum VendorEvent {
    Buy { trader: Trader, lines: Vec<BuyLine> },
    Sell { trader: Trader, lines: Vec<SellLine> },
    QuoteSell { trader: Trader, lines: Vec<SellLine> },
    Listing,
    RequestTraining { trader: Trader, skill: String },
    Deposit { actor: ActorId, amount: Gold },
    /// Periodic tick: restock if due, drop stale shelf lots and sessions
    Restock,
    /// Rebuild the catalog from the shop definition
    Reload,
}

impl VendorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            VendorEvent::Buy { .. } => "buy",
            VendorEvent::Sell { .. } => "sell",
            VendorEvent::QuoteSell { .. } => "quote_sell",
            VendorEvent::Listing => "listing",
            VendorEvent::RequestTraining { .. } => "request_training",
            VendorEvent::Deposit { .. } => "deposit",
            VendorEvent::Restock => "restock",
            VendorEvent::Reload => "reload",
        }
    }

    /// The actor the event is on behalf of, if any
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            VendorEvent::Buy { trader, .. }
            | VendorEvent::Sell { trader, .. }
            | VendorEvent::QuoteSell { trader, .. }
            | VendorEvent::RequestTraining { trader, .. } => Some(trader.id),
            VendorEvent::Deposit { actor, .. } => Some(*actor),
            VendorEvent::Listing | VendorEvent::Restock | VendorEvent::Reload => None,
        }
    }
}

struct Deferred {
    due: DateTime<Utc>,
    seq: u64,
    event: VendorEvent,
}

/// FIFO queue of vendor events.
///
/// Events are handled strictly in arrival order. Deferred events wait
/// outside the queue and join its tail once due, in due order.
#[derive(Default)]
pub struct EventQueue {
    queue: VecDeque<VendorEvent>,
    deferred: Vec<Deferred>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: VendorEvent) {
        self.queue.push_back(event);
    }

    /// Hold an event back until `due`
    pub fn defer(&mut self, event: VendorEvent, due: DateTime<Utc>) {
        debug!("Deferring {} until {}", event.kind(), due);
        self.next_seq += 1;
        self.deferred.push(Deferred {
            due,
            seq: self.next_seq,
            event,
        });
    }

    /// Move every deferred event that is due onto the tail of the queue
    pub fn release_due(&mut self, now: DateTime<Utc>) -> usize {
        let (mut due, waiting): (Vec<Deferred>, Vec<Deferred>) =
            self.deferred.drain(..).partition(|d| d.due <= now);
        self.deferred = waiting;

        due.sort_by_key(|d| (d.due, d.seq));
        let released = due.len();
        self.queue.extend(due.into_iter().map(|d| d.event));
        released
    }

    pub fn next_event(&mut self) -> Option<VendorEvent> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn deposit(actor: u64) -> VendorEvent {
        VendorEvent::Deposit {
            actor: ActorId(actor),
            amount: Gold(10),
        }
    }

    #[test]
    fn test_events_come_out_in_arrival_order() {
        let mut queue = EventQueue::new();
        queue.push(deposit(1));
        queue.push(VendorEvent::Restock);
        queue.push(deposit(2));

        assert_eq!(queue.next_event(), Some(deposit(1)));
        assert_eq!(queue.next_event(), Some(VendorEvent::Restock));
        assert_eq!(queue.next_event(), Some(deposit(2)));
        assert_eq!(queue.next_event(), None);
    }

    #[test]
    fn test_deferred_events_join_the_tail_when_due() {
        let now = Utc::now();
        let mut queue = EventQueue::new();
        queue.defer(deposit(3), now + Duration::seconds(20));
        queue.defer(deposit(2), now + Duration::seconds(10));
        queue.push(deposit(1));

        assert_eq!(queue.release_due(now), 0);
        assert_eq!(queue.deferred_len(), 2);

        assert_eq!(queue.release_due(now + Duration::seconds(30)), 2);
        assert_eq!(queue.next_event(), Some(deposit(1)));
        assert_eq!(queue.next_event(), Some(deposit(2)));
        assert_eq!(queue.next_event(), Some(deposit(3)));
        assert_eq!(queue.deferred_len(), 0);
    }

    #[test]
    fn test_event_actor() {
        let sell = VendorEvent::Sell {
            trader: Trader::new(ActorId(7)),
            lines: Vec::new(),
        };
        assert_eq!(sell.actor(), Some(ActorId(7)));
        assert_eq!(deposit(4).actor(), Some(ActorId(4)));
        assert_eq!(VendorEvent::Restock.actor(), None);
    }
}
