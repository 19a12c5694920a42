//! Edge-triggered change notification
//!
//! Subscribers watch a mask of one group. They are called only when a
//! frame-start composite differs from the previous one within that mask.

use std::fmt;

use crate::port::PortId;

/// A group's composite changed between two frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortChange {
    pub port: PortId,
    pub old: u32,
    pub new: u32,
}

impl PortChange {
    /// Bits that differ
    pub fn changed(&self) -> u32 {
        self.old ^ self.new
    }
}

/// Handle returned by [`ChangeNotifier::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback receiving the masked old and new values
pub type ChangeCallback = Box<dyn FnMut(PortChange)>;

struct Subscriber {
    id: SubscriptionId,
    port: PortId,
    mask: u32,
    callback: ChangeCallback,
}

/// Registry of change subscribers
#[derive(Default)]
pub struct ChangeNotifier {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `mask` of `port`
    pub fn subscribe(
        &mut self,
        port: PortId,
        mask: u32,
        callback: impl FnMut(PortChange) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            port,
            mask,
            callback: Box::new(callback),
        });
        id
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver one change to every subscriber whose mask it touches
    pub fn dispatch(&mut self, change: PortChange) {
        for subscriber in self
            .subscribers
            .iter_mut()
            .filter(|s| s.port == change.port && change.changed() & s.mask != 0)
        {
            (subscriber.callback)(PortChange {
                port: change.port,
                old: change.old & subscriber.mask,
                new: change.new & subscriber.mask,
            });
        }
    }
}
