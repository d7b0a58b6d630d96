//! Propagation channel between cell and layout adapters.
//!
//! The bus is a FIFO of visibility events with exact-match subscriptions.
//! Events are delivered in publication order, which preserves the order of
//! verdicts addressed to the same target. A [`Subscription`] is a disposable
//! handle: dropping it unsubscribes, and [`EventBus::close`] releases every
//! subscription and pending event at once.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crf_model::{CellId, LayoutId, LayoutUid};

/// A visibility announcement addressed to one cell instance or one layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisibilityEvent {
    Cell {
        cell_id: CellId,
        layout_uid: LayoutUid,
        shown: bool,
    },
    Layout {
        layout_id: LayoutId,
        shown: bool,
    },
}

impl VisibilityEvent {
    pub fn shown(&self) -> bool {
        match self {
            VisibilityEvent::Cell { shown, .. } | VisibilityEvent::Layout { shown, .. } => *shown,
        }
    }

    /// The filter of the subscribers this event is addressed to.
    pub fn address(&self) -> EventFilter {
        match self {
            VisibilityEvent::Cell {
                cell_id,
                layout_uid,
                ..
            } => EventFilter::Cell {
                cell_id: cell_id.clone(),
                layout_uid: layout_uid.clone(),
            },
            VisibilityEvent::Layout { layout_id, .. } => EventFilter::Layout {
                layout_id: layout_id.clone(),
            },
        }
    }
}

impl fmt::Display for VisibilityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.shown() { "show" } else { "hide" };
        match self {
            VisibilityEvent::Cell {
                cell_id,
                layout_uid,
                ..
            } => write!(f, "{verb} cell {cell_id} in {layout_uid}"),
            VisibilityEvent::Layout { layout_id, .. } => write!(f, "{verb} layout {layout_id}"),
        }
    }
}

/// Subscription filter. A cell subscription only receives events for its own
/// layout instance, so repeated layouts do not interfere with each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventFilter {
    Cell {
        cell_id: CellId,
        layout_uid: LayoutUid,
    },
    Layout {
        layout_id: LayoutId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// An event together with the subscriptions it must be delivered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub event: VisibilityEvent,
    /// Empty when nobody listens to the event's address any more.
    pub recipients: Vec<SubscriptionId>,
}

#[derive(Debug, Default)]
struct BusInner {
    next_id: u64,
    filters: BTreeMap<SubscriptionId, EventFilter>,
    by_address: HashMap<EventFilter, Vec<SubscriptionId>>,
    queue: VecDeque<VisibilityEvent>,
    closed: bool,
}

impl BusInner {
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(filter) = self.filters.remove(&id) else {
            return false;
        };
        if let Some(ids) = self.by_address.get_mut(&filter) {
            ids.retain(|candidate| *candidate != id);
            if ids.is_empty() {
                self.by_address.remove(&filter);
            }
        }
        true
    }
}

/// In-process event bus scoped to one open form view.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in events addressed to `filter`.
    ///
    /// On a closed bus the returned handle is inert.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        if !inner.closed {
            inner.filters.insert(id, filter.clone());
            inner.by_address.entry(filter).or_default().push(id);
        }
        Subscription {
            id,
            bus: Rc::downgrade(&self.inner),
        }
    }

    /// Queues an event. Returns `false` when the bus is closed and the event was dropped.
    pub fn publish(&self, event: VisibilityEvent) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.closed {
            return false;
        }
        inner.queue.push_back(event);
        true
    }

    /// Pops the oldest event and resolves its recipients.
    pub fn next_delivery(&self) -> Option<Delivery> {
        let mut inner = self.inner.borrow_mut();
        let event = inner.queue.pop_front()?;
        let recipients = inner
            .by_address
            .get(&event.address())
            .cloned()
            .unwrap_or_default();
        Some(Delivery { event, recipients })
    }

    /// Drops every pending event, keeping subscriptions.
    pub fn clear_pending(&self) -> usize {
        let mut inner = self.inner.borrow_mut();
        let dropped = inner.queue.len();
        inner.queue.clear();
        dropped
    }

    /// Releases every subscription and pending event; later publications are dropped.
    pub fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.closed = true;
        inner.queue.clear();
        inner.filters.clear();
        inner.by_address.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().filters.len()
    }
}

/// Disposable subscription handle. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    bus: Weak<RefCell<BusInner>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the bus still delivers to this subscription.
    pub fn is_active(&self) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|inner| inner.borrow().filters.contains_key(&self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade()
            && let Ok(mut inner) = inner.try_borrow_mut()
        {
            inner.unsubscribe(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_event(cell: &str, uid: &str, shown: bool) -> VisibilityEvent {
        VisibilityEvent::Cell {
            cell_id: CellId::new(cell).unwrap(),
            layout_uid: LayoutUid::new(uid).unwrap(),
            shown,
        }
    }

    fn cell_filter(cell: &str, uid: &str) -> EventFilter {
        EventFilter::Cell {
            cell_id: CellId::new(cell).unwrap(),
            layout_uid: LayoutUid::new(uid).unwrap(),
        }
    }

    #[test]
    fn events_reach_only_matching_subscribers() {
        let bus = EventBus::new();
        let first = bus.subscribe(cell_filter("C1", "L#1"));
        let _second = bus.subscribe(cell_filter("C1", "L#2"));

        bus.publish(cell_event("C1", "L#1", false));

        let delivery = bus.next_delivery().unwrap();
        assert_eq!(delivery.recipients, vec![first.id()]);
        assert!(bus.next_delivery().is_none());
    }

    #[test]
    fn deliveries_follow_publication_order() {
        let bus = EventBus::new();
        let _sub = bus.subscribe(cell_filter("C1", "L"));
        bus.publish(cell_event("C1", "L", false));
        bus.publish(cell_event("C1", "L", true));

        let shown: Vec<bool> = std::iter::from_fn(|| bus.next_delivery())
            .map(|delivery| delivery.event.shown())
            .collect();
        assert_eq!(shown, vec![false, true]);
    }

    #[test]
    fn dropping_a_subscription_unsubscribes() {
        let bus = EventBus::new();
        let sub = bus.subscribe(cell_filter("C1", "L"));
        assert!(sub.is_active());
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);

        bus.publish(cell_event("C1", "L", false));
        assert!(bus.next_delivery().unwrap().recipients.is_empty());
    }

    #[test]
    fn closed_bus_drops_everything() {
        let bus = EventBus::new();
        let sub = bus.subscribe(cell_filter("C1", "L"));
        bus.publish(cell_event("C1", "L", false));

        bus.close();

        assert!(!sub.is_active());
        assert_eq!(bus.pending(), 0);
        assert!(!bus.publish(cell_event("C1", "L", true)));
        assert!(bus.next_delivery().is_none());
        let late = bus.subscribe(cell_filter("C1", "L"));
        assert!(!late.is_active());
    }

    #[test]
    fn subscription_outliving_the_bus_is_harmless() {
        let sub = {
            let bus = EventBus::new();
            bus.subscribe(EventFilter::Layout {
                layout_id: LayoutId::new("L").unwrap(),
            })
        };
        assert!(!sub.is_active());
        drop(sub);
    }
}
