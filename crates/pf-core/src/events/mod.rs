//! Page-wide event bus
//!
//! Browser events (scroll, click, input, submit, visibility) are translated
//! into [`PageEvent`]s and published here; controllers subscribe per
//! [`EventKind`]. Tests publish synthetic events directly.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use ahash::AHashMap;

use crate::dom::{ElementRef, ObserverId};

/// Discriminant used to route events to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Click,
    Input,
    Submit,
    Visibility,
}

/// An event observed on the page
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// Window scrolled to a new vertical offset
    Scroll { offset: f64 },

    Click(ClickEvent),

    /// A text control changed
    Input { target: ElementRef, value: String },

    /// A form was submitted; the browser default is always suppressed
    Submit { form: ElementRef },

    Visibility(VisibilityEntry),
}

impl PageEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PageEvent::Scroll { .. } => EventKind::Scroll,
            PageEvent::Click(_) => EventKind::Click,
            PageEvent::Input { .. } => EventKind::Input,
            PageEvent::Submit { .. } => EventKind::Submit,
            PageEvent::Visibility(_) => EventKind::Visibility,
        }
    }
}

/// A click; clones share the default-prevented flag
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub target: ElementRef,
    prevented: Rc<Cell<bool>>,
}

impl ClickEvent {
    pub fn new(target: ElementRef) -> Self {
        Self {
            target,
            prevented: Rc::new(Cell::new(false)),
        }
    }

    pub fn prevent_default(&self) {
        self.prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.prevented.get()
    }
}

/// One visibility report from an observer
#[derive(Debug, Clone)]
pub struct VisibilityEntry {
    pub observer: ObserverId,
    pub target: ElementRef,

    /// Visible fraction of the target, 0.0 to 1.0
    pub ratio: f64,

    pub intersecting: bool,
}

/// Handler trait for event handlers
pub trait EventHandler {
    fn handle(&mut self, event: &PageEvent);
}

/// Token returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type HandlerList = Vec<(SubscriptionId, Box<dyn EventHandler>)>;

/// Page-wide event bus
///
/// Events published while a dispatch is running are queued and delivered
/// after it, so a handler is never re-entered.
pub struct EventBus {
    handlers: RefCell<AHashMap<EventKind, HandlerList>>,
    queue: RefCell<VecDeque<PageEvent>>,
    cancelled: RefCell<Vec<SubscriptionId>>,
    dispatching: Cell<bool>,
    next_id: Cell<u64>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(AHashMap::new()),
            queue: RefCell::new(VecDeque::new()),
            cancelled: RefCell::new(Vec::new()),
            dispatching: Cell::new(false),
            next_id: Cell::new(0),
        }
    }

    /// Subscribe to events of one kind
    pub fn subscribe(&self, kind: EventKind, handler: Box<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().entry(kind).or_default().push((id, handler));
        id
    }

    /// Subscribe a closure to events of one kind
    pub fn on<F>(&self, kind: EventKind, f: F) -> SubscriptionId
    where
        F: FnMut(&PageEvent) + 'static,
    {
        self.subscribe(kind, handler_from_fn(f))
    }

    /// Remove a subscription; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut handlers = self.handlers.borrow_mut();
        for list in handlers.values_mut() {
            list.retain(|(sub, _)| *sub != id);
        }
        if self.dispatching.get() {
            self.cancelled.borrow_mut().push(id);
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.borrow().get(&kind).map(Vec::len).unwrap_or(0)
    }

    /// Publish an event
    pub fn publish(&self, event: PageEvent) {
        self.queue.borrow_mut().push_back(event);
        if self.dispatching.get() {
            return;
        }

        self.dispatching.set(true);
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else { break };
            self.dispatch(&event);
        }
        self.dispatching.set(false);
        self.cancelled.borrow_mut().clear();
    }

    fn dispatch(&self, event: &PageEvent) {
        let kind = event.kind();
        // Handlers run outside the borrow so they may subscribe or unsubscribe
        let mut running = self.handlers.borrow_mut().remove(&kind).unwrap_or_default();
        for (_, handler) in running.iter_mut() {
            handler.handle(event);
        }

        let mut handlers = self.handlers.borrow_mut();
        let added = handlers.remove(&kind).unwrap_or_default();
        let cancelled = self.cancelled.borrow();
        running.retain(|(id, _)| !cancelled.contains(id));
        running.extend(added);
        handlers.insert(kind, running);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&PageEvent),
{
    fn handle(&mut self, event: &PageEvent) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&PageEvent) + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, MemoryDocument};

    #[test]
    fn test_routes_by_kind() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        bus.on(EventKind::Scroll, move |event| {
            if let PageEvent::Scroll { offset } = event {
                sink.borrow_mut().push(*offset);
            }
        });

        bus.publish(PageEvent::Scroll { offset: 120.0 });
        let doc = MemoryDocument::new();
        bus.publish(PageEvent::Click(ClickEvent::new(doc.body().unwrap())));

        assert_eq!(*seen.borrow(), vec![120.0]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let id = bus.on(EventKind::Scroll, move |_| c.set(c.get() + 1));

        bus.publish(PageEvent::Scroll { offset: 1.0 });
        bus.unsubscribe(id);
        bus.publish(PageEvent::Scroll { offset: 2.0 });

        assert_eq!(count.get(), 1);
        assert_eq!(bus.subscriber_count(EventKind::Scroll), 0);
    }

    #[test]
    fn test_nested_publish_is_queued() {
        let bus = Rc::new(EventBus::new());
        let order = Rc::new(RefCell::new(Vec::new()));

        let inner_bus = Rc::downgrade(&bus);
        let log = order.clone();
        bus.on(EventKind::Scroll, move |event| {
            if let PageEvent::Scroll { offset } = event {
                log.borrow_mut().push(format!("start {offset}"));
                if *offset < 1.0 {
                    if let Some(bus) = inner_bus.upgrade() {
                        bus.publish(PageEvent::Scroll { offset: 5.0 });
                    }
                }
                log.borrow_mut().push(format!("end {offset}"));
            }
        });

        bus.publish(PageEvent::Scroll { offset: 0.0 });
        assert_eq!(*order.borrow(), vec!["start 0", "end 0", "start 5", "end 5"]);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let bus = Rc::new(EventBus::new());
        let count = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&bus);
        let c = count.clone();
        let slot = own_id.clone();
        let id = bus.on(EventKind::Scroll, move |_| {
            c.set(c.get() + 1);
            if let (Some(bus), Some(id)) = (weak.upgrade(), slot.get()) {
                bus.unsubscribe(id);
            }
        });
        own_id.set(Some(id));

        bus.publish(PageEvent::Scroll { offset: 1.0 });
        bus.publish(PageEvent::Scroll { offset: 2.0 });
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_handler_may_subscribe_during_dispatch() {
        let bus = Rc::new(EventBus::new());
        let late = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&bus);
        let l = late.clone();
        bus.on(EventKind::Scroll, move |_| {
            if let Some(bus) = weak.upgrade() {
                if bus.subscriber_count(EventKind::Click) == 0 {
                    let l = l.clone();
                    bus.on(EventKind::Click, move |_| l.set(l.get() + 1));
                }
            }
        });

        bus.publish(PageEvent::Scroll { offset: 1.0 });
        assert_eq!(bus.subscriber_count(EventKind::Click), 1);
        assert_eq!(bus.subscriber_count(EventKind::Scroll), 1);

        let doc = MemoryDocument::new();
        bus.publish(PageEvent::Click(ClickEvent::new(doc.body().unwrap())));
        assert_eq!(late.get(), 1);
    }

    #[test]
    fn test_click_flag_shared_between_clones() {
        let doc = MemoryDocument::new();
        let click = ClickEvent::new(doc.body().unwrap());
        let copy = click.clone();
        copy.prevent_default();
        assert!(click.default_prevented());
    }
}
