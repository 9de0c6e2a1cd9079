//! Toast notifications
//!
//! At most one toast is on the page at a time. A new toast evicts the
//! current one immediately, without its exit transition. Every deferred
//! step of a toast's lifecycle checks that the toast is still the current
//! one before touching the page, so a stale timer can never hide or remove
//! its successor.

use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use serde::Serialize;

use crate::config::NotificationSettings;
use crate::dom::{add_classes, create_with_classes, set_icon, Document, ElementRef};
use crate::events::ClickEvent;
use crate::timing::{Scheduler, TimerId};

pub const NOTIFICATION_SELECTOR: &str = ".notification";

const BASE_CLASSES: &str = "notification fixed top-20 right-4 z-50 p-4 rounded-lg shadow-lg \
                            transform translate-x-full transition-transform duration-300";
const OFF_SCREEN: &str = "translate-x-full";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn colour_classes(self) -> &'static str {
        match self {
            Severity::Success => "bg-green-500 text-white",
            Severity::Error => "bg-red-500 text-white",
            Severity::Warning => "bg-yellow-500 text-white",
            Severity::Info => "bg-blue-500 text-white",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Severity::Success => "fa-check-circle",
            Severity::Error => "fa-exclamation-circle",
            Severity::Warning => "fa-exclamation-triangle",
            Severity::Info => "fa-info-circle",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Case-insensitive; anything unrecognised is [`Severity::Info`]
impl FromStr for Severity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "success" => Severity::Success,
            "warning" => Severity::Warning,
            "error" => Severity::Error,
            _ => Severity::Info,
        })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A toast that has been shown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,

    /// Scheduler time at creation, in milliseconds
    pub created_at: f64,
}

struct Shown {
    notification: Notification,
    element: ElementRef,
    dismiss: ElementRef,
    timers: Vec<TimerId>,
}

#[derive(Default)]
struct CenterState {
    current: Option<Shown>,
    next_id: u64,
}

struct Inner {
    document: Rc<dyn Document>,
    scheduler: Rc<dyn Scheduler>,
    settings: NotificationSettings,
    state: RefCell<CenterState>,
}

/// Shows, times out and dismisses toasts; clones share the same toast slot
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Rc<Inner>,
}

impl NotificationCenter {
    pub fn new(
        document: Rc<dyn Document>,
        scheduler: Rc<dyn Scheduler>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                document,
                scheduler,
                settings,
                state: RefCell::new(CenterState::default()),
            }),
        }
    }

    /// Show `message`, replacing whatever toast is on screen
    ///
    /// Returns `None` only when the page has no body to attach to.
    pub fn notify(&self, message: &str, severity: Severity) -> Option<Notification> {
        let inner = &self.inner;
        inner.evict();

        let body = inner.document.body()?;
        let id = {
            let mut state = inner.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            id
        };
        let notification = Notification {
            id,
            message: message.to_string(),
            severity,
            created_at: inner.scheduler.now(),
        };

        let (element, dismiss) = inner.build(&notification)?;
        body.append_child(element.as_ref());

        let settings = &inner.settings;
        let entering = element.clone();
        let enter = inner.after(settings.enter_delay_ms, id, move |_| {
            entering.remove_class(OFF_SCREEN);
        });
        let leaving = element.clone();
        let leave = inner.after(settings.lifetime_ms, id, move |inner| {
            leaving.add_class(OFF_SCREEN);
            let exit = inner.after(inner.settings.exit_ms, id, move |inner| {
                inner.clear(Some(id));
            });
            inner.track(id, exit);
        });

        inner.state.borrow_mut().current = Some(Shown {
            notification: notification.clone(),
            element,
            dismiss,
            timers: vec![enter, leave],
        });
        tracing::debug!(id, %severity, "notification shown");
        Some(notification)
    }

    /// Remove the toast with `id` if it is still on screen
    pub fn dismiss(&self, id: u64) -> bool {
        self.inner.clear(Some(id))
    }

    /// Dismiss the current toast when the click landed on its close button
    pub fn on_click(&self, click: &ClickEvent) -> bool {
        let target = {
            let state = self.inner.state.borrow();
            state
                .current
                .as_ref()
                .filter(|shown| shown.dismiss.contains(click.target.as_ref()))
                .map(|shown| shown.notification.id)
        };
        match target {
            Some(id) => self.dismiss(id),
            None => false,
        }
    }

    /// The toast currently on screen
    pub fn visible(&self) -> Option<Notification> {
        self.inner
            .state
            .borrow()
            .current
            .as_ref()
            .map(|shown| shown.notification.clone())
    }

    pub fn element(&self) -> Option<ElementRef> {
        self.inner
            .state
            .borrow()
            .current
            .as_ref()
            .map(|shown| shown.element.clone())
    }
}

impl Inner {
    fn current_id(&self) -> Option<u64> {
        self.state
            .borrow()
            .current
            .as_ref()
            .map(|shown| shown.notification.id)
    }

    /// Run `step` after `delay_ms`, but only if toast `id` is still current
    fn after<F>(self: &Rc<Self>, delay_ms: f64, id: u64, step: F) -> TimerId
    where
        F: FnOnce(&Rc<Inner>) + 'static,
    {
        let weak: Weak<Inner> = Rc::downgrade(self);
        self.scheduler.set_timeout(
            delay_ms,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else { return };
                if inner.current_id() == Some(id) {
                    step(&inner);
                } else {
                    tracing::trace!(id, "stale notification timer ignored");
                }
            }),
        )
    }

    fn track(&self, id: u64, timer: TimerId) {
        let mut state = self.state.borrow_mut();
        if let Some(shown) = state.current.as_mut().filter(|s| s.notification.id == id) {
            shown.timers.push(timer);
        }
    }

    fn build(&self, notification: &Notification) -> Option<(ElementRef, ElementRef)> {
        let doc = self.document.as_ref();
        let container = create_with_classes(doc, "div", BASE_CLASSES)?;
        add_classes(container.as_ref(), notification.severity.colour_classes());

        let row = create_with_classes(doc, "div", "flex items-center space-x-3")?;
        let icon = create_with_classes(doc, "i", &format!("fas {}", notification.severity.icon()))?;
        let text = doc.create("span")?;
        text.set_text(&notification.message);
        let dismiss = create_with_classes(doc, "button", "ml-4 hover:opacity-75")?;
        dismiss.set_attribute("type", "button");
        dismiss.set_attribute("aria-label", "Dismiss notification");
        set_icon(doc, dismiss.as_ref(), "fa-times");

        row.append_child(icon.as_ref());
        row.append_child(text.as_ref());
        row.append_child(dismiss.as_ref());
        container.append_child(row.as_ref());
        Some((container, dismiss))
    }

    /// Drop the current toast and any stray toast markup
    fn evict(&self) {
        self.clear(self.current_id());
        for stray in self.document.query_all(NOTIFICATION_SELECTOR) {
            stray.remove();
        }
    }

    /// Remove toast `id`; `None` or a stale id does nothing
    fn clear(&self, id: Option<u64>) -> bool {
        let Some(id) = id else { return false };
        if self.current_id() != Some(id) {
            return false;
        }
        let Some(shown) = self.state.borrow_mut().current.take() else {
            return false;
        };

        for timer in &shown.timers {
            self.scheduler.clear_timeout(*timer);
        }
        shown.element.remove();
        tracing::debug!(id, "notification removed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use crate::timing::ManualScheduler;

    fn setup() -> (MemoryDocument, Rc<ManualScheduler>, NotificationCenter) {
        let doc = MemoryDocument::new();
        let scheduler = Rc::new(ManualScheduler::new());
        let center = NotificationCenter::new(
            Rc::new(doc.clone()),
            scheduler.clone(),
            NotificationSettings::default(),
        );
        (doc, scheduler, center)
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!("SUCCESS".parse::<Severity>(), Ok(Severity::Success));
        assert_eq!(" error ".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("Warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("shouting".parse::<Severity>(), Ok(Severity::Info));
    }

    #[test]
    fn test_newest_notification_wins() {
        let (doc, scheduler, center) = setup();
        center.notify("A", Severity::Info);
        scheduler.advance(50.0);
        center.notify("B", Severity::Success);

        let toasts = doc.query_all(NOTIFICATION_SELECTOR);
        assert_eq!(toasts.len(), 1);
        assert!(toasts[0].text().contains('B'));
        assert!(!toasts[0].text().contains('A'));
        assert_eq!(center.visible().map(|n| n.message), Some("B".to_string()));
    }

    #[test]
    fn test_markup_carries_severity() {
        let (_doc, _scheduler, center) = setup();
        center.notify("Saved", Severity::Success);

        let toast = center.element().unwrap();
        assert!(toast.has_class("bg-green-500"));
        assert!(toast.has_class("translate-x-full"));
        assert!(toast.query("i.fa-check-circle").is_some());
        assert_eq!(toast.query("span").unwrap().text(), "Saved");
        assert!(toast.query("button").unwrap().query("i.fa-times").is_some());
    }

    #[test]
    fn test_lifecycle_timings() {
        let (doc, scheduler, center) = setup();
        center.notify("Hello", Severity::Info);
        let toast = center.element().unwrap();

        scheduler.advance(99.0);
        assert!(toast.has_class("translate-x-full"));
        scheduler.advance(1.0);
        assert!(!toast.has_class("translate-x-full"));

        scheduler.advance(4900.0);
        assert!(toast.has_class("translate-x-full"));
        assert!(toast.is_connected());

        scheduler.advance(300.0);
        assert!(!toast.is_connected());
        assert!(center.visible().is_none());
        assert!(doc.query(NOTIFICATION_SELECTOR).is_none());
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn test_stale_timers_leave_successor_alone() {
        let (_doc, scheduler, center) = setup();
        center.notify("first", Severity::Info);
        scheduler.advance(4000.0);
        center.notify("second", Severity::Warning);
        let second = center.element().unwrap();

        scheduler.advance(1300.0);
        assert!(second.is_connected());
        assert!(!second.has_class("translate-x-full"));

        scheduler.advance(3700.0);
        assert!(second.has_class("translate-x-full"));
        scheduler.advance(300.0);
        assert!(!second.is_connected());
    }

    #[test]
    fn test_dismiss_button_removes_toast() {
        let (_doc, scheduler, center) = setup();
        center.notify("Bye", Severity::Error);
        let toast = center.element().unwrap();
        let icon = toast.query("button").unwrap().query("i").unwrap();

        let elsewhere = ClickEvent::new(toast.query("span").unwrap());
        assert!(!center.on_click(&elsewhere));

        assert!(center.on_click(&ClickEvent::new(icon)));
        assert!(!toast.is_connected());
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn test_dismiss_with_stale_id_is_ignored() {
        let (_doc, _scheduler, center) = setup();
        let old = center.notify("old", Severity::Info).unwrap();
        center.notify("new", Severity::Info);
        assert!(!center.dismiss(old.id));
        assert!(center.visible().is_some());
    }

    #[test]
    fn test_stray_markup_is_evicted() {
        let (doc, _scheduler, center) = setup();
        doc.spawn(None, "div.notification");
        center.notify("fresh", Severity::Info);
        assert_eq!(doc.query_all(NOTIFICATION_SELECTOR).len(), 1);
    }
}
