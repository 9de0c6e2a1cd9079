//! Trailing-edge debouncing on top of a [`Scheduler`]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{Scheduler, TimerId};

/// Delays a callback until `wait_ms` pass without another call
///
/// Each call cancels the pending timer, so at most one timer is ever
/// outstanding per debouncer and only the latest arguments are delivered.
/// Clones share the same pending timer.
pub struct Debouncer<A> {
    scheduler: Rc<dyn Scheduler>,
    wait_ms: f64,
    callback: Rc<RefCell<dyn FnMut(A)>>,
    pending: Rc<Cell<Option<TimerId>>>,
}

impl<A> Clone for Debouncer<A> {
    fn clone(&self) -> Self {
        Self {
            scheduler: self.scheduler.clone(),
            wait_ms: self.wait_ms,
            callback: self.callback.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<A: 'static> Debouncer<A> {
    pub fn new<F>(scheduler: Rc<dyn Scheduler>, wait_ms: f64, callback: F) -> Self
    where
        F: FnMut(A) + 'static,
    {
        Self {
            scheduler,
            wait_ms,
            callback: Rc::new(RefCell::new(callback)),
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// Schedule the callback with `args`, superseding any pending call
    pub fn call(&self, args: A) {
        self.cancel();

        let callback = self.callback.clone();
        let pending = self.pending.clone();
        let id = self.scheduler.set_timeout(
            self.wait_ms,
            Box::new(move || {
                pending.set(None);
                (&mut *callback.borrow_mut())(args);
            }),
        );
        self.pending.set(Some(id));
    }

    /// Drop the pending call, if any
    pub fn cancel(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.clear_timeout(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    /// Turn the debouncer into a plain function value
    pub fn into_fn(self) -> impl Fn(A) {
        move |args| self.call(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::ManualScheduler;

    #[test]
    fn test_burst_collapses_to_last_call() {
        let scheduler = Rc::new(ManualScheduler::new());
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        let debounced = Debouncer::new(scheduler.clone(), 300.0, move |n: u32| {
            sink.borrow_mut().push(n)
        });

        for n in 1..=5 {
            debounced.call(n);
            scheduler.advance(90.0);
        }
        assert!(calls.borrow().is_empty());
        assert_eq!(scheduler.pending_timers(), 1);

        scheduler.advance(300.0);
        assert_eq!(*calls.borrow(), vec![5]);
        assert!(!debounced.is_pending());
    }

    #[test]
    fn test_quiet_period_between_calls_fires_each() {
        let scheduler = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let debounced = Debouncer::new(scheduler.clone(), 300.0, move |_: ()| c.set(c.get() + 1));

        debounced.call(());
        scheduler.advance(400.0);
        debounced.call(());
        scheduler.advance(400.0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_cancel_drops_pending_call() {
        let scheduler = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let debounced = Debouncer::new(scheduler.clone(), 300.0, move |_: ()| c.set(c.get() + 1));

        debounced.call(());
        debounced.cancel();
        scheduler.advance(1000.0);
        assert_eq!(count.get(), 0);
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn test_function_form() {
        let scheduler = Rc::new(ManualScheduler::new());
        let last = Rc::new(RefCell::new(String::new()));
        let sink = last.clone();
        let search = Debouncer::new(scheduler.clone(), 300.0, move |q: String| *sink.borrow_mut() = q)
            .into_fn();

        search("ru".to_string());
        search("rust".to_string());
        scheduler.advance(300.0);
        assert_eq!(*last.borrow(), "rust");
    }
}
