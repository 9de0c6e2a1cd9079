//! Frame-driven text animations
//!
//! [`NumberAnimator`] ramps an integer shown in an element from one value to
//! another. Each element has at most one running animation: starting a new
//! one on the same element cancels the pending frame of the previous run, so
//! two animations never race on one node.

mod typing;

pub use typing::{TypingEffect, HERO_TEXT_SELECTOR};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::dom::{Element, ElementRef};
use crate::timing::{FrameId, Scheduler};

/// Linear ramp from `start` to `end`, floored to an integer
///
/// Progress is clamped to `[0, 1]`, so the result always lies between the
/// two endpoints and equals `end` once `elapsed >= duration`.
pub fn interpolate(start: i64, end: i64, elapsed: f64, duration: f64) -> i64 {
    let progress = if duration > 0.0 {
        (elapsed / duration).clamp(0.0, 1.0)
    } else {
        1.0
    };
    if progress >= 1.0 {
        return end;
    }
    if progress <= 0.0 {
        return start;
    }
    let (from, to) = (start as f64, end as f64);
    (from + (to - from) * progress).floor() as i64
}

/// Identifies one animation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle(u64);

#[derive(Clone)]
struct Run {
    handle: AnimationHandle,
    element: ElementRef,
    start: i64,
    end: i64,
    duration: f64,
    started_at: f64,
}

struct Active {
    handle: AnimationHandle,
    element: ElementRef,
    frame: Option<FrameId>,
}

struct Inner {
    scheduler: Rc<dyn Scheduler>,
    active: RefCell<Vec<Active>>,
    next_handle: Cell<u64>,
}

/// Animates integers shown in elements; clones share the running set
#[derive(Clone)]
pub struct NumberAnimator {
    inner: Rc<Inner>,
}

impl NumberAnimator {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(Inner {
                scheduler,
                active: RefCell::new(Vec::new()),
                next_handle: Cell::new(0),
            }),
        }
    }

    /// Show `start..=end` in `element` over `duration_ms`, one value per frame
    ///
    /// Replaces any animation already running on the same element.
    pub fn animate(&self, element: ElementRef, start: i64, end: i64, duration_ms: f64) -> AnimationHandle {
        self.cancel(element.as_ref());

        let handle = AnimationHandle(self.inner.next_handle.get());
        self.inner.next_handle.set(handle.0 + 1);
        self.inner.active.borrow_mut().push(Active {
            handle,
            element: element.clone(),
            frame: None,
        });

        let run = Run {
            handle,
            element,
            start,
            end,
            duration: duration_ms,
            started_at: self.inner.scheduler.now(),
        };
        self.inner.schedule(run);
        handle
    }

    /// Stop the animation running on `element`; returns whether one was
    pub fn cancel(&self, element: &dyn Element) -> bool {
        let removed = {
            let mut active = self.inner.active.borrow_mut();
            active
                .iter()
                .position(|a| a.element.is_same(element))
                .map(|idx| active.remove(idx))
        };
        match removed {
            Some(active) => {
                if let Some(frame) = active.frame {
                    self.inner.scheduler.cancel_frame(frame);
                }
                tracing::trace!(handle = active.handle.0, "number animation replaced");
                true
            }
            None => false,
        }
    }

    pub fn is_animating(&self, element: &dyn Element) -> bool {
        self.inner
            .active
            .borrow()
            .iter()
            .any(|a| a.element.is_same(element))
    }

    pub fn active_count(&self) -> usize {
        self.inner.active.borrow().len()
    }
}

impl Inner {
    fn is_current(&self, handle: AnimationHandle) -> bool {
        self.active.borrow().iter().any(|a| a.handle == handle)
    }

    fn schedule(self: &Rc<Self>, run: Run) {
        let handle = run.handle;
        let weak = Rc::downgrade(self);
        let frame = self.scheduler.request_frame(Box::new(move |now| {
            if let Some(inner) = weak.upgrade() {
                inner.tick(run, now);
            }
        }));

        if let Some(active) = self.active.borrow_mut().iter_mut().find(|a| a.handle == handle) {
            active.frame = Some(frame);
        }
    }

    fn tick(self: &Rc<Self>, run: Run, now: f64) {
        if !self.is_current(run.handle) {
            return;
        }

        let elapsed = now - run.started_at;
        let value = interpolate(run.start, run.end, elapsed, run.duration);
        run.element.set_text(&value.to_string());

        if elapsed >= run.duration {
            self.active.borrow_mut().retain(|a| a.handle != run.handle);
        } else {
            self.schedule(run);
        }
    }
}
