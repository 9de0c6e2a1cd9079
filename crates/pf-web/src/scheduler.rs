//! Window timers and animation frames

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;
use pf_core::timing::{FrameId, FrameTask, RepeatingTask, Scheduler, Task, TimerId};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Live interval callbacks keyed by browser handle
type IntervalMap = AHashMap<i32, Closure<dyn FnMut()>>;

/// Handles whose callback is running or has finished
///
/// A closure must not be dropped while it executes, so finished handles are
/// only recorded here and released on the next sweep.
#[derive(Default)]
struct Firing {
    running: RefCell<Vec<i32>>,
    fired: RefCell<Vec<i32>>,
}

impl Firing {
    fn run(&self, handle: i32, f: impl FnOnce()) {
        self.running.borrow_mut().push(handle);
        f();
        self.running.borrow_mut().retain(|h| *h != handle);
        self.fired.borrow_mut().push(handle);
    }

    fn is_running(&self, handle: i32) -> bool {
        self.running.borrow().contains(&handle)
    }
}

/// Single-shot callbacks kept alive until they fire or are cancelled
struct OneShots<F: ?Sized> {
    live: RefCell<AHashMap<i32, Closure<F>>>,
    firing: Rc<Firing>,
}

impl<F: ?Sized> OneShots<F> {
    fn new() -> Self {
        Self {
            live: RefCell::new(AHashMap::new()),
            firing: Rc::new(Firing::default()),
        }
    }

    fn sweep(&self) {
        let fired: Vec<i32> = self.firing.fired.borrow_mut().drain(..).collect();
        let mut live = self.live.borrow_mut();
        for handle in fired {
            live.remove(&handle);
        }
    }

    fn keep(&self, handle: i32, closure: Closure<F>) {
        self.live.borrow_mut().insert(handle, closure);
    }

    /// Drop a pending callback; one cancelling itself is released by the sweep
    fn cancel(&self, handle: i32) {
        if !self.firing.is_running(handle) {
            self.live.borrow_mut().remove(&handle);
        }
        self.sweep();
    }

    fn len(&self) -> usize {
        self.sweep();
        self.live.borrow().len()
    }
}

/// [`Scheduler`] over `setTimeout`, `setInterval` and
/// `requestAnimationFrame`
pub struct BrowserScheduler {
    window: web_sys::Window,
    performance: Option<web_sys::Performance>,
    timeouts: OneShots<dyn FnMut()>,
    frames: OneShots<dyn FnMut(f64)>,
    intervals: RefCell<IntervalMap>,
}

impl BrowserScheduler {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let performance = window.performance();
        Ok(Self {
            window,
            performance,
            timeouts: OneShots::new(),
            frames: OneShots::new(),
            intervals: RefCell::new(IntervalMap::new()),
        })
    }

    /// Callbacks still held on the Rust side
    pub fn live_callbacks(&self) -> usize {
        self.timeouts.len() + self.frames.len() + self.intervals.borrow().len()
    }
}

fn millis(ms: f64) -> i32 {
    ms.max(0.0).min(i32::MAX as f64) as i32
}

impl Scheduler for BrowserScheduler {
    fn now(&self) -> f64 {
        self.performance
            .as_ref()
            .map(|performance| performance.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn set_timeout(&self, delay_ms: f64, task: Task) -> TimerId {
        self.timeouts.sweep();
        let handle = Rc::new(Cell::new(0));
        let own = handle.clone();
        let firing = self.timeouts.firing.clone();
        let mut task = Some(task);
        let callback = Closure::wrap(Box::new(move || {
            if let Some(task) = task.take() {
                firing.run(own.get(), task);
            }
        }) as Box<dyn FnMut()>);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis(delay_ms),
            ) {
            Ok(id) => {
                handle.set(id);
                self.timeouts.keep(id, callback);
                TimerId(id as u64)
            }
            Err(err) => {
                tracing::warn!(?err, "setTimeout failed");
                TimerId(0)
            }
        }
    }

    fn clear_timeout(&self, id: TimerId) {
        let handle = id.0 as i32;
        self.window.clear_timeout_with_handle(handle);
        self.timeouts.cancel(handle);
    }

    fn set_interval(&self, period_ms: f64, task: RepeatingTask) -> TimerId {
        let callback = Closure::wrap(task);
        match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis(period_ms),
            ) {
            Ok(handle) => {
                self.intervals.borrow_mut().insert(handle, callback);
                TimerId(handle as u64)
            }
            Err(err) => {
                tracing::warn!(?err, "setInterval failed");
                TimerId(0)
            }
        }
    }

    fn clear_interval(&self, id: TimerId) {
        let handle = id.0 as i32;
        self.window.clear_interval_with_handle(handle);
        self.intervals.borrow_mut().remove(&handle);
    }

    fn request_frame(&self, task: FrameTask) -> FrameId {
        self.frames.sweep();
        let handle = Rc::new(Cell::new(0));
        let own = handle.clone();
        let firing = self.frames.firing.clone();
        let mut task = Some(task);
        let callback = Closure::wrap(Box::new(move |timestamp: f64| {
            if let Some(task) = task.take() {
                firing.run(own.get(), || task(timestamp));
            }
        }) as Box<dyn FnMut(f64)>);
        match self.window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            Ok(id) => {
                handle.set(id);
                self.frames.keep(id, callback);
                FrameId(id as u64)
            }
            Err(err) => {
                tracing::warn!(?err, "requestAnimationFrame failed");
                FrameId(0)
            }
        }
    }

    fn cancel_frame(&self, id: FrameId) {
        let handle = id.0 as i32;
        let _ = self.window.cancel_animation_frame(handle);
        self.frames.cancel(handle);
    }
}
