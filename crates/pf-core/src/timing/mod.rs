//! Timers, display-refresh frames and debouncing
//!
//! Every deferral in the page layer (debounce windows, toast lifetimes,
//! simulated network latency, counter animation frames) goes through the
//! [`Scheduler`] trait.

mod debounce;
mod manual;

pub use debounce::Debouncer;
pub use manual::{ManualScheduler, FRAME_MS};

/// Handle for a pending timeout or interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Handle for a pending display-refresh callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

pub type Task = Box<dyn FnOnce()>;
pub type RepeatingTask = Box<dyn FnMut()>;

/// Receives the frame timestamp in milliseconds
pub type FrameTask = Box<dyn FnOnce(f64)>;

/// Single-threaded timer source
pub trait Scheduler {
    /// Monotonic time in milliseconds
    fn now(&self) -> f64;

    fn set_timeout(&self, delay_ms: f64, task: Task) -> TimerId;

    /// Cancel a timeout; already-fired or unknown ids are ignored
    fn clear_timeout(&self, id: TimerId);

    fn set_interval(&self, period_ms: f64, task: RepeatingTask) -> TimerId;
    fn clear_interval(&self, id: TimerId);

    /// Run `task` before the next repaint
    fn request_frame(&self, task: FrameTask) -> FrameId;
    fn cancel_frame(&self, id: FrameId);
}
