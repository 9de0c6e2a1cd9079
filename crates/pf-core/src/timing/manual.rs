//! Virtual-time scheduler for tests and the simulator

use std::cell::RefCell;

use super::{FrameId, FrameTask, RepeatingTask, Scheduler, Task, TimerId};

/// Interval between simulated display refreshes (about 60 Hz)
pub const FRAME_MS: f64 = 16.0;

enum TimerTask {
    Once(Option<Task>),
    Repeat { period: f64, task: Option<RepeatingTask> },
}

struct PendingTimer {
    id: TimerId,
    due: f64,
    task: TimerTask,
}

#[derive(Default)]
struct State {
    now: f64,
    next_id: u64,
    timers: Vec<PendingTimer>,
    frames: Vec<(FrameId, FrameTask)>,
    next_frame_at: f64,
}

impl State {
    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Earliest due timer; ties resolve in scheduling order
    fn earliest_timer(&self) -> Option<(usize, f64)> {
        self.timers
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (idx, timer)| match best {
                Some((_, due)) if due <= timer.due => best,
                _ => Some((idx, timer.due)),
            })
    }
}

enum Step {
    Timer(usize, f64),
    Frame(f64),
}

/// Scheduler whose clock only moves when [`advance`](ManualScheduler::advance) is called
///
/// Frames are delivered every [`FRAME_MS`] while any are requested; timers
/// and frames due at the same instant run timers first.
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<State>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `ms`, running everything that falls due
    pub fn advance(&self, ms: f64) {
        let target = self.now() + ms.max(0.0);
        while let Some(step) = self.next_step(target) {
            match step {
                Step::Timer(idx, due) => self.run_timer(idx, due),
                Step::Frame(at) => self.run_frames(at),
            }
        }
        self.state.borrow_mut().now = target;
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    fn next_step(&self, target: f64) -> Option<Step> {
        let state = self.state.borrow();
        let timer = state.earliest_timer().filter(|(_, due)| *due <= target);
        let frame = (!state.frames.is_empty() && state.next_frame_at <= target)
            .then_some(state.next_frame_at);

        match (timer, frame) {
            (Some((idx, due)), Some(at)) if due <= at => Some(Step::Timer(idx, due)),
            (_, Some(at)) => Some(Step::Frame(at)),
            (Some((idx, due)), None) => Some(Step::Timer(idx, due)),
            (None, None) => None,
        }
    }

    fn run_timer(&self, idx: usize, due: f64) {
        let (id, once, repeating) = {
            let mut state = self.state.borrow_mut();
            state.now = state.now.max(due);
            let id = state.timers[idx].id;
            match &mut state.timers[idx].task {
                TimerTask::Repeat { period, task } => {
                    let period = *period;
                    let task = task.take();
                    state.timers[idx].due += period;
                    (id, None, task)
                }
                TimerTask::Once(_) => match state.timers.remove(idx).task {
                    TimerTask::Once(task) => (id, task, None),
                    TimerTask::Repeat { .. } => (id, None, None),
                },
            }
        };

        if let Some(task) = once {
            task();
        }

        if let Some(mut task) = repeating {
            task();
            // Put the task back unless the interval was cleared while running
            let mut state = self.state.borrow_mut();
            if let Some(timer) = state.timers.iter_mut().find(|t| t.id == id) {
                if let TimerTask::Repeat { task: slot, .. } = &mut timer.task {
                    *slot = Some(task);
                }
            }
        }
    }

    fn run_frames(&self, at: f64) {
        let frames = {
            let mut state = self.state.borrow_mut();
            state.now = state.now.max(at);
            state.next_frame_at = at + FRAME_MS;
            std::mem::take(&mut state.frames)
        };
        for (_, task) in frames {
            task(at);
        }
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> f64 {
        self.state.borrow().now
    }

    fn set_timeout(&self, delay_ms: f64, task: Task) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.allocate());
        let due = state.now + delay_ms.max(0.0);
        state.timers.push(PendingTimer {
            id,
            due,
            task: TimerTask::Once(Some(task)),
        });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.state.borrow_mut().timers.retain(|t| t.id != id);
    }

    fn set_interval(&self, period_ms: f64, task: RepeatingTask) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.allocate());
        // A zero period would never let the clock advance
        let period = period_ms.max(1.0);
        let due = state.now + period;
        state.timers.push(PendingTimer {
            id,
            due,
            task: TimerTask::Repeat {
                period,
                task: Some(task),
            },
        });
        id
    }

    fn clear_interval(&self, id: TimerId) {
        self.clear_timeout(id);
    }

    fn request_frame(&self, task: FrameTask) -> FrameId {
        let mut state = self.state.borrow_mut();
        let id = FrameId(state.allocate());
        if state.frames.is_empty() && state.next_frame_at <= state.now {
            state.next_frame_at = state.now + FRAME_MS;
        }
        state.frames.push((id, task));
        id
    }

    fn cancel_frame(&self, id: FrameId) {
        self.state.borrow_mut().frames.retain(|(frame, _)| *frame != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_timeouts_fire_in_due_order() {
        let scheduler = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(300.0, "b"), (100.0, "a"), (300.0, "c")] {
            let log = log.clone();
            scheduler.set_timeout(delay, Box::new(move || log.borrow_mut().push(label)));
        }

        scheduler.advance(99.0);
        assert!(log.borrow().is_empty());
        scheduler.advance(301.0);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn test_cleared_timeout_never_runs() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        let id = scheduler.set_timeout(50.0, Box::new(move || f.set(true)));
        scheduler.clear_timeout(id);
        scheduler.advance(100.0);
        assert!(!fired.get());
    }

    #[test]
    fn test_interval_repeats_until_cleared() {
        let scheduler = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let id = scheduler.set_interval(100.0, Box::new(move || c.set(c.get() + 1)));

        scheduler.advance(350.0);
        assert_eq!(count.get(), 3);
        scheduler.clear_interval(id);
        scheduler.advance(500.0);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_task_scheduled_from_task_sees_advanced_clock() {
        let scheduler = Rc::new(ManualScheduler::new());
        let fired_at = Rc::new(Cell::new(0.0));

        let inner = scheduler.clone();
        let at = fired_at.clone();
        scheduler.set_timeout(
            100.0,
            Box::new(move || {
                let clock = inner.clone();
                inner.set_timeout(50.0, Box::new(move || at.set(clock.now())));
            }),
        );

        scheduler.advance(1000.0);
        assert_eq!(fired_at.get(), 150.0);
        assert_eq!(scheduler.now(), 1000.0);
    }

    #[test]
    fn test_frames_tick_every_frame_interval() {
        let scheduler = Rc::new(ManualScheduler::new());
        let stamps = Rc::new(RefCell::new(Vec::new()));

        fn tick(scheduler: Rc<ManualScheduler>, stamps: Rc<RefCell<Vec<f64>>>, remaining: u32) {
            let next = scheduler.clone();
            scheduler.request_frame(Box::new(move |ts| {
                stamps.borrow_mut().push(ts);
                if remaining > 1 {
                    tick(next, stamps, remaining - 1);
                }
            }));
        }

        tick(scheduler.clone(), stamps.clone(), 3);
        scheduler.advance(100.0);
        assert_eq!(*stamps.borrow(), vec![16.0, 32.0, 48.0]);
        assert_eq!(scheduler.pending_frames(), 0);
    }
}
