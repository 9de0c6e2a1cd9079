//! Periodically refreshed GitHub counters
//!
//! Elements marked with `data-github-stat` show an integer. On every refresh
//! a [`StatsProvider`] proposes a new value per element and changed values
//! are animated with the shared [`NumberAnimator`].

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::animation::NumberAnimator;
use crate::dom::Document;
use crate::error::Result;
use crate::timing::{Scheduler, TimerId};

pub const STAT_SELECTOR: &str = "[data-github-stat]";
const STAT_ATTRIBUTE: &str = "data-github-stat";

/// Source of fresh counter values
pub trait StatsProvider {
    /// Next value for `stat` (e.g. `"stars"`) given what the page shows now
    fn next_value(&self, stat: &str, current: i64) -> Result<i64>;
}

/// Drifts every counter by -1, 0 or +1, never below zero
pub struct RandomWalkStats {
    random: Box<dyn Fn() -> f64>,
}

impl RandomWalkStats {
    /// `random` yields uniform values in `[0, 1)`
    pub fn new(random: impl Fn() -> f64 + 'static) -> Self {
        Self {
            random: Box::new(random),
        }
    }
}

impl StatsProvider for RandomWalkStats {
    fn next_value(&self, _stat: &str, current: i64) -> Result<i64> {
        let change = ((self.random)() * 3.0).floor().clamp(0.0, 2.0) as i64 - 1;
        Ok(current.saturating_add(change).max(0))
    }
}

/// Leading integer of `text`, `0` when there is none
///
/// Mirrors how counters are read from the page: surrounding whitespace and
/// trailing junk (`"42 stars"`, `"1,234"`) are tolerated.
pub fn parse_leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    match rest[..digits_end].parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => 0,
    }
}

/// Refreshes every counter on the page
pub struct StatsRefresher {
    document: Rc<dyn Document>,
    scheduler: Rc<dyn Scheduler>,
    provider: Rc<dyn StatsProvider>,
    animator: NumberAnimator,
    duration_ms: f64,
    interval: Cell<Option<TimerId>>,
}

impl StatsRefresher {
    pub fn new(
        document: Rc<dyn Document>,
        scheduler: Rc<dyn Scheduler>,
        provider: Rc<dyn StatsProvider>,
        animator: NumberAnimator,
        duration_ms: f64,
    ) -> Rc<Self> {
        Rc::new(Self {
            document,
            scheduler,
            provider,
            animator,
            duration_ms,
            interval: Cell::new(None),
        })
    }

    /// Ask the provider for new values; returns how many counters changed
    pub fn refresh(&self) -> usize {
        let mut changed = 0;
        for element in self.document.query_all(STAT_SELECTOR) {
            let stat = element.attribute(STAT_ATTRIBUTE).unwrap_or_default();
            let current = parse_leading_int(&element.text());
            match self.provider.next_value(&stat, current) {
                Ok(next) if next != current => {
                    self.animator.animate(element, current, next, self.duration_ms);
                    changed += 1;
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(%stat, error = %err, "stats provider failed"),
            }
        }
        tracing::debug!(changed, "github stats refreshed");
        changed
    }

    /// Refresh now and then every `period_ms`
    pub fn start(self: &Rc<Self>, period_ms: f64) {
        self.stop();
        self.refresh();

        let weak: Weak<Self> = Rc::downgrade(self);
        let id = self.scheduler.set_interval(
            period_ms,
            Box::new(move || {
                if let Some(refresher) = weak.upgrade() {
                    refresher.refresh();
                }
            }),
        );
        self.interval.set(Some(id));
    }

    pub fn stop(&self) {
        if let Some(id) = self.interval.take() {
            self.scheduler.clear_interval(id);
        }
    }

    pub fn is_running(&self) -> bool {
        self.interval.get().is_some()
    }
}
