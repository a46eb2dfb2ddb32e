//! Virtual-clock timer queue for deterministic tests

use super::{TimerId, Timers};
use log::{trace, warn};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

/// Upper bound on callbacks run by a single `run_until_idle`, so a timer
/// that keeps rescheduling itself cannot hang the caller.
pub const MAX_IDLE_ITERATIONS: usize = 100_000;

type Callback = Box<dyn FnOnce()>;

/// A single-threaded timer queue driven by an explicit clock.
///
/// Nothing runs until the owner calls [`tick`](Self::tick) or
/// [`run_until_idle`](Self::run_until_idle). Timers due at the same instant
/// run in scheduling order.
pub struct EventLoop {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<BTreeMap<(Duration, TimerId), Callback>>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        EventLoop {
            now: Cell::new(Duration::ZERO),
            next_id: Cell::new(0),
            queue: RefCell::new(BTreeMap::new()),
        }
    }

    /// Number of timers still queued
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// When the earliest queued timer is due
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.borrow().keys().next().map(|(due, _)| *due)
    }

    /// Advance the clock by `delta`, running every timer that falls due on
    /// the way. Returns how many callbacks ran.
    pub fn tick(&self, delta: Duration) -> usize {
        let deadline = self.now.get() + delta;
        let mut ran = 0;
        while let Some((due, callback)) = self.pop_due(Some(deadline)) {
            self.now.set(due);
            callback();
            ran += 1;
        }
        self.now.set(deadline);
        ran
    }

    /// Jump the clock from timer to timer until the queue is empty.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some((due, callback)) = self.pop_due(None) {
            self.now.set(due);
            callback();
            ran += 1;
            if ran >= MAX_IDLE_ITERATIONS {
                warn!("run_until_idle stopped after {} callbacks", ran);
                break;
            }
        }
        ran
    }

    fn pop_due(&self, limit: Option<Duration>) -> Option<(Duration, Callback)> {
        let mut queue = self.queue.borrow_mut();
        let key = *queue.keys().next()?;
        if limit.is_some_and(|limit| key.0 > limit) {
            return None;
        }
        queue.remove(&key).map(|callback| (key.0, callback))
    }
}

impl Timers for EventLoop {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        let due = self.now.get() + delay;
        trace!("timer {:?} due at {:?}", id, due);
        self.queue.borrow_mut().insert((due, id), callback);
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.queue.borrow_mut().retain(|(_, queued), _| *queued != id);
    }

    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn timers_run_in_due_order() {
        let l = EventLoop::new();
        let out = Rc::new(RefCell::new(Vec::new()));
        for (name, delay) in [("b", 20), ("a", 10), ("c", 20)] {
            let out = out.clone();
            l.set_timeout(ms(delay), Box::new(move || out.borrow_mut().push(name)));
        }
        assert_eq!(l.run_until_idle(), 3);
        assert_eq!(*out.borrow(), vec!["a", "b", "c"]);
        assert_eq!(l.now(), ms(20));
    }

    #[test]
    fn tick_stops_at_deadline() {
        let l = EventLoop::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        l.set_timeout(ms(50), Box::new(move || h.set(h.get() + 1)));
        assert_eq!(l.tick(ms(49)), 0);
        assert_eq!(l.now(), ms(49));
        assert_eq!(l.tick(ms(1)), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn cleared_timers_never_fire() {
        let l = EventLoop::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = l.set_timeout(ms(5), Box::new(move || h.set(h.get() + 1)));
        l.clear_timeout(id);
        assert_eq!(l.pending(), 0);
        l.run_until_idle();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn callbacks_may_schedule_more_timers() {
        let l = Rc::new(EventLoop::new());
        let out = Rc::new(RefCell::new(Vec::new()));
        let (l2, o2) = (l.clone(), out.clone());
        l.set_timeout(
            ms(10),
            Box::new(move || {
                o2.borrow_mut().push(l2.now());
                let o3 = o2.clone();
                let l3 = l2.clone();
                l2.set_timeout(ms(5), Box::new(move || o3.borrow_mut().push(l3.now())));
            }),
        );
        l.run_until_idle();
        assert_eq!(*out.borrow(), vec![ms(10), ms(15)]);
    }
}
