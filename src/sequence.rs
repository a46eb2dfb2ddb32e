//! Sequencer engine: ordered, cancelable chains of asynchronous steps.
//!
//! A [`Sequence`] owns a FIFO list of steps. Each step receives an
//! [`Advance`] continuation and the sequence only moves on once that
//! continuation is called, so a step may complete synchronously or from a
//! timer or event listener much later. Cancellation is cooperative: it stops
//! the cursor from moving but never interrupts work already in flight.
//!
//! ```
//! use naboo::{EventKind, Sequence};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let seq = Sequence::new();
//! for i in 0..3 {
//!     let log = log.clone();
//!     seq.step(move |advance| {
//!         log.borrow_mut().push(i);
//!         advance.advance();
//!     });
//! }
//! seq.on(EventKind::End, |_| {});
//! seq.start();
//! assert_eq!(*log.borrow(), vec![0, 1, 2]);
//! assert!(seq.is_ended());
//! ```

use crate::{Error, Result};
use log::{debug, trace, warn};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// A deferred unit of work. It must eventually call its continuation.
pub type Step = Box<dyn FnOnce(Advance)>;

/// Subscriber callback for sequence events
pub type Listener = Rc<dyn Fn(&SequenceEvent)>;

/// The closed set of events a sequence emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    End,
}

/// Event payloads delivered to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceEvent {
    /// Fired synchronously by `start`, before the first step runs
    Start { steps: usize },
    /// Fired once the cursor moves past the last step
    End { steps: usize },
}

impl SequenceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SequenceEvent::Start { .. } => EventKind::Start,
            SequenceEvent::End { .. } => EventKind::End,
        }
    }
}

/// Handle returned by [`Sequence::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Listeners {
    start: Vec<(ListenerId, Listener)>,
    end: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl Listeners {
    fn slot(&mut self, kind: EventKind) -> &mut Vec<(ListenerId, Listener)> {
        match kind {
            EventKind::Start => &mut self.start,
            EventKind::End => &mut self.end,
        }
    }

    fn add(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.slot(kind).push((id, listener));
        id
    }

    fn remove(&mut self, kind: EventKind, id: Option<ListenerId>) {
        let slot = self.slot(kind);
        match id {
            Some(id) => slot.retain(|(existing, _)| *existing != id),
            None => slot.clear(),
        }
    }

    fn clear(&mut self) {
        self.start.clear();
        self.end.clear();
    }

    // Listeners are copied out so callbacks may subscribe or unsubscribe
    // while the event is being delivered.
    fn snapshot(&mut self, kind: EventKind) -> Vec<Listener> {
        self.slot(kind).iter().map(|(_, l)| Rc::clone(l)).collect()
    }

    fn count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Start => self.start.len(),
            EventKind::End => self.end.len(),
        }
    }
}

struct Inner {
    steps: Vec<Option<Step>>,
    // Number of continuations accepted so far. 0 means "before the first
    // step"; step `i` is running while `position == i + 1`.
    position: usize,
    // Last position the driver loop acted on
    dispatched: usize,
    started: bool,
    canceled: bool,
    ended: bool,
    driving: bool,
    listeners: Listeners,
    waiters: Vec<oneshot::Sender<Result<()>>>,
}

enum Action {
    Run(Step, usize),
    End(usize, Vec<oneshot::Sender<Result<()>>>),
    Skip,
}

/// An ordered, cancelable chain of asynchronous steps.
///
/// `Sequence` is a cheap reference-counted handle; clones refer to the same
/// chain. It is single-threaded by construction (`!Send`).
#[derive(Clone)]
pub struct Sequence {
    inner: Rc<RefCell<Inner>>,
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Sequence")
            .field("steps", &inner.steps.len())
            .field("position", &inner.position)
            .field("started", &inner.started)
            .field("canceled", &inner.canceled)
            .field("ended", &inner.ended)
            .finish()
    }
}

impl Sequence {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                steps: Vec::new(),
                position: 0,
                dispatched: 0,
                started: false,
                canceled: false,
                ended: false,
                driving: false,
                listeners: Listeners::default(),
                waiters: Vec::new(),
            })),
        }
    }

    /// Append a step. The step is only queued; it runs once every step
    /// before it has called its continuation.
    pub fn step<F>(&self, step: F) -> &Self
    where
        F: FnOnce(Advance) + 'static,
    {
        self.inner.borrow_mut().steps.push(Some(Box::new(step)));
        self
    }

    /// Number of steps appended so far
    pub fn len(&self) -> usize {
        self.inner.borrow().steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many continuations the sequence has accepted (0 before start)
    pub fn position(&self) -> usize {
        self.inner.borrow().position
    }

    pub fn is_started(&self) -> bool {
        self.inner.borrow().started
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.borrow().canceled
    }

    pub fn is_ended(&self) -> bool {
        self.inner.borrow().ended
    }

    /// Start executing. Fires `Start` synchronously, then runs the first
    /// step. Listeners must be attached before calling this: steps that
    /// complete synchronously may reach `End` before `start` returns.
    pub fn start(&self) -> Finished {
        let finished = self.finished();
        let steps = {
            let mut inner = self.inner.borrow_mut();
            if inner.started {
                warn!("sequence already started; ignoring second start");
                return finished;
            }
            inner.started = true;
            inner.steps.len()
        };
        debug!("starting sequence with {} step(s)", steps);
        self.trigger(&SequenceEvent::Start { steps });
        self.advance_from(0);
        finished
    }

    /// Register `on_end` as an `End` listener, then [`start`](Self::start).
    pub fn start_with<F>(&self, on_end: F) -> Finished
    where
        F: Fn(&SequenceEvent) + 'static,
    {
        self.on(EventKind::End, on_end);
        self.start()
    }

    /// A handle that resolves when the sequence ends or is canceled.
    pub fn finished(&self) -> Finished {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.inner.borrow_mut();
        if inner.ended {
            let _ = tx.send(Ok(()));
        } else if inner.canceled {
            let _ = tx.send(Err(Error::Canceled));
        } else {
            inner.waiters.push(tx);
        }
        Finished { rx }
    }

    /// Move the cursor forward from wherever it currently is.
    ///
    /// Steps should prefer the [`Advance`] they were handed, which is bound
    /// to their own position and cannot skip a successor.
    pub fn advance(&self) {
        let at = self.inner.borrow().position;
        self.advance_from(at);
    }

    /// Stop the sequence from progressing. A step already running is not
    /// interrupted and its pending timers or listeners still fire.
    pub fn cancel(&self) {
        let waiters = {
            let mut inner = self.inner.borrow_mut();
            if inner.canceled || inner.ended {
                return;
            }
            inner.canceled = true;
            debug!("sequence canceled at position {}", inner.position);
            std::mem::take(&mut inner.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(Err(Error::Canceled));
        }
    }

    /// Subscribe to an event. Duplicate subscriptions are kept and each
    /// fires.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&SequenceEvent) + 'static,
    {
        self.inner.borrow_mut().listeners.add(kind, Rc::new(listener))
    }

    /// Unsubscribe one listener, or every listener of `kind` when `id` is
    /// `None`. Unknown ids are ignored.
    pub fn off(&self, kind: EventKind, id: Option<ListenerId>) -> &Self {
        self.inner.borrow_mut().listeners.remove(kind, id);
        self
    }

    /// Drop every listener of every kind
    pub fn off_all(&self) -> &Self {
        self.inner.borrow_mut().listeners.clear();
        self
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.borrow().listeners.count(kind)
    }

    /// Deliver `event` to its listeners in registration order.
    ///
    /// A panicking listener aborts delivery to the remaining ones.
    pub fn trigger(&self, event: &SequenceEvent) {
        let listeners = self.inner.borrow_mut().listeners.snapshot(event.kind());
        trace!("trigger {:?} to {} listener(s)", event, listeners.len());
        for listener in listeners {
            listener(event);
        }
    }

    fn advance_from(&self, at: usize) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.canceled {
                trace!("continuation after cancel ignored");
                return;
            }
            if inner.position != at {
                debug!(
                    "stale continuation for position {} ignored (now at {})",
                    at, inner.position
                );
                return;
            }
            inner.position += 1;
        }
        self.drive();
    }

    // Runs steps until one of them suspends. Continuations called while a
    // step is still on the stack only bump `position`; this loop picks the
    // next step up once that step returns.
    fn drive(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.driving {
                return;
            }
            inner.driving = true;
        }
        loop {
            let action = {
                let mut inner = self.inner.borrow_mut();
                if inner.canceled || inner.ended || inner.dispatched == inner.position {
                    inner.driving = false;
                    break;
                }
                inner.dispatched = inner.position;
                let index = inner.position - 1;
                if index >= inner.steps.len() {
                    inner.ended = true;
                    let waiters = std::mem::take(&mut inner.waiters);
                    Action::End(inner.steps.len(), waiters)
                } else {
                    match inner.steps[index].take() {
                        Some(step) => Action::Run(step, inner.position),
                        None => Action::Skip,
                    }
                }
            };

            match action {
                Action::Run(step, at) => {
                    trace!("running step {}", at);
                    step(Advance {
                        seq: self.clone(),
                        at,
                    });
                }
                Action::End(steps, waiters) => {
                    debug!("sequence ended after {} step(s)", steps);
                    self.trigger(&SequenceEvent::End { steps });
                    for waiter in waiters {
                        let _ = waiter.send(Ok(()));
                    }
                }
                Action::Skip => {}
            }
        }
    }
}

/// Continuation handed to each step.
///
/// It is bound to the step that received it: only the first call moves the
/// sequence, later or stale calls are ignored.
#[derive(Clone)]
pub struct Advance {
    seq: Sequence,
    at: usize,
}

impl Advance {
    /// Signal that the owning step is complete
    pub fn advance(&self) {
        self.seq.advance_from(self.at);
    }

    /// The sequence this continuation belongs to
    pub fn sequence(&self) -> &Sequence {
        &self.seq
    }
}

impl fmt::Debug for Advance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advance").field("at", &self.at).finish()
    }
}

/// Completion handle returned by [`Sequence::start`].
///
/// Resolves to `Ok(())` when `End` fires, `Err(Error::Canceled)` on cancel
/// and `Err(Error::Abandoned)` if the sequence is dropped while stalled.
#[must_use = "dropping the handle does not stop the sequence"]
#[derive(Debug)]
pub struct Finished {
    rx: oneshot::Receiver<Result<()>>,
}

impl Future for Finished {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(Error::Abandoned)))
    }
}
