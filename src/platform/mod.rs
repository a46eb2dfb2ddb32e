//! Platform surface: style targets, timers and capability probing
//!
//! The transition driver only touches the platform through the traits in
//! this module. The `headless` feature provides a deterministic in-memory
//! implementation (virtual clock, elements that dispatch transition-end
//! events) used by tests, benchmarks and the `naboo` binary.

use std::rc::Rc;
use std::time::Duration;

#[cfg(feature = "headless")]
pub mod capabilities;
#[cfg(feature = "headless")]
pub mod element;
#[cfg(feature = "headless")]
pub mod event_loop;

#[cfg(feature = "headless")]
pub use capabilities::{HeadlessProbe, TransitionSupport};
#[cfg(feature = "headless")]
pub use element::{Document, Element, StyleRecord};
#[cfg(feature = "headless")]
pub use event_loop::EventLoop;

/// Identity of a style target, used to reject bubbled events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// Handle for a registered event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(pub u64);

/// Handle for a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// A transition-completion event as delivered to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEndEvent {
    /// Element whose transition finished
    pub target: ElementId,
    /// Element the listener is attached to (differs while bubbling)
    pub current_target: ElementId,
    /// Dashed CSS property name
    pub property_name: String,
    /// Elapsed time in seconds
    pub elapsed_time: f64,
}

pub type EventListener = Rc<dyn Fn(&TransitionEndEvent)>;

/// The element surface the transition driver needs.
///
/// An empty string from `style` means "not set"; setting an empty string
/// removes the declaration.
pub trait StyleTarget {
    fn element_id(&self) -> ElementId;
    fn style(&self, property: &str) -> String;
    fn set_style(&self, property: &str, value: &str);
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);
    fn add_event_listener(&self, event: &str, listener: EventListener) -> ListenerKey;
    fn remove_event_listener(&self, event: &str, key: ListenerKey);
    /// Force a synchronous style read so later changes start a fresh transition
    fn flush_layout(&self);
}

/// Shared handle to a style target
pub type Target = Rc<dyn StyleTarget>;

/// One-shot timers on the platform's event loop
pub trait Timers {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;
    fn clear_timeout(&self, id: TimerId);
    /// Current time on the platform clock
    fn now(&self) -> Duration;
}

/// Answers whether the style surface exposes a (camelCase) property name,
/// e.g. `transitionProperty` or `WebkitTransitionProperty`.
pub trait StyleProbe {
    fn supports_style(&self, property: &str) -> bool;
}

/// Composite surface handed to driver construction
pub trait Platform {
    fn style_probe(&self) -> &dyn StyleProbe;
    fn timers(&self) -> Rc<dyn Timers>;
}

/// Options for [`HeadlessPlatform`]
#[cfg(feature = "headless")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessOptions {
    /// Which style surface the fake engine exposes
    pub support: TransitionSupport,
    /// Whether elements dispatch transition-end events on their own
    pub native_events: bool,
}

#[cfg(feature = "headless")]
impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            support: TransitionSupport::Standard,
            native_events: true,
        }
    }
}

/// Deterministic platform: virtual clock plus in-memory document.
#[cfg(feature = "headless")]
pub struct HeadlessPlatform {
    event_loop: Rc<EventLoop>,
    probe: HeadlessProbe,
    document: Document,
}

#[cfg(feature = "headless")]
impl HeadlessPlatform {
    pub fn new(options: HeadlessOptions) -> Self {
        let event_loop = Rc::new(EventLoop::new());
        let probe = HeadlessProbe::new(options.support);
        let profile = crate::transition::VendorProfile::detect(&probe);
        let document = Document::new(Rc::clone(&event_loop), profile, options.native_events);
        Self {
            event_loop,
            probe,
            document,
        }
    }

    pub fn event_loop(&self) -> &Rc<EventLoop> {
        &self.event_loop
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn create_element(&self, tag: &str) -> Rc<Element> {
        self.document.create_element(tag)
    }
}

#[cfg(feature = "headless")]
impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new(HeadlessOptions::default())
    }
}

#[cfg(feature = "headless")]
impl Platform for HeadlessPlatform {
    fn style_probe(&self) -> &dyn StyleProbe {
        &self.probe
    }

    fn timers(&self) -> Rc<dyn Timers> {
        self.event_loop.clone()
    }
}
