//! In-memory elements for the headless platform
//!
//! Elements keep inline styles and attributes in ordered maps, record every
//! style mutation and layout flush in a journal, and (when native events are
//! enabled) dispatch a transition-end event once a declared transition on a
//! changed property has run its course on the virtual clock. Elapsed times
//! are computed on a whole-millisecond grid and include the delay.

use super::{
    ElementId, EventListener, EventLoop, ListenerKey, StyleTarget, Timers, TransitionEndEvent,
};
use crate::transition::VendorProfile;
use log::trace;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// One entry of an element's style journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleRecord {
    Set { property: String, value: String },
    Flush,
}

/// Factory for elements sharing one clock and vendor profile
pub struct Document {
    event_loop: Rc<EventLoop>,
    profile: Rc<VendorProfile>,
    native_events: bool,
    next_id: Cell<u64>,
}

impl Document {
    pub fn new(event_loop: Rc<EventLoop>, profile: VendorProfile, native_events: bool) -> Self {
        Document {
            event_loop,
            profile: Rc::new(profile),
            native_events,
            next_id: Cell::new(0),
        }
    }

    pub fn profile(&self) -> &VendorProfile {
        &self.profile
    }

    pub fn create_element(&self, tag: &str) -> Rc<Element> {
        let id = ElementId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        Rc::new_cyclic(|this| Element {
            id,
            tag: tag.to_string(),
            this: this.clone(),
            parent: RefCell::new(Weak::new()),
            event_loop: Rc::clone(&self.event_loop),
            profile: Rc::clone(&self.profile),
            native_events: self.native_events,
            state: RefCell::new(ElementState::default()),
        })
    }
}

#[derive(Default)]
struct ElementState {
    styles: BTreeMap<String, String>,
    attributes: BTreeMap<String, String>,
    listeners: Vec<(ListenerKey, String, EventListener)>,
    next_key: u64,
    journal: Vec<StyleRecord>,
    flushes: usize,
}

pub struct Element {
    id: ElementId,
    tag: String,
    this: Weak<Element>,
    parent: RefCell<Weak<Element>>,
    event_loop: Rc<EventLoop>,
    profile: Rc<VendorProfile>,
    native_events: bool,
    state: RefCell<ElementState>,
}

impl Element {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn append_child(&self, child: &Rc<Element>) {
        *child.parent.borrow_mut() = self.this.clone();
    }

    pub fn parent(&self) -> Option<Rc<Element>> {
        self.parent.borrow().upgrade()
    }

    /// Every style write and layout flush, oldest first
    pub fn journal(&self) -> Vec<StyleRecord> {
        self.state.borrow().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state.borrow_mut().journal.clear();
    }

    pub fn flush_count(&self) -> usize {
        self.state.borrow().flushes
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|(_, name, _)| name == event)
            .count()
    }

    /// Dispatch the vendor transition-end event from this element
    pub fn dispatch_transition_end(&self, property: &str, elapsed_time: f64) {
        let event_name = self.profile.end_event().to_string();
        self.dispatch_event(&event_name, property, elapsed_time);
    }

    /// Dispatch `event_name` at this element and bubble it to its ancestors
    pub fn dispatch_event(&self, event_name: &str, property: &str, elapsed_time: f64) {
        let mut event = TransitionEndEvent {
            target: self.id,
            current_target: self.id,
            property_name: property.to_string(),
            elapsed_time,
        };
        let mut node = self.this.upgrade();
        while let Some(el) = node {
            event.current_target = el.id;
            let listeners: Vec<EventListener> = el
                .state
                .borrow()
                .listeners
                .iter()
                .filter(|(_, name, _)| name == event_name)
                .map(|(_, _, l)| Rc::clone(l))
                .collect();
            for listener in listeners {
                listener(&event);
            }
            node = el.parent();
        }
    }

    fn schedule_transition_end(&self, property: &str) {
        if property.contains("transition-") {
            return;
        }
        let Some((duration_ms, delay_ms)) = self.transition_timing(property) else {
            return;
        };
        if duration_ms == 0 {
            return;
        }
        let total = duration_ms + delay_ms;
        let elapsed = total as f64 / 1000.0;
        let this = self.this.clone();
        let property = property.to_string();
        trace!("{:?}: '{}' transition ends in {}ms", self.id, property, total);
        self.event_loop.set_timeout(
            Duration::from_millis(total),
            Box::new(move || {
                if let Some(el) = this.upgrade() {
                    el.dispatch_transition_end(&property, elapsed);
                }
            }),
        );
    }

    // Later entries in the property list win, like the cascade does.
    fn transition_timing(&self, property: &str) -> Option<(u64, u64)> {
        let state = self.state.borrow();
        let list = |name: &str| -> Vec<String> {
            state
                .styles
                .get(name)
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default()
        };
        let names = list(self.profile.transition_property());
        let index = names.iter().rposition(|n| n == property || n == "all")?;
        let durations = list(self.profile.transition_duration());
        let delays = list(self.profile.transition_delay());
        let duration = pick(&durations, index).and_then(parse_time_ms).unwrap_or(0);
        let delay = pick(&delays, index).and_then(parse_time_ms).unwrap_or(0);
        Some((duration, delay))
    }
}

fn pick(list: &[String], index: usize) -> Option<&str> {
    if list.is_empty() {
        None
    } else {
        Some(list[index % list.len()].as_str())
    }
}

/// Parse a CSS time (`0.4s`, `150ms`) into whole milliseconds
pub fn parse_time_ms(value: &str) -> Option<u64> {
    let value = value.trim();
    let ms = if let Some(n) = value.strip_suffix("ms") {
        n.trim().parse::<f64>().ok()?
    } else if let Some(n) = value.strip_suffix('s') {
        n.trim().parse::<f64>().ok()? * 1000.0
    } else {
        return None;
    };
    if !ms.is_finite() {
        return None;
    }
    Some(ms.max(0.0).round() as u64)
}

impl StyleTarget for Element {
    fn element_id(&self) -> ElementId {
        self.id
    }

    fn style(&self, property: &str) -> String {
        self.state
            .borrow()
            .styles
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    fn set_style(&self, property: &str, value: &str) {
        let changed = {
            let mut state = self.state.borrow_mut();
            state.journal.push(StyleRecord::Set {
                property: property.to_string(),
                value: value.to_string(),
            });
            let previous = if value.is_empty() {
                state.styles.remove(property)
            } else {
                state
                    .styles
                    .insert(property.to_string(), value.to_string())
            };
            previous.as_deref().unwrap_or("") != value
        };
        if changed && self.native_events {
            self.schedule_transition_end(property);
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.state.borrow().attributes.get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.state
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn add_event_listener(&self, event: &str, listener: EventListener) -> ListenerKey {
        let mut state = self.state.borrow_mut();
        state.next_key += 1;
        let key = ListenerKey(state.next_key);
        state.listeners.push((key, event.to_string(), listener));
        key
    }

    fn remove_event_listener(&self, event: &str, key: ListenerKey) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|(k, name, _)| !(*k == key && name == event));
    }

    fn flush_layout(&self) {
        let mut state = self.state.borrow_mut();
        state.flushes += 1;
        state.journal.push(StyleRecord::Flush);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::{Vendor, VendorProfile};

    fn document(native: bool) -> (Rc<EventLoop>, Document) {
        let l = Rc::new(EventLoop::new());
        let doc = Document::new(l.clone(), VendorProfile::for_vendor(Some(Vendor::Standard)), native);
        (l, doc)
    }

    #[test]
    fn parse_time_handles_seconds_and_millis() {
        assert_eq!(parse_time_ms("0.4s"), Some(400));
        assert_eq!(parse_time_ms(" 150ms "), Some(150));
        assert_eq!(parse_time_ms("0.05s"), Some(50));
        assert_eq!(parse_time_ms("fast"), None);
    }

    #[test]
    fn declared_transition_dispatches_end_event() {
        let (l, doc) = document(true);
        let el = doc.create_element("div");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        el.add_event_listener(
            "transitionend",
            Rc::new(move |e: &TransitionEndEvent| s.borrow_mut().push(e.clone())),
        );
        el.set_style("transition-property", "opacity, left");
        el.set_style("transition-duration", "0.2s, 0.3s");
        el.set_style("transition-delay", "0s, 0.1s");
        el.set_style("left", "10px");
        l.run_until_idle();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].property_name, "left");
        assert_eq!(seen[0].elapsed_time, 0.4);
        assert_eq!(l.now(), Duration::from_millis(400));
    }

    #[test]
    fn unchanged_values_do_not_transition() {
        let (l, doc) = document(true);
        let el = doc.create_element("div");
        el.set_style("opacity", "1");
        el.set_style("transition-property", "all");
        el.set_style("transition-duration", "0.1s");
        el.set_style("opacity", "1");
        assert_eq!(l.pending(), 0);
    }

    #[test]
    fn events_bubble_to_ancestors() {
        let (_l, doc) = document(false);
        let parent = doc.create_element("section");
        let child = doc.create_element("div");
        parent.append_child(&child);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        parent.add_event_listener(
            "transitionend",
            Rc::new(move |e: &TransitionEndEvent| s.borrow_mut().push((e.target, e.current_target))),
        );
        child.dispatch_transition_end("opacity", 0.1);
        assert_eq!(
            *seen.borrow(),
            vec![(child.element_id(), parent.element_id())]
        );
    }

    #[test]
    fn listeners_can_be_removed() {
        let (_l, doc) = document(false);
        let el = doc.create_element("div");
        let key = el.add_event_listener("transitionend", Rc::new(|_: &TransitionEndEvent| {}));
        assert_eq!(el.listener_count("transitionend"), 1);
        el.remove_event_listener("transitionend", key);
        assert_eq!(el.listener_count("transitionend"), 0);
    }
}
