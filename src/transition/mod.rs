//! CSS transition driver and the `animate` plugin.
//!
//! [`TransitionDriver::transition`] applies a set of property values to a
//! target through CSS transitions and reports completion exactly once,
//! either from the platform's transition-end event or from a fallback timer
//! sized `duration + delay + grace`, whichever comes first.
//!
//! Several transitions may overlap on one target. Each call bumps a counter
//! kept in a visible attribute (`data-naboo` by default) and appends its own
//! entries to the target's transition declarations. When the last
//! overlapping call completes, the declarations the target had before the
//! first one are written back.

pub mod options;
pub mod properties;
pub mod vendor;

pub use options::{AnimateOptions, Ease, Mode, DEFAULT_DURATION_MS};
pub use properties::Properties;
pub use vendor::{Vendor, VendorProfile};

use crate::platform::{ElementId, ListenerKey, Platform, Target, Timers, TransitionEndEvent};
use crate::plugin::Plugin;
use crate::sequence::{Advance, Sequence};
use crate::NabooConfig;
use log::{debug, trace};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// Applies CSS transitions using a vendor profile detected at construction
pub struct TransitionDriver {
    profile: VendorProfile,
    timers: Rc<dyn Timers>,
    grace: Duration,
    counter_attribute: String,
    // Declarations each busy target had before its first active transition
    saved: Rc<RefCell<HashMap<ElementId, [String; 4]>>>,
}

impl TransitionDriver {
    /// Probe `platform` once and keep the result for the driver's lifetime.
    pub fn new(platform: &dyn Platform, config: &NabooConfig) -> Self {
        Self::with_profile(
            VendorProfile::detect(platform.style_probe()),
            platform.timers(),
            config,
        )
    }

    pub fn with_profile(profile: VendorProfile, timers: Rc<dyn Timers>, config: &NabooConfig) -> Self {
        TransitionDriver {
            profile,
            timers,
            grace: Duration::from_millis(config.grace_ms),
            counter_attribute: config.counter_attribute.clone(),
            saved: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn profile(&self) -> &VendorProfile {
        &self.profile
    }

    pub fn counter_attribute(&self) -> &str {
        &self.counter_attribute
    }

    /// Transition `target` to `properties` and call `on_complete` once the
    /// transition has finished (or the fallback timer gave up waiting).
    pub fn transition<F>(
        &self,
        target: &Target,
        properties: &Properties,
        options: &AnimateOptions,
        on_complete: F,
    ) where
        F: FnOnce() + 'static,
    {
        let duration_ms = if self.profile.is_supported() {
            options.duration_ms
        } else {
            0
        };
        let delay_ms = options.delay_ms;
        let total_ms = duration_ms + delay_ms;

        let active = read_counter(target, &self.counter_attribute) + 1;
        target.set_attribute(&self.counter_attribute, &active.to_string());
        if active == 1 {
            let before = self
                .profile
                .transition_declarations()
                .map(|name| target.style(name));
            self.saved.borrow_mut().insert(target.element_id(), before);
        }

        let plan = properties::plan(properties, &self.profile);
        let declarations = if duration_ms > 0 && !plan.animated.is_empty() {
            self.declarations(target, &plan.animated, duration_ms, delay_ms, options.ease)
        } else {
            Vec::new()
        };

        let invocation = Rc::new(Invocation {
            target: Rc::clone(target),
            end_event: self.profile.end_event().to_string(),
            counter_attribute: self.counter_attribute.clone(),
            reset: self
                .profile
                .transition_declarations()
                .map(str::to_string),
            saved: Rc::clone(&self.saved),
            fired: Cell::new(false),
            listener: Cell::new(None),
            callback: RefCell::new(Some(Box::new(on_complete))),
        });

        if duration_ms > 0 {
            let expected = total_ms as f64 / 1000.0;
            let element = target.element_id();
            let inv = Rc::clone(&invocation);
            let key = target.add_event_listener(
                self.profile.end_event(),
                Rc::new(move |event: &TransitionEndEvent| {
                    // Ignore events bubbling up from descendants.
                    if event.target != event.current_target || event.target != element {
                        return;
                    }
                    if event.elapsed_time != expected {
                        trace!(
                            "transition end for '{}' after {}s ignored (expected {}s)",
                            event.property_name,
                            event.elapsed_time,
                            expected
                        );
                        return;
                    }
                    inv.complete("event");
                }),
            );
            invocation.listener.set(Some(key));
        }

        let inv = Rc::clone(&invocation);
        self.timers.set_timeout(
            Duration::from_millis(total_ms) + self.grace,
            Box::new(move || inv.complete("timer")),
        );

        debug!(
            "{} {:?} on {:?}: {}ms + {}ms delay, {} active",
            options.mode.as_str(),
            plan.animated,
            target.element_id(),
            duration_ms,
            delay_ms,
            active
        );

        for (name, value) in &declarations {
            target.set_style(name, value);
        }
        target.flush_layout();
        for (name, value) in &plan.values {
            target.set_style(name, value);
        }
    }

    // Each animated property gets its own list entry so that appended
    // entries stay index-aligned with whatever was declared before.
    fn declarations(
        &self,
        target: &Target,
        animated: &[String],
        duration_ms: u64,
        delay_ms: u64,
        ease: Ease,
    ) -> Vec<(String, String)> {
        let n = animated.len();
        let repeat = |item: String| vec![item; n].join(", ");
        let fresh = [
            (self.profile.transition_property(), animated.join(", ")),
            (self.profile.transition_duration(), repeat(seconds(duration_ms))),
            (self.profile.transition_delay(), repeat(seconds(delay_ms))),
            (
                self.profile.transition_timing_function(),
                repeat(ease.as_css().to_string()),
            ),
        ];
        fresh
            .into_iter()
            .map(|(name, value)| {
                let existing = target.style(name);
                let combined = if existing.trim().is_empty() {
                    value
                } else {
                    format!("{}, {}", existing, value)
                };
                (name.to_string(), combined)
            })
            .collect()
    }
}

/// State of one `transition` call, shared by its event and timer paths
struct Invocation {
    target: Target,
    end_event: String,
    counter_attribute: String,
    reset: [String; 4],
    saved: Rc<RefCell<HashMap<ElementId, [String; 4]>>>,
    fired: Cell<bool>,
    listener: Cell<Option<ListenerKey>>,
    callback: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Invocation {
    fn complete(&self, via: &str) {
        if self.fired.replace(true) {
            trace!("late transition completion via {} discarded", via);
            return;
        }
        if let Some(key) = self.listener.take() {
            self.target.remove_event_listener(&self.end_event, key);
        }

        let remaining = read_counter(&self.target, &self.counter_attribute).saturating_sub(1);
        self.target
            .set_attribute(&self.counter_attribute, &remaining.to_string());
        if remaining == 0 {
            let before = self
                .saved
                .borrow_mut()
                .remove(&self.target.element_id())
                .unwrap_or_default();
            for (name, value) in self.reset.iter().zip(before.iter()) {
                if self.target.style(name) != *value {
                    self.target.set_style(name, value);
                }
            }
        }
        debug!(
            "transition on {:?} completed via {}, {} still active",
            self.target.element_id(),
            via,
            remaining
        );

        let callback = self.callback.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

fn read_counter(target: &Target, attribute: &str) -> u32 {
    target
        .attribute(attribute)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

// 400 -> "0.4s", 1000 -> "1s"
fn seconds(ms: u64) -> String {
    format!("{}s", ms as f64 / 1000.0)
}

/// Arguments of one `animate` step
pub struct AnimateArgs {
    pub target: Target,
    pub properties: Properties,
    pub options: AnimateOptions,
    pub callback: Option<Box<dyn FnOnce()>>,
}

impl AnimateArgs {
    pub fn new(target: Target, properties: Properties) -> Self {
        AnimateArgs {
            target,
            properties,
            options: AnimateOptions::default(),
            callback: None,
        }
    }

    pub fn options(mut self, options: AnimateOptions) -> Self {
        self.options = options;
        self
    }

    /// Run `f` when the transition completes, before the sequence advances
    pub fn then_call<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.callback = Some(Box::new(f));
        self
    }
}

/// Plugin wrapping [`TransitionDriver::transition`] as a sequence step
pub struct Animate {
    driver: Rc<TransitionDriver>,
}

impl Animate {
    pub fn new(driver: Rc<TransitionDriver>) -> Self {
        Animate { driver }
    }
}

impl Plugin for Animate {
    type Args = AnimateArgs;

    fn name(&self) -> &'static str {
        "animate"
    }

    fn step(&self, advance: Advance, args: AnimateArgs) {
        let AnimateArgs {
            target,
            properties,
            options,
            callback,
        } = args;
        self.driver
            .transition(&target, &properties, &options, move || {
                if let Some(callback) = callback {
                    callback();
                }
                advance.advance();
            });
    }
}

impl Sequence {
    /// Enqueue an [`Animate`] step
    pub fn with_animate(&self, driver: &Rc<TransitionDriver>, args: AnimateArgs) -> &Self {
        self.with(&Rc::new(Animate::new(Rc::clone(driver))), args)
    }
}

/// One-shot animation sequence
pub fn animate(driver: &Rc<TransitionDriver>, args: AnimateArgs) -> Sequence {
    Sequence::of(&Rc::new(Animate::new(Rc::clone(driver))), args)
}
