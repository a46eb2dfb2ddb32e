//! Plugins: named step functions usable in chained or one-shot form.
//!
//! Implementing [`Plugin`] gives a step function two call forms:
//! [`Sequence::with`] appends it to an existing chain and returns the
//! sequence, [`Sequence::of`] builds a fresh sequence holding just that
//! step. [`Registry`] keeps step factories under string names for callers
//! that only know the plugin name at run time (scripts, configuration).

use crate::sequence::{Advance, EventKind, Sequence, Step};
use crate::{Error, Result};
use log::{debug, trace, warn};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// A named step function with typed arguments
pub trait Plugin: 'static {
    /// Arguments captured when the step is enqueued
    type Args: 'static;

    fn name(&self) -> &'static str;

    /// Run the step; must eventually call `advance`
    fn step(&self, advance: Advance, args: Self::Args);
}

impl Sequence {
    /// Instance form: enqueue `plugin` with `args` and return the sequence.
    pub fn with<P: Plugin>(&self, plugin: &Rc<P>, args: P::Args) -> &Self {
        let plugin = Rc::clone(plugin);
        trace!("enqueue plugin '{}'", plugin.name());
        self.step(move |advance| plugin.step(advance, args))
    }

    /// Factory form: a new sequence holding one `plugin` step.
    pub fn of<P: Plugin>(plugin: &Rc<P>, args: P::Args) -> Sequence {
        let seq = Sequence::new();
        seq.with(plugin, args);
        seq
    }

    /// Enqueue a [`Parallel`] step over `children`
    pub fn with_parallel(&self, children: Vec<Sequence>) -> &Self {
        self.with(&Rc::new(Parallel), children)
    }

    /// Enqueue a [`Done`] step running `f`
    pub fn with_done<F>(&self, f: F) -> &Self
    where
        F: FnOnce(Advance) + 'static,
    {
        self.with(&Rc::new(Done), Box::new(f))
    }
}

/// Start every child and advance once all of them have ended.
///
/// Children run concurrently; nothing is guaranteed about which finishes
/// first. Children must not have been started already.
#[derive(Debug, Default, Clone, Copy)]
pub struct Parallel;

impl Plugin for Parallel {
    type Args = Vec<Sequence>;

    fn name(&self) -> &'static str {
        "p"
    }

    fn step(&self, advance: Advance, children: Vec<Sequence>) {
        if children.is_empty() {
            advance.advance();
            return;
        }

        let remaining = Rc::new(Cell::new(children.len()));
        for child in &children {
            if child.is_started() {
                warn!("parallel child already started; it may never report its end");
            }
            let remaining = Rc::clone(&remaining);
            let advance = advance.clone();
            child.on(EventKind::End, move |_| {
                let left = remaining.get().saturating_sub(1);
                remaining.set(left);
                trace!("parallel child ended, {} remaining", left);
                if left == 0 {
                    advance.advance();
                }
            });
        }

        debug!("starting {} parallel children", children.len());
        for child in children {
            let _ = child.start();
        }
    }
}

/// Pass-through step: hands `advance` to an arbitrary function
#[derive(Debug, Default, Clone, Copy)]
pub struct Done;

impl Plugin for Done {
    type Args = Box<dyn FnOnce(Advance)>;

    fn name(&self) -> &'static str {
        "done"
    }

    fn step(&self, advance: Advance, f: Self::Args) {
        f(advance);
    }
}

/// One-shot parallel composition
pub fn parallel(children: Vec<Sequence>) -> Sequence {
    Sequence::of(&Rc::new(Parallel), children)
}

/// One-shot custom step
pub fn done<F>(f: F) -> Sequence
where
    F: FnOnce(Advance) + 'static,
{
    Sequence::of(&Rc::new(Done), Box::new(f))
}

/// Builds a step from call-time arguments, or rejects them
pub type StepFactory<A> = Rc<dyn Fn(A) -> Result<Step>>;

/// Name-keyed table of step factories sharing one argument type.
pub struct Registry<A> {
    entries: HashMap<String, StepFactory<A>>,
}

impl<A: 'static> Default for Registry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> Registry<A> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Install `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(A) -> Result<Step> + 'static,
    {
        if self
            .entries
            .insert(name.to_string(), Rc::new(factory))
            .is_some()
        {
            debug!("plugin '{}' re-registered", name);
        }
        self
    }

    /// Install a typed plugin under its own name
    pub fn register_plugin<P>(&mut self, plugin: Rc<P>) -> &mut Self
    where
        P: Plugin<Args = A>,
    {
        let name = plugin.name();
        self.register(name, move |args| {
            let plugin = Rc::clone(&plugin);
            let step: Step = Box::new(move |advance| plugin.step(advance, args));
            Ok(step)
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instance form: build the step and append it to `seq`.
    pub fn enqueue<'s>(&self, seq: &'s Sequence, name: &str, args: A) -> Result<&'s Sequence> {
        let factory = self
            .entries
            .get(name)
            .ok_or_else(|| Error::UnknownPlugin(name.to_string()))?;
        let step = factory(args)?;
        Ok(seq.step(step))
    }

    /// Factory form: a fresh sequence holding one `name` step.
    pub fn create(&self, name: &str, args: A) -> Result<Sequence> {
        let seq = Sequence::new();
        self.enqueue(&seq, name, args)?;
        Ok(seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Record {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Plugin for Record {
        type Args = String;

        fn name(&self) -> &'static str {
            "record"
        }

        fn step(&self, advance: Advance, args: String) {
            self.log.borrow_mut().push(args);
            advance.advance();
        }
    }

    #[test]
    fn instance_and_factory_forms_enqueue_without_running() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let plugin = Rc::new(Record { log: log.clone() });

        let seq = Sequence::of(&plugin, "a".to_string());
        seq.with(&plugin, "b".to_string())
            .with(&plugin, "c".to_string());
        assert_eq!(seq.len(), 3);
        assert!(log.borrow().is_empty());

        let _ = seq.start();
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn registry_reports_unknown_names() {
        let registry: Registry<String> = Registry::new();
        let err = registry.create("missing", String::new()).unwrap_err();
        assert!(matches!(err, Error::UnknownPlugin(name) if name == "missing"));
    }

    #[test]
    fn registry_surfaces_factory_rejections() {
        let mut registry: Registry<i64> = Registry::new();
        registry.register("positive", |n| {
            if n < 0 {
                return Err(Error::invalid_args("positive", "negative input"));
            }
            let step: Step = Box::new(|advance| advance.advance());
            Ok(step)
        });
        assert!(registry.create("positive", 3).is_ok());
        assert!(matches!(
            registry.create("positive", -1),
            Err(Error::InvalidArguments { .. })
        ));
    }

    #[test]
    fn registry_holds_typed_plugins_by_name() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = Registry::new();
        registry.register_plugin(Rc::new(Record { log: log.clone() }));
        assert_eq!(registry.names(), vec!["record"]);

        let seq = registry.create("record", "x".to_string()).unwrap();
        registry.enqueue(&seq, "record", "y".to_string()).unwrap();
        let _ = seq.start();
        assert_eq!(*log.borrow(), vec!["x", "y"]);
    }

    #[test]
    fn empty_parallel_advances_immediately() {
        let seq = parallel(Vec::new());
        let ended = Rc::new(Cell::new(false));
        let e = ended.clone();
        let _ = seq.start_with(move |_| e.set(true));
        assert!(ended.get());
    }

    #[test]
    fn done_runs_synchronous_logic_inline() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let seq = done(move |advance| {
            h.set(h.get() + 1);
            advance.advance();
        });
        let h2 = hits.clone();
        seq.with_done(move |advance| {
            h2.set(h2.get() * 10);
            advance.advance();
        });
        let _ = seq.start();
        assert_eq!(hits.get(), 10);
        assert!(seq.is_ended());
    }
}
