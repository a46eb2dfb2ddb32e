//! JSON-described sequences played on the headless platform.
//!
//! A script names the elements it animates and lists its steps; each step
//! is an object with exactly one key naming a registered plugin:
//!
//! ```json
//! {
//!   "elements": ["box", "shade"],
//!   "steps": [
//!     {"animate": {"target": "box", "props": {"opacity": "0"}, "duration": 300}},
//!     {"wait": 100},
//!     {"p": [
//!       [{"animate": {"target": "box", "props": {"translateX": "40px"}}}],
//!       [{"animate": {"target": "shade", "props": {"opacity": 1}, "ease": "linear"}}]
//!     ]},
//!     {"log": "done"}
//!   ]
//! }
//! ```

use crate::platform::{Element, HeadlessPlatform, Target, Timers};
use crate::plugin::{Done, Parallel, Plugin, Registry};
use crate::sequence::{EventKind, Sequence, Step};
use crate::transition::{options::parse_int, Animate, AnimateArgs, AnimateOptions, Properties, TransitionDriver};
use crate::{Error, NabooConfig, Result};
use futures::FutureExt;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Parsed script file
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub elements: Vec<String>,
    pub steps: Vec<Value>,
}

impl Script {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One line of the run timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub at: Duration,
    pub message: String,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}ms  {}", self.at.as_millis(), self.message)
    }
}

struct Context {
    platform: HeadlessPlatform,
    driver: Rc<TransitionDriver>,
    config: NabooConfig,
    elements: RefCell<BTreeMap<String, Rc<Element>>>,
    trace: RefCell<Vec<TraceEntry>>,
}

impl Context {
    fn record(&self, message: impl Into<String>) {
        let at = self.platform.event_loop().now();
        let message = message.into();
        info!("{:>6}ms {}", at.as_millis(), message);
        self.trace.borrow_mut().push(TraceEntry { at, message });
    }

    fn element(&self, name: &str) -> Option<Rc<Element>> {
        self.elements.borrow().get(name).cloned()
    }
}

/// Compiles scripts into sequences and runs them to completion
pub struct ScriptRunner {
    context: Rc<Context>,
    registry: Rc<Registry<Value>>,
}

impl ScriptRunner {
    pub fn new(platform: HeadlessPlatform, config: NabooConfig) -> Self {
        let driver = Rc::new(TransitionDriver::new(&platform, &config));
        let context = Rc::new(Context {
            platform,
            driver,
            config,
            elements: RefCell::new(BTreeMap::new()),
            trace: RefCell::new(Vec::new()),
        });
        let registry = Rc::new_cyclic(|weak| builtin_registry(&context, weak.clone()));
        ScriptRunner { context, registry }
    }

    pub fn platform(&self) -> &HeadlessPlatform {
        &self.context.platform
    }

    pub fn driver(&self) -> &Rc<TransitionDriver> {
        &self.context.driver
    }

    /// Plugin names a script may use
    pub fn plugin_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    pub fn element(&self, name: &str) -> Option<Rc<Element>> {
        self.context.element(name)
    }

    /// Create the script's elements and compile its steps.
    pub fn compile(&self, script: &Script) -> Result<Sequence> {
        for name in &script.elements {
            let mut elements = self.context.elements.borrow_mut();
            if elements.contains_key(name) {
                return Err(Error::ScriptError(format!("duplicate element '{}'", name)));
            }
            elements.insert(name.clone(), self.context.platform.create_element("div"));
        }
        compile_steps(&self.registry, &script.steps)
    }

    /// Start `sequence`, drain the event loop and return the timeline.
    ///
    /// Fails with `ScriptError` if the sequence is still waiting once no
    /// timers are left.
    pub fn run(&self, sequence: &Sequence) -> Result<Vec<TraceEntry>> {
        let ctx = Rc::clone(&self.context);
        sequence.on(EventKind::Start, move |e| ctx.record(format!("{:?}", e)));
        let ctx = Rc::clone(&self.context);
        sequence.on(EventKind::End, move |e| ctx.record(format!("{:?}", e)));

        let finished = sequence.start();
        let ran = self.context.platform.event_loop().run_until_idle();
        debug!("event loop idle after {} timer callback(s)", ran);

        match finished.now_or_never() {
            Some(outcome) => outcome?,
            None => {
                return Err(Error::ScriptError(format!(
                    "sequence stalled at step {} of {}",
                    sequence.position(),
                    sequence.len()
                )))
            }
        }
        Ok(self.context.trace.borrow().clone())
    }
}

fn compile_steps(registry: &Registry<Value>, steps: &[Value]) -> Result<Sequence> {
    let seq = Sequence::new();
    for (i, step) in steps.iter().enumerate() {
        let (name, args) = match step.as_object() {
            Some(map) if map.len() == 1 => map
                .iter()
                .next()
                .ok_or_else(|| Error::ScriptError(format!("step {} is empty", i)))?,
            _ => {
                return Err(Error::ScriptError(format!(
                    "step {} must be an object with exactly one plugin key",
                    i
                )))
            }
        };
        registry.enqueue(&seq, name, args.clone())?;
    }
    Ok(seq)
}

fn builtin_registry(context: &Rc<Context>, this: Weak<Registry<Value>>) -> Registry<Value> {
    let mut registry = Registry::new();

    let ctx = Rc::clone(context);
    let animate = Rc::new(Animate::new(Rc::clone(&context.driver)));
    registry.register("animate", move |args: Value| {
        let name = args
            .get("target")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_args("animate", "missing 'target'"))?
            .to_string();
        let element = ctx
            .element(&name)
            .ok_or_else(|| Error::invalid_args("animate", format!("unknown element '{}'", name)))?;
        let properties = Properties::from_value(args.get("props").unwrap_or(&Value::Null))?;
        let options = AnimateOptions::from_value(&args, &ctx.config);

        let target: Target = element;
        let plugin = Rc::clone(&animate);
        let ctx = Rc::clone(&ctx);
        let step: Step = Box::new(move |advance| {
            ctx.record(format!("animate {} ({}ms)", name, options.duration_ms));
            let done_ctx = Rc::clone(&ctx);
            let args = AnimateArgs::new(target, properties)
                .options(options)
                .then_call(move || done_ctx.record(format!("animate {} done", name)));
            plugin.step(advance, args);
        });
        Ok(step)
    });

    let ctx = Rc::clone(context);
    registry.register("wait", move |args: Value| {
        let ms = parse_int(&args)
            .ok_or_else(|| Error::invalid_args("wait", "expected milliseconds"))?
            .max(0) as u64;
        let ctx = Rc::clone(&ctx);
        let step: Step = Box::new(move |advance| {
            ctx.record(format!("wait {}ms", ms));
            ctx.platform.event_loop().set_timeout(
                Duration::from_millis(ms),
                Box::new(move || advance.advance()),
            );
        });
        Ok(step)
    });

    let ctx = Rc::clone(context);
    registry.register("log", move |args: Value| {
        let message = match args {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let ctx = Rc::clone(&ctx);
        let step: Step = Box::new(move |advance| {
            Done.step(
                advance,
                Box::new(move |advance| {
                    ctx.record(message);
                    advance.advance();
                }),
            );
        });
        Ok(step)
    });

    registry.register("p", move |args: Value| {
        let registry = this
            .upgrade()
            .ok_or_else(|| Error::ScriptError("plugin registry dropped".to_string()))?;
        let branches = args
            .as_array()
            .ok_or_else(|| Error::invalid_args("p", "expected an array of step lists"))?;
        let children = branches
            .iter()
            .map(|branch| {
                let steps = branch
                    .as_array()
                    .ok_or_else(|| Error::invalid_args("p", "each branch must be an array"))?;
                compile_steps(&registry, steps)
            })
            .collect::<Result<Vec<_>>>()?;
        let step: Step = Box::new(move |advance| Parallel.step(advance, children));
        Ok(step)
    });

    registry
}
