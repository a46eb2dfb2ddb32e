//! Naboo animation sequencer
//!
//! A small scheduler that chains asynchronous, cancelable animation steps,
//! plus a driver that runs CSS transitions on a target element and detects
//! their completion.
//!
//! # Features
//!
//! - **Sequences**: FIFO steps with explicit continuations, `Start`/`End`
//!   events and cooperative cancellation
//! - **Plugins**: step functions usable chained (`seq.with(..)`) or one-shot
//!   (`Sequence::of(..)`), with built-in parallel, done and animate steps
//! - **Transitions**: vendor detection done once, overlapping transitions on
//!   one target, completion from the native event or a fallback timer
//! - **Headless platform** (default feature `headless`): virtual clock and
//!   in-memory elements for deterministic runs
//!
//! # Example
//!
//! ```
//! use naboo::platform::HeadlessPlatform;
//! use naboo::transition::{AnimateArgs, AnimateOptions, Properties, TransitionDriver};
//! use naboo::{NabooConfig, Sequence};
//! use std::rc::Rc;
//!
//! let platform = HeadlessPlatform::default();
//! let driver = Rc::new(TransitionDriver::new(&platform, &NabooConfig::default()));
//! let panel = platform.create_element("div");
//!
//! let seq = Sequence::new();
//! seq.with_animate(
//!     &driver,
//!     AnimateArgs::new(panel.clone(), Properties::new().set("opacity", "0"))
//!         .options(AnimateOptions::new().duration(300)),
//! )
//! .with_done(|advance| advance.advance());
//!
//! let _finished = seq.start();
//! platform.event_loop().run_until_idle();
//! assert!(seq.is_ended());
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod error;
pub use error::{Error, Result};

pub mod sequence;
pub use sequence::{Advance, EventKind, Finished, ListenerId, Sequence, SequenceEvent, Step};

pub mod plugin;
pub use plugin::{done, parallel, Done, Parallel, Plugin, Registry};

// Platform traits and the headless implementation
pub mod platform;

pub mod transition;
pub use transition::{animate, Animate, AnimateArgs, TransitionDriver};

// JSON-described sequences for the command line
#[cfg(feature = "headless")]
pub mod script;

/// Engine-wide defaults
///
/// The defaults follow the classic transition helper conventions:
/// - 400 ms transitions with the `ease` timing function
/// - a 25 ms grace window on top of `duration + delay` before the fallback
///   timer declares a transition finished
/// - the per-target counter kept in the `data-naboo` attribute
///
/// # Examples
///
/// ```
/// let cfg = naboo::NabooConfig::default();
/// assert_eq!(cfg.default_duration_ms, 400);
/// assert_eq!(cfg.counter_attribute, "data-naboo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NabooConfig {
    /// Duration used when a call does not specify one (ms)
    pub default_duration_ms: u64,
    /// Timing function used when a call does not specify one
    pub default_ease: transition::Ease,
    /// Extra wait before the fallback timer fires (ms)
    pub grace_ms: u64,
    /// Attribute holding the number of active transitions on a target
    pub counter_attribute: String,
}

impl Default for NabooConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: transition::DEFAULT_DURATION_MS,
            default_ease: transition::Ease::Ease,
            grace_ms: 25,
            counter_attribute: "data-naboo".to_string(),
        }
    }
}

impl NabooConfig {
    /// Parse a JSON config; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: NabooConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.counter_attribute.trim().is_empty() {
            return Err(Error::ConfigError(
                "counter_attribute must not be empty".to_string(),
            ));
        }
        if self.counter_attribute.chars().any(char::is_whitespace) {
            return Err(Error::ConfigError(format!(
                "counter_attribute '{}' contains whitespace",
                self.counter_attribute
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NabooConfig::default();
        assert_eq!(config.default_duration_ms, 400);
        assert_eq!(config.grace_ms, 25);
        assert_eq!(config.default_ease, transition::Ease::Ease);
    }

    #[test]
    fn test_partial_json_config() {
        let config = NabooConfig::from_json_str(r#"{"grace_ms": 50, "default_ease": "ease-out"}"#)
            .expect("valid config");
        assert_eq!(config.grace_ms, 50);
        assert_eq!(config.default_ease, transition::Ease::EaseOut);
        assert_eq!(config.default_duration_ms, 400);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            NabooConfig::from_json_str(r#"{"counter_attribute": " "}"#),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(
            NabooConfig::from_json_str("{"),
            Err(Error::Json(_))
        ));
    }
}
