//! Options accepted by `animate`, with permissive coercion
//!
//! Nothing here fails: unknown easing names become `ease`, unknown modes
//! become `transition`, and non-numeric durations or delays fall back to
//! their defaults.

use crate::NabooConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default transition duration in milliseconds
pub const DEFAULT_DURATION_MS: u64 = 400;

/// CSS timing functions the driver emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ease {
    #[default]
    Ease,
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Ease {
    /// Map a CSS name onto the enum; anything unknown becomes `Ease`.
    pub fn coerce(name: &str) -> Ease {
        match name {
            "ease" => Ease::Ease,
            "linear" => Ease::Linear,
            "ease-in" => Ease::EaseIn,
            "ease-out" => Ease::EaseOut,
            "ease-in-out" => Ease::EaseInOut,
            other => {
                debug!("unknown ease '{}', using 'ease'", other);
                Ease::Ease
            }
        }
    }

    pub fn as_css(&self) -> &'static str {
        match self {
            Ease::Ease => "ease",
            Ease::Linear => "linear",
            Ease::EaseIn => "ease-in",
            Ease::EaseOut => "ease-out",
            Ease::EaseInOut => "ease-in-out",
        }
    }
}

/// Animation mode. Only CSS transitions are implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Transition,
}

impl Mode {
    pub fn coerce(name: &str) -> Mode {
        if name != "transition" {
            debug!("unsupported mode '{}', using 'transition'", name);
        }
        Mode::Transition
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Transition => "transition",
        }
    }
}

/// Timing options for one transition call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimateOptions {
    pub duration_ms: u64,
    pub delay_ms: u64,
    pub ease: Ease,
    pub mode: Mode,
}

impl Default for AnimateOptions {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            delay_ms: 0,
            ease: Ease::Ease,
            mode: Mode::Transition,
        }
    }
}

impl AnimateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults taken from `config` instead of the built-in constants
    pub fn from_config(config: &NabooConfig) -> Self {
        Self {
            duration_ms: config.default_duration_ms,
            ease: config.default_ease,
            ..Self::default()
        }
    }

    /// Duration in ms; negative values clamp to 0
    pub fn duration(mut self, ms: i64) -> Self {
        self.duration_ms = ms.max(0) as u64;
        self
    }

    /// Delay in ms; negative values clamp to 0
    pub fn delay(mut self, ms: i64) -> Self {
        self.delay_ms = ms.max(0) as u64;
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn ease_named(self, name: &str) -> Self {
        self.ease(Ease::coerce(name))
    }

    pub fn mode_named(mut self, name: &str) -> Self {
        self.mode = Mode::coerce(name);
        self
    }

    /// Read `{duration, delay, ease, mode}` from a loosely-typed JSON
    /// object. Missing or unparseable fields keep the `config` defaults.
    pub fn from_value(value: &Value, config: &NabooConfig) -> Self {
        let mut options = Self::from_config(config);
        let Some(map) = value.as_object() else {
            return options;
        };
        if let Some(ms) = map.get("duration").and_then(parse_int) {
            options = options.duration(ms);
        }
        if let Some(ms) = map.get("delay").and_then(parse_int) {
            options = options.delay(ms);
        }
        if let Some(ease) = map.get("ease").and_then(Value::as_str) {
            options = options.ease_named(ease);
        }
        if let Some(mode) = map.get("mode").and_then(Value::as_str) {
            options = options.mode_named(mode);
        }
        options
    }

    /// `duration + delay` in milliseconds
    pub fn total_ms(&self) -> u64 {
        self.duration_ms + self.delay_ms
    }
}

/// Integer parsing with `parseInt` leniency: numbers are truncated, strings
/// yield their leading decimal integer ("250ms" -> 250), everything else is
/// `None`.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: &str = {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }
    let n = digits.parse::<i64>().ok()?;
    Some(if negative { -n } else { n })
}
