//! Style-surface emulation for the headless platform

use super::StyleProbe;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which transition implementation the headless engine pretends to have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionSupport {
    /// Unprefixed `transition-*` properties
    #[default]
    Standard,
    Webkit,
    Moz,
    O,
    /// No transitions at all
    None,
}

impl TransitionSupport {
    /// The camelCase style keys this engine exposes
    pub fn exposed_properties(&self) -> &'static [&'static str] {
        match self {
            TransitionSupport::Standard => &["transitionProperty", "transform"],
            TransitionSupport::Webkit => &["WebkitTransitionProperty", "WebkitTransform"],
            TransitionSupport::Moz => &["MozTransitionProperty", "MozTransform"],
            TransitionSupport::O => &["OTransitionProperty", "OTransform"],
            TransitionSupport::None => &[],
        }
    }
}

impl fmt::Display for TransitionSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransitionSupport::Standard => "standard",
            TransitionSupport::Webkit => "webkit",
            TransitionSupport::Moz => "moz",
            TransitionSupport::O => "o",
            TransitionSupport::None => "none",
        };
        f.write_str(s)
    }
}

impl FromStr for TransitionSupport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(TransitionSupport::Standard),
            "webkit" => Ok(TransitionSupport::Webkit),
            "moz" => Ok(TransitionSupport::Moz),
            "o" => Ok(TransitionSupport::O),
            "none" => Ok(TransitionSupport::None),
            other => Err(format!(
                "unknown transition support '{}' (expected standard, webkit, moz, o or none)",
                other
            )),
        }
    }
}

/// Probe answering from a fixed [`TransitionSupport`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessProbe {
    support: TransitionSupport,
}

impl HeadlessProbe {
    pub fn new(support: TransitionSupport) -> Self {
        HeadlessProbe { support }
    }

    pub fn support(&self) -> TransitionSupport {
        self.support
    }
}

impl StyleProbe for HeadlessProbe {
    fn supports_style(&self, property: &str) -> bool {
        self.support.exposed_properties().contains(&property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_matches_exposed_surface() {
        let p = HeadlessProbe::new(TransitionSupport::Webkit);
        assert!(p.supports_style("WebkitTransitionProperty"));
        assert!(!p.supports_style("transitionProperty"));
    }

    #[test]
    fn support_parses_case_insensitively() {
        assert_eq!("WebKit".parse::<TransitionSupport>(), Ok(TransitionSupport::Webkit));
        assert!("blink".parse::<TransitionSupport>().is_err());
    }
}
