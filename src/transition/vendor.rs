//! One-time detection of vendor-prefixed transition names

use crate::platform::StyleProbe;
use log::debug;
use serde::Serialize;

/// Transition implementations probed for, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Standard,
    Webkit,
    Moz,
    O,
}

const PROBE_ORDER: [Vendor; 4] = [Vendor::Standard, Vendor::Webkit, Vendor::Moz, Vendor::O];

impl Vendor {
    /// Style key whose presence signals support
    pub fn style_key(self) -> &'static str {
        match self {
            Vendor::Standard => "transitionProperty",
            Vendor::Webkit => "WebkitTransitionProperty",
            Vendor::Moz => "MozTransitionProperty",
            Vendor::O => "OTransitionProperty",
        }
    }

    pub fn css_prefix(self) -> &'static str {
        match self {
            Vendor::Standard => "",
            Vendor::Webkit => "-webkit-",
            Vendor::Moz => "-moz-",
            Vendor::O => "-o-",
        }
    }

    // Gecko kept the unprefixed event name even while prefixing properties.
    fn event_prefix(self) -> Option<&'static str> {
        match self {
            Vendor::Webkit => Some("webkit"),
            Vendor::O => Some("o"),
            Vendor::Standard | Vendor::Moz => None,
        }
    }
}

/// Resolved CSS names for one platform, computed once and never re-probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorProfile {
    vendor: Option<Vendor>,
    transition_property: String,
    transition_duration: String,
    transition_delay: String,
    transition_timing_function: String,
    transform: String,
    end_event: String,
}

impl VendorProfile {
    /// Probe the style surface for the first supported implementation
    pub fn detect(probe: &dyn StyleProbe) -> Self {
        let vendor = PROBE_ORDER
            .into_iter()
            .find(|v| probe.supports_style(v.style_key()));
        let profile = Self::for_vendor(vendor);
        debug!(
            "transition support: {:?} (end event '{}')",
            profile.vendor, profile.end_event
        );
        profile
    }

    /// Profile for a known vendor; `None` means no transition support
    pub fn for_vendor(vendor: Option<Vendor>) -> Self {
        let prefix = vendor.map(Vendor::css_prefix).unwrap_or("");
        let end_event = match vendor.and_then(Vendor::event_prefix) {
            Some(p) => format!("{}TransitionEnd", p),
            None => "transitionend".to_string(),
        };
        VendorProfile {
            vendor,
            transition_property: format!("{}transition-property", prefix),
            transition_duration: format!("{}transition-duration", prefix),
            transition_delay: format!("{}transition-delay", prefix),
            transition_timing_function: format!("{}transition-timing-function", prefix),
            transform: format!("{}transform", prefix),
            end_event,
        }
    }

    pub fn vendor(&self) -> Option<Vendor> {
        self.vendor
    }

    pub fn is_supported(&self) -> bool {
        self.vendor.is_some()
    }

    pub fn transition_property(&self) -> &str {
        &self.transition_property
    }

    pub fn transition_duration(&self) -> &str {
        &self.transition_duration
    }

    pub fn transition_delay(&self) -> &str {
        &self.transition_delay
    }

    pub fn transition_timing_function(&self) -> &str {
        &self.transition_timing_function
    }

    pub fn transform(&self) -> &str {
        &self.transform
    }

    pub fn end_event(&self) -> &str {
        &self.end_event
    }

    /// The four declarations restored once a target goes idle
    pub fn transition_declarations(&self) -> [&str; 4] {
        [
            &self.transition_property,
            &self.transition_duration,
            &self.transition_delay,
            &self.transition_timing_function,
        ]
    }
}
