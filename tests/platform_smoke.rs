#![cfg(feature = "headless")]

use naboo::platform::{
    HeadlessOptions, HeadlessPlatform, HeadlessProbe, Platform, StyleTarget, Timers,
    TransitionSupport,
};
use naboo::transition::{Vendor, VendorProfile};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[test]
fn vendor_detection_per_engine() {
    let cases = [
        (TransitionSupport::Standard, Some(Vendor::Standard), "transition-property", "transitionend"),
        (TransitionSupport::Webkit, Some(Vendor::Webkit), "-webkit-transition-property", "webkitTransitionEnd"),
        (TransitionSupport::Moz, Some(Vendor::Moz), "-moz-transition-property", "transitionend"),
        (TransitionSupport::O, Some(Vendor::O), "-o-transition-property", "oTransitionEnd"),
        (TransitionSupport::None, None, "transition-property", "transitionend"),
    ];
    for (support, vendor, property, event) in cases {
        let profile = VendorProfile::detect(&HeadlessProbe::new(support));
        assert_eq!(profile.vendor(), vendor, "{}", support);
        assert_eq!(profile.transition_property(), property, "{}", support);
        assert_eq!(profile.end_event(), event, "{}", support);
    }
}

#[test]
fn support_names_round_trip_through_cli_strings() {
    for name in ["standard", "webkit", "moz", "o", "none"] {
        let support: TransitionSupport = name.parse().unwrap();
        assert_eq!(support.to_string(), name);
    }
    assert!("ie".parse::<TransitionSupport>().is_err());
}

#[test]
fn virtual_clock_orders_and_clears_timers() {
    let platform = HeadlessPlatform::new(HeadlessOptions::default());
    let timers = platform.timers();
    let fired = Rc::new(RefCell::new(Vec::new()));

    for (name, ms) in [("b", 20u64), ("a", 10), ("c", 20)] {
        let fired = fired.clone();
        timers.set_timeout(
            Duration::from_millis(ms),
            Box::new(move || fired.borrow_mut().push(name)),
        );
    }
    let dropped = {
        let fired = fired.clone();
        timers.set_timeout(
            Duration::from_millis(15),
            Box::new(move || fired.borrow_mut().push("dropped")),
        )
    };
    timers.clear_timeout(dropped);

    assert_eq!(platform.event_loop().pending(), 3);
    assert_eq!(platform.event_loop().next_due(), Some(Duration::from_millis(10)));
    assert_eq!(platform.event_loop().run_until_idle(), 3);
    assert_eq!(*fired.borrow(), vec!["a", "b", "c"]);
    assert_eq!(timers.now(), Duration::from_millis(20));
}

#[test]
fn element_attributes_and_styles() {
    let platform = HeadlessPlatform::default();
    let a = platform.create_element("div");
    let b = platform.create_element("span");
    assert_ne!(a.element_id(), b.element_id());
    assert_eq!(b.tag(), "span");

    assert_eq!(a.attribute("data-naboo"), None);
    a.set_attribute("data-naboo", "3");
    assert_eq!(a.attribute("data-naboo").as_deref(), Some("3"));

    a.set_style("opacity", "0.5");
    a.set_style("opacity", "");
    assert_eq!(a.style("opacity"), "");
    assert_eq!(a.journal().len(), 2);
    a.clear_journal();
    assert!(a.journal().is_empty());
}
