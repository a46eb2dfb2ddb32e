#![cfg(feature = "headless")]

use naboo::platform::{HeadlessOptions, HeadlessPlatform, StyleTarget, TransitionSupport};
use naboo::script::{Script, ScriptRunner, TraceEntry};
use naboo::{Error, NabooConfig};
use std::time::Duration;

const DEMO: &str = r#"{
  "elements": ["box", "shade"],
  "steps": [
    {"animate": {"target": "box", "props": {"opacity": "0"}, "duration": 300}},
    {"wait": "100ms"},
    {"p": [
      [{"animate": {"target": "box", "props": {"translateX": "40px"}}}],
      [{"animate": {"target": "shade", "props": {"opacity": 1}, "duration": 200, "ease": "linear"}}]
    ]},
    {"log": "done"}
  ]
}"#;

fn play(native_events: bool) -> (ScriptRunner, Vec<TraceEntry>) {
    let platform = HeadlessPlatform::new(HeadlessOptions {
        support: TransitionSupport::Standard,
        native_events,
    });
    let runner = ScriptRunner::new(platform, NabooConfig::default());
    let script = Script::from_json_str(DEMO).expect("valid script");
    let sequence = runner.compile(&script).expect("script compiles");
    let trace = runner.run(&sequence).expect("script runs to the end");
    (runner, trace)
}

fn at(trace: &[TraceEntry], message: &str) -> Duration {
    trace
        .iter()
        .find(|t| t.message == message)
        .unwrap_or_else(|| panic!("'{}' missing from {:?}", message, trace))
        .at
}

#[test]
fn demo_script_completes_on_native_events() {
    let (runner, trace) = play(true);

    assert_eq!(trace.first().map(|t| t.message.as_str()), Some("Start { steps: 4 }"));
    assert_eq!(at(&trace, "animate box done"), Duration::from_millis(300));
    assert_eq!(at(&trace, "wait 100ms"), Duration::from_millis(300));
    assert_eq!(at(&trace, "animate shade done"), Duration::from_millis(600));
    assert_eq!(at(&trace, "done"), Duration::from_millis(800));
    assert_eq!(trace.last().map(|t| t.message.as_str()), Some("End { steps: 4 }"));

    let shade = runner.element("shade").expect("shade created");
    assert_eq!(shade.style("opacity"), "1");
    assert_eq!(shade.attribute("data-naboo").as_deref(), Some("0"));
    let boxed = runner.element("box").expect("box created");
    assert_eq!(boxed.style("transform"), "translateX(40px)");
}

#[test]
fn demo_script_falls_back_to_timers() {
    let (_runner, trace) = play(false);
    assert_eq!(at(&trace, "animate box done"), Duration::from_millis(325));
    assert_eq!(at(&trace, "animate shade done"), Duration::from_millis(625));
    assert_eq!(at(&trace, "done"), Duration::from_millis(850));
}

#[test]
fn bad_scripts_are_reported() {
    assert!(matches!(Script::from_json_str("{\"steps\": 3}"), Err(Error::Json(_))));

    let runner = ScriptRunner::new(HeadlessPlatform::default(), NabooConfig::default());
    let script = Script::from_json_str(r#"{"elements": ["a", "a"], "steps": []}"#).unwrap();
    assert!(matches!(runner.compile(&script), Err(Error::ScriptError(_))));

    let script = Script::from_json_str(r#"{"steps": [{"p": {"not": "a list"}}]}"#).unwrap();
    assert!(matches!(
        runner.compile(&script),
        Err(Error::InvalidArguments { ref plugin, .. }) if plugin == "p"
    ));
}

#[test]
fn config_defaults_flow_into_scripts() {
    let config = NabooConfig::from_json_str(r#"{"default_duration_ms": 100, "grace_ms": 5}"#).unwrap();
    let runner = ScriptRunner::new(
        HeadlessPlatform::new(HeadlessOptions {
            support: TransitionSupport::Standard,
            native_events: false,
        }),
        config,
    );
    let script = Script::from_json_str(
        r#"{"elements": ["x"], "steps": [{"animate": {"target": "x", "props": {"left": "1px"}}}]}"#,
    )
    .unwrap();
    let sequence = runner.compile(&script).unwrap();
    let trace = runner.run(&sequence).unwrap();
    assert_eq!(at(&trace, "animate x done"), Duration::from_millis(105));
}
