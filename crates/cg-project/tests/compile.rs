use cg_core::Epoch;
use cg_graph::GraphError;
use cg_project::{ProjectError, compile, from_yaml_str};

const INTEGRATING_LOOP: &str = r#"
version: 1
name: Integrating loop
period_s: 0.1
nodes:
  - id: speed
    kind: { type: Input, initial: 2.0 }
  - id: distance
    kind: { type: Integrator }
    inputs: [speed]
  - id: lagged
    kind: { type: Delay, depth: 2 }
    inputs: [distance]
    publish: true
  - id: clamp
    kind: { type: Limiter, lo: 0.0, hi: 1.0 }
    inputs: [distance]
sinks: [clamp, distance]
"#;

#[test]
fn compiles_and_ticks() {
    let def = from_yaml_str(INTEGRATING_LOOP).unwrap();
    let mut compiled = compile(&def).unwrap();
    assert_eq!(compiled.name, "Integrating loop");
    assert_eq!(compiled.published, vec!["clamp", "distance", "lagged"]);
    assert_eq!(compiled.graph.roots().len(), 3);

    let graph = &mut compiled.graph;
    for epoch in 1..=10_u64 {
        graph.tick(epoch).unwrap();
    }
    let sinks = graph.sink_outputs();
    assert_eq!(sinks[0].value, 1.0);
    assert!((sinks[1].value - 2.0).abs() < 1e-9);

    // Published, so evaluated every tick: seeded at tick 1, two ticks behind.
    assert!((sinks[2].value - 1.6).abs() < 1e-9);
    let mut published: Vec<(String, Epoch, f64)> = Vec::new();
    graph.publish(&mut published);
    assert!(published.iter().any(|(name, _, v)| name == "lagged" && (v - 1.6).abs() < 1e-9));

    graph.set_input_by_name("speed", 0.0).unwrap();
    graph.tick(11).unwrap();
    assert!((graph.output_by_name("distance").unwrap() - 2.0).abs() < 1e-9);
}

#[test]
fn cycle_surfaces_as_graph_error() {
    let yaml = r#"
version: 1
name: Loop with a cycle
nodes:
  - id: a
    kind: { type: Gain, k: 1.0 }
    inputs: [c]
  - id: b
    kind: { type: Gain, k: 1.0 }
    inputs: [a]
  - id: c
    kind: { type: Gain, k: 1.0 }
    inputs: [b]
sinks: [c]
"#;
    let def = from_yaml_str(yaml).unwrap();
    let err = compile(&def).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Graph(GraphError::CycleDetected { .. })
    ));
}

#[test]
fn rate_sets_the_default_period() {
    let yaml = r#"
version: 1
name: Rate
rate_hz: 20
nodes:
  - id: one
    kind: { type: Constant, value: 1.0 }
  - id: sum
    kind: { type: Integrator }
    inputs: [one]
sinks: [sum]
"#;
    let mut compiled = compile(&from_yaml_str(yaml).unwrap()).unwrap();
    let graph = &mut compiled.graph;
    assert_eq!(graph.node(graph.roots()[0]).unwrap().period().seconds(), 0.05);
    assert!((graph.tick(1).unwrap()[0].value - 0.05).abs() < 1e-12);
}

#[test]
fn profile_node_from_yaml() {
    let yaml = r#"
version: 1
name: Lift
period_s: 0.1
nodes:
  - id: lift
    kind: { type: Profile, max_velocity: 1.0, time_to_max_velocity: 0.2, goal: 1.0 }
sinks: [lift]
"#;
    let mut compiled = compile(&from_yaml_str(yaml).unwrap()).unwrap();
    let graph = &mut compiled.graph;
    let mut last = 0.0;
    for epoch in 1..=15_u64 {
        let position = graph.tick(epoch).unwrap()[0].value;
        assert!(position >= last);
        last = position;
    }
    assert_eq!(last, 1.0);

    graph.set_goal_by_name("lift", 0.0).unwrap();
    for epoch in 16..=30_u64 {
        last = graph.tick(epoch).unwrap()[0].value;
    }
    assert_eq!(last, 0.0);
}

#[test]
fn zero_node_period_rejected() {
    let yaml = r#"
version: 1
name: Bad period
nodes:
  - id: x
    kind: { type: Constant, value: 1.0 }
  - id: d
    kind: { type: Differentiator }
    inputs: [x]
    period_s: 0.0
sinks: [d]
"#;
    // Periods are checked as the file is read.
    assert!(matches!(from_yaml_str(yaml), Err(ProjectError::Yaml(_))));
}

#[test]
fn unknown_kind_is_a_yaml_error() {
    let yaml = r#"
version: 1
name: Unknown
nodes:
  - id: x
    kind: { type: Teleporter }
sinks: [x]
"#;
    assert!(matches!(from_yaml_str(yaml), Err(ProjectError::Yaml(_))));
}

#[test]
fn heading_hold_demo_runs() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/heading_hold.yaml");
    let def = cg_project::load(&path).unwrap();
    let mut compiled = compile(&def).unwrap();
    assert_eq!(compiled.published, vec!["turn", "turn_lagged", "error"]);

    let graph = &mut compiled.graph;
    let sinks = graph.tick(1).unwrap().to_vec();
    assert_eq!(sinks[0].value, 0.8);
    assert_eq!(sinks[1].value, 0.0);

    // 90 - 350 wraps to the short way round.
    assert!((graph.output_by_name("error").unwrap() - 100.0).abs() < 1e-9);
    assert_eq!(graph.in_tolerance(graph.find("error").unwrap()), Ok(false));

    graph.tick(2).unwrap();
    let sinks = graph.tick(3).unwrap();
    assert_eq!(sinks[1].value, 0.8);
}
