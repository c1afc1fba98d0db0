use cg_core::Period;
use cg_nodes::{InputRange, Sign, TrapezoidProfile};
use cg_project::schema::*;
use cg_project::{LATEST_VERSION, load, load_json, load_yaml, save_json, save_yaml};

fn heading_loop() -> LoopDef {
    LoopDef {
        version: LATEST_VERSION,
        name: "Heading hold".to_string(),
        period_s: Some(Period::new(0.02).unwrap()),
        rate_hz: None,
        nodes: vec![
            NodeDef {
                id: "target".to_string(),
                kind: NodeKindDef::Input { initial: 90.0 },
                inputs: vec![],
                period_s: None,
                publish: false,
            },
            NodeDef {
                id: "gyro".to_string(),
                kind: NodeKindDef::Input { initial: 0.0 },
                inputs: vec![],
                period_s: None,
                publish: true,
            },
            NodeDef {
                id: "error".to_string(),
                kind: NodeKindDef::Summer {
                    signs: vec![Sign::Plus, Sign::Minus],
                    continuous: Some(InputRange {
                        min: 0.0,
                        max: 360.0,
                    }),
                    tolerance: None,
                },
                inputs: vec!["target".to_string(), "gyro".to_string()],
                period_s: None,
                publish: true,
            },
            NodeDef {
                id: "turn".to_string(),
                kind: NodeKindDef::Pid {
                    kp: 0.02,
                    ki: 0.0,
                    kd: 0.001,
                    out_min: Some(-1.0),
                    out_max: Some(1.0),
                },
                inputs: vec!["error".to_string()],
                period_s: Some(Period::new(0.01).unwrap()),
                publish: false,
            },
            NodeDef {
                id: "turn_rate_limit".to_string(),
                kind: NodeKindDef::Profile(
                    TrapezoidProfile::new(30.0, 0.5).with_start(90.0).with_goal(180.0),
                ),
                inputs: vec![],
                period_s: None,
                publish: true,
            },
        ],
        sinks: vec!["turn".to_string()],
    }
}

#[test]
fn roundtrip_yaml() {
    let def = heading_loop();
    let path = std::env::temp_dir().join("cg_project_roundtrip.yaml");

    save_yaml(&path, &def).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(def, loaded);

    let by_extension = load(&path).unwrap();
    assert_eq!(def, by_extension);
}

#[test]
fn roundtrip_json() {
    let def = heading_loop();
    let path = std::env::temp_dir().join("cg_project_roundtrip.json");

    save_json(&path, &def).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(def, loaded);
}

#[test]
fn save_rejects_invalid_definition() {
    let mut def = heading_loop();
    def.sinks = vec!["missing".to_string()];
    let path = std::env::temp_dir().join("cg_project_invalid.yaml");
    assert!(save_yaml(&path, &def).is_err());
}
