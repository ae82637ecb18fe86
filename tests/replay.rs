use std::fs;
use std::path::PathBuf;

use x4sim::{
    replay::{self, StepOutcome, Trace},
    BuildingKind, GameConfig, TilePos,
};

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

#[test]
fn bundled_scenarios_load() {
    let standard = GameConfig::load(repo_path("scenarios/standard.yaml")).unwrap();
    assert_eq!(standard.name, "standard");
    assert_eq!(standard.hazards.chance_per_turn, 0.15);

    let tiny = GameConfig::load(repo_path("scenarios/tiny.yaml")).unwrap();
    assert_eq!(tiny.map.width, 3);
    assert_eq!(tiny.turns.max_turns, 5);
}

#[test]
fn opening_trace_replays_on_tiny_map() {
    let config = GameConfig::load(repo_path("scenarios/tiny.yaml")).unwrap();
    let trace = Trace::load(repo_path("traces/opening.yaml")).unwrap();
    let replay = replay::run(config, &trace).unwrap();

    assert!(replay.outcomes[..4]
        .iter()
        .all(|outcome| !outcome.is_rejected()));
    assert!(matches!(replay.outcomes[3], StepOutcome::Advanced(_)));
    assert_eq!(replay.state.turn(), 3);
    assert_eq!(
        replay.state.tile(TilePos::new(1, 1)).and_then(|t| t.building),
        Some(BuildingKind::Farm)
    );
}

#[test]
fn json_and_yaml_traces_agree() {
    let dir = tempfile::tempdir().unwrap();
    let yaml_path = dir.path().join("trace.yaml");
    let json_path = dir.path().join("trace.json");
    fs::write(
        &yaml_path,
        "- action_type: explore\n  target_x: 1\n  target_y: 1\n- action_type: end_turn\n",
    )
    .unwrap();
    fs::write(
        &json_path,
        r#"[{"action_type": "explore", "target_x": 1, "target_y": 1}, {"action_type": "end_turn"}]"#,
    )
    .unwrap();

    let from_yaml = Trace::load(&yaml_path).unwrap();
    let from_json = Trace::load(&json_path).unwrap();
    assert_eq!(from_yaml, from_json);
}

#[test]
fn unreadable_trace_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "- action_type: [unclosed").unwrap();

    let err = Trace::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.yaml"));
}

#[test]
fn outcomes_serialize_for_reporting() {
    let mut trace = Trace::default();
    trace.push(x4sim::ActionRequest::explore(7, 7));
    let replay = replay::run(GameConfig::default(), &trace).unwrap();

    let json = serde_json::to_value(&replay.outcomes).unwrap();
    assert_eq!(json[0]["outcome"], "rejected");
    assert_eq!(json[0]["detail"]["kind"], "invalid_target");
}
