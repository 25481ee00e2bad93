//! Tests for saving and loading parameter trees as JSON and YAML files

use simparams_rs::parameters::{
    Entry, MappingStyle, OptSpec, ParameterTree, Parameters, ParametersVector, Switch,
    Value,
};
use simparams_rs::SimParamsError;
use tempfile::tempdir;

fn build() -> ParameterTree {
    let stage = Parameters::new("stage")
        .with("gain", Entry::new::<f64>("-", "Stage gain").with_default(1.0).unwrap())
        .unwrap()
        .with("taps", Entry::new::<Vec<f64>>("-", "Filter taps"))
        .unwrap();
    let root = Parameters::new("amplifier")
        .with("label", Entry::new::<String>("-", "Run label").with_default("nominal").unwrap())
        .unwrap()
        .with("enabled", Entry::new::<bool>("-", "Amplifier on").with_default(true).unwrap())
        .unwrap()
        .with(
            "mode",
            Switch::from_keys(["linear", "saturated"], "-", "Operating mode")
                .unwrap()
                .with_default("linear")
                .unwrap(),
        )
        .unwrap()
        .with(
            "samples",
            Entry::new::<i64>("-", "Samples per window")
                .with_default(256)
                .unwrap()
                .with_opt(OptSpec::range(64.0, 1024.0).unwrap())
                .unwrap(),
        )
        .unwrap()
        .with("stages", ParametersVector::with_len(stage, 1))
        .unwrap();
    ParameterTree::new(root).unwrap()
}

fn modified() -> ParameterTree {
    let mut tree = build();
    tree.apply_overrides([
        ("label", Value::from("scan 3")),
        ("enabled", false.into()),
        ("mode", "saturated".into()),
        ("samples", 512.into()),
        ("stages[0].taps", vec![0.25, 0.5, 0.25].into()),
    ])
    .unwrap();
    tree.push("stages", stage_with_gain(2.0)).unwrap();
    tree
}

fn stage_with_gain(gain: f64) -> Parameters {
    Parameters::new("stage")
        .with("gain", Entry::new::<f64>("-", "Stage gain").with_value(gain).unwrap())
        .unwrap()
        .with("taps", Entry::new::<Vec<f64>>("-", "Filter taps"))
        .unwrap()
}

#[test]
fn test_json_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("amplifier.json");

    let source = modified();
    source.save_json(&path).unwrap();

    let mut target = build();
    target.load_json(&path).unwrap();
    assert_eq!(target.to_mapping(), source.to_mapping());
    assert_eq!(target.get::<f64>("stages[1].gain").unwrap(), 2.0);
    assert_eq!(target.get::<i64>("samples").unwrap(), 512);
}

#[cfg(feature = "yaml")]
#[test]
fn test_yaml_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("amplifier.yaml");

    let source = modified();
    source.save_yaml(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("mode: saturated"));

    let mut target = build();
    target.load_yaml(&path).unwrap();
    assert_eq!(target.to_mapping(), source.to_mapping());
    assert_eq!(target.get::<Vec<f64>>("stages[0].taps").unwrap(), vec![0.25, 0.5, 0.25]);
}

#[test]
fn test_detailed_json_keeps_defaults() {
    let source = modified();
    let text = source.to_json_string_with(MappingStyle::Detailed).unwrap();
    assert!(text.contains("\"units\""));
    assert!(text.contains("range [64, 1024]"));

    let mut target = build();
    target.from_json_str(&text).unwrap();
    assert_eq!(target.diff_from_default(), source.diff_from_default());
}

#[test]
fn test_load_rejects_unknown_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"label": "x", "gain": 2.0}"#).unwrap();

    let mut tree = build();
    let snapshot = tree.clone();
    match tree.load_json(&path) {
        Err(SimParamsError::InexistentField { path }) => assert_eq!(path, "gain"),
        other => panic!("Expected InexistentField error, got {other:?}"),
    }
    assert_eq!(tree, snapshot);
}

#[test]
fn test_load_errors() {
    let dir = tempdir().unwrap();
    let mut tree = build();

    // Missing file
    assert!(matches!(
        tree.load_json(dir.path().join("missing.json")),
        Err(SimParamsError::Io(_))
    ));

    // Malformed JSON
    assert!(matches!(
        tree.from_json_str("{\"label\": "),
        Err(SimParamsError::Json(_))
    ));

    // Top level must be a mapping
    assert!(matches!(
        tree.from_json_str("[1, 2, 3]"),
        Err(SimParamsError::BadParameter { .. })
    ));

    // Value outside the range spec
    assert!(tree.from_json_str(r#"{"samples": 4096}"#).is_err());
    assert_eq!(tree.get::<i64>("samples").unwrap(), 256);
}
