//! Integration tests for the Parameters container and ParametersVector
//!
//! These tests verify path addressing, the mapping codec and vector schemas.

use serde_json::json;
use simparams_rs::parameters::{
    Entry, Field, Mapping, MappingStyle, Node, Parameters, ParametersVector, Switch, Value,
};
use simparams_rs::SimParamsError;

fn mapping(value: serde_json::Value) -> Mapping {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn coil() -> Parameters {
    Parameters::new("coil")
        .with("current", Entry::new::<f64>("MA", "Coil current").with_default(10.0).unwrap())
        .unwrap()
        .with(
            "conductor",
            Switch::from_keys(["nb3sn", "nbti"], "-", "Conductor").unwrap(),
        )
        .unwrap()
}

fn machine() -> Parameters {
    let plasma = Parameters::new("plasma")
        .with("ip", Entry::new::<f64>("MA", "Plasma current").with_default(15.0).unwrap())
        .unwrap()
        .with("elongation", Entry::new::<f64>("-", "Elongation"))
        .unwrap();
    Parameters::new("machine")
        .with("name", Entry::new::<String>("-", "Case name").with_default("baseline").unwrap())
        .unwrap()
        .with("plasma", plasma)
        .unwrap()
        .with("coils", ParametersVector::with_len(coil(), 2))
        .unwrap()
}

#[test]
fn test_parameters_basic_operations() {
    let mut params = Parameters::new("empty");
    assert!(params.is_empty());

    params.add("x", Entry::new::<f64>("-", "x")).unwrap();
    assert_eq!(params.len(), 1);
    assert!(params.contains("x"));

    // Duplicate and malformed names
    assert!(params.add("x", Entry::new::<f64>("-", "x again")).is_err());
    assert!(params.add("1x", Entry::new::<f64>("-", "bad")).is_err());
    assert!(params.add("a.b", Entry::new::<f64>("-", "bad")).is_err());

    let params = machine();
    let names: Vec<&String> = params.names().collect();
    assert_eq!(names, vec!["name", "plasma", "coils"]);
    assert!(matches!(params.field("plasma"), Some(Field::Group(_))));
    assert!(matches!(params.field("coils"), Some(Field::List(_))));
}

#[test]
fn test_path_addressing() {
    let mut params = machine();

    // Both index spellings address the same element
    params.set_field("coils.1.current", 12.0).unwrap();
    assert_eq!(params.get::<f64>("coils[1].current").unwrap(), 12.0);
    assert_eq!(params.get::<f64>("coils[0].current").unwrap(), 10.0);

    match params.get_field("plasma").unwrap() {
        Node::Group(group) => assert_eq!(group.name(), "plasma"),
        _ => panic!("Expected a container"),
    }
    match params.get_field("coils").unwrap() {
        Node::List(list) => assert_eq!(list.len(), 2),
        _ => panic!("Expected a vector"),
    }

    // Unknown field reports the full path
    match params.get_field("plasma.beta") {
        Err(SimParamsError::InexistentField { path }) => assert_eq!(path, "plasma.beta"),
        _ => panic!("Expected InexistentField error"),
    }

    // Out-of-range index
    match params.get_field("coils[5].current") {
        Err(SimParamsError::IndexOutOfRange { path, index, len }) => {
            assert_eq!(path, "coils");
            assert_eq!(index, 5);
            assert_eq!(len, 2);
        }
        _ => panic!("Expected IndexOutOfRange error"),
    }

    // Unset leaf
    match params.value("plasma.elongation") {
        Err(SimParamsError::NotSet { path }) => assert_eq!(path, "plasma.elongation"),
        _ => panic!("Expected NotSet error"),
    }

    // Assigning to a container is an error
    assert!(matches!(
        params.set_field("plasma", 1.0),
        Err(SimParamsError::BadParameter { .. })
    ));

    // Switch membership carries the leaf path
    match params.set_field("coils[0].conductor", "copper") {
        Err(SimParamsError::BadParameter { path, .. }) => assert_eq!(path, "coils[0].conductor"),
        _ => panic!("Expected BadParameter error"),
    }
}

#[test]
fn test_to_mapping() {
    let mut params = machine();
    params.set_field("coils[1].conductor", "nbti").unwrap();

    assert_eq!(
        serde_json::Value::Object(params.to_mapping()),
        json!({
            "name": "baseline",
            "plasma": {"ip": 15.0, "elongation": null},
            "coils": [
                {"current": 10.0, "conductor": null},
                {"current": 10.0, "conductor": "nbti"}
            ]
        })
    );

    // Declaration order is kept
    let mapping = params.to_mapping();
    let keys: Vec<&String> = mapping.keys().collect();
    assert_eq!(keys, vec!["name", "plasma", "coils"]);

    let detailed = params.to_mapping_with(MappingStyle::Detailed);
    assert_eq!(
        detailed["plasma"]["ip"],
        json!({
            "value": null,
            "default": 15.0,
            "units": "MA",
            "description": "Plasma current"
        })
    );
}

#[test]
fn test_from_mapping_partial_update() {
    let mut params = machine();
    params
        .from_mapping(&mapping(json!({"plasma": {"elongation": 1.7}})))
        .unwrap();

    // Only the given field changed
    assert_eq!(params.get::<f64>("plasma.elongation").unwrap(), 1.7);
    assert_eq!(params.get::<f64>("plasma.ip").unwrap(), 15.0);
    assert_eq!(params.get::<String>("name").unwrap(), "baseline");

    // null unsets
    params
        .from_mapping(&mapping(json!({"plasma": {"elongation": null}})))
        .unwrap();
    assert!(params.value("plasma.elongation").is_err());

    // Detailed bundles are accepted too
    params
        .from_mapping(&mapping(json!({"plasma": {"ip": {"value": 12.0, "default": 14.0}}})))
        .unwrap();
    assert_eq!(params.get::<f64>("plasma.ip").unwrap(), 12.0);
    params.set_field("plasma.ip", 14.0).unwrap();
    assert!(params.diff_from_default().is_empty());
}

#[test]
fn test_from_mapping_errors_leave_container_untouched() {
    let mut params = machine();
    let snapshot = params.clone();

    // Unknown key, reported with its full path
    match params.from_mapping(&mapping(json!({"name": "x", "plasma": {"beta": 1.0}}))) {
        Err(SimParamsError::InexistentField { path }) => assert_eq!(path, "plasma.beta"),
        other => panic!("Expected InexistentField error, got {other:?}"),
    }

    // Type mismatch
    assert!(matches!(
        params.from_mapping(&mapping(json!({"plasma": {"ip": "large"}}))),
        Err(SimParamsError::BadParameter { .. })
    ));

    // Container given a scalar
    assert!(params.from_mapping(&mapping(json!({"plasma": 3.0}))).is_err());

    // Unknown bundle key
    match params.from_mapping(&mapping(json!({"plasma": {"ip": {"value": 1.0, "unit": "A"}}}))) {
        Err(SimParamsError::InexistentField { path }) => assert_eq!(path, "plasma.ip.unit"),
        other => panic!("Expected InexistentField error, got {other:?}"),
    }

    assert_eq!(params, snapshot);
}

#[test]
fn test_from_mapping_resizes_vectors() {
    let mut params = machine();
    params
        .from_mapping(&mapping(json!({
            "coils": [{"current": 8.0}, {}, {"conductor": "nb3sn"}]
        })))
        .unwrap();

    match params.get_field("coils").unwrap() {
        Node::List(list) => assert_eq!(list.len(), 3),
        _ => panic!("Expected a vector"),
    }
    assert_eq!(params.get::<f64>("coils[0].current").unwrap(), 8.0);
    // New elements start from the prototype
    assert_eq!(params.get::<f64>("coils[2].current").unwrap(), 10.0);
    assert_eq!(params.get::<String>("coils[2].conductor").unwrap(), "nb3sn");

    params.from_mapping(&mapping(json!({"coils": []}))).unwrap();
    assert!(params.get_field("coils[0]").is_err());
}

#[test]
fn test_mapping_round_trip() {
    let mut source = machine();
    source.set_field("name", "high field").unwrap();
    source.set_field("plasma.elongation", 1.85).unwrap();
    source.set_field("coils[0].conductor", "nbti").unwrap();

    for style in [MappingStyle::Values, MappingStyle::Detailed] {
        let mut target = machine();
        target.from_mapping(&source.to_mapping_with(style)).unwrap();
        assert_eq!(target.to_mapping(), source.to_mapping());
    }
}

#[test]
fn test_vector_schema() {
    let mut coils = ParametersVector::new(coil());
    assert!(coils.is_empty());

    coils.push(coils.new_element()).unwrap();
    assert_eq!(coils.len(), 1);

    // Extra field
    let wider = coil().with("spare", Entry::new::<f64>("-", "spare")).unwrap();
    assert!(matches!(
        coils.push(wider),
        Err(SimParamsError::BadParameter { .. })
    ));

    // Different leaf kind under the same name
    let retyped = Parameters::new("coil")
        .with("current", Entry::new::<i64>("MA", "Coil current"))
        .unwrap()
        .with("conductor", Switch::from_keys(["nb3sn", "nbti"], "-", "Conductor").unwrap())
        .unwrap();
    assert!(coils.append(retyped).is_err());

    // Different switch options
    let reoptioned = Parameters::new("coil")
        .with("current", Entry::new::<f64>("MA", "Coil current"))
        .unwrap()
        .with("conductor", Switch::from_keys(["rebco"], "-", "Conductor").unwrap())
        .unwrap();
    assert!(coils.append(reoptioned).is_err());

    // Values and defaults may differ, the name too
    let renamed = Parameters::new("other")
        .with("current", Entry::new::<f64>("MA", "Coil current").with_value(3.0).unwrap())
        .unwrap()
        .with("conductor", Switch::from_keys(["nb3sn", "nbti"], "-", "Conductor").unwrap())
        .unwrap();
    coils.append(renamed).unwrap();
    assert_eq!(coils.len(), 2);
    assert_eq!(coils.at(1).unwrap().get::<f64>("current").unwrap(), 3.0);
    assert!(matches!(
        coils.at(2),
        Err(SimParamsError::IndexOutOfRange { index: 2, len: 2, .. })
    ));

    assert!(coils.pop().is_some());
    coils.resize(4);
    assert_eq!(coils.len(), 4);
}

#[test]
fn test_diff_from_default() {
    let mut params = machine();
    assert!(params.diff_from_default().is_empty());

    params.set_field("plasma.ip", 17.0).unwrap();
    params.set_field("plasma.elongation", 1.7).unwrap();
    params.set_field("coils[0].current", 10.0).unwrap();

    let diff = params.diff_from_default();
    let lines: Vec<String> = diff.iter().map(|m| m.to_string()).collect();
    assert_eq!(
        lines,
        vec!["plasma.ip: 15 -> 17", "plasma.elongation: <unset> -> 1.7"]
    );
    assert_eq!(diff[0].value, Value::Float(17.0));
}
