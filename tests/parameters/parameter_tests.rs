//! Integration tests for Entry and Switch leaves
//!
//! These tests verify typing, defaults, switch membership and optimization
//! specs on single leaves.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use simparams_rs::parameters::{
    Distribution, Entry, OptSpec, Parameter, Switch, SwitchOption, Value, ValueKind,
};
use simparams_rs::SimParamsError;

#[test]
fn test_entry_lifecycle() {
    // Declared without a default, the leaf is not set
    let mut param = Parameter::from(Entry::new::<f64>("MW", "Fusion power"));
    assert_eq!(param.kind(), ValueKind::Float);
    assert_eq!(param.units(), "MW");
    assert_eq!(param.description(), "Fusion power");
    assert!(!param.is_set());
    assert!(matches!(param.get(), Err(SimParamsError::NotSet { .. })));

    // Set a value
    param.set(500.0).unwrap();
    assert!(param.is_set());
    assert_eq!(param.get_as::<f64>().unwrap(), 500.0);

    // Ints widen into Float leaves
    param.set(450).unwrap();
    assert_eq!(param.value(), Some(&Value::Float(450.0)));

    // Wrong type is rejected and the previous value kept
    assert!(matches!(
        param.set("high"),
        Err(SimParamsError::BadParameter { .. })
    ));
    assert!(param.set(f64::NAN).is_err());
    assert_eq!(param.get_as::<f64>().unwrap(), 450.0);

    // Unset falls back to the default, here none
    param.unset();
    assert!(param.effective().is_none());
}

#[test]
fn test_defaults_and_modification() {
    let mut param = Parameter::from(
        Entry::new::<i64>("-", "Number of coils")
            .with_default(18)
            .unwrap(),
    );
    assert_eq!(param.get_as::<i64>().unwrap(), 18);
    assert!(!param.is_modified());

    // Setting the default value explicitly is not a modification
    param.set(18).unwrap();
    assert!(!param.is_modified());

    param.set(16).unwrap();
    assert!(param.is_modified());

    // Floats do not narrow into Int leaves
    assert!(param.set(16.5).is_err());

    param.set_new_base();
    assert_eq!(param.default_value(), Some(&Value::Int(16)));
    assert!(!param.is_modified());

    // Defaults go through the same checks as values
    assert!(param.set_default(Some(Value::from("x"))).is_err());
    param.set_default(None).unwrap();
    assert_eq!(param.get_as::<i64>().unwrap(), 16);
}

#[test]
fn test_switch_options() {
    let switch = Switch::new(
        [
            (1, SwitchOption::new("Single null", "One X-point")),
            (2, SwitchOption::new("Double null", "Two X-points")),
        ],
        "-",
        "Divertor configuration",
    )
    .unwrap()
    .with_default(1)
    .unwrap();

    assert_eq!(switch.option_keys(), vec![&Value::Int(1), &Value::Int(2)]);
    assert_eq!(
        switch.option(&Value::Int(2)).unwrap().label,
        "Double null"
    );
    assert!(switch.option(&Value::Int(3)).is_none());

    let mut param = Parameter::from(switch);
    assert!(param.as_switch().is_some());
    param.set(2).unwrap();
    assert!(matches!(
        param.set(3),
        Err(SimParamsError::BadParameter { .. })
    ));
    assert_eq!(param.get_as::<i64>().unwrap(), 2);
}

#[test]
fn test_switch_declaration_errors() {
    // Empty option set
    let empty: [(&str, SwitchOption); 0] = [];
    assert!(Switch::new(empty, "-", "nothing").is_err());

    // Duplicate keys
    assert!(Switch::from_keys(["a", "b", "a"], "-", "dup").is_err());

    // Mixed kinds
    assert!(Switch::with_kind(
        ValueKind::Str,
        [
            (Value::from("a"), SwitchOption::new("A", "")),
            (Value::Int(1), SwitchOption::new("One", "")),
        ],
        "-",
        "mixed",
    )
    .is_err());

    // Default must be one of the options
    assert!(Switch::from_keys(["on", "off"], "-", "state")
        .unwrap()
        .with_default("maybe")
        .is_err());
}

#[test]
fn test_range_spec_on_leaf() {
    let mut param = Parameter::from(
        Entry::new::<f64>("K", "Coolant temperature")
            .with_default(300.0)
            .unwrap()
            .with_opt(OptSpec::range(250.0, 350.0).unwrap())
            .unwrap(),
    );
    assert_eq!(param.bounds(), Some((250.0, 350.0)));
    assert_eq!(param.nominal(), Some(&Value::Float(300.0)));

    // Explicit values must respect the range
    assert!(param.set(400.0).is_err());
    param.set(260.0).unwrap();

    // A spec that excludes the current value cannot be attached
    assert!(param
        .set_opt(Some(OptSpec::range(0.0, 100.0).unwrap()))
        .is_err());
    assert_eq!(param.bounds(), Some((250.0, 350.0)));

    // Range specs only fit numeric leaves
    assert!(Entry::new::<String>("-", "name")
        .with_opt(OptSpec::range(0.0, 1.0).unwrap())
        .is_err());
    assert!(OptSpec::range(1.0, 0.0).is_err());
}

#[test]
fn test_choice_spec_on_switch() {
    let switch = Switch::from_keys(["steel", "tungsten", "beryllium"], "-", "Material").unwrap();

    // Choices must be option keys
    assert!(switch
        .clone()
        .with_opt(OptSpec::choice(["steel", "copper"]).unwrap())
        .is_err());

    let mut param = Parameter::from(
        switch
            .with_opt(OptSpec::choice(["steel", "tungsten"]).unwrap())
            .unwrap(),
    );
    param.set("tungsten").unwrap();
    // A registered option outside the choice set is still rejected
    assert!(param.set("beryllium").is_err());

    assert!(OptSpec::choice(Vec::<Value>::new()).is_err());
}

#[test]
fn test_switch_rejects_continuous_specs() {
    let switch = Switch::from_keys([1, 2, 5], "-", "Divertor legs").unwrap();

    // Draws between option keys could never be assigned
    assert!(switch
        .clone()
        .with_opt(OptSpec::range(1.0, 5.0).unwrap())
        .is_err());
    assert!(switch
        .clone()
        .with_opt(
            OptSpec::distribution(Distribution::Uniform {
                low: 1.0,
                high: 5.0
            })
            .unwrap()
        )
        .is_err());

    let mut param = Parameter::from(switch.with_opt(OptSpec::choice([1, 5]).unwrap()).unwrap());
    assert!(matches!(
        param.set_opt(Some(OptSpec::range(1.0, 5.0).unwrap())),
        Err(SimParamsError::BadParameter { .. })
    ));

    // The choice spec stayed in place and every draw is an option key
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for _ in 0..20 {
        assert!(param.randomize(&mut rng).unwrap());
        let k = param.get_as::<i64>().unwrap();
        assert!(k == 1 || k == 5);
    }
}

#[test]
fn test_sampling() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let mut uniform = Parameter::from(
        Entry::new::<i64>("-", "Coils")
            .with_opt(OptSpec::range(4.0, 8.0).unwrap())
            .unwrap(),
    );
    for _ in 0..50 {
        assert!(uniform.randomize(&mut rng).unwrap());
        let n = uniform.get_as::<i64>().unwrap();
        assert!((4..=8).contains(&n));
    }

    let normal = Parameter::from(
        Entry::new::<f64>("MW", "Power")
            .with_opt(
                OptSpec::distribution(Distribution::Normal {
                    mean: 500.0,
                    std: 1.0,
                })
                .unwrap(),
            )
            .unwrap(),
    );
    let x = normal.sample(&mut rng).unwrap().as_f64().unwrap();
    assert!((480.0..520.0).contains(&x));

    // Nothing to sample without an independent spec
    let mut fixed = Parameter::from(Entry::new::<f64>("-", "fixed").with_default(1.0).unwrap());
    assert!(!fixed.randomize(&mut rng).unwrap());
    let mut derived = Parameter::from(
        Entry::new::<f64>("-", "derived")
            .with_opt(OptSpec::function("2 * x").unwrap())
            .unwrap(),
    );
    assert!(!derived.randomize(&mut rng).unwrap());

    // Invalid distribution parameters are rejected up front
    assert!(OptSpec::distribution(Distribution::Normal {
        mean: 0.0,
        std: -1.0
    })
    .is_err());
}

#[test]
fn test_array_entry() {
    let mut param = Parameter::from(Entry::new::<Vec<f64>>("m", "Outline"));
    param.set(vec![1.0, 2.0, 3.0]).unwrap();
    assert_eq!(param.get_as::<Vec<f64>>().unwrap(), vec![1.0, 2.0, 3.0]);
    assert!(param.set(vec![1.0, f64::INFINITY]).is_err());
    assert!(param.set(1.0).is_err());
}
