//! Tests for the Expression parsing and evaluation

use simparams_rs::parameters::expression::{
    EvaluationContext, Expression, ExpressionError, SimpleContext,
};
use simparams_rs::parameters::{Entry, Parameters, ParametersVector};
use std::collections::HashMap;

#[test]
fn test_expression_parsing() {
    // Test parsing simple expressions
    let expr = Expression::parse("42").unwrap();
    assert!(expr.variables().is_empty());

    let expr = Expression::parse("x + y").unwrap();
    assert_eq!(expr.variables(), vec!["x", "y"]);

    let expr = Expression::parse("x^2").unwrap();
    assert_eq!(expr.variables().len(), 1);

    // Test parsing complex expressions
    let expr = Expression::parse("sin(x) + cos(y)").unwrap();
    assert_eq!(expr.variables().len(), 2);

    let expr = Expression::parse("max(a, b, c)").unwrap();
    assert_eq!(expr.variables().len(), 3);

    let expr = Expression::parse("(x + y) * (z - 1) / w").unwrap();
    assert_eq!(expr.variables().len(), 4);

    // Test parsing expressions with whitespace
    let expr = Expression::parse("  (  x  +  y  )  *  z  ").unwrap();
    assert_eq!(expr.variables().len(), 3);

    // Test parsing expressions with negative numbers
    let expr = Expression::parse("-2 * x").unwrap();
    assert_eq!(expr.variables().len(), 1);

    // Test parsing invalid expressions
    assert!(Expression::parse("").is_err());
    assert!(Expression::parse("x +").is_err());
    assert!(Expression::parse("x + (y").is_err());
    assert!(Expression::parse("@#$%").is_err());
}

#[test]
fn test_path_variables() {
    // Field paths are single variables, in either index spelling
    let expr = Expression::parse("plasma.ip * 2 + layers[0].thickness - layers.1.thickness").unwrap();
    assert_eq!(
        expr.variables(),
        vec!["layers.1.thickness", "layers[0].thickness", "plasma.ip"]
    );

    let expr = Expression::parse("sqrt(coils[2].current)").unwrap();
    assert_eq!(expr.variables(), vec!["coils[2].current"]);

    // Scientific notation is a number, not a path
    let expr = Expression::parse("1.5e-3 * a.b").unwrap();
    assert_eq!(expr.variables(), vec!["a.b"]);
}

#[test]
fn test_expression_evaluation_simple() {
    let mut context = SimpleContext::new();
    context.set_variable("x", 2.0);
    context.set_variable("y", 3.0);

    let cases = [
        ("42", 42.0),
        ("x", 2.0),
        ("-x", -2.0),
        ("x + y", 5.0),
        ("x - y", -1.0),
        ("x * y", 6.0),
        ("y / x", 1.5),
        ("x^2", 4.0),
        ("2 * (x + y)", 10.0),
        ("(x + y) * (x - y)", -5.0),
        ("x^2 + y^2", 13.0),
        // Left associative
        ("12 / x / y", 2.0),
        ("10 - x - y", 5.0),
        // Power is right associative and binds tighter than unary minus
        ("2^y^2", 512.0),
        ("-x^2", -4.0),
    ];
    for (source, expected) in cases {
        let expr = Expression::parse(source).unwrap();
        assert_eq!(expr.evaluate(&context).unwrap(), expected, "{source}");
    }
}

#[test]
fn test_expression_evaluation_functions() {
    let mut context = SimpleContext::new();
    context.set_variable("x", 2.0);
    context.set_variable("y", 3.0);
    context.set_variable("z", 4.0);

    let expr = Expression::parse("sin(x)").unwrap();
    assert!((expr.evaluate(&context).unwrap() - f64::sin(2.0)).abs() < 1e-10);

    let expr = Expression::parse("log(y)").unwrap();
    assert!((expr.evaluate(&context).unwrap() - f64::ln(3.0)).abs() < 1e-10);

    let expr = Expression::parse("log10(z)").unwrap();
    assert!((expr.evaluate(&context).unwrap() - f64::log10(4.0)).abs() < 1e-10);

    let expr = Expression::parse("sqrt(z)").unwrap();
    assert!((expr.evaluate(&context).unwrap() - 2.0).abs() < 1e-10);

    let expr = Expression::parse("abs(-x)").unwrap();
    assert!((expr.evaluate(&context).unwrap() - 2.0).abs() < 1e-10);

    // Test evaluating functions with multiple arguments
    let expr = Expression::parse("max(x, y, z)").unwrap();
    assert_eq!(expr.evaluate(&context).unwrap(), 4.0);

    let expr = Expression::parse("min(x, y, z)").unwrap();
    assert_eq!(expr.evaluate(&context).unwrap(), 2.0);

    let expr = Expression::parse("sin(x)^2 + cos(x)^2").unwrap();
    assert!((expr.evaluate(&context).unwrap() - 1.0).abs() < 1e-10);
}

#[test]
fn test_expression_evaluation_errors() {
    let mut context = SimpleContext::new();
    context.set_variable("x", 2.0);

    // Test undefined variable
    match Expression::parse("y").unwrap().evaluate(&context) {
        Err(ExpressionError::UndefinedVariable { name }) => assert_eq!(name, "y"),
        _ => panic!("Expected UndefinedVariable error"),
    }

    // Test division by zero
    match Expression::parse("x / 0").unwrap().evaluate(&context) {
        Err(ExpressionError::DivisionByZero) => {}
        _ => panic!("Expected DivisionByZero error"),
    }

    // Test undefined function
    match Expression::parse("unknown_func(x)").unwrap().evaluate(&context) {
        Err(ExpressionError::UndefinedFunction { name }) => assert_eq!(name, "unknown_func"),
        _ => panic!("Expected UndefinedFunction error"),
    }

    // Test invalid function arguments
    match Expression::parse("sin(x, x)").unwrap().evaluate(&context) {
        Err(ExpressionError::InvalidOperation { .. }) => {}
        _ => panic!("Expected InvalidOperation error"),
    }
    match Expression::parse("max(x)").unwrap().evaluate(&context) {
        Err(ExpressionError::InvalidOperation { .. }) => {}
        _ => panic!("Expected InvalidOperation error"),
    }
}

#[test]
fn test_expression_context_implementations() {
    // HashMap context
    let mut values = HashMap::new();
    values.insert("a".to_string(), 4.0);
    assert_eq!(values.get_variable("a").unwrap(), 4.0);
    assert!(values.get_variable("b").is_err());

    // A parameter container resolves variables as field paths
    let layer = Parameters::new("layer")
        .with("thickness", Entry::new::<f64>("m", "Thickness").with_default(0.2).unwrap())
        .unwrap()
        .with("name", Entry::new::<String>("-", "Name").with_default("fw").unwrap())
        .unwrap();
    let params = Parameters::new("root")
        .with("n", Entry::new::<i64>("-", "Count").with_default(3).unwrap())
        .unwrap()
        .with("unset", Entry::new::<f64>("-", "Unset"))
        .unwrap()
        .with("layers", ParametersVector::with_len(layer, 2))
        .unwrap();

    assert_eq!(params.get_variable("n").unwrap(), 3.0);
    assert_eq!(params.get_variable("layers.1.thickness").unwrap(), 0.2);

    let expr = Expression::parse("n * layers[0].thickness").unwrap();
    assert!((expr.evaluate(&params).unwrap() - 0.6).abs() < 1e-12);

    // Unset, non-numeric, missing and container paths are all undefined
    for name in ["unset", "layers[0].name", "layers[2].thickness", "layers"] {
        assert!(matches!(
            params.get_variable(name),
            Err(ExpressionError::UndefinedVariable { .. })
        ));
    }
}
