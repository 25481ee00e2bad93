//! Integration tests for the parameter system
//!
//! These tests verify that the parameter system behaves correctly in various scenarios.

// Tests for Entry and Switch leaves
mod parameter_tests;

// Tests for the Parameters container and ParametersVector
mod parameters_tests;


// Tests for JSON and YAML files
mod serialization_tests;

// Tests for the Expression parsing and evaluation
mod expression_tests;
