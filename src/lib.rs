//! # simparams-rs
//!
//! `simparams-rs` is a library for declaring simulation parameters as a typed,
//! hierarchical schema, with units and descriptions on every leaf.
//!
//! The library provides:
//! - Typed leaf parameters (free entries and labeled switches) with defaults
//! - Nested containers and vectors of containers with fixed schemas
//! - Lossless conversion to ordered mappings, JSON and YAML
//! - Optimization specs that let an optimizer treat the tree as a flat vector
//!
//! ## Basic Usage
//!
//! ```
//! use simparams_rs::parameters::{Entry, ParameterTree, Parameters};
//!
//! let root = Parameters::new("plasma")
//!     .with("ip", Entry::new::<f64>("MA", "Plasma current").with_default(15.0).unwrap())
//!     .unwrap();
//! let mut tree = ParameterTree::new(root).unwrap();
//!
//! tree.set_field("ip", 12.0).unwrap();
//! assert_eq!(tree.diff_from_default().len(), 1);
//! ```

// Public modules
pub mod error;

// Parameter system
pub mod parameters;

// Re-exports for convenience
pub use error::{Result, SimParamsError};
pub use parameters::{Entry, OptSpec, ParameterTree, Parameters, ParametersVector, Switch};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
