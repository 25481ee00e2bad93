//! # Parameter System
//!
//! This module provides a hierarchical, type-enforced parameter system for
//! simulation codes. Application authors declare a tree of named parameters,
//! each with a value type, physical units, a description, an optional default
//! and optional optimization metadata, then move the whole tree between memory,
//! ordered mappings, JSON and YAML.
//!
//! ## Key Features
//!
//! - **Typed leaves**: [`Entry`] holds any value of its declared kind, [`Switch`]
//!   only one of a fixed set of labeled options; every assignment is validated
//! - **Nested schemas**: [`Parameters`] containers nest inside each other and
//!   inside [`ParametersVector`]s of identically shaped elements
//! - **Mapping codec**: `to_mapping` / `from_mapping` over `serde_json` maps in
//!   declaration order, with partial updates and fixed schemas
//! - **Optimizer interface**: leaves with an [`OptSpec`] (range, distribution,
//!   choice) are packed into and unpacked from a flat numeric vector; function
//!   specs derive a leaf from other leaves
//! - **Atomic batches**: mapping updates, unpacking, randomizing and overrides
//!   leave the tree untouched when any part fails
//!
//! ## Core Components
//!
//! - [`Parameter`]: a leaf, either [`Entry`] or [`Switch`]
//! - [`OptSpec`]: optimization metadata attached to a leaf
//! - [`Parameters`] and [`ParametersVector`]: the containers
//! - [`ParameterTree`]: a validated tree with the optimizer interface,
//!   derived parameters, overrides and the text formats
//! - [`Expression`]: the arithmetic language used by function specs
//!
//! ## Example Usage
//!
//! ```rust
//! use simparams_rs::parameters::{Entry, OptSpec, ParameterTree, Parameters, Switch};
//!
//! let root = Parameters::new("cooling")
//!     .with(
//!         "temperature",
//!         Entry::new::<f64>("K", "Coolant temperature")
//!             .with_default(300.0)
//!             .unwrap()
//!             .with_opt(OptSpec::range(250.0, 350.0).unwrap())
//!             .unwrap(),
//!     )
//!     .unwrap()
//!     .with(
//!         "mode",
//!         Switch::from_keys(["auto", "manual"], "-", "Control mode")
//!             .unwrap()
//!             .with_default("auto")
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let mut tree = ParameterTree::new(root).unwrap();
//!
//! // Flat vector for the optimizer
//! let x = tree.pack().unwrap();
//! assert_eq!(x, vec![300.0]);
//! assert_eq!(tree.opt_labels(), vec!["temperature"]);
//!
//! // After optimization, write back
//! tree.unpack(&[310.5]).unwrap();
//! assert_eq!(tree.get::<f64>("temperature").unwrap(), 310.5);
//!
//! // Mapping form
//! let mapping = tree.to_mapping();
//! assert_eq!(mapping["temperature"], 310.5);
//! assert_eq!(mapping["mode"], "auto");
//! ```

pub mod bounds;
pub mod expression;
pub mod mapping;
pub mod opt;
pub mod parameter;
pub mod parameters;
pub mod path;
pub mod serialization;
pub mod tree;
pub mod value;
pub mod vector;


// Re-export key types
pub use bounds::{Bounds, BoundsError};
pub use expression::{EvaluationContext, Expression, ExpressionError, SimpleContext};
pub use mapping::{Mapping, MappingStyle};
pub use opt::{Distribution, FunctionSpec, OptKind, OptSpec};
pub use parameter::{Entry, Parameter, Switch, SwitchOption};
pub use parameters::{Field, ModifiedField, Node, NodeMut, Parameters};
pub use path::{FieldPath, Segment};
pub use tree::{OptimizableLeaf, ParameterTree};
pub use value::{ParamType, Value, ValueKind};
pub use vector::ParametersVector;
