//! Parameter trees
//!
//! [`ParameterTree`] owns a root [`Parameters`] container and adds everything
//! that needs a view of the whole tree at once:
//!
//! - derived parameters, whose function specs read other leaves by path and
//!   are re-evaluated in dependency order after every mutation
//! - the optimizer interface (`pack`, `unpack`, `opt_labels`) over the leaves
//!   carrying range, distribution or choice specs
//! - batch operations (`from_mapping`, `unpack`, `randomize`, overrides)
//!   that are staged on a copy and only swapped in when they fully succeed
//!
//! Construction is the gate for structural validity: dangling or cyclic
//! function references are rejected there, and every later structural change
//! is re-checked and rolled back on failure.

use crate::error::{Result, SimParamsError};
use crate::parameters::expression::Expression;
use crate::parameters::mapping::{Mapping, MappingStyle};
use crate::parameters::opt::OptSpec;
use crate::parameters::parameter::Parameter;
use crate::parameters::parameters::{ModifiedField, Node, NodeMut, Parameters};
use crate::parameters::path::FieldPath;
use crate::parameters::value::{ParamType, Value};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

/// A leaf taking part in optimization, as seen by the optimizer
#[derive(Debug, Clone)]
pub struct OptimizableLeaf<'a> {
    /// Where the leaf lives
    pub path: FieldPath,
    /// The spec label, or the dotted path when the spec has none
    pub label: String,
    pub parameter: &'a Parameter,
}

impl OptimizableLeaf<'_> {
    fn spec(&self) -> Result<&OptSpec> {
        self.parameter
            .opt()
            .ok_or_else(|| SimParamsError::bad(&self.path, "has no optimization spec"))
    }
}

fn is_independent(leaf: &Parameter) -> bool {
    leaf.opt().is_some_and(OptSpec::is_independent)
}

/// A validated parameter tree
///
/// # Examples
///
/// ```
/// use simparams_rs::parameters::{Entry, OptSpec, ParameterTree, Parameters, Switch};
///
/// let root = Parameters::new("cooling")
///     .with(
///         "temperature",
///         Entry::new::<f64>("K", "Coolant temperature")
///             .with_default(300.0)
///             .unwrap()
///             .with_opt(OptSpec::range(250.0, 350.0).unwrap())
///             .unwrap(),
///     )
///     .unwrap()
///     .with(
///         "mode",
///         Switch::from_keys(["auto", "manual"], "-", "Control mode")
///             .unwrap()
///             .with_default("auto")
///             .unwrap(),
///     )
///     .unwrap();
///
/// let mut tree = ParameterTree::new(root).unwrap();
/// assert_eq!(tree.pack().unwrap(), vec![300.0]);
///
/// tree.unpack(&[310.5]).unwrap();
/// assert_eq!(tree.get::<f64>("temperature").unwrap(), 310.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTree {
    root: Parameters,
    /// Function-spec leaves, dependencies first
    derived: Vec<FieldPath>,
}

impl ParameterTree {
    /// Validate `root` and wrap it.
    ///
    /// Fails when a function spec references a field that does not exist or
    /// is not numeric, or when function specs reference each other in a
    /// cycle. Derived leaves whose inputs are all set are evaluated.
    pub fn new(root: Parameters) -> Result<Self> {
        let derived = derived_order(&root)?;
        let mut tree = Self { root, derived };
        evaluate_derived(&mut tree.root, &tree.derived, false)?;
        debug!(
            root = tree.root.name(),
            derived = tree.derived.len(),
            "parameter tree ready"
        );
        Ok(tree)
    }

    pub fn root(&self) -> &Parameters {
        &self.root
    }

    pub fn into_inner(self) -> Parameters {
        self.root
    }

    /// Paths of derived leaves in evaluation order
    pub fn derived_paths(&self) -> &[FieldPath] {
        &self.derived
    }

    /// Apply `operation` to a copy of the root, re-check the structure,
    /// refresh derived leaves and swap the copy in. On error nothing changes.
    fn commit<F>(&mut self, operation: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Parameters) -> Result<()>,
    {
        let mut staged = self.root.clone();
        let outcome = apply(&mut staged).and_then(|()| {
            let derived = derived_order(&staged)?;
            evaluate_derived(&mut staged, &derived, false)?;
            Ok(derived)
        });
        match outcome {
            Ok(derived) => {
                self.root = staged;
                self.derived = derived;
                Ok(())
            }
            Err(error) => {
                warn!(operation, %error, "batch rejected, tree left unchanged");
                Err(error)
            }
        }
    }

    // Access

    pub fn get_field(&self, path: &str) -> Result<Node<'_>> {
        self.root.get_field(path)
    }

    pub fn value(&self, path: &str) -> Result<&Value> {
        self.root.value(path)
    }

    pub fn get<T: ParamType>(&self, path: &str) -> Result<T> {
        self.root.get(path)
    }

    /// Validated assignment of one leaf. Derived leaves cannot be set directly.
    pub fn set_field(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let path = FieldPath::parse(path)?;
        self.ensure_not_derived(&path)?;
        let value = value.into();
        self.commit("set_field", |root| root.set_at(&path, value))
    }

    fn ensure_not_derived(&self, path: &FieldPath) -> Result<()> {
        if self.derived.contains(path) {
            return Err(SimParamsError::bad(
                path,
                "is derived from a function and cannot be set directly",
            ));
        }
        Ok(())
    }

    /// Evaluate an expression over the current leaf values
    pub fn eval_expression(&self, source: &str) -> Result<f64> {
        Ok(Expression::parse(source)?.evaluate(&self.root)?)
    }

    // Mapping codec

    pub fn to_mapping(&self) -> Mapping {
        self.root.to_mapping()
    }

    pub fn to_mapping_with(&self, style: MappingStyle) -> Mapping {
        self.root.to_mapping_with(style)
    }

    /// Assign a mapping onto the schema; see [`Parameters::from_mapping`].
    /// Vector lengths may change, after which function references are
    /// re-checked.
    pub fn from_mapping(&mut self, mapping: &Mapping) -> Result<()> {
        debug!(fields = mapping.len(), "applying mapping");
        self.commit("from_mapping", |root| {
            root.assign_mapping(mapping, &FieldPath::root())
        })
    }

    pub fn diff_from_default(&self) -> Vec<ModifiedField> {
        self.root.diff_from_default()
    }

    /// Make every leaf's current value its default
    pub fn set_new_base(&mut self) {
        self.root.set_new_base();
    }

    // Optimizer interface

    /// Leaves with range, distribution or choice specs, depth-first in
    /// declaration order
    pub fn collect_optimizable(&self) -> Vec<OptimizableLeaf<'_>> {
        self.root
            .leaves()
            .into_iter()
            .filter(|(_, leaf)| is_independent(leaf))
            .map(|(path, parameter)| {
                let label = parameter
                    .opt()
                    .and_then(OptSpec::label)
                    .map(str::to_string)
                    .unwrap_or_else(|| path.to_string());
                OptimizableLeaf {
                    path,
                    label,
                    parameter,
                }
            })
            .collect()
    }

    /// Labels of the optimizable leaves, in pack order
    pub fn opt_labels(&self) -> Vec<String> {
        self.collect_optimizable()
            .into_iter()
            .map(|leaf| leaf.label)
            .collect()
    }

    /// The optimizer vector: each optimizable leaf's value (or default, or
    /// spec nominal). Choices are encoded as their index in the choice list.
    pub fn pack(&self) -> Result<Vec<f64>> {
        self.collect_optimizable()
            .iter()
            .map(|leaf| {
                let spec = leaf.spec()?;
                let value = leaf
                    .parameter
                    .effective()
                    .or_else(|| spec.nominal())
                    .ok_or_else(|| SimParamsError::not_set(&leaf.path))?;
                spec.encode(value)
                    .map_err(|message| SimParamsError::bad(&leaf.path, message))
            })
            .collect()
    }

    /// Assign an optimizer vector to the optimizable leaves, then refresh the
    /// derived leaves. The length must match [`pack`](Self::pack).
    pub fn unpack(&mut self, values: &[f64]) -> Result<()> {
        debug!(len = values.len(), "unpacking optimizer vector");
        self.commit("unpack", |root| {
            let targets: Vec<(FieldPath, &mut Parameter)> = root
                .leaves_mut()
                .into_iter()
                .filter(|(_, leaf)| is_independent(leaf))
                .collect();
            if targets.len() != values.len() {
                return Err(SimParamsError::bad(
                    "",
                    format!(
                        "expected {} values for optimizable parameters, got {}",
                        targets.len(),
                        values.len()
                    ),
                ));
            }
            for ((path, leaf), &x) in targets.into_iter().zip(values) {
                let Some(spec) = leaf.opt() else { continue };
                let decoded = spec
                    .decode(x, leaf.kind())
                    .map_err(|message| SimParamsError::bad(&path, message))?;
                // An unset leaf keeps packing from its default or nominal
                let packed_from = leaf.effective().or_else(|| spec.nominal());
                if !leaf.is_set() && packed_from == Some(&decoded) {
                    continue;
                }
                trace!(path = %path, value = %decoded, "unpacked");
                leaf.set(decoded).map_err(|e| e.within(&path.to_string()))?;
            }
            Ok(())
        })
    }

    /// [`pack`](Self::pack) as an ndarray vector
    #[cfg(feature = "ndarray")]
    pub fn pack_array(&self) -> Result<ndarray::Array1<f64>> {
        Ok(ndarray::Array1::from_vec(self.pack()?))
    }

    /// [`unpack`](Self::unpack) from an ndarray vector
    #[cfg(feature = "ndarray")]
    pub fn unpack_array(&mut self, values: &ndarray::Array1<f64>) -> Result<()> {
        self.unpack(&values.to_vec())
    }

    /// Spec nominal (else value, else default) of each optimizable leaf
    pub fn nominal_values(&self) -> Vec<Option<Value>> {
        self.collect_optimizable()
            .iter()
            .map(|leaf| leaf.parameter.nominal().cloned())
            .collect()
    }

    /// Range bounds of each optimizable leaf, `None` for other specs
    pub fn float_bounds(&self) -> Vec<Option<(f64, f64)>> {
        self.collect_optimizable()
            .iter()
            .map(|leaf| leaf.parameter.bounds())
            .collect()
    }

    /// Draw and assign a new value for every optimizable leaf
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        debug!("randomizing optimizable parameters");
        self.commit("randomize", |root| {
            for (path, leaf) in root.leaves_mut() {
                if !is_independent(leaf) {
                    continue;
                }
                if let Some(value) = leaf.sample(rng) {
                    trace!(path = %path, value = %value, "sampled");
                    leaf.set(value).map_err(|e| e.within(&path.to_string()))?;
                }
            }
            Ok(())
        })
    }

    /// [`randomize`](Self::randomize) with the thread-local generator
    pub fn randomize_with_thread_rng(&mut self) -> Result<()> {
        self.randomize(&mut rand::thread_rng())
    }

    /// Draw and assign a new value for one optimizable leaf
    pub fn randomize_field<R: Rng + ?Sized>(&mut self, path: &str, rng: &mut R) -> Result<()> {
        let path = FieldPath::parse(path)?;
        debug!(path = %path, "randomizing parameter");
        self.commit("randomize_field", |root| {
            let leaf = root.leaf_mut(&path)?;
            if !is_independent(leaf) {
                return Err(SimParamsError::bad(
                    &path,
                    "has no range, distribution or choice spec to sample from",
                ));
            }
            match leaf.sample(rng) {
                Some(value) => leaf.set(value).map_err(|e| e.within(&path.to_string())),
                None => Ok(()),
            }
        })
    }

    /// A randomized copy; `self` is left untouched
    pub fn randomized<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Self> {
        let mut copy = self.clone();
        copy.randomize(rng)?;
        Ok(copy)
    }

    /// Re-evaluate every derived leaf. Unlike the refresh that follows each
    /// mutation, a derived leaf with an unset input is an error here.
    pub fn update_derived(&mut self) -> Result<()> {
        let mut staged = self.root.clone();
        match evaluate_derived(&mut staged, &self.derived, true) {
            Ok(()) => {
                self.root = staged;
                Ok(())
            }
            Err(error) => {
                warn!(%error, "derived update rejected, tree left unchanged");
                Err(error)
            }
        }
    }

    // Overrides

    /// Assign several leaves in one batch
    pub fn apply_overrides<K, V>(&mut self, overlay: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let overlay = overlay
            .into_iter()
            .map(|(path, value)| Ok((FieldPath::parse(path.as_ref())?, value.into())))
            .collect::<Result<Vec<(FieldPath, Value)>>>()?;
        for (path, _) in &overlay {
            self.ensure_not_derived(path)?;
        }
        debug!(count = overlay.len(), "applying overrides");
        self.commit("override", |root| {
            for (path, value) in overlay {
                trace!(path = %path, value = %value, "override");
                root.set_at(&path, value)?;
            }
            Ok(())
        })
    }

    /// A copy with `overlay` applied; `self` is left untouched
    pub fn overridden<K, V>(&self, overlay: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut copy = self.clone();
        copy.apply_overrides(overlay)?;
        Ok(copy)
    }

    /// Run `f` on an overridden copy, which is dropped afterwards
    pub fn with_overrides<K, V, F, T>(
        &self,
        overlay: impl IntoIterator<Item = (K, V)>,
        f: F,
    ) -> Result<T>
    where
        K: AsRef<str>,
        V: Into<Value>,
        F: FnOnce(&ParameterTree) -> T,
    {
        let scoped = self.overridden(overlay)?;
        Ok(f(&scoped))
    }

    // Structural changes

    /// Append an element to the vector at `path`
    pub fn push(&mut self, path: &str, element: Parameters) -> Result<()> {
        let path = FieldPath::parse(path)?;
        self.commit("push", |root| match root.node_mut(&path)? {
            NodeMut::List(list) => list.push(element).map_err(|e| e.within(&path.to_string())),
            _ => Err(SimParamsError::bad(&path, "is not a vector")),
        })
    }

    /// Attach, replace or remove the optimization spec of the leaf at `path`
    pub fn set_opt(&mut self, path: &str, opt: Option<OptSpec>) -> Result<()> {
        let path = FieldPath::parse(path)?;
        self.commit("set_opt", |root| {
            root.leaf_mut(&path)?
                .set_opt(opt)
                .map_err(|e| e.within(&path.to_string()))
        })
    }
}

/// Check every function reference and order the derived leaves so that each
/// comes after the derived leaves it reads.
fn derived_order(root: &Parameters) -> Result<Vec<FieldPath>> {
    let derived: Vec<(FieldPath, &[FieldPath])> = root
        .leaves()
        .into_iter()
        .filter_map(|(path, leaf)| {
            leaf.opt()
                .and_then(OptSpec::function_spec)
                .map(|function| (path, function.dependencies()))
        })
        .collect();

    for (path, dependencies) in &derived {
        for dependency in dependencies.iter() {
            if dependency == path {
                return Err(SimParamsError::CircularDependency {
                    path: path.to_string(),
                });
            }
            match root.node(dependency) {
                Ok(Node::Leaf(leaf)) if leaf.kind().is_numeric() => {}
                Ok(Node::Leaf(leaf)) => {
                    return Err(SimParamsError::bad(
                        path,
                        format!("function reads '{dependency}', a {} parameter", leaf.kind()),
                    ))
                }
                Ok(_) => {
                    return Err(SimParamsError::bad(
                        path,
                        format!("function reads '{dependency}', which is not a parameter"),
                    ))
                }
                Err(_) => return Err(SimParamsError::inexistent(dependency)),
            }
        }
    }

    let derived_set: HashSet<&FieldPath> = derived.iter().map(|(path, _)| path).collect();
    let graph: HashMap<&FieldPath, Vec<&FieldPath>> = derived
        .iter()
        .map(|(path, dependencies)| {
            let edges = dependencies
                .iter()
                .filter(|dependency| derived_set.contains(dependency))
                .collect();
            (path, edges)
        })
        .collect();

    fn visit<'a>(
        node: &'a FieldPath,
        graph: &HashMap<&'a FieldPath, Vec<&'a FieldPath>>,
        visited: &mut HashSet<&'a FieldPath>,
        in_progress: &mut HashSet<&'a FieldPath>,
        order: &mut Vec<FieldPath>,
    ) -> Result<()> {
        if visited.contains(node) {
            return Ok(());
        }
        if !in_progress.insert(node) {
            return Err(SimParamsError::CircularDependency {
                path: node.to_string(),
            });
        }
        if let Some(dependencies) = graph.get(node) {
            for dependency in dependencies {
                visit(*dependency, graph, visited, in_progress, order)?;
            }
        }
        in_progress.remove(node);
        visited.insert(node);
        order.push(node.clone());
        Ok(())
    }

    let mut order = Vec::with_capacity(derived.len());
    let mut visited = HashSet::new();
    let mut in_progress = HashSet::new();
    for (path, _) in &derived {
        visit(path, &graph, &mut visited, &mut in_progress, &mut order)?;
    }
    Ok(order)
}

/// Evaluate derived leaves in `order`. A derived leaf with an unset input is
/// an error when `strict`, otherwise it is unset.
fn evaluate_derived(root: &mut Parameters, order: &[FieldPath], strict: bool) -> Result<()> {
    for path in order {
        let outcome = {
            let view: &Parameters = root;
            let leaf = view.leaf(path)?;
            let Some(spec) = leaf.opt() else { continue };
            let Some(function) = spec.function_spec() else {
                continue;
            };
            let missing = function.dependencies().iter().find(|dependency| {
                !matches!(view.node(dependency), Ok(Node::Leaf(input)) if input.effective().is_some())
            });
            match missing {
                Some(dependency) if strict => return Err(SimParamsError::not_set(dependency)),
                Some(_) => None,
                None => {
                    let x = function.evaluate(view).map_err(|e| {
                        SimParamsError::bad(path, format!("function evaluation failed: {e}"))
                    })?;
                    Some(
                        spec.decode(x, leaf.kind())
                            .map_err(|message| SimParamsError::bad(path, message))?,
                    )
                }
            }
        };
        let leaf = root.leaf_mut(path)?;
        match outcome {
            Some(value) => {
                trace!(path = %path, value = %value, "derived");
                leaf.set(value).map_err(|e| e.within(&path.to_string()))?;
            }
            None => leaf.unset(),
        }
    }
    Ok(())
}
