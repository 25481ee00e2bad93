//! Parameter containers
//!
//! This module provides the [`Parameters`] container: a named, ordered mapping
//! from field name to a [`Field`], where each field is a leaf [`Parameter`], a
//! nested container, or a [`ParametersVector`]. The set of field names is fixed
//! when the container is built; only leaf values and vector lengths change
//! afterwards.
//!
//! Fields are addressed by [`FieldPath`]s, walked from the container down.
//! Traversals (leaf iteration, mapping conversion, optimizer packing) always
//! go depth-first in declaration order, with vector elements in index order.

use crate::error::{Result, SimParamsError};
use crate::parameters::expression::{EvaluationContext, ExpressionError};
use crate::parameters::parameter::{Entry, Parameter, Switch};
use crate::parameters::path::{is_valid_field_name, FieldPath, Segment};
use crate::parameters::value::{ParamType, Value};
use crate::parameters::vector::ParametersVector;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A child of a [`Parameters`] container
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Leaf(Parameter),
    Group(Parameters),
    List(ParametersVector),
}

impl Field {
    fn as_node(&self) -> Node<'_> {
        match self {
            Field::Leaf(leaf) => Node::Leaf(leaf),
            Field::Group(group) => Node::Group(group),
            Field::List(list) => Node::List(list),
        }
    }

    fn as_node_mut(&mut self) -> NodeMut<'_> {
        match self {
            Field::Leaf(leaf) => NodeMut::Leaf(leaf),
            Field::Group(group) => NodeMut::Group(group),
            Field::List(list) => NodeMut::List(list),
        }
    }

    fn same_shape(&self, other: &Field) -> bool {
        match (self, other) {
            (Field::Leaf(a), Field::Leaf(b)) => a.same_shape(b),
            (Field::Group(a), Field::Group(b)) => a.same_schema(b),
            (Field::List(a), Field::List(b)) => a.same_schema(b),
            _ => false,
        }
    }
}

impl From<Parameter> for Field {
    fn from(leaf: Parameter) -> Self {
        Field::Leaf(leaf)
    }
}

impl From<Entry> for Field {
    fn from(entry: Entry) -> Self {
        Field::Leaf(entry.into())
    }
}

impl From<Switch> for Field {
    fn from(switch: Switch) -> Self {
        Field::Leaf(switch.into())
    }
}

impl From<Parameters> for Field {
    fn from(group: Parameters) -> Self {
        Field::Group(group)
    }
}

impl From<ParametersVector> for Field {
    fn from(list: ParametersVector) -> Self {
        Field::List(list)
    }
}

/// A resolved position in a tree
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Leaf(&'a Parameter),
    Group(&'a Parameters),
    List(&'a ParametersVector),
}

impl<'a> Node<'a> {
    /// The leaf at this position, or `BadParameter` naming `path`
    pub fn leaf(self, path: &FieldPath) -> Result<&'a Parameter> {
        match self {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Group(_) => Err(SimParamsError::bad(path, "is a container, not a parameter")),
            Node::List(_) => Err(SimParamsError::bad(path, "is a vector, not a parameter")),
        }
    }
}

/// Mutable counterpart of [`Node`]
#[derive(Debug)]
pub enum NodeMut<'a> {
    Leaf(&'a mut Parameter),
    Group(&'a mut Parameters),
    List(&'a mut ParametersVector),
}

impl<'a> NodeMut<'a> {
    pub fn leaf(self, path: &FieldPath) -> Result<&'a mut Parameter> {
        match self {
            NodeMut::Leaf(leaf) => Ok(leaf),
            NodeMut::Group(_) => {
                Err(SimParamsError::bad(path, "is a container, not a parameter"))
            }
            NodeMut::List(_) => Err(SimParamsError::bad(path, "is a vector, not a parameter")),
        }
    }
}

/// A leaf whose explicit value differs from its default
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifiedField {
    pub path: FieldPath,
    pub value: Value,
    pub default: Option<Value>,
}

impl fmt::Display for ModifiedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(default) => write!(f, "{}: {} -> {}", self.path, default, self.value),
            None => write!(f, "{}: <unset> -> {}", self.path, self.value),
        }
    }
}

/// A named, ordered container of parameters
///
/// # Examples
///
/// ```
/// use simparams_rs::parameters::{Entry, Parameters, Switch};
///
/// let mut cooling = Parameters::new("cooling")
///     .with("temperature", Entry::new::<f64>("K", "Coolant temperature").with_default(300.0).unwrap())
///     .unwrap()
///     .with("mode", Switch::from_keys(["auto", "manual"], "-", "Control mode").unwrap())
///     .unwrap();
///
/// cooling.set_field("mode", "manual").unwrap();
/// assert_eq!(cooling.get::<String>("mode").unwrap(), "manual");
/// assert_eq!(cooling.get::<f64>("temperature").unwrap(), 300.0);
/// assert!(cooling.set_field("pressure", 1.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    name: String,
    fields: IndexMap<String, Field>,
}

impl Parameters {
    /// Create an empty container
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: IndexMap::new(),
        }
    }

    /// Builder form of [`add`](Self::add)
    pub fn with(mut self, name: &str, field: impl Into<Field>) -> Result<Self> {
        self.add(name, field)?;
        Ok(self)
    }

    /// Declare a field. Names must be unique and valid identifiers.
    pub fn add(&mut self, name: &str, field: impl Into<Field>) -> Result<()> {
        if !is_valid_field_name(name) {
            return Err(SimParamsError::bad(name, "invalid field name"));
        }
        if self.fields.contains_key(name) {
            return Err(SimParamsError::bad(
                name,
                format!("duplicate field in '{}'", self.name),
            ));
        }
        self.fields.insert(name.to_string(), field.into());
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    /// Direct child by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Walk `path` from this container
    pub fn node(&self, path: &FieldPath) -> Result<Node<'_>> {
        let mut current = Node::Group(self);
        let mut walked = FieldPath::root();
        for segment in path.segments() {
            let next = walked.child(segment);
            current = match (current, segment) {
                (Node::Group(group), Segment::Field(name)) => match group.fields.get(name) {
                    Some(field) => field.as_node(),
                    None => return Err(SimParamsError::inexistent(&next)),
                },
                (Node::List(list), Segment::Index(index)) => Node::Group(
                    list.at(*index)
                        .map_err(|e| e.within(&walked.to_string()))?,
                ),
                _ => return Err(SimParamsError::inexistent(&next)),
            };
            walked = next;
        }
        Ok(current)
    }

    /// Mutable form of [`node`](Self::node)
    pub fn node_mut(&mut self, path: &FieldPath) -> Result<NodeMut<'_>> {
        let mut current = NodeMut::Group(self);
        let mut walked = FieldPath::root();
        for segment in path.segments() {
            let next = walked.child(segment);
            current = match (current, segment) {
                (NodeMut::Group(group), Segment::Field(name)) => match group.fields.get_mut(name) {
                    Some(field) => field.as_node_mut(),
                    None => return Err(SimParamsError::inexistent(&next)),
                },
                (NodeMut::List(list), Segment::Index(index)) => NodeMut::Group(
                    list.at_mut(*index)
                        .map_err(|e| e.within(&walked.to_string()))?,
                ),
                _ => return Err(SimParamsError::inexistent(&next)),
            };
            walked = next;
        }
        Ok(current)
    }

    /// Resolve a dotted path such as `layers[0].thickness`
    pub fn get_field(&self, path: &str) -> Result<Node<'_>> {
        self.node(&FieldPath::parse(path)?)
    }

    /// The leaf at `path`
    pub fn leaf(&self, path: &FieldPath) -> Result<&Parameter> {
        self.node(path)?.leaf(path)
    }

    pub fn leaf_mut(&mut self, path: &FieldPath) -> Result<&mut Parameter> {
        self.node_mut(path)?.leaf(path)
    }

    /// The value (or default) of the leaf at `path`
    pub fn value(&self, path: &str) -> Result<&Value> {
        let path = FieldPath::parse(path)?;
        self.leaf(&path)?
            .get()
            .map_err(|e| e.within(&path.to_string()))
    }

    /// Typed read of the leaf at `path`
    pub fn get<T: ParamType>(&self, path: &str) -> Result<T> {
        let path = FieldPath::parse(path)?;
        self.leaf(&path)?
            .get_as::<T>()
            .map_err(|e| e.within(&path.to_string()))
    }

    /// Validated assignment of the leaf at `path`
    pub fn set_field(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let path = FieldPath::parse(path)?;
        self.set_at(&path, value.into())
    }

    pub(crate) fn set_at(&mut self, path: &FieldPath, value: Value) -> Result<()> {
        self.leaf_mut(path)?
            .set(value)
            .map_err(|e| e.within(&path.to_string()))
    }

    /// Same field names in the same order, with matching leaf kinds, switch
    /// options and nested schemas. Container names are not compared.
    pub fn same_schema(&self, other: &Parameters) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|((a_name, a), (b_name, b))| a_name == b_name && a.same_shape(b))
    }

    /// Every leaf with its path, depth-first in declaration order
    pub fn leaves(&self) -> Vec<(FieldPath, &Parameter)> {
        let mut out = Vec::new();
        self.collect_leaves(&FieldPath::root(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &FieldPath, out: &mut Vec<(FieldPath, &'a Parameter)>) {
        for (name, field) in &self.fields {
            let path = prefix.field(name);
            match field {
                Field::Leaf(leaf) => out.push((path, leaf)),
                Field::Group(group) => group.collect_leaves(&path, out),
                Field::List(list) => {
                    for (i, element) in list.iter().enumerate() {
                        element.collect_leaves(&path.index(i), out);
                    }
                }
            }
        }
    }

    /// Mutable form of [`leaves`](Self::leaves)
    pub fn leaves_mut(&mut self) -> Vec<(FieldPath, &mut Parameter)> {
        let mut out = Vec::new();
        self.collect_leaves_mut(&FieldPath::root(), &mut out);
        out
    }

    fn collect_leaves_mut<'a>(
        &'a mut self,
        prefix: &FieldPath,
        out: &mut Vec<(FieldPath, &'a mut Parameter)>,
    ) {
        for (name, field) in self.fields.iter_mut() {
            let path = prefix.field(name);
            match field {
                Field::Leaf(leaf) => out.push((path, leaf)),
                Field::Group(group) => group.collect_leaves_mut(&path, out),
                Field::List(list) => {
                    for (i, element) in list.iter_mut().enumerate() {
                        element.collect_leaves_mut(&path.index(i), out);
                    }
                }
            }
        }
    }

    /// Leaves whose explicit value differs from their default
    pub fn diff_from_default(&self) -> Vec<ModifiedField> {
        self.leaves()
            .into_iter()
            .filter(|(_, leaf)| leaf.is_modified())
            .filter_map(|(path, leaf)| {
                leaf.value().map(|value| ModifiedField {
                    path,
                    value: value.clone(),
                    default: leaf.default_value().cloned(),
                })
            })
            .collect()
    }

    /// Make every leaf's current value its default
    pub fn set_new_base(&mut self) {
        for (_, leaf) in self.leaves_mut() {
            leaf.set_new_base();
        }
    }
}

/// Function specs read other leaves by path through this context.
impl EvaluationContext for Parameters {
    fn get_variable(&self, name: &str) -> std::result::Result<f64, ExpressionError> {
        let undefined = || ExpressionError::UndefinedVariable {
            name: name.to_string(),
        };
        let path = FieldPath::parse(name).map_err(|_| undefined())?;
        match self.node(&path) {
            Ok(Node::Leaf(leaf)) => leaf.effective().and_then(Value::as_f64).ok_or_else(undefined),
            _ => Err(undefined()),
        }
    }
}
