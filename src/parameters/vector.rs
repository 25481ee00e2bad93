//! Ordered collections of identically shaped containers

use crate::error::{Result, SimParamsError};
use crate::parameters::parameters::Parameters;

/// A sequence of [`Parameters`] that all share one schema.
///
/// The schema is fixed by a prototype container given at construction. New
/// elements are clones of the prototype, and any container appended from the
/// outside must have the same field names, nesting and leaf kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct ParametersVector {
    prototype: Parameters,
    elements: Vec<Parameters>,
}

impl ParametersVector {
    /// An empty vector of elements shaped like `prototype`
    pub fn new(prototype: Parameters) -> Self {
        Self {
            prototype,
            elements: Vec::new(),
        }
    }

    /// A vector holding `len` copies of `prototype`
    pub fn with_len(prototype: Parameters, len: usize) -> Self {
        let elements = vec![prototype.clone(); len];
        Self {
            prototype,
            elements,
        }
    }

    /// A vector holding `elements`, each checked against `prototype`
    pub fn from_elements(
        prototype: Parameters,
        elements: impl IntoIterator<Item = Parameters>,
    ) -> Result<Self> {
        let mut vector = Self::new(prototype);
        for element in elements {
            vector.push(element)?;
        }
        Ok(vector)
    }

    /// The container every element is shaped like
    pub fn prototype(&self) -> &Parameters {
        &self.prototype
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element `index`, or `IndexOutOfRange`
    pub fn at(&self, index: usize) -> Result<&Parameters> {
        let len = self.elements.len();
        self.elements
            .get(index)
            .ok_or_else(|| SimParamsError::IndexOutOfRange {
                path: String::new(),
                index,
                len,
            })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut Parameters> {
        let len = self.elements.len();
        self.elements
            .get_mut(index)
            .ok_or_else(|| SimParamsError::IndexOutOfRange {
                path: String::new(),
                index,
                len,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameters> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Parameters> {
        self.elements.iter_mut()
    }

    /// Append an element. Fails with `BadParameter` if its schema differs
    /// from the prototype's.
    pub fn push(&mut self, element: Parameters) -> Result<()> {
        if !self.prototype.same_schema(&element) {
            return Err(SimParamsError::bad(
                "",
                format!(
                    "container '{}' does not match the element schema of '{}'",
                    element.name(),
                    self.prototype.name()
                ),
            ));
        }
        self.elements.push(element);
        Ok(())
    }

    /// Alias of [`push`](Self::push)
    pub fn append(&mut self, element: Parameters) -> Result<()> {
        self.push(element)
    }

    /// A fresh element cloned from the prototype, not yet inserted
    pub fn new_element(&self) -> Parameters {
        self.prototype.clone()
    }

    pub fn pop(&mut self) -> Option<Parameters> {
        self.elements.pop()
    }

    /// Grow with prototype clones or truncate to `len` elements
    pub fn resize(&mut self, len: usize) {
        let prototype = &self.prototype;
        self.elements.resize_with(len, || prototype.clone());
    }

    /// Same element schema as `other`
    pub(crate) fn same_schema(&self, other: &ParametersVector) -> bool {
        self.prototype.same_schema(&other.prototype)
    }
}
