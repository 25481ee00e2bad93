//! Conversion between parameter trees and ordered mappings
//!
//! The mapping form is a `serde_json` object with insertion order preserved.
//! Containers become nested objects, vectors become arrays of objects and
//! leaves become either their bare value or a metadata bundle, depending on
//! [`MappingStyle`]. `null` stands for "not set".
//!
//! Reading a mapping walks the existing schema. Unknown keys are rejected,
//! keys that are absent leave the corresponding field untouched, and vector
//! lengths follow the length of the incoming array.

use crate::error::{Result, SimParamsError};
use crate::parameters::parameter::Parameter;
use crate::parameters::parameters::{Field, Parameters};
use crate::parameters::path::FieldPath;
use crate::parameters::value::Value;
use crate::parameters::vector::ParametersVector;
use serde_json::{Map, Value as JsonValue};
use tracing::trace;

/// Ordered mapping form of a tree
pub type Mapping = Map<String, JsonValue>;

const VALUE_KEY: &str = "value";
const DEFAULT_KEY: &str = "default";
const UNITS_KEY: &str = "units";
const DESCRIPTION_KEY: &str = "description";
const OPT_KEY: &str = "opt";

/// How leaves are written by `to_mapping`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingStyle {
    /// Each leaf becomes its value, or its default when unset
    #[default]
    Values,
    /// Each leaf becomes `{value, default, units, description}` plus `opt`
    /// when it carries an optimization spec
    Detailed,
}

impl Parameter {
    /// Mapping form of this leaf
    pub fn to_json(&self, style: MappingStyle) -> JsonValue {
        let as_json = |value: Option<&Value>| value.map_or(JsonValue::Null, Value::to_json);
        match style {
            MappingStyle::Values => as_json(self.effective()),
            MappingStyle::Detailed => {
                let mut bundle = Map::new();
                bundle.insert(VALUE_KEY.to_string(), as_json(self.value()));
                bundle.insert(DEFAULT_KEY.to_string(), as_json(self.default_value()));
                bundle.insert(UNITS_KEY.to_string(), JsonValue::from(self.units()));
                bundle.insert(
                    DESCRIPTION_KEY.to_string(),
                    JsonValue::from(self.description()),
                );
                if let Some(opt) = self.opt() {
                    bundle.insert(OPT_KEY.to_string(), JsonValue::from(opt.to_string()));
                }
                JsonValue::Object(bundle)
            }
        }
    }

    fn read_json(&self, json: &JsonValue) -> Result<Option<Value>> {
        if json.is_null() {
            return Ok(None);
        }
        Value::from_json(json, self.kind())
            .map(Some)
            .map_err(|message| SimParamsError::bad("", message))
    }

    /// Assign from either mapping form
    fn assign_json(&mut self, json: &JsonValue, path: &FieldPath) -> Result<()> {
        match json {
            JsonValue::Object(bundle) => {
                for key in bundle.keys() {
                    if ![VALUE_KEY, DEFAULT_KEY, UNITS_KEY, DESCRIPTION_KEY, OPT_KEY]
                        .contains(&key.as_str())
                    {
                        return Err(SimParamsError::inexistent(key));
                    }
                }
                self.check_metadata(bundle)?;
                if let Some(default) = bundle.get(DEFAULT_KEY) {
                    let default = self.read_json(default)?;
                    self.set_default(default)?;
                }
                if let Some(value) = bundle.get(VALUE_KEY) {
                    self.assign_value(value, path)?;
                }
                Ok(())
            }
            other => self.assign_value(other, path),
        }
    }

    /// Units, description and spec in a bundle are schema, so they must
    /// agree with this leaf's declaration
    fn check_metadata(&self, bundle: &Mapping) -> Result<()> {
        let declared = self.to_json(MappingStyle::Detailed);
        for key in [UNITS_KEY, DESCRIPTION_KEY, OPT_KEY] {
            let Some(given) = bundle.get(key) else { continue };
            let expected = declared.get(key).unwrap_or(&JsonValue::Null);
            if given != expected {
                return Err(SimParamsError::bad(
                    "",
                    format!("{key} {given} does not match the declared {key} {expected}"),
                ));
            }
        }
        Ok(())
    }

    fn assign_value(&mut self, json: &JsonValue, path: &FieldPath) -> Result<()> {
        match self.read_json(json)? {
            Some(value) => {
                trace!(path = %path, value = %value, "assigning parameter");
                self.set(value)
            }
            None => {
                self.unset();
                Ok(())
            }
        }
    }
}

impl Parameters {
    /// Canonical mapping form: leaves as bare values
    ///
    /// # Examples
    ///
    /// ```
    /// use simparams_rs::parameters::{Entry, Parameters};
    /// use serde_json::json;
    ///
    /// let params = Parameters::new("p")
    ///     .with("temperature", Entry::new::<f64>("K", "T").with_default(300.0).unwrap())
    ///     .unwrap()
    ///     .with("label", Entry::new::<String>("-", "name"))
    ///     .unwrap();
    ///
    /// let mapping = params.to_mapping();
    /// assert_eq!(
    ///     serde_json::Value::Object(mapping),
    ///     json!({"temperature": 300.0, "label": null})
    /// );
    /// ```
    pub fn to_mapping(&self) -> Mapping {
        self.to_mapping_with(MappingStyle::Values)
    }

    /// Mapping form in the given style
    pub fn to_mapping_with(&self, style: MappingStyle) -> Mapping {
        self.iter()
            .map(|(name, field)| {
                let json = match field {
                    Field::Leaf(leaf) => leaf.to_json(style),
                    Field::Group(group) => JsonValue::Object(group.to_mapping_with(style)),
                    Field::List(list) => JsonValue::Array(
                        list.iter()
                            .map(|element| JsonValue::Object(element.to_mapping_with(style)))
                            .collect(),
                    ),
                };
                (name.clone(), json)
            })
            .collect()
    }

    /// Assign every entry of `mapping` onto the existing schema.
    ///
    /// The update is staged on a copy: on any error this container is left
    /// exactly as it was.
    pub fn from_mapping(&mut self, mapping: &Mapping) -> Result<()> {
        let mut staged = self.clone();
        staged.assign_mapping(mapping, &FieldPath::root())?;
        *self = staged;
        Ok(())
    }

    pub(crate) fn assign_mapping(&mut self, mapping: &Mapping, prefix: &FieldPath) -> Result<()> {
        for (name, json) in mapping {
            let path = prefix.field(name);
            let Some(field) = self.field_mut(name) else {
                return Err(SimParamsError::inexistent(&path));
            };
            match field {
                Field::Leaf(leaf) => leaf
                    .assign_json(json, &path)
                    .map_err(|e| e.within(&path.to_string()))?,
                Field::Group(group) => match json {
                    JsonValue::Object(nested) => group.assign_mapping(nested, &path)?,
                    other => {
                        return Err(SimParamsError::bad(
                            &path,
                            format!("expected a mapping for container, got {other}"),
                        ))
                    }
                },
                Field::List(list) => match json {
                    JsonValue::Array(items) => list.assign_items(items, &path)?,
                    other => {
                        return Err(SimParamsError::bad(
                            &path,
                            format!("expected a sequence for vector, got {other}"),
                        ))
                    }
                },
            }
        }
        Ok(())
    }
}

impl ParametersVector {
    fn assign_items(&mut self, items: &[JsonValue], prefix: &FieldPath) -> Result<()> {
        self.resize(items.len());
        for (i, (element, json)) in self.iter_mut().zip(items).enumerate() {
            let path = prefix.index(i);
            match json {
                JsonValue::Object(nested) => element.assign_mapping(nested, &path)?,
                other => {
                    return Err(SimParamsError::bad(
                        &path,
                        format!("expected a mapping for vector element, got {other}"),
                    ))
                }
            }
        }
        Ok(())
    }
}
