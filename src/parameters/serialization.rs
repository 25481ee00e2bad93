//! Text formats for parameter trees
//!
//! Both formats go through the mapping form: a tree is written as its mapping
//! and read by parsing text into a mapping and assigning it onto the existing
//! schema, so the usual validation applies and unknown fields are rejected.

use crate::error::{Result, SimParamsError};
use crate::parameters::mapping::{Mapping, MappingStyle};
use crate::parameters::tree::ParameterTree;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use tracing::debug;

fn into_mapping(json: JsonValue, format: &str) -> Result<Mapping> {
    match json {
        JsonValue::Object(mapping) => Ok(mapping),
        other => Err(SimParamsError::bad(
            "",
            format!("{format} document must be a mapping at the top level, got {other}"),
        )),
    }
}

impl ParameterTree {
    /// Serialize the tree to pretty-printed JSON
    ///
    /// # Examples
    ///
    /// ```
    /// use simparams_rs::parameters::{Entry, ParameterTree, Parameters};
    ///
    /// let root = Parameters::new("p")
    ///     .with("ip", Entry::new::<f64>("MA", "Plasma current").with_default(15.0).unwrap())
    ///     .unwrap();
    /// let tree = ParameterTree::new(root).unwrap();
    ///
    /// let json = tree.to_json_string().unwrap();
    /// assert!(json.contains("\"ip\": 15.0"));
    /// ```
    pub fn to_json_string(&self) -> Result<String> {
        self.to_json_string_with(MappingStyle::Values)
    }

    pub fn to_json_string_with(&self, style: MappingStyle) -> Result<String> {
        let mapping = JsonValue::Object(self.to_mapping_with(style));
        Ok(serde_json::to_string_pretty(&mapping)?)
    }

    /// Assign a JSON document onto the tree
    pub fn from_json_str(&mut self, json: &str) -> Result<()> {
        let document: JsonValue = serde_json::from_str(json)?;
        self.from_mapping(&into_mapping(document, "JSON")?)
    }

    /// Write the tree to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json_string()?;
        fs::write(path.as_ref(), json)?;
        debug!(path = %path.as_ref().display(), "saved parameters as JSON");
        Ok(())
    }

    /// Read a JSON file onto the tree
    pub fn load_json<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let json = fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "loading parameters from JSON");
        self.from_json_str(&json)
    }

    /// Serialize the tree to YAML
    #[cfg(feature = "yaml")]
    pub fn to_yaml_string(&self) -> Result<String> {
        self.to_yaml_string_with(MappingStyle::Values)
    }

    #[cfg(feature = "yaml")]
    pub fn to_yaml_string_with(&self, style: MappingStyle) -> Result<String> {
        let mapping = JsonValue::Object(self.to_mapping_with(style));
        Ok(serde_yaml::to_string(&mapping)?)
    }

    /// Assign a YAML document onto the tree
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(&mut self, yaml: &str) -> Result<()> {
        let document: JsonValue = serde_yaml::from_str(yaml)?;
        self.from_mapping(&into_mapping(document, "YAML")?)
    }

    #[cfg(feature = "yaml")]
    pub fn save_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml_string()?;
        fs::write(path.as_ref(), yaml)?;
        debug!(path = %path.as_ref().display(), "saved parameters as YAML");
        Ok(())
    }

    #[cfg(feature = "yaml")]
    pub fn load_yaml<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let yaml = fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "loading parameters from YAML");
        self.from_yaml_str(&yaml)
    }
}
