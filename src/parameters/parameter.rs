//! Leaf parameter definition and implementation
//!
//! A leaf is either an [`Entry`], which holds any value of its declared kind,
//! or a [`Switch`], which only holds one of a fixed set of option keys. Both
//! carry units, a description, an optional default and an optional
//! [`OptSpec`]. Leaves distinguish "not set" from any concrete value.
//!
//! Errors raised here carry an empty path; containers prefix the field path
//! as the error travels up.

use crate::error::{Result, SimParamsError};
use crate::parameters::opt::{OptKind, OptSpec};
use crate::parameters::value::{ParamType, Value, ValueKind};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One selectable option of a [`Switch`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchOption {
    /// Short human-readable name of the option
    pub label: String,
    /// What selecting this option means
    pub description: String,
}

impl SwitchOption {
    pub fn new(label: &str, description: &str) -> Self {
        Self {
            label: label.to_string(),
            description: description.to_string(),
        }
    }
}

/// State shared by both leaf variants
#[derive(Debug, Clone, PartialEq)]
struct LeafCore {
    kind: ValueKind,
    value: Option<Value>,
    default: Option<Value>,
    units: String,
    description: String,
    opt: Option<OptSpec>,
}

impl LeafCore {
    fn new(kind: ValueKind, units: &str, description: &str) -> Self {
        Self {
            kind,
            value: None,
            default: None,
            units: units.to_string(),
            description: description.to_string(),
            opt: None,
        }
    }

    /// Validate `value` for this leaf without storing it
    fn admit(
        &self,
        value: Value,
        membership: impl Fn(&Value) -> std::result::Result<(), String>,
    ) -> Result<Value> {
        let value = value
            .conform(self.kind)
            .map_err(|message| SimParamsError::bad("", message))?;
        membership(&value).map_err(|message| SimParamsError::bad("", message))?;
        if let Some(opt) = &self.opt {
            opt.check(&value)
                .map_err(|message| SimParamsError::bad("", message))?;
        }
        Ok(value)
    }

    fn attach_opt(&mut self, opt: Option<OptSpec>) -> Result<()> {
        let Some(opt) = opt else {
            self.opt = None;
            return Ok(());
        };
        let opt = opt
            .prepare(self.kind)
            .map_err(|message| SimParamsError::bad("", message))?;
        for current in [&self.value, &self.default].into_iter().flatten() {
            opt.check(current).map_err(|message| {
                SimParamsError::bad("", format!("current value incompatible with spec: {message}"))
            })?;
        }
        self.opt = Some(opt);
        Ok(())
    }
}

/// A parameter whose value can be freely set to anything of its declared kind
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    core: LeafCore,
}

impl Entry {
    /// Declare an entry holding values of type `T`
    ///
    /// # Examples
    ///
    /// ```
    /// use simparams_rs::parameters::{Entry, OptSpec, Parameter};
    ///
    /// let temperature = Entry::new::<f64>("K", "Coolant temperature")
    ///     .with_default(300.0)
    ///     .unwrap()
    ///     .with_opt(OptSpec::range(250.0, 350.0).unwrap())
    ///     .unwrap();
    ///
    /// let param = Parameter::from(temperature);
    /// assert_eq!(param.get_as::<f64>().unwrap(), 300.0);
    /// assert_eq!(param.bounds(), Some((250.0, 350.0)));
    /// ```
    pub fn new<T: ParamType>(units: &str, description: &str) -> Self {
        Self::with_kind(T::KIND, units, description)
    }

    /// Declare an entry by kind
    pub fn with_kind(kind: ValueKind, units: &str, description: &str) -> Self {
        Self {
            core: LeafCore::new(kind, units, description),
        }
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<Value>) -> Result<Self> {
        let default = self.core.admit(default.into(), |_| Ok(()))?;
        self.core.default = Some(default);
        Ok(self)
    }

    /// Set an initial value
    pub fn with_value(mut self, value: impl Into<Value>) -> Result<Self> {
        let value = self.core.admit(value.into(), |_| Ok(()))?;
        self.core.value = Some(value);
        Ok(self)
    }

    /// Attach an optimization spec
    pub fn with_opt(mut self, opt: OptSpec) -> Result<Self> {
        self.core.attach_opt(Some(opt))?;
        Ok(self)
    }
}

/// A parameter restricted to a fixed, labeled set of option keys
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    core: LeafCore,
    options: Vec<(Value, SwitchOption)>,
}

impl Switch {
    /// Declare a switch; the value kind is taken from the option keys.
    ///
    /// Fails when the option set is empty, keys repeat, or keys are of
    /// different kinds.
    ///
    /// # Examples
    ///
    /// ```
    /// use simparams_rs::parameters::{Switch, SwitchOption};
    ///
    /// let mode = Switch::new(
    ///     [
    ///         ("auto", SwitchOption::new("Auto", "Controller picks the setpoint")),
    ///         ("manual", SwitchOption::new("Manual", "Operator sets the setpoint")),
    ///     ],
    ///     "-",
    ///     "Control mode",
    /// )
    /// .unwrap()
    /// .with_default("auto")
    /// .unwrap();
    /// assert_eq!(mode.option_keys().len(), 2);
    /// ```
    pub fn new<K: Into<Value>>(
        options: impl IntoIterator<Item = (K, SwitchOption)>,
        units: &str,
        description: &str,
    ) -> Result<Self> {
        let options: Vec<(Value, SwitchOption)> = options
            .into_iter()
            .map(|(key, option)| (key.into(), option))
            .collect();
        let kind = options
            .first()
            .map(|(key, _)| key.kind())
            .ok_or_else(|| SimParamsError::bad("", "switch needs at least one option"))?;
        Self::with_kind(kind, options, units, description)
    }

    /// Declare a switch whose options are labeled by their keys
    pub fn from_keys<K: Into<Value>>(
        keys: impl IntoIterator<Item = K>,
        units: &str,
        description: &str,
    ) -> Result<Self> {
        let options = keys.into_iter().map(|key| {
            let key: Value = key.into();
            let label = match &key {
                Value::Str(s) => s.clone(),
                other => other.to_string(),
            };
            (key, SwitchOption::new(&label, ""))
        });
        Self::new(options, units, description)
    }

    /// Declare a switch with an explicit value kind
    pub fn with_kind<K: Into<Value>>(
        kind: ValueKind,
        options: impl IntoIterator<Item = (K, SwitchOption)>,
        units: &str,
        description: &str,
    ) -> Result<Self> {
        let mut checked: Vec<(Value, SwitchOption)> = Vec::new();
        for (key, option) in options {
            let key: Value = key.into();
            let key = key
                .conform(kind)
                .map_err(|message| SimParamsError::bad("", format!("switch option: {message}")))?;
            if checked.iter().any(|(existing, _)| *existing == key) {
                return Err(SimParamsError::bad("", format!("duplicate switch option {key}")));
            }
            checked.push((key, option));
        }
        if checked.is_empty() {
            return Err(SimParamsError::bad("", "switch needs at least one option"));
        }
        Ok(Self {
            core: LeafCore::new(kind, units, description),
            options: checked,
        })
    }

    /// Set the default option
    pub fn with_default(mut self, default: impl Into<Value>) -> Result<Self> {
        let default = self.core.admit(default.into(), |v| self.membership(v))?;
        self.core.default = Some(default);
        Ok(self)
    }

    /// Select an initial option
    pub fn with_value(mut self, value: impl Into<Value>) -> Result<Self> {
        let value = self.core.admit(value.into(), |v| self.membership(v))?;
        self.core.value = Some(value);
        Ok(self)
    }

    /// Attach an optimization spec. Independent specs must be choices listing
    /// only option keys.
    pub fn with_opt(mut self, opt: OptSpec) -> Result<Self> {
        self.check_opt(&opt)?;
        self.core.attach_opt(Some(opt))?;
        Ok(self)
    }

    /// Option keys in declaration order
    pub fn option_keys(&self) -> Vec<&Value> {
        self.options.iter().map(|(key, _)| key).collect()
    }

    /// All options in declaration order
    pub fn options(&self) -> &[(Value, SwitchOption)] {
        &self.options
    }

    /// The option registered under `key`
    pub fn option(&self, key: &Value) -> Option<&SwitchOption> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, option)| option)
    }

    fn membership(&self, value: &Value) -> std::result::Result<(), String> {
        if self.options.iter().any(|(key, _)| key == value) {
            Ok(())
        } else {
            let keys: Vec<String> = self.options.iter().map(|(k, _)| k.to_string()).collect();
            Err(format!("{value} is not one of the options [{}]", keys.join(", ")))
        }
    }

    fn check_opt(&self, opt: &OptSpec) -> Result<()> {
        let opt = opt
            .clone()
            .prepare(self.core.kind)
            .map_err(|message| SimParamsError::bad("", message))?;
        match opt.kind() {
            OptKind::Choice(choices) => {
                for choice in choices {
                    self.membership(choice)
                        .map_err(|message| SimParamsError::bad("", message))?;
                }
                Ok(())
            }
            OptKind::Function(_) => Ok(()),
            // Continuous samples would land between option keys
            OptKind::Range(_) | OptKind::Distribution(_) => Err(SimParamsError::bad(
                "",
                "a switch can only be optimized over a choice of its option keys",
            )),
        }
    }
}

/// A leaf of the parameter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Entry(Entry),
    Switch(Switch),
}

impl From<Entry> for Parameter {
    fn from(entry: Entry) -> Self {
        Parameter::Entry(entry)
    }
}

impl From<Switch> for Parameter {
    fn from(switch: Switch) -> Self {
        Parameter::Switch(switch)
    }
}

impl Parameter {
    fn core(&self) -> &LeafCore {
        match self {
            Parameter::Entry(entry) => &entry.core,
            Parameter::Switch(switch) => &switch.core,
        }
    }

    fn core_mut(&mut self) -> &mut LeafCore {
        match self {
            Parameter::Entry(entry) => &mut entry.core,
            Parameter::Switch(switch) => &mut switch.core,
        }
    }

    /// The declared value kind
    pub fn kind(&self) -> ValueKind {
        self.core().kind
    }

    pub fn units(&self) -> &str {
        &self.core().units
    }

    pub fn description(&self) -> &str {
        &self.core().description
    }

    /// The explicitly set value, if any
    pub fn value(&self) -> Option<&Value> {
        self.core().value.as_ref()
    }

    /// The default value, if any
    pub fn default_value(&self) -> Option<&Value> {
        self.core().default.as_ref()
    }

    pub fn opt(&self) -> Option<&OptSpec> {
        self.core().opt.as_ref()
    }

    /// Whether an explicit value is set
    pub fn is_set(&self) -> bool {
        self.core().value.is_some()
    }

    /// The value if set, else the default, else `NotSet`
    pub fn get(&self) -> Result<&Value> {
        self.value()
            .or_else(|| self.default_value())
            .ok_or_else(|| SimParamsError::not_set(""))
    }

    /// Like [`get`](Self::get), converted to a Rust type
    pub fn get_as<T: ParamType>(&self) -> Result<T> {
        let value = self.get()?;
        T::from_value(value).ok_or_else(|| {
            SimParamsError::bad("", format!("cannot read {} as {}", value.kind(), T::KIND))
        })
    }

    /// The value if set, else the default
    pub fn effective(&self) -> Option<&Value> {
        self.value().or_else(|| self.default_value())
    }

    /// Check a candidate value against this leaf's constraints without storing it
    pub fn validate(&self, value: Value) -> Result<Value> {
        match self {
            Parameter::Entry(entry) => entry.core.admit(value, |_| Ok(())),
            Parameter::Switch(switch) => switch.core.admit(value, |v| switch.membership(v)),
        }
    }

    /// Set the value. On failure the previous value is kept.
    pub fn set(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = self.validate(value.into())?;
        self.core_mut().value = Some(value);
        Ok(())
    }

    /// Clear the explicit value, falling back to the default
    pub fn unset(&mut self) {
        self.core_mut().value = None;
    }

    /// Replace the default with the same checks as [`set`](Self::set)
    pub fn set_default(&mut self, default: Option<Value>) -> Result<()> {
        let default = default.map(|value| self.validate(value)).transpose()?;
        self.core_mut().default = default;
        Ok(())
    }

    /// Attach, replace or remove the optimization spec
    pub fn set_opt(&mut self, opt: Option<OptSpec>) -> Result<()> {
        if let (Parameter::Switch(switch), Some(spec)) = (&*self, &opt) {
            switch.check_opt(spec)?;
        }
        self.core_mut().attach_opt(opt)
    }

    /// The spec's nominal value, else the current value, else the default
    pub fn nominal(&self) -> Option<&Value> {
        self.opt()
            .and_then(|opt| opt.nominal())
            .or_else(|| self.effective())
    }

    /// `(min, max)` when the leaf carries a range spec
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.opt().and_then(|opt| opt.bounds())
    }

    /// Draw a candidate from the optimization spec. Returns `None` without a
    /// spec or for function specs, which are evaluated by the tree.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Value> {
        self.opt().and_then(|opt| opt.sample(self.kind(), rng))
    }

    /// Sample and assign. Returns whether a new value was assigned.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<bool> {
        match self.sample(rng) {
            Some(value) => {
                self.set(value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether the effective value differs from the default
    pub fn is_modified(&self) -> bool {
        match self.value() {
            Some(value) => self.default_value() != Some(value),
            None => false,
        }
    }

    /// Make the current value the new default
    pub fn set_new_base(&mut self) {
        let core = self.core_mut();
        if let Some(value) = core.value.clone() {
            core.default = Some(value);
        }
    }

    /// The switch this leaf is, if it is one
    pub fn as_switch(&self) -> Option<&Switch> {
        match self {
            Parameter::Switch(switch) => Some(switch),
            Parameter::Entry(_) => None,
        }
    }

    /// Same kind, same variant and, for switches, same option keys
    pub(crate) fn same_shape(&self, other: &Parameter) -> bool {
        match (self, other) {
            (Parameter::Entry(a), Parameter::Entry(b)) => a.core.kind == b.core.kind,
            (Parameter::Switch(a), Parameter::Switch(b)) => {
                a.core.kind == b.core.kind && a.option_keys() == b.option_keys()
            }
            _ => false,
        }
    }
}
