//! Optimization specifications
//!
//! An [`OptSpec`] marks a leaf parameter as something an external optimizer may
//! vary, and describes how: inside a closed range, following a probability
//! distribution, among a discrete set of choices, or not at all because the
//! value is derived from other parameters through a function.
//!
//! Range, distribution and choice specs are independent degrees of freedom and
//! take part in packing/unpacking; function specs are re-evaluated after the
//! independent parameters change.

use crate::error::{Result, SimParamsError};
use crate::parameters::bounds::Bounds;
use crate::parameters::expression::{EvaluationContext, Expression};
use crate::parameters::path::FieldPath;
use crate::parameters::value::{Value, ValueKind};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::Distribution as _;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named probability distributions supported by distribution specs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Distribution {
    Normal { mean: f64, std: f64 },
    LogNormal { mu: f64, sigma: f64 },
    Uniform { low: f64, high: f64 },
    Exponential { lambda: f64 },
    Gamma { shape: f64, scale: f64 },
    Beta { alpha: f64, beta: f64 },
}

impl Distribution {
    /// Check the distribution parameters by building the sampler once.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let ok = match *self {
            Distribution::Normal { mean, std } => rand_distr::Normal::new(mean, std).is_ok(),
            Distribution::LogNormal { mu, sigma } => rand_distr::LogNormal::new(mu, sigma).is_ok(),
            Distribution::Uniform { low, high } => {
                low.is_finite() && high.is_finite() && low < high && (high - low).is_finite()
            }
            Distribution::Exponential { lambda } => lambda > 0.0 && rand_distr::Exp::new(lambda).is_ok(),
            Distribution::Gamma { shape, scale } => rand_distr::Gamma::new(shape, scale).is_ok(),
            Distribution::Beta { alpha, beta } => rand_distr::Beta::new(alpha, beta).is_ok(),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("invalid distribution parameters: {self}"))
        }
    }

    /// Draw one sample. Parameters are validated when the spec is built, so
    /// construction failures here only happen for hand-built values and fall
    /// back to NaN, which leaf validation then rejects.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Distribution::Normal { mean, std } => rand_distr::Normal::new(mean, std)
                .map(|d| d.sample(rng))
                .unwrap_or(f64::NAN),
            Distribution::LogNormal { mu, sigma } => rand_distr::LogNormal::new(mu, sigma)
                .map(|d| d.sample(rng))
                .unwrap_or(f64::NAN),
            Distribution::Uniform { low, high } => {
                if low < high && (high - low).is_finite() {
                    rng.gen_range(low..high)
                } else {
                    f64::NAN
                }
            }
            Distribution::Exponential { lambda } => rand_distr::Exp::new(lambda)
                .map(|d| d.sample(rng))
                .unwrap_or(f64::NAN),
            Distribution::Gamma { shape, scale } => rand_distr::Gamma::new(shape, scale)
                .map(|d| d.sample(rng))
                .unwrap_or(f64::NAN),
            Distribution::Beta { alpha, beta } => rand_distr::Beta::new(alpha, beta)
                .map(|d| d.sample(rng))
                .unwrap_or(f64::NAN),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Normal { mean, std } => write!(f, "Normal(mean={mean}, std={std})"),
            Distribution::LogNormal { mu, sigma } => write!(f, "LogNormal(mu={mu}, sigma={sigma})"),
            Distribution::Uniform { low, high } => write!(f, "Uniform(low={low}, high={high})"),
            Distribution::Exponential { lambda } => write!(f, "Exponential(lambda={lambda})"),
            Distribution::Gamma { shape, scale } => write!(f, "Gamma(shape={shape}, scale={scale})"),
            Distribution::Beta { alpha, beta } => write!(f, "Beta(alpha={alpha}, beta={beta})"),
        }
    }
}

/// A parameter computed from other parameters of the same tree
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    source: String,
    expr: Expression,
    dependencies: Vec<FieldPath>,
}

impl FunctionSpec {
    /// Parse a function spec from an expression over field paths.
    ///
    /// # Examples
    ///
    /// ```
    /// use simparams_rs::parameters::opt::FunctionSpec;
    ///
    /// let f = FunctionSpec::parse("2 * plasma.ip + layers[0].thickness").unwrap();
    /// assert_eq!(f.dependencies().len(), 2);
    /// ```
    pub fn parse(source: &str) -> Result<Self> {
        let expr = Expression::parse(source)?;
        let dependencies = expr
            .variables()
            .iter()
            .map(|name| FieldPath::parse(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            source: source.trim().to_string(),
            expr,
            dependencies,
        })
    }

    /// The expression text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The field paths this function reads
    pub fn dependencies(&self) -> &[FieldPath] {
        &self.dependencies
    }

    /// Evaluate against the current values of the referenced parameters
    pub fn evaluate<C: EvaluationContext + ?Sized>(&self, context: &C) -> Result<f64> {
        Ok(self.expr.evaluate(context)?)
    }
}

/// The four ways a parameter can take part in optimization
#[derive(Debug, Clone, PartialEq)]
pub enum OptKind {
    /// Uniform within closed bounds
    Range(Bounds),
    /// Drawn from a named distribution
    Distribution(Distribution),
    /// One of a finite set of values
    Choice(Vec<Value>),
    /// Derived from other parameters; not an independent degree of freedom
    Function(FunctionSpec),
}

/// Optimization annotation attached to a leaf parameter
#[derive(Debug, Clone, PartialEq)]
pub struct OptSpec {
    kind: OptKind,
    nominal: Option<Value>,
    label: Option<String>,
}

impl OptSpec {
    fn from_kind(kind: OptKind) -> Self {
        Self {
            kind,
            nominal: None,
            label: None,
        }
    }

    /// A uniform range `[min, max]`
    pub fn range(min: f64, max: f64) -> Result<Self> {
        Ok(Self::from_kind(OptKind::Range(Bounds::new(min, max)?)))
    }

    /// A named probability distribution
    pub fn distribution(distribution: Distribution) -> Result<Self> {
        distribution
            .validate()
            .map_err(|message| SimParamsError::bad("", message))?;
        Ok(Self::from_kind(OptKind::Distribution(distribution)))
    }

    /// A discrete, non-empty set of admissible values
    pub fn choice<V: Into<Value>>(choices: impl IntoIterator<Item = V>) -> Result<Self> {
        let choices: Vec<Value> = choices.into_iter().map(Into::into).collect();
        if choices.is_empty() {
            return Err(SimParamsError::bad("", "choice set must not be empty"));
        }
        for (i, choice) in choices.iter().enumerate() {
            if choices[..i].contains(choice) {
                return Err(SimParamsError::bad("", format!("duplicate choice {choice}")));
            }
        }
        Ok(Self::from_kind(OptKind::Choice(choices)))
    }

    /// A derived value, computed by an expression over other parameters
    pub fn function(source: &str) -> Result<Self> {
        Ok(Self::from_kind(OptKind::Function(FunctionSpec::parse(source)?)))
    }

    /// Set the value to use when the parameter is not sampled
    pub fn with_nominal(mut self, nominal: impl Into<Value>) -> Self {
        self.nominal = Some(nominal.into());
        self
    }

    /// Set the label reported by `opt_labels` in place of the field path
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn kind(&self) -> &OptKind {
        &self.kind
    }

    pub fn nominal(&self) -> Option<&Value> {
        self.nominal.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether this spec is an independent degree of freedom (everything but functions)
    pub fn is_independent(&self) -> bool {
        !matches!(self.kind, OptKind::Function(_))
    }

    /// `(min, max)` for range specs
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match &self.kind {
            OptKind::Range(bounds) => Some((*bounds).into()),
            _ => None,
        }
    }

    pub fn function_spec(&self) -> Option<&FunctionSpec> {
        match &self.kind {
            OptKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Check that this spec can annotate a leaf of `kind`, normalizing the
    /// choice values and nominal to that kind.
    pub(crate) fn prepare(mut self, kind: ValueKind) -> std::result::Result<Self, String> {
        match &mut self.kind {
            OptKind::Range(bounds) => {
                if !kind.is_numeric() {
                    return Err(format!("range spec requires a numeric parameter, not {kind}"));
                }
                if kind == ValueKind::Int {
                    bounds.integer_range().map_err(|e| e.to_string())?;
                }
            }
            OptKind::Distribution(_) | OptKind::Function(_) => {
                if !kind.is_numeric() {
                    return Err(format!(
                        "distribution and function specs require a numeric parameter, not {kind}"
                    ));
                }
            }
            OptKind::Choice(choices) => {
                if kind == ValueKind::FloatArray {
                    return Err("choice spec cannot annotate an array parameter".to_string());
                }
                let conformed = std::mem::take(choices)
                    .into_iter()
                    .map(|c| c.conform(kind))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                *choices = conformed;
            }
        }
        if let Some(nominal) = self.nominal.take() {
            let nominal = nominal.conform(kind)?;
            self.check(&nominal)?;
            self.nominal = Some(nominal);
        }
        Ok(self)
    }

    /// Membership check applied when a value is explicitly set
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match &self.kind {
            OptKind::Range(bounds) => match value.as_f64() {
                Some(x) => bounds.check(x).map_err(|e| e.to_string()),
                None => Err(format!("range spec cannot hold {value}")),
            },
            OptKind::Choice(choices) => {
                if choices.contains(value) {
                    Ok(())
                } else {
                    Err(format!("{value} is not one of the admissible choices"))
                }
            }
            OptKind::Distribution(_) | OptKind::Function(_) => Ok(()),
        }
    }

    /// Draw a candidate for a leaf of `kind`. Function specs are not sampled
    /// here and return `None`; the tree evaluates them instead.
    pub fn sample<R: Rng + ?Sized>(&self, kind: ValueKind, rng: &mut R) -> Option<Value> {
        let value = match &self.kind {
            OptKind::Range(bounds) => match kind {
                ValueKind::Int => {
                    let (low, high) = bounds.integer_range().ok()?;
                    Value::Int(rng.gen_range(low..=high))
                }
                _ => Value::Float(rng.gen_range(bounds.min..=bounds.max)),
            },
            OptKind::Distribution(distribution) => {
                let x = distribution.sample(rng);
                match kind {
                    ValueKind::Int => Value::Int(x.round() as i64),
                    _ => Value::Float(x),
                }
            }
            OptKind::Choice(choices) => choices.choose(rng)?.clone(),
            OptKind::Function(_) => return None,
        };
        Some(value)
    }

    /// Encode a leaf value as an optimizer number: choices encode as their
    /// zero-based index, numeric values as themselves.
    pub fn encode(&self, value: &Value) -> std::result::Result<f64, String> {
        match &self.kind {
            OptKind::Choice(choices) => choices
                .iter()
                .position(|c| c == value)
                .map(|i| i as f64)
                .ok_or_else(|| format!("{value} is not one of the admissible choices")),
            _ => value
                .as_f64()
                .ok_or_else(|| format!("cannot encode {value} as a number")),
        }
    }

    /// Decode an optimizer number into a value for a leaf of `kind`.
    /// Choice indices and integer values are rounded to the nearest integer.
    pub fn decode(&self, x: f64, kind: ValueKind) -> std::result::Result<Value, String> {
        if !x.is_finite() {
            return Err(format!("non-finite optimizer value {x}"));
        }
        match &self.kind {
            OptKind::Choice(choices) => {
                let index = x.round();
                if index < 0.0 || index as usize >= choices.len() {
                    return Err(format!(
                        "choice index {x} outside [0, {})",
                        choices.len()
                    ));
                }
                Ok(choices[index as usize].clone())
            }
            _ => match kind {
                ValueKind::Int => Ok(Value::Int(x.round() as i64)),
                _ => Ok(Value::Float(x)),
            },
        }
    }
}

impl fmt::Display for OptSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            OptKind::Range(bounds) => write!(f, "range [{}, {}]", bounds.min, bounds.max)?,
            OptKind::Distribution(d) => write!(f, "distribution {d}")?,
            OptKind::Choice(choices) => {
                let items: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
                write!(f, "choice [{}]", items.join(", "))?
            }
            OptKind::Function(func) => write!(f, "function {}", func.source())?,
        }
        if let Some(nominal) = &self.nominal {
            write!(f, " (nominal {nominal})")?;
        }
        Ok(())
    }
}
