//! Parameter space definitions and concrete configurations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolution at which continuous axes are counted when estimating the
/// size of a space. Estimates are informational only.
const CONTINUOUS_RESOLUTION: f64 = 4_294_967_296.0; // 2^32

/// A single parameter dimension in the tuning space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    /// Human-readable parameter name (e.g. "unroll_factor").
    pub name: String,
    /// The kind of value range.
    pub kind: ParamKind,
}

/// Describes the admissible values of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamKind {
    /// Continuous uniform range [low, high].
    FloatRange { low: f64, high: f64 },
    /// Integer range [low, high] inclusive.
    IntRange { low: i64, high: i64 },
    /// Positive range compared in log-space.
    LogRange { low: f64, high: f64 },
    /// Categorical choices.
    Choice { values: Vec<serde_json::Value> },
}

/// A concrete parameter value inside a [`Configuration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Json(serde_json::Value),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// The full tuning space: an ordered list of parameter definitions.
///
/// The space is fixed for the lifetime of a run; techniques read it to
/// produce candidates and the session reads it for size reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpace {
    pub params: Vec<ParamDef>,
}

impl ParamSpace {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    pub fn add_int(mut self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.params.push(ParamDef {
            name: name.into(),
            kind: ParamKind::IntRange { low, high },
        });
        self
    }

    pub fn add_float(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.params.push(ParamDef {
            name: name.into(),
            kind: ParamKind::FloatRange { low, high },
        });
        self
    }

    pub fn add_log(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.params.push(ParamDef {
            name: name.into(),
            kind: ParamKind::LogRange { low, high },
        });
        self
    }

    pub fn add_choice(mut self, name: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        self.params.push(ParamDef {
            name: name.into(),
            kind: ParamKind::Choice { values },
        });
        self
    }

    pub fn param(&self, name: &str) -> Option<&ParamDef> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Approximate number of distinct configurations in this space.
    ///
    /// Discrete dimensions contribute their exact cardinality; continuous
    /// dimensions are counted at a fixed resolution. Always at least 1.
    pub fn estimate_size(&self) -> f64 {
        let mut total = 1.0f64;
        for param in &self.params {
            let dim = match &param.kind {
                ParamKind::IntRange { low, high } => (high - low + 1).max(1) as f64,
                ParamKind::Choice { values } => values.len().max(1) as f64,
                ParamKind::FloatRange { .. } | ParamKind::LogRange { .. } => {
                    CONTINUOUS_RESOLUTION
                }
            };
            total *= dim;
        }
        total
    }

    /// Check that `config` assigns an in-range value to every parameter
    /// of this space and nothing else.
    pub fn validate(&self, config: &Configuration) -> bool {
        if config.len() != self.params.len() {
            return false;
        }
        for param in &self.params {
            let value = match config.get(&param.name) {
                Some(v) => v,
                None => return false,
            };
            let ok = match (&param.kind, value) {
                (ParamKind::IntRange { low, high }, ParamValue::Int(v)) => {
                    *v >= *low && *v <= *high
                }
                (ParamKind::FloatRange { low, high }, ParamValue::Float(v)) => {
                    *v >= *low && *v <= *high
                }
                (ParamKind::LogRange { low, high }, ParamValue::Float(v)) => {
                    *v > 0.0 && *v >= *low && *v <= *high
                }
                (ParamKind::Choice { values }, ParamValue::Json(v)) => values.contains(v),
                _ => false,
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

impl Default for ParamSpace {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Configurations
// ---------------------------------------------------------------------------

/// An immutable assignment of a value to every parameter of a space.
///
/// Identity is structural: two configurations are equal iff they assign
/// equal values to the same parameter names. Multiple jobs may share one
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    values: BTreeMap<String, ParamValue>,
}

impl Configuration {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, ParamValue)>,
        S: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(ParamValue::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(ParamValue::as_float)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}
