//! Pluggable strict better-than ordering over measurements.

use tb_types::Measurement;

/// Strict weak ordering used to pick the best result.
///
/// `is_better(a, b)` must be irreflexive and transitive; the session
/// invokes objectives only through this interface, so swapping one never
/// touches session logic.
pub trait Objective: Send {
    fn is_better(&self, a: &Measurement, b: &Measurement) -> bool;

    /// Descriptor recorded on the run.
    fn name(&self) -> &str;
}

/// Default objective: smaller primary cost wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimizeTime;

impl Objective for MinimizeTime {
    fn is_better(&self, a: &Measurement, b: &Measurement) -> bool {
        a.time < b.time
    }

    fn name(&self) -> &str {
        "minimize_time"
    }
}

/// Maximize a named secondary metric; a missing metric always loses.
#[derive(Debug, Clone)]
pub struct MaximizeMetric {
    key: String,
    name: String,
}

impl MaximizeMetric {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let name = format!("maximize_{key}");
        Self { key, name }
    }
}

impl Objective for MaximizeMetric {
    fn is_better(&self, a: &Measurement, b: &Measurement) -> bool {
        let av = a.metric(&self.key).unwrap_or(f64::NEG_INFINITY);
        let bv = b.metric(&self.key).unwrap_or(f64::NEG_INFINITY);
        av > bv
    }

    fn name(&self) -> &str {
        &self.name
    }
}
