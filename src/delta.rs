use serde::{Deserialize, Serialize};

/// Current and previous period values of one raw measured quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub value: f64,
    #[serde(default)]
    pub prev: f64,
}

impl Aggregate {
    #[must_use]
    pub const fn new(value: f64, prev: f64) -> Self {
        Self { value, prev }
    }
}

/// A `{value, prev, change}` triple.
///
/// A side whose denominator was zero holds `NaN`; `change` is `NaN` as
/// soon as either side is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Delta {
    pub value: f64,
    pub prev: f64,
    pub change: f64,
}

impl Delta {
    #[must_use]
    pub fn new(value: f64, prev: f64) -> Self {
        Self {
            value,
            prev,
            change: value - prev,
        }
    }

    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.value.is_finite() && self.prev.is_finite() && self.change.is_finite()
    }
}

#[must_use]
pub fn compute_simple(agg: Aggregate) -> Delta {
    Delta::new(agg.value, agg.prev)
}

/// `min(denom, numer) / denom * scale` for both periods.
///
/// Bounce rate is `compute_ratio(bounces, visits, 100.0)`: bounces are
/// capped at the visit count so the rate never exceeds `scale`.
#[must_use]
pub fn compute_ratio(numer: Aggregate, denom: Aggregate, scale: f64) -> Delta {
    let value = capped_ratio(numer.value, denom.value, scale);
    let prev = capped_ratio(numer.prev, denom.prev, scale);
    Delta::new(value, prev)
}

/// `numer / denom` for both periods, unscaled (average visit duration).
#[must_use]
pub fn compute_rate(numer: Aggregate, denom: Aggregate) -> Delta {
    let value = guarded_div(numer.value, denom.value);
    let prev = guarded_div(numer.prev, denom.prev);
    Delta::new(value, prev)
}

fn capped_ratio(numer: f64, denom: f64, scale: f64) -> f64 {
    guarded_div(denom.min(numer), denom) * scale
}

fn guarded_div(numer: f64, denom: f64) -> f64 {
    if denom == 0.0 {
        tracing::trace!(numer, "zero denominator, metric is undefined");
        return f64::NAN;
    }
    numer / denom
}
