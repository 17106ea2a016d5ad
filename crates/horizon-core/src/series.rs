//! Static-or-per-snapshot scalar values.

use serde::{Deserialize, Serialize};

/// A scalar attribute that is either constant or given per snapshot.
///
/// Serialized untagged, so `0.9` and `[0.9, 0.8, 0.7]` are both valid in case
/// files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Series {
    Static(f64),
    Varying(Vec<f64>),
}

impl Series {
    pub fn constant(value: f64) -> Self {
        Series::Static(value)
    }

    pub fn varying(values: impl Into<Vec<f64>>) -> Self {
        Series::Varying(values.into())
    }

    /// Value at snapshot `t`.
    ///
    /// Lengths are checked during validation; an out-of-range index on an
    /// unvalidated series reads as `0.0`.
    #[inline]
    pub fn at(&self, t: usize) -> f64 {
        match self {
            Series::Static(v) => *v,
            Series::Varying(values) => values.get(t).copied().unwrap_or(0.0),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Series::Static(_))
    }

    /// True when the series can be indexed by every one of `n` snapshots.
    pub fn fits(&self, n: usize) -> bool {
        match self {
            Series::Static(_) => true,
            Series::Varying(values) => values.len() == n,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Series::Static(v) => v.is_finite(),
            Series::Varying(values) => values.iter().all(|v| v.is_finite()),
        }
    }

    pub fn max(&self) -> f64 {
        match self {
            Series::Static(v) => *v,
            Series::Varying(values) => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    pub fn min(&self) -> f64 {
        match self {
            Series::Static(v) => *v,
            Series::Varying(values) => values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

impl From<f64> for Series {
    fn from(value: f64) -> Self {
        Series::Static(value)
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Series::Varying(values)
    }
}
