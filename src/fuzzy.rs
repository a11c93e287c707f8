//! Fuzzy numbers and discrete fuzzy sets.
//!
//! Everything here is a pure value type. Set operations build new sets and
//! never mutate their operands, so fusion over many sets may be evaluated in
//! any order.

use std::collections::HashMap;
use std::hash::Hash;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{CoveragePoint, Error, Result};

/// A trapezoidal fuzzy number.
///
/// Membership is 1 inside the core interval, 0 outside the support interval and
/// linear in between. Interval bounds may be infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct FuzzyNumber {
    support: (f64, f64),
    core: (f64, f64),
}

impl FuzzyNumber {
    /// Create a new trapezoidal fuzzy number. The core must lie within the
    /// support.
    pub fn trapezoid(support: (f64, f64), core: (f64, f64)) -> Result<Self> {
        if !(support.0 <= core.0 && core.0 <= core.1 && core.1 <= support.1) {
            return Err(Error::InvalidInput("core must lie within support"));
        }
        Ok(Self { support, core })
    }

    /// Support interval.
    #[inline]
    pub fn support(&self) -> (f64, f64) {
        self.support
    }

    /// Core interval.
    #[inline]
    pub fn core(&self) -> (f64, f64) {
        self.core
    }

    /// Membership degree of `x`.
    ///
    /// A ramp running out to an infinite support bound has no slope, so it
    /// stays at 1.
    pub fn mu(&self, x: f64) -> f64 {
        if self.core.0 <= x && x <= self.core.1 {
            1.0
        } else if x <= self.support.0 || x >= self.support.1 {
            0.0
        } else if x < self.core.0 {
            if self.support.0.is_infinite() {
                1.0
            } else {
                (x - self.support.0) / (self.core.0 - self.support.0)
            }
        } else if self.support.1.is_infinite() {
            1.0
        } else {
            (self.support.1 - x) / (self.support.1 - self.core.1)
        }
    }
}

/// A piecewise-linear fuzzy number through `(x, mu)` vertices.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PolygonalFuzzyNumber {
    points: Vec<(f64, f64)>,
}

impl PolygonalFuzzyNumber {
    /// Create from vertices sorted by `x` with degrees in `[0, 1]`.
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::InvalidInput("polygonal fuzzy number needs vertices"));
        }
        if points.windows(2).any(|w| w[1].0 < w[0].0) {
            return Err(Error::InvalidInput("polygon vertices must be sorted"));
        }
        if points.iter().any(|&(_, mu)| !(0.0..=1.0).contains(&mu)) {
            return Err(Error::InvalidInput("membership degree outside [0, 1]"));
        }
        Ok(Self { points })
    }

    /// Smallest and largest `x` with a vertex.
    pub fn extent(&self) -> (f64, f64) {
        // non-empty by construction
        (self.points[0].0, self.points[self.points.len() - 1].0)
    }

    /// Membership degree of `x`.
    pub fn mu(&self, x: f64) -> f64 {
        let (lo, hi) = self.extent();
        if x < lo || x > hi {
            return 0.0;
        }
        for w in self.points.windows(2) {
            let ((x0, m0), (x1, m1)) = (w[0], w[1]);
            if x0 <= x && x <= x1 {
                if x1 == x0 {
                    return m0.max(m1);
                }
                return m0 + (m1 - m0) * (x - x0) / (x1 - x0);
            }
        }
        self.points[0].1
    }
}

/// A t-norm used to fuse per-camera degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum FusionNorm {
    /// Pointwise minimum.
    #[default]
    Minimum,
    /// Algebraic product.
    Product,
}

impl FusionNorm {
    /// Combine two degrees.
    #[inline]
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            Self::Minimum => a.min(b),
            Self::Product => a * b,
        }
    }
}

/// A discrete fuzzy set: keys with membership degrees in `(0, 1]`.
///
/// Keys with degree zero are never stored; a key that is absent has degree 0.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzySet<K: Eq + Hash> {
    elements: HashMap<K, f64>,
}

/// A fuzzy set of coverage points.
pub type PointCache = FuzzySet<CoveragePoint>;

impl<K: Eq + Hash> Default for FuzzySet<K> {
    fn default() -> Self {
        Self {
            elements: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> FuzzySet<K> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the degree of `key`, replacing any previous degree. The degree is
    /// clamped into `[0, 1]`; a zero degree removes the key.
    pub fn insert(&mut self, key: K, mu: f64) {
        let mu = mu.clamp(0.0, 1.0);
        if mu > 0.0 {
            self.elements.insert(key, mu);
        } else {
            self.elements.remove(&key);
        }
    }

    /// Remove `key`.
    pub fn remove(&mut self, key: &K) -> Option<f64> {
        self.elements.remove(key)
    }

    /// Degree of `key`, zero if absent.
    #[inline]
    pub fn mu(&self, key: &K) -> f64 {
        self.elements.get(key).copied().unwrap_or(0.0)
    }

    /// Whether `key` has a nonzero degree.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.elements.contains_key(key)
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the set has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over `(key, degree)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.elements.iter().map(|(k, mu)| (k, *mu))
    }

    /// Iterate over keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.elements.keys()
    }

    /// Sigma-count: the sum of all degrees.
    pub fn cardinality(&self) -> f64 {
        self.elements.values().sum()
    }

    /// Pointwise maximum.
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    /// In-place pointwise maximum.
    pub fn union_with(&mut self, other: &Self) {
        for (k, mu) in other.iter() {
            let entry = self.elements.entry(k.clone()).or_insert(0.0);
            *entry = entry.max(mu);
        }
    }

    /// Pointwise minimum.
    pub fn intersection(&self, other: &Self) -> Self {
        self.intersection_with(other, FusionNorm::Minimum)
    }

    /// Intersection under the given t-norm. Only keys present in both sets
    /// survive.
    pub fn intersection_with(&self, other: &Self, norm: FusionNorm) -> Self {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut result = Self::new();
        for (k, mu) in small.iter() {
            if let Some(&other_mu) = large.elements.get(k) {
                result.insert(k.clone(), norm.apply(mu, other_mu));
            }
        }
        result
    }

    /// Degree to which this set covers `desired`: `|self ∩ desired| / |desired|`.
    ///
    /// Zero when `desired` is empty.
    pub fn overlap(&self, desired: &Self) -> f64 {
        let total = desired.cardinality();
        if total == 0.0 {
            return 0.0;
        }
        (self.intersection(desired).cardinality() / total).clamp(0.0, 1.0)
    }
}

impl<K: Eq + Hash + Clone> FromIterator<(K, f64)> for FuzzySet<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, mu) in iter {
            set.insert(k, mu);
        }
        set
    }
}
