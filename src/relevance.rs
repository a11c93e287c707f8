use std::f64::consts::PI;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{
    CoveragePoint, Error, Mount, PointCache, PolygonalFuzzyNumber, Pose, PoseConfig, Result,
};

/// A box-shaped region of relevance, graded per axis by polygonal fuzzy
/// numbers given as `(coordinate, degree)` vertices.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RelevanceRange {
    /// Vertices along x.
    pub x: Vec<(f64, f64)>,
    /// Vertices along y.
    pub y: Vec<(f64, f64)>,
    /// Vertices along z.
    pub z: Vec<(f64, f64)>,
}

/// A single relevant point: `[x, y, z]` or `[x, y, z, rho, eta]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RelevancePoint {
    /// Coordinates, optionally followed by direction angles.
    pub point: Vec<f64>,
    /// Degree of relevance, 1 if omitted.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub mu: Option<f64>,
}

/// Description of a desired-coverage (relevance) model.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RelevanceParams {
    /// Graded regions, sampled on a grid.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub ranges: Vec<RelevanceRange>,
    /// Grid spacing for `ranges`.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub step: f64,
    /// If set, every grid location is sampled as directional points, with
    /// the half circle of inclinations divided into `ddiv` parts.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub ddiv: Option<u32>,
    /// Explicit points.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub points: Vec<RelevancePoint>,
    /// Pose of the model relative to its mount (or the world).
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub pose: Option<PoseConfig>,
}

impl RelevanceParams {
    /// Build the relevance model in the world frame.
    ///
    /// Points are placed by `pose`, then by `mount` if given. Where the graded
    /// regions and explicit points share a point, the larger degree wins.
    pub fn generate(&self, mount: Option<&dyn Mount>) -> Result<PointCache> {
        let mut model = PointCache::new();
        for range in self.ranges.iter() {
            model.union_with(&self.sample_range(range)?);
        }

        let mut explicit = PointCache::new();
        for rp in self.points.iter() {
            let p = match rp.point.as_slice() {
                &[x, y, z] => CoveragePoint::plain(x, y, z),
                &[x, y, z, rho, eta] => CoveragePoint::directional(x, y, z, rho, eta),
                _ => return Err(Error::InvalidInput("relevance point needs 3 or 5 values")),
            };
            explicit.insert(p, rp.mu.unwrap_or(1.0));
        }
        model.union_with(&explicit);

        let local = match &self.pose {
            Some(config) => Pose::try_from(config)?,
            None => Pose::identity(),
        };
        let pose = match mount {
            Some(mount) => local.then(&mount.mount_pose()),
            None => local,
        };
        log::debug!("generated relevance model with {} points", model.len());
        Ok(model.iter().map(|(p, mu)| (p.map(&pose), mu)).collect())
    }

    fn sample_range(&self, range: &RelevanceRange) -> Result<PointCache> {
        if !(self.step > 0.0) {
            return Err(Error::InvalidInput("relevance grid step must be positive"));
        }
        let axes = [
            PolygonalFuzzyNumber::new(range.x.clone())?,
            PolygonalFuzzyNumber::new(range.y.clone())?,
            PolygonalFuzzyNumber::new(range.z.clone())?,
        ];
        let [xs, ys, zs] = [0, 1, 2].map(|i| samples(axes[i].extent(), self.step));
        let directions = match self.ddiv {
            Some(ddiv) if ddiv > 0 => Some(directions(ddiv)),
            _ => None,
        };

        let mut part = PointCache::new();
        for &x in xs.iter() {
            for &y in ys.iter() {
                for &z in zs.iter() {
                    let mu = axes[0].mu(x).min(axes[1].mu(y)).min(axes[2].mu(z));
                    if mu == 0.0 {
                        continue;
                    }
                    match &directions {
                        None => part.insert(CoveragePoint::plain(x, y, z), mu),
                        Some(directions) => {
                            for &(rho, eta) in directions.iter() {
                                part.insert(CoveragePoint::directional(x, y, z, rho, eta), mu);
                            }
                        }
                    }
                }
            }
        }
        Ok(part)
    }
}

/// Grid coordinates from `lo` to `hi` inclusive.
fn samples((lo, hi): (f64, f64), step: f64) -> Vec<f64> {
    // tolerate rounding when the extent is a whole number of steps
    let n = ((hi - lo) / step + 1e-9).floor() as usize;
    (0..=n).map(|i| lo + i as f64 * step).collect()
}

/// Directions covering the sphere: inclinations `k π / ddiv` and, away from
/// the poles, azimuths `j π / ddiv` over the full circle.
fn directions(ddiv: u32) -> Vec<(f64, f64)> {
    let d = PI / f64::from(ddiv);
    let mut result = Vec::new();
    for k in 0..=ddiv {
        let rho = f64::from(k) * d;
        if k == 0 || k == ddiv {
            result.push((rho, 0.0));
            continue;
        }
        for j in 0..2 * ddiv {
            result.push((rho, f64::from(j) * d));
        }
    }
    result
}
