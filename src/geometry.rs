use float_ord::FloatOrd;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::Pose;

/// A 3D point annotated with a preferred viewing direction.
///
/// The direction is stored as spherical angles: `rho` is the inclination from
/// +Z and `eta` the azimuth from +X, so `rho = π` points straight down -Z.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DirectionalPoint {
    /// Location.
    pub point: Point3<f64>,
    /// Inclination of the direction.
    pub rho: f64,
    /// Azimuth of the direction.
    pub eta: f64,
}

impl DirectionalPoint {
    /// Create a new directional point.
    pub fn new(x: f64, y: f64, z: f64, rho: f64, eta: f64) -> Self {
        Self {
            point: Point3::new(x, y, z),
            rho,
            eta,
        }
    }

    /// Unit vector of the direction.
    pub fn direction_unit(&self) -> Vector3<f64> {
        Vector3::new(
            self.rho.sin() * self.eta.cos(),
            self.rho.sin() * self.eta.sin(),
            self.rho.cos(),
        )
    }

    fn from_direction(point: Point3<f64>, direction: &Vector3<f64>) -> Self {
        let d = direction.normalize();
        Self {
            point,
            rho: d.z.clamp(-1.0, 1.0).acos(),
            eta: d.y.atan2(d.x),
        }
    }
}

/// A point of interest for coverage: either a plain location or a location
/// with a viewing direction.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum CoveragePoint {
    /// Undirected point; direction terms always evaluate to 1.
    Plain(Point3<f64>),
    /// Oriented surface sample.
    Directional(DirectionalPoint),
}

impl CoveragePoint {
    /// A plain point.
    pub fn plain(x: f64, y: f64, z: f64) -> Self {
        Self::Plain(Point3::new(x, y, z))
    }

    /// A directional point.
    pub fn directional(x: f64, y: f64, z: f64, rho: f64, eta: f64) -> Self {
        Self::Directional(DirectionalPoint::new(x, y, z, rho, eta))
    }

    /// The location of the point.
    #[inline]
    pub fn position(&self) -> &Point3<f64> {
        match self {
            Self::Plain(p) => p,
            Self::Directional(dp) => &dp.point,
        }
    }

    /// The directional part, if any.
    #[inline]
    pub fn direction(&self) -> Option<&DirectionalPoint> {
        match self {
            Self::Plain(_) => None,
            Self::Directional(dp) => Some(dp),
        }
    }

    /// Map from the local frame of `pose` into its parent frame, rotating the
    /// direction along with the location.
    pub fn map(&self, pose: &Pose) -> Self {
        match self {
            Self::Plain(p) => Self::Plain(pose.map(p)),
            Self::Directional(dp) => Self::Directional(DirectionalPoint::from_direction(
                pose.map(&dp.point),
                &pose.map_rotate(&dp.direction_unit()),
            )),
        }
    }

    /// Map from the parent frame into the local frame of `pose`.
    pub fn map_inverse(&self, pose: &Pose) -> Self {
        match self {
            Self::Plain(p) => Self::Plain(pose.map_inverse(p)),
            Self::Directional(dp) => Self::Directional(DirectionalPoint::from_direction(
                pose.map_inverse(&dp.point),
                &pose.map_rotate_inverse(&dp.direction_unit()),
            )),
        }
    }

    fn key(&self) -> [FloatOrd<f64>; 5] {
        // adding zero folds -0.0 into 0.0
        let k = |v: f64| FloatOrd(v + 0.0);
        let p = self.position();
        match self {
            Self::Plain(_) => [k(p.x), k(p.y), k(p.z), FloatOrd(f64::NAN), FloatOrd(f64::NAN)],
            Self::Directional(dp) => [k(p.x), k(p.y), k(p.z), k(dp.rho), k(dp.eta)],
        }
    }
}

impl From<Point3<f64>> for CoveragePoint {
    fn from(p: Point3<f64>) -> Self {
        Self::Plain(p)
    }
}

impl From<DirectionalPoint> for CoveragePoint {
    fn from(dp: DirectionalPoint) -> Self {
        Self::Directional(dp)
    }
}

impl PartialEq for CoveragePoint {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CoveragePoint {}

impl std::hash::Hash for CoveragePoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}
