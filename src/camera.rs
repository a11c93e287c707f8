use std::f64::consts::FRAC_PI_2;

use nalgebra::Point3;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{CoveragePoint, Error, FuzzyNumber, Pose, Result, TaskParams};

/// Optical and application parameters of a single camera.
///
/// Can be converted into [`CoverageIntrinsics`] via `try_into()`, which
/// precomputes the visibility, resolution and focus fuzzy numbers:
///
/// ```
/// use cam_coverage::*;
/// let params = CameraParams {
///     aperture: 8.0,
///     focal_length: 12.0,
///     pixel_size: [0.00465, 0.00465],
///     principal_point: [512.0, 384.0],
///     dim: [1024, 768],
///     subject_distance: 1000.0,
///     gamma: 20.0,
///     r1: 3.0,
///     r2: 0.5,
///     cmax: 0.0093,
///     zeta: 0.3,
/// };
/// let intrinsics: CoverageIntrinsics = params.try_into().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraParams {
    /// Effective aperture diameter.
    pub aperture: f64,
    /// Focal length.
    pub focal_length: f64,
    /// Effective pixel size, horizontal and vertical.
    pub pixel_size: [f64; 2],
    /// Principal point in pixel coordinates.
    pub principal_point: [f64; 2],
    /// Sensor dimensions in pixels.
    pub dim: [u32; 2],
    /// Subject (focus) distance.
    pub subject_distance: f64,
    /// Visibility fuzzification, in pixels.
    pub gamma: f64,
    /// Fully acceptable resolution, in pixels per unit length.
    pub r1: f64,
    /// Acceptable resolution, in pixels per unit length.
    pub r2: f64,
    /// Maximum acceptable circle of confusion diameter.
    pub cmax: f64,
    /// Direction fuzzification, in radians.
    pub zeta: f64,
}

/// Angular extent of the sensor along one image axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisFov {
    /// Half-angle subtended by the sensor edge before the principal point.
    pub(crate) left: f64,
    /// Half-angle subtended by the sensor edge after the principal point.
    pub(crate) right: f64,
}

impl AxisFov {
    /// `2 sin((left + right) / 2)`, the chord of the full field of view.
    #[inline]
    pub(crate) fn chord(&self) -> f64 {
        2.0 * ((self.left + self.right) / 2.0).sin()
    }
}

/// Pose-independent part of the camera coverage model.
///
/// Create one from [`CameraParams`] with `try_into()`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageIntrinsics {
    params: CameraParams,
    pub(crate) cache: IntrinsicsCache,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IntrinsicsCache {
    pub(crate) fov: [AxisFov; 2],
    pub(crate) cv: [FuzzyNumber; 2],
    pub(crate) cr: FuzzyNumber,
    pub(crate) cf: FuzzyNumber,
}

impl TryFrom<CameraParams> for CoverageIntrinsics {
    type Error = Error;

    fn try_from(params: CameraParams) -> Result<Self> {
        let f = params.focal_length;
        if f <= 0.0 || params.aperture <= 0.0 {
            return Err(Error::InvalidInput("focal length and aperture must be positive"));
        }
        if params.dim.iter().any(|&d| d == 0) {
            return Err(Error::InvalidInput("sensor dimensions must be nonzero"));
        }
        if params.zeta <= 0.0 {
            return Err(Error::InvalidInput("direction fuzzification must be positive"));
        }

        let mut fov = [AxisFov {
            left: 0.0,
            right: 0.0,
        }; 2];
        let mut cv = Vec::with_capacity(2);
        for i in 0..2 {
            let s = params.pixel_size[i];
            let o = params.principal_point[i];
            let dim = f64::from(params.dim[i]);
            let left = 2.0 * ((o * s) / (2.0 * f)).atan();
            let right = 2.0 * (((dim - o) * s) / (2.0 * f)).atan();
            fov[i] = AxisFov { left, right };
            let g = (params.gamma / dim) * fov[i].chord();
            cv.push(FuzzyNumber::trapezoid(
                (-left.sin(), right.sin()),
                (-left.sin() + g, right.sin() - g),
            )?);
        }

        // resolution
        let mr = (0..2)
            .map(|i| f64::from(params.dim[i]) / fov[i].chord())
            .fold(f64::INFINITY, f64::min);
        let zr1 = depth_at_resolution(mr, params.r1);
        let zr2 = depth_at_resolution(mr, params.r2);
        let cr = FuzzyNumber::trapezoid((0.0, zr2), (0.0, zr1))?;

        // focus
        let af = params.aperture * f;
        let zs = params.subject_distance;
        let smin = params.pixel_size[0].min(params.pixel_size[1]);
        let near = |c: f64| (af * zs) / (af + c * (zs - f));
        let far = |c: f64| {
            let denom = af - c * (zs - f);
            if denom <= 0.0 {
                // beyond the hyperfocal distance everything far is sharp
                f64::INFINITY
            } else {
                (af * zs) / denom
            }
        };
        let cf = FuzzyNumber::trapezoid(
            (near(params.cmax), far(params.cmax)),
            (near(smin), far(smin)),
        )?;

        let cv = [cv[0], cv[1]];
        Ok(Self {
            params,
            cache: IntrinsicsCache { fov, cv, cr, cf },
        })
    }
}

/// Depth along the optical axis at which `resolution` pixels per unit length
/// occur, given the scale factor `mr`. Infinite for zero resolution.
#[inline]
pub(crate) fn depth_at_resolution(mr: f64, resolution: f64) -> f64 {
    if resolution == 0.0 {
        f64::INFINITY
    } else {
        mr / resolution
    }
}

impl CoverageIntrinsics {
    /// The parameters these intrinsics were built from.
    #[inline]
    pub fn params(&self) -> &CameraParams {
        &self.params
    }

    /// Visibility fuzzy numbers for the horizontal and vertical axes.
    #[inline]
    pub fn visibility(&self) -> &[FuzzyNumber; 2] {
        &self.cache.cv
    }

    /// Resolution fuzzy number over depth.
    #[inline]
    pub fn resolution(&self) -> &FuzzyNumber {
        &self.cache.cr
    }

    /// Focus fuzzy number over depth.
    #[inline]
    pub fn focus(&self) -> &FuzzyNumber {
        &self.cache.cf
    }
}

/// The individual coverage terms for one point in the camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageTerms {
    /// Field of view.
    pub visibility: f64,
    /// Resolution.
    pub resolution: f64,
    /// Focus.
    pub focus: f64,
    /// Viewing direction.
    pub direction: f64,
}

impl CoverageTerms {
    /// Algebraic product of all terms.
    #[inline]
    pub fn product(&self) -> f64 {
        self.visibility * self.resolution * self.focus * self.direction
    }
}

/// A fuzzy coverage model of a single camera.
///
/// # Examples
///
/// ```
/// use cam_coverage::*;
/// use nalgebra::{Unit, Vector3};
///
/// let params = CameraParams {
///     aperture: 8.0,
///     focal_length: 12.0,
///     pixel_size: [0.00465, 0.00465],
///     principal_point: [512.0, 384.0],
///     dim: [1024, 768],
///     subject_distance: 1000.0,
///     gamma: 20.0,
///     r1: 3.0,
///     r2: 0.5,
///     cmax: 0.0093,
///     zeta: 0.3,
/// };
/// let pose = Pose::from_view(
///     &Vector3::new(0.0, 0.0, 1000.0),
///     &Vector3::new(0.0, 0.0, 0.0),
///     &Unit::new_normalize(Vector3::new(0.0, 1.0, 0.0)),
/// );
/// let camera = Camera::new(params.try_into().unwrap(), pose);
/// let mu = camera.mu(&CoveragePoint::plain(0.0, 0.0, 0.0));
/// assert!(mu > 0.0 && mu <= 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    intrinsics: CoverageIntrinsics,
    pose: Pose,
}

impl Camera {
    /// Create a new camera from its intrinsics and pose.
    #[inline]
    pub fn new(intrinsics: CoverageIntrinsics, pose: Pose) -> Self {
        Self { intrinsics, pose }
    }

    /// Return a reference to the intrinsics.
    #[inline]
    pub fn intrinsics(&self) -> &CoverageIntrinsics {
        &self.intrinsics
    }

    /// Return the pose of the camera.
    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Move the camera. The intrinsic caches do not depend on the pose.
    #[inline]
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// The optical center in world coordinates.
    #[inline]
    pub fn center(&self) -> Point3<f64> {
        self.pose.origin()
    }

    /// Coverage terms of a point already in the camera frame.
    pub fn terms(&self, campoint: &CoveragePoint) -> CoverageTerms {
        let cache = &self.intrinsics.cache;
        let p = campoint.position();

        let visibility = if p.z == 0.0 {
            0.0
        } else {
            cache.cv[0].mu(p.x / p.z).min(cache.cv[1].mu(p.y / p.z))
        };

        let direction = match campoint.direction() {
            None => 1.0,
            Some(dp) => {
                let r = (p.x * p.x + p.y * p.y).sqrt();
                let terma = if r == 0.0 {
                    1.0
                } else {
                    (p.y / r) * dp.eta.sin() + (p.x / r) * dp.eta.cos()
                };
                let termb = if p.z == 0.0 { FRAC_PI_2 } else { (r / p.z).atan() };
                ((dp.rho - (FRAC_PI_2 + terma * termb)) / self.intrinsics.params.zeta)
                    .clamp(0.0, 1.0)
            }
        };

        CoverageTerms {
            visibility,
            resolution: cache.cr.mu(p.z),
            focus: cache.cf.mu(p.z),
            direction,
        }
    }

    /// Coverage degree of a world-frame point, in `[0, 1]`.
    pub fn mu(&self, point: &CoveragePoint) -> f64 {
        self.terms(&point.map_inverse(&self.pose)).product()
    }
}

/// A posed sensor whose coverage strength can be evaluated at points.
pub trait Sensor {
    /// Coverage strength of a world-frame point, in `[0, 1]`.
    fn strength(&self, point: &CoveragePoint, params: &TaskParams) -> Result<f64>;

    /// Pose of the sensor in the world.
    fn pose(&self) -> &Pose;

    /// Reference location for occlusion tests.
    fn center(&self) -> Point3<f64> {
        self.pose().origin()
    }
}

impl Sensor for Camera {
    fn strength(&self, point: &CoveragePoint, _params: &TaskParams) -> Result<f64> {
        Ok(self.mu(point))
    }

    fn pose(&self) -> &Pose {
        &self.pose
    }
}
