use std::f64::consts::PI;

use nalgebra::Point3;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, Mount, Pose, Result, Triangle};

/// Parameters of a line laser.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LaserParams {
    /// Full fan angle of the projected plane, in radians.
    pub fan: f64,
    /// Projection depth along the local +Z axis.
    pub depth: f64,
}

/// A line laser projecting a planar fan in its local x-z plane.
///
/// The fan opens along local +Z from the origin. The world-frame triangle
/// spanned by the fan is cached and recomputed whenever the pose changes.
#[derive(Clone, PartialEq)]
pub struct LineLaser {
    params: LaserParams,
    pose: Pose,
    fan_triangle: Triangle,
}

impl std::fmt::Debug for LineLaser {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("LineLaser")
            .field("params", &self.params)
            .field("pose", &self.pose)
            .finish()
    }
}

impl LineLaser {
    /// Create a new laser.
    pub fn new(params: LaserParams, pose: Pose) -> Result<Self> {
        if !(params.fan > 0.0 && params.fan < PI) {
            return Err(Error::InvalidInput("laser fan must lie in (0, pi)"));
        }
        if !(params.depth > 0.0) {
            return Err(Error::InvalidInput("laser depth must be positive"));
        }
        let fan_triangle = fan_triangle(&params, &pose);
        Ok(Self {
            params,
            pose,
            fan_triangle,
        })
    }

    /// Laser parameters.
    #[inline]
    pub fn params(&self) -> &LaserParams {
        &self.params
    }

    /// Full fan angle.
    #[inline]
    pub fn fan(&self) -> f64 {
        self.params.fan
    }

    /// Projection depth.
    #[inline]
    pub fn depth(&self) -> f64 {
        self.params.depth
    }

    /// Pose of the laser in the world.
    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Move the laser.
    pub fn set_pose(&mut self, pose: Pose) {
        self.fan_triangle = fan_triangle(&self.params, &pose);
        self.pose = pose;
    }

    /// Half-width of the fan at local depth `z`.
    #[inline]
    pub fn half_width(&self, z: f64) -> f64 {
        z * (self.params.fan / 2.0).tan()
    }

    /// Whether a laser-frame point lies within the angular extent of the fan.
    #[inline]
    pub fn in_fan(&self, local: &Point3<f64>) -> bool {
        local.x.abs() <= self.half_width(local.z)
    }

    /// The world-frame triangle swept by the fan.
    #[inline]
    pub fn fan_triangle(&self) -> &Triangle {
        &self.fan_triangle
    }

    /// Whether the world-frame triangle `t` crosses the laser fan and could
    /// therefore block some of it.
    pub fn occluded_by(&self, t: &Triangle) -> bool {
        self.fan_triangle.overlap(t)
    }
}

impl Mount for LineLaser {
    fn mount_pose(&self) -> Pose {
        self.pose.clone()
    }
}

fn fan_triangle(params: &LaserParams, pose: &Pose) -> Triangle {
    let w = params.depth * (params.fan / 2.0).tan();
    Triangle::new(
        Point3::origin(),
        Point3::new(-w, 0.0, params.depth),
        Point3::new(w, 0.0, params.depth),
    )
    .mapped(pose)
}
