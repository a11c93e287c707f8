use nalgebra::geometry::{Isometry3, Point3, Rotation3, Translation3, UnitQuaternion};
use nalgebra::{Matrix3, Quaternion, Unit, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A rigid transform from a local frame into its parent (usually world) frame.
///
/// A point `p` given in the local frame maps to `R p + T` in the parent frame.
/// Composition is associative, [`Pose::identity`] is its neutral element and
/// every pose has an [`inverse`](Pose::inverse).
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize))]
pub struct Pose {
    pub(crate) rotation: UnitQuaternion<f64>,
    pub(crate) translation: Vector3<f64>,
    #[cfg_attr(feature = "serde-serialize", serde(skip))]
    pub(crate) cache: PoseCache,
}

impl std::fmt::Debug for Pose {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // This should match the auto derived Debug implementation but not print
        // the cache field.
        fmt.debug_struct("Pose")
            .field("rotation", &self.rotation)
            .field("translation", &self.translation)
            .finish()
    }
}

#[derive(Clone, PartialEq)]
pub(crate) struct PoseCache {
    pub(crate) iso: Isometry3<f64>,
    pub(crate) iso_inv: Isometry3<f64>,
}

impl std::fmt::Debug for PoseCache {
    fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // do not show cache
        Ok(())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create a new pose from a rotation and a translation.
    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        let iso = Isometry3::from_parts(Translation3::from(translation), rotation);
        let iso_inv = iso.inverse();
        Self {
            rotation,
            translation,
            cache: PoseCache { iso, iso_inv },
        }
    }

    /// The identity pose.
    pub fn identity() -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::zeros())
    }

    /// A pure translation.
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::new(UnitQuaternion::identity(), translation)
    }

    /// Create a new instance from an [`nalgebra::Isometry3`].
    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        Self::new(iso.rotation, iso.translation.vector)
    }

    /// Create a pose located at `center`, looking at `lookat` with `up` roughly
    /// along the local -Y axis (the camera convention).
    pub fn from_view(center: &Vector3<f64>, lookat: &Vector3<f64>, up: &Unit<Vector3<f64>>) -> Self {
        let dir = Unit::new_normalize(lookat - center);
        // local +Z along `dir`, local -Y as close to `up` as possible
        let x = Unit::new_normalize(dir.cross(up.as_ref()));
        let y = dir.cross(&x);
        let m = Matrix3::from_columns(&[x.into_inner(), y, dir.into_inner()]);
        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(m));
        Self::new(rotation, *center)
    }

    /// Return the rotation part of the pose.
    #[inline]
    pub fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.rotation
    }

    /// Return the translation part of the pose (the local origin in the parent frame).
    #[inline]
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Return the local origin as a point in the parent frame.
    #[inline]
    pub fn origin(&self) -> Point3<f64> {
        Point3::from(self.translation)
    }

    /// Return the pose as an isometry.
    #[inline]
    pub fn isometry(&self) -> &Isometry3<f64> {
        &self.cache.iso
    }

    /// The inverse pose, mapping parent-frame coordinates back to the local frame.
    pub fn inverse(&self) -> Pose {
        Pose::from_isometry(&self.cache.iso_inv)
    }

    /// Apply `self` first, then `next`.
    pub fn then(&self, next: &Pose) -> Pose {
        Pose::from_isometry(&(next.cache.iso * self.cache.iso))
    }

    /// Fold an ordered sequence of poses into one; the first pose is applied
    /// first. An empty sequence yields the identity.
    pub fn chain<'a, I>(poses: I) -> Pose
    where
        I: IntoIterator<Item = &'a Pose>,
    {
        poses
            .into_iter()
            .fold(Pose::identity(), |acc, pose| acc.then(pose))
    }

    /// Map a point from the local frame into the parent frame.
    #[inline]
    pub fn map(&self, point: &Point3<f64>) -> Point3<f64> {
        self.cache.iso.transform_point(point)
    }

    /// Map a point from the parent frame into the local frame.
    #[inline]
    pub fn map_inverse(&self, point: &Point3<f64>) -> Point3<f64> {
        self.cache.iso_inv.transform_point(point)
    }

    /// Rotate a direction vector from the local frame into the parent frame.
    #[inline]
    pub fn map_rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.transform_vector(v)
    }

    /// Rotate a direction vector from the parent frame into the local frame.
    #[inline]
    pub fn map_rotate_inverse(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse_transform_vector(v)
    }
}

/// Supported encodings of the rotation part of a [`PoseConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationFormat {
    /// `[w, x, y, z]`
    Quaternion,
    /// Nine values, row major.
    Matrix,
    /// `[angle, ax, ay, az]`, angle in radians.
    AxisAngle,
    /// Three intrinsic rotations about the named axes, in order.
    Euler {
        /// Axis order, e.g. `[0, 1, 2]` for `xyz`.
        axes: [usize; 3],
        /// Whether the angles are given in degrees.
        degrees: bool,
    },
}

impl std::str::FromStr for RotationFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "quaternion" => Ok(Self::Quaternion),
            "matrix" => Ok(Self::Matrix),
            "axis-angle" => Ok(Self::AxisAngle),
            _ => {
                let unrecognized = || Error::UnrecognizedRotationFormat(s.to_string());
                let mut parts = s.split('-');
                if parts.next() != Some("euler") {
                    return Err(unrecognized());
                }
                let convention = parts.next().ok_or_else(unrecognized)?;
                let degrees = match parts.next() {
                    Some("deg") => true,
                    Some("rad") => false,
                    _ => return Err(unrecognized()),
                };
                if parts.next().is_some() || convention.len() != 3 {
                    return Err(unrecognized());
                }
                let mut axes = [0; 3];
                for (axis, c) in axes.iter_mut().zip(convention.chars()) {
                    *axis = match c {
                        'x' => 0,
                        'y' => 1,
                        'z' => 2,
                        _ => return Err(unrecognized()),
                    };
                }
                Ok(Self::Euler { axes, degrees })
            }
        }
    }
}

impl RotationFormat {
    /// Build a rotation from its encoded values.
    pub fn rotation(&self, r: &[f64]) -> Result<UnitQuaternion<f64>> {
        match *self {
            Self::Quaternion => {
                let [w, x, y, z] = take::<4>(r)?;
                let q = Quaternion::new(w, x, y, z);
                if q.norm() == 0.0 {
                    return Err(Error::InvalidRotation);
                }
                Ok(UnitQuaternion::from_quaternion(q))
            }
            Self::Matrix => {
                let m = Matrix3::from_row_slice(&take::<9>(r)?);
                let rot = Rotation3::from_matrix_unchecked(m);
                let rquat = UnitQuaternion::from_rotation_matrix(&rot);
                // reject anything that is not a proper rotation
                if approx::relative_ne!(*rquat.to_rotation_matrix().matrix(), m, epsilon = 1e-6) {
                    return Err(Error::InvalidRotation);
                }
                Ok(rquat)
            }
            Self::AxisAngle => {
                let [angle, ax, ay, az] = take::<4>(r)?;
                let axis = Unit::try_new(Vector3::new(ax, ay, az), f64::EPSILON)
                    .ok_or(Error::InvalidRotation)?;
                Ok(UnitQuaternion::from_axis_angle(&axis, angle))
            }
            Self::Euler { axes, degrees } => {
                let mut angles = take::<3>(r)?;
                if degrees {
                    angles.iter_mut().for_each(|a| *a = a.to_radians());
                }
                Ok(axes
                    .iter()
                    .zip(angles.iter())
                    .fold(UnitQuaternion::identity(), |acc, (&axis, &angle)| {
                        let mut v = Vector3::zeros();
                        v[axis] = 1.0;
                        acc * UnitQuaternion::from_axis_angle(&Unit::new_unchecked(v), angle)
                    }))
            }
        }
    }
}

fn take<const N: usize>(r: &[f64]) -> Result<[f64; N]> {
    r.try_into()
        .map_err(|_| Error::InvalidInput("wrong number of rotation values"))
}

/// Configuration form of a [`Pose`]: translation plus an encoded rotation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PoseConfig {
    /// Translation.
    pub t: [f64; 3],
    /// Rotation values, interpreted according to `rformat`.
    pub r: Vec<f64>,
    /// Rotation format, e.g. `quaternion` or `euler-zyx-deg`.
    pub rformat: String,
}

impl TryFrom<&PoseConfig> for Pose {
    type Error = Error;

    fn try_from(config: &PoseConfig) -> Result<Self> {
        let format: RotationFormat = config.rformat.parse()?;
        let rotation = format.rotation(&config.r)?;
        Ok(Pose::new(rotation, Vector3::from(config.t)))
    }
}

/// An object that provides a pose other objects can be mounted on.
///
/// An object mounted with local pose `P` on a mount `M` sits at `P` then
/// `M.mount_pose()` in the world.
pub trait Mount {
    /// The pose of the mounting point in the world frame.
    fn mount_pose(&self) -> Pose;
}

impl Mount for Pose {
    fn mount_pose(&self) -> Pose {
        self.clone()
    }
}

/// A serial chain of joint transforms on a base pose, e.g. a robot arm whose
/// end effector carries a sensor.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PoseChain {
    /// Joint transforms, ordered from the end effector towards the base.
    pub joints: Vec<Pose>,
    /// Pose of the chain's base in the world.
    pub base: Pose,
}

impl Mount for PoseChain {
    fn mount_pose(&self) -> Pose {
        Pose::chain(self.joints.iter().chain(std::iter::once(&self.base)))
    }
}

// The cache has to be rebuilt after deserialization, so this cannot simply be
// derived.
#[cfg(feature = "serde-serialize")]
impl<'de> serde::Deserialize<'de> for Pose {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;
        use std::fmt;

        #[derive(Deserialize)]
        #[serde(field_identifier, rename_all = "lowercase")]
        enum Field {
            Rotation,
            Translation,
        }

        struct PoseVisitor;

        impl<'de> serde::de::Visitor<'de> for PoseVisitor {
            type Value = Pose;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("struct Pose")
            }

            fn visit_seq<V>(self, mut seq: V) -> std::result::Result<Pose, V::Error>
            where
                V: serde::de::SeqAccess<'de>,
            {
                let rotation = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let translation = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                Ok(Pose::new(rotation, translation))
            }

            fn visit_map<V>(self, mut map: V) -> std::result::Result<Pose, V::Error>
            where
                V: serde::de::MapAccess<'de>,
            {
                let mut rotation = None;
                let mut translation = None;
                while let Some(key) = map.next_key()? {
                    match key {
                        Field::Rotation => {
                            if rotation.is_some() {
                                return Err(de::Error::duplicate_field("rotation"));
                            }
                            rotation = Some(map.next_value()?);
                        }
                        Field::Translation => {
                            if translation.is_some() {
                                return Err(de::Error::duplicate_field("translation"));
                            }
                            translation = Some(map.next_value()?);
                        }
                    }
                }
                let rotation = rotation.ok_or_else(|| de::Error::missing_field("rotation"))?;
                let translation =
                    translation.ok_or_else(|| de::Error::missing_field("translation"))?;
                Ok(Pose::new(rotation, translation))
            }
        }

        const FIELDS: &[&str] = &["rotation", "translation"];
        deserializer.deserialize_struct("Pose", FIELDS, PoseVisitor)
    }
}
