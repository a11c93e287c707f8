use std::collections::BTreeMap;

use nalgebra::Point3;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, Mount, Pose, Result, Triangle};

/// Fraction of a sight line, at either end, in which a crossing does not count
/// as occlusion. Surface points lie exactly on their own triangles.
const ENDPOINT_TOLERANCE: f64 = 1e-6;

/// What a scene object represents, passed on to a [`Renderer`](crate::Renderer).
///
/// Occlusion does not depend on the category: every object's triangles block
/// sight lines alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum ObjectCategory {
    /// Static or moving scene geometry, including targets.
    #[default]
    Scene,
    /// The body of a camera.
    Camera,
    /// The body of a line laser.
    Laser,
}

/// An opaque object made of triangles given in its local frame.
///
/// The world-frame triangles are recomputed whenever the pose changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    category: ObjectCategory,
    pose: Pose,
    triangles: Vec<Triangle>,
    mapped: Vec<Triangle>,
}

impl SceneObject {
    /// Create a new object.
    pub fn new(category: ObjectCategory, pose: Pose, triangles: Vec<Triangle>) -> Self {
        let mapped = triangles.iter().map(|t| t.mapped(&pose)).collect();
        Self {
            category,
            pose,
            triangles,
            mapped,
        }
    }

    /// A rectangle spanning `x` and `y` in the local z = 0 plane, as two
    /// triangles.
    pub fn plane(pose: Pose, x: (f64, f64), y: (f64, f64)) -> Self {
        let a = Point3::new(x.0, y.0, 0.0);
        let b = Point3::new(x.1, y.0, 0.0);
        let c = Point3::new(x.1, y.1, 0.0);
        let d = Point3::new(x.0, y.1, 0.0);
        Self::new(
            ObjectCategory::Scene,
            pose,
            vec![Triangle::new(a, b, c), Triangle::new(a, c, d)],
        )
    }

    /// The category of this object.
    #[inline]
    pub fn category(&self) -> ObjectCategory {
        self.category
    }

    /// The pose of this object.
    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Move the object, remapping its triangles.
    pub fn set_pose(&mut self, pose: Pose) {
        self.mapped = self.triangles.iter().map(|t| t.mapped(&pose)).collect();
        self.pose = pose;
    }

    /// Triangles in the local frame.
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Triangles in the world frame.
    #[inline]
    pub fn mapped_triangles(&self) -> &[Triangle] {
        &self.mapped
    }
}

impl Mount for SceneObject {
    fn mount_pose(&self) -> Pose {
        self.pose.clone()
    }
}

/// Whether any of `triangles` blocks the sight line from `reference` to
/// `point`, ignoring crossings at the very ends of the line.
pub fn sight_line_blocked<'a, I>(triangles: I, point: &Point3<f64>, reference: &Point3<f64>) -> bool
where
    I: IntoIterator<Item = &'a Triangle>,
{
    triangles.into_iter().any(|t| {
        t.segment_parameter(reference, point)
            .map_or(false, |s| s > ENDPOINT_TOLERANCE && s < 1.0 - ENDPOINT_TOLERANCE)
    })
}

/// A named collection of opaque objects.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: BTreeMap<String, SceneObject>,
}

impl Scene {
    /// An empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an object.
    pub fn insert(&mut self, name: impl Into<String>, object: SceneObject) {
        self.objects.insert(name.into(), object);
    }

    /// Remove an object.
    pub fn remove(&mut self, name: &str) -> Option<SceneObject> {
        self.objects.remove(name)
    }

    /// Look up an object.
    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.objects.get(name)
    }

    /// Look up a target object by name.
    pub fn target(&self, name: &str) -> Result<&SceneObject> {
        self.objects
            .get(name)
            .ok_or_else(|| Error::UnknownTarget(name.to_string()))
    }

    /// Move an object.
    pub fn set_pose(&mut self, name: &str, pose: Pose) -> Result<()> {
        self.objects
            .get_mut(name)
            .ok_or_else(|| Error::UnknownTarget(name.to_string()))?
            .set_pose(pose);
        Ok(())
    }

    /// Iterate over named objects.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SceneObject)> {
        self.objects.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// World-frame triangles of every object except `exclude`.
    pub fn triangles_except<'a>(
        &'a self,
        exclude: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Triangle> + 'a {
        self.objects
            .iter()
            .filter(move |(name, _)| Some(name.as_str()) != exclude)
            .flat_map(|(_, object)| object.mapped_triangles().iter())
    }

    /// Whether the segment from `reference` to `point` is blocked by any
    /// opaque triangle strictly between its ends.
    pub fn occluded(&self, point: &Point3<f64>, reference: &Point3<f64>) -> bool {
        sight_line_blocked(self.triangles_except(None), point, reference)
    }

    /// As [`occluded`](Self::occluded), but ignores the body of the sensor
    /// named `owner`.
    pub fn occluded_for(&self, point: &Point3<f64>, reference: &Point3<f64>, owner: &str) -> bool {
        sight_line_blocked(self.triangles_except(Some(owner)), point, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn wall_scene() -> Scene {
        let mut scene = Scene::new();
        scene.insert(
            "wall",
            SceneObject::plane(
                Pose::from_translation(Vector3::new(0.0, 0.0, 500.0)),
                (-100.0, 100.0),
                (-100.0, 100.0),
            ),
        );
        scene
    }

    #[test]
    fn wall_blocks_sight_line() {
        let scene = wall_scene();
        let camera = Point3::new(0.0, 0.0, 1000.0);
        assert!(scene.occluded(&Point3::new(0.0, 0.0, 0.0), &camera));
        assert!(!scene.occluded(&Point3::new(500.0, 0.0, 0.0), &camera));
        // in front of the wall
        assert!(!scene.occluded(&Point3::new(0.0, 0.0, 700.0), &camera));
    }

    #[test]
    fn point_on_surface_is_not_self_occluded() {
        let scene = wall_scene();
        let camera = Point3::new(30.0, 0.0, 1000.0);
        assert!(!scene.occluded(&Point3::new(10.0, 10.0, 500.0), &camera));
    }

    #[test]
    fn owner_is_ignored() {
        let mut scene = wall_scene();
        scene.insert(
            "cam-body",
            SceneObject::new(
                ObjectCategory::Camera,
                Pose::identity(),
                vec![Triangle::new(
                    Point3::new(-10.0, -10.0, 990.0),
                    Point3::new(10.0, -10.0, 990.0),
                    Point3::new(0.0, 10.0, 990.0),
                )],
            ),
        );
        let camera = Point3::new(0.0, 0.0, 1000.0);
        let p = Point3::new(300.0, 0.0, 0.0);
        assert!(scene.occluded(&p, &camera));
        assert!(!scene.occluded_for(&p, &camera, "cam-body"));
    }

    #[test]
    fn category_does_not_change_occlusion() {
        let camera = Point3::new(0.0, 0.0, 1000.0);
        let p = Point3::new(0.0, 0.0, 0.0);
        let wall = wall_scene().remove("wall").unwrap();
        for category in [ObjectCategory::Scene, ObjectCategory::Camera, ObjectCategory::Laser] {
            let mut scene = Scene::new();
            let object = SceneObject::new(category, wall.pose().clone(), wall.triangles().to_vec());
            assert_eq!(object.category(), category);
            scene.insert("wall", object);
            assert!(scene.occluded(&p, &camera));
        }
    }

    #[test]
    fn moving_an_object_remaps_triangles() {
        let mut scene = wall_scene();
        let camera = Point3::new(0.0, 0.0, 1000.0);
        let p = Point3::new(0.0, 0.0, 0.0);
        assert!(scene.occluded(&p, &camera));
        scene
            .set_pose("wall", Pose::from_translation(Vector3::new(1000.0, 0.0, 500.0)))
            .unwrap();
        assert!(!scene.occluded(&p, &camera));
        assert!(matches!(
            scene.set_pose("nothing", Pose::identity()),
            Err(Error::UnknownTarget(_))
        ));
    }
}
