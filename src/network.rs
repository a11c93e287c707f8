use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;

use crate::{
    Camera, CoveragePoint, Error, FusionNorm, PointCache, Result, Scene, Sensor, Task, TaskParams,
};

/// An n-ocular fuzzy coverage model of a camera network.
///
/// Each camera keeps an in-scene set: the tracked points it covers with
/// nonzero degree and an unobstructed line of sight. The network model is the
/// union, over every combination of `ocular` cameras, of the intersection of
/// their in-scene sets. It is recomputed lazily; any change to cameras, points
/// or the scene marks it stale.
#[derive(Debug, Clone)]
pub struct MultiCamera<C = Camera> {
    ocular: usize,
    norm: FusionNorm,
    scene: Scene,
    params: TaskParams,
    points: HashSet<CoveragePoint>,
    cameras: BTreeMap<String, C>,
    inscene: BTreeMap<String, PointCache>,
    model: PointCache,
    model_updated: bool,
}

impl<C: Sensor> MultiCamera<C> {
    /// Create an empty network requiring coverage by `ocular` cameras at once.
    pub fn new(ocular: usize, scene: Scene) -> Result<Self> {
        if ocular < 1 {
            return Err(Error::InvalidOcular(ocular));
        }
        Ok(Self {
            ocular,
            norm: FusionNorm::default(),
            scene,
            params: TaskParams::new(),
            points: HashSet::new(),
            cameras: BTreeMap::new(),
            inscene: BTreeMap::new(),
            model: PointCache::new(),
            model_updated: false,
        })
    }

    /// Use `norm` to fuse the degrees of the cameras in each combination.
    pub fn with_fusion_norm(mut self, norm: FusionNorm) -> Self {
        self.norm = norm;
        self.model_updated = false;
        self
    }

    /// Task parameters handed to the cameras when evaluating tracked points.
    pub fn with_task_params(mut self, params: TaskParams) -> Result<Self> {
        self.set_task_params(params)?;
        Ok(self)
    }

    /// The task parameters used for tracked points.
    #[inline]
    pub fn task_params(&self) -> &TaskParams {
        &self.params
    }

    /// Replace the task parameters and recompute every in-scene set.
    ///
    /// On error the previous parameters and sets are kept.
    pub fn set_task_params(&mut self, params: TaskParams) -> Result<()> {
        let inscene = self.compute_all_inscene(&self.scene, &params)?;
        self.params = params;
        self.commit_inscene(inscene);
        Ok(())
    }

    /// Required number of simultaneously covering cameras.
    #[inline]
    pub fn ocular(&self) -> usize {
        self.ocular
    }

    /// The fusion t-norm.
    #[inline]
    pub fn fusion_norm(&self) -> FusionNorm {
        self.norm
    }

    /// The scene used for occlusion.
    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Change the scene, then recompute every in-scene set.
    ///
    /// If `f` or the recomputation fails, the scene is restored.
    pub fn modify_scene<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Scene) -> Result<T>,
    {
        let mut scene = self.scene.clone();
        let value = f(&mut scene)?;
        let inscene = self.compute_all_inscene(&scene, &self.params)?;
        self.scene = scene;
        self.commit_inscene(inscene);
        Ok(value)
    }

    /// Iterate over named cameras.
    pub fn cameras(&self) -> impl Iterator<Item = (&str, &C)> {
        self.cameras.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a camera.
    pub fn camera(&self, name: &str) -> Result<&C> {
        self.cameras
            .get(name)
            .ok_or_else(|| Error::UnknownCamera(name.to_string()))
    }

    /// Number of cameras.
    #[inline]
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Whether the network has no cameras.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Add (or replace) a camera and compute its in-scene set.
    ///
    /// If a tracked point cannot be evaluated, the network is left unchanged.
    pub fn add_camera(&mut self, name: impl Into<String>, camera: C) -> Result<()> {
        let name = name.into();
        log::debug!("adding camera {name}");
        let set = self.compute_inscene(&self.scene, &self.params, &name, &camera)?;
        self.cameras.insert(name.clone(), camera);
        self.inscene.insert(name, set);
        self.model_updated = false;
        Ok(())
    }

    /// Remove a camera and its in-scene set.
    pub fn remove_camera(&mut self, name: &str) -> Result<C> {
        let camera = self
            .cameras
            .remove(name)
            .ok_or_else(|| Error::UnknownCamera(name.to_string()))?;
        self.inscene.remove(name);
        self.model_updated = false;
        Ok(camera)
    }

    /// Change a camera (e.g. move it), then recompute its in-scene set.
    ///
    /// The change is applied to a copy, which replaces the camera only once
    /// its in-scene set has been computed.
    pub fn modify_camera<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        C: Clone,
        F: FnOnce(&mut C),
    {
        let mut camera = self.camera(name)?.clone();
        f(&mut camera);
        let set = self.compute_inscene(&self.scene, &self.params, name, &camera)?;
        self.cameras.insert(name.to_string(), camera);
        self.inscene.insert(name.to_string(), set);
        self.model_updated = false;
        Ok(())
    }

    /// The tracked points.
    pub fn points(&self) -> impl Iterator<Item = &CoveragePoint> {
        self.points.iter()
    }

    /// Track a new point and add it to the in-scene set of every camera that
    /// covers it.
    ///
    /// If any camera fails to evaluate the point, it is not tracked.
    pub fn add_point(&mut self, point: CoveragePoint) -> Result<()> {
        let degrees = self
            .cameras
            .iter()
            .map(|(name, camera)| {
                gated_strength(&self.scene, name, camera, &point, &self.params)
                    .map(|mu| (name.clone(), mu))
            })
            .collect::<Result<Vec<(String, f64)>>>()?;
        self.points.insert(point);
        for (name, mu) in degrees {
            if mu > 0.0 {
                self.inscene.entry(name).or_default().insert(point, mu);
            }
        }
        self.model_updated = false;
        Ok(())
    }

    /// Track several points.
    ///
    /// On error none of them are tracked.
    pub fn add_points<I>(&mut self, points: I) -> Result<()>
    where
        I: IntoIterator<Item = CoveragePoint>,
    {
        let previous = self.points.clone();
        self.points.extend(points);
        match self.compute_all_inscene(&self.scene, &self.params) {
            Ok(inscene) => {
                self.commit_inscene(inscene);
                Ok(())
            }
            Err(e) => {
                self.points = previous;
                Err(e)
            }
        }
    }

    /// The in-scene set of a camera.
    pub fn inscene(&self, name: &str) -> Result<&PointCache> {
        self.inscene
            .get(name)
            .ok_or_else(|| Error::UnknownCamera(name.to_string()))
    }

    /// Recompute the in-scene set of one camera from all tracked points.
    pub fn update_inscene(&mut self, name: &str) -> Result<()> {
        let camera = self.camera(name)?;
        let set = self.compute_inscene(&self.scene, &self.params, name, camera)?;
        self.inscene.insert(name.to_string(), set);
        self.model_updated = false;
        Ok(())
    }

    fn compute_inscene(
        &self,
        scene: &Scene,
        params: &TaskParams,
        name: &str,
        camera: &C,
    ) -> Result<PointCache> {
        let mut set = PointCache::new();
        for point in self.points.iter() {
            let mu = gated_strength(scene, name, camera, point, params)?;
            if mu > 0.0 {
                set.insert(*point, mu);
            }
        }
        log::trace!("camera {name} covers {} of {} points", set.len(), self.points.len());
        Ok(set)
    }

    fn compute_all_inscene(
        &self,
        scene: &Scene,
        params: &TaskParams,
    ) -> Result<BTreeMap<String, PointCache>> {
        self.cameras
            .iter()
            .map(|(name, camera)| {
                self.compute_inscene(scene, params, name, camera)
                    .map(|set| (name.clone(), set))
            })
            .collect()
    }

    fn commit_inscene(&mut self, inscene: BTreeMap<String, PointCache>) {
        self.inscene = inscene;
        self.model_updated = false;
    }

    /// Whether the network model reflects the current in-scene sets.
    #[inline]
    pub fn is_model_current(&self) -> bool {
        self.model_updated
    }

    fn check_ocular(&self, cameras: usize) -> Result<()> {
        if cameras < self.ocular {
            return Err(Error::TooFewCameras {
                cameras,
                ocular: self.ocular,
            });
        }
        Ok(())
    }

    /// Recompute the network model from the in-scene sets.
    pub fn update_model(&mut self) -> Result<()> {
        self.check_ocular(self.cameras.len())?;
        self.model = fuse(self.inscene.values(), self.ocular, self.norm);
        log::debug!(
            "updated {}-ocular model over {} cameras: {} points",
            self.ocular,
            self.cameras.len(),
            self.model.len()
        );
        self.model_updated = true;
        Ok(())
    }

    /// The network model, recomputed first if stale.
    pub fn model(&mut self) -> Result<&PointCache> {
        if !self.model_updated {
            self.update_model()?;
        }
        Ok(&self.model)
    }

    /// Network coverage degree of a single point.
    ///
    /// Tracked points are answered from the model; other points are evaluated
    /// on the fly with the same gating and fusion.
    pub fn mu(&mut self, point: &CoveragePoint) -> Result<f64> {
        let model = self.model()?;
        if model.contains(point) {
            return Ok(model.mu(point));
        }
        let degrees = self
            .cameras
            .iter()
            .map(|(name, camera)| gated_strength(&self.scene, name, camera, point, &self.params))
            .collect::<Result<Vec<f64>>>()?;
        let norm = self.norm;
        Ok(degrees
            .into_iter()
            .combinations(self.ocular)
            .map(|combo| combo.into_iter().reduce(|a, b| norm.apply(a, b)).unwrap_or(0.0))
            .fold(0.0, f64::max))
    }

    /// How well the network model matches a desired coverage model, in `[0, 1]`.
    pub fn performance(&mut self, desired: &PointCache) -> Result<f64> {
        Ok(self.model()?.overlap(desired))
    }

    /// Fused coverage of a task's points by all cameras, or by `subset`.
    ///
    /// This does not touch the tracked points or the network model.
    pub fn coverage(&self, task: &Task, subset: Option<&[&str]>) -> Result<PointCache> {
        self.coverage_in(&self.scene, task, subset)
    }

    /// Like [`coverage`](Self::coverage), with occlusion by `scene` in place
    /// of the network's own scene.
    pub(crate) fn coverage_in(
        &self,
        scene: &Scene,
        task: &Task,
        subset: Option<&[&str]>,
    ) -> Result<PointCache> {
        let names: Vec<&str> = match subset {
            Some(subset) => {
                for name in subset {
                    self.camera(name)?;
                }
                subset.iter().copied().unique().collect()
            }
            None => self.cameras.keys().map(String::as_str).collect(),
        };
        self.check_ocular(names.len())?;

        let points = task.mapped_points();
        let mut sets = Vec::with_capacity(names.len());
        for name in names {
            let camera = self.camera(name)?;
            let mut set = PointCache::new();
            for (point, _) in points.iter() {
                let mu = gated_strength(scene, name, camera, point, &task.params)?;
                if mu > 0.0 {
                    set.insert(*point, mu);
                }
            }
            sets.push(set);
        }
        Ok(fuse(sets.iter(), self.ocular, self.norm))
    }
}

/// Strength of `camera` at `point`, or zero if the line of sight is blocked.
fn gated_strength<C: Sensor>(
    scene: &Scene,
    name: &str,
    camera: &C,
    point: &CoveragePoint,
    params: &TaskParams,
) -> Result<f64> {
    let mu = camera.strength(point, params)?;
    if mu > 0.0 && !scene.occluded_for(point.position(), &camera.center(), name) {
        Ok(mu)
    } else {
        Ok(0.0)
    }
}

fn intersect_all(combo: Vec<&PointCache>, norm: FusionNorm) -> PointCache {
    let mut iter = combo.into_iter();
    let first = match iter.next() {
        Some(first) => first.clone(),
        None => return PointCache::new(),
    };
    iter.fold(first, |acc, set| acc.intersection_with(set, norm))
}

/// Union over all `ocular`-combinations of the intersection of their sets.
#[cfg(not(feature = "rayon"))]
fn fuse<'a, I>(sets: I, ocular: usize, norm: FusionNorm) -> PointCache
where
    I: Iterator<Item = &'a PointCache>,
{
    let mut model = PointCache::new();
    for combo in sets.combinations(ocular) {
        model.union_with(&intersect_all(combo, norm));
    }
    model
}

/// Union over all `ocular`-combinations of the intersection of their sets.
#[cfg(feature = "rayon")]
fn fuse<'a, I>(sets: I, ocular: usize, norm: FusionNorm) -> PointCache
where
    I: Iterator<Item = &'a PointCache>,
{
    use rayon::prelude::*;

    let combos: Vec<Vec<&PointCache>> = sets.combinations(ocular).collect();
    combos
        .into_par_iter()
        .map(|combo| intersect_all(combo, norm))
        .reduce(PointCache::new, |mut a, b| {
            a.union_with(&b);
            a
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::tests::camera_above;
    use crate::{Pose, SceneObject};
    use approx::assert_abs_diff_eq;
    use nalgebra::{Unit, Vector3};

    /// A fixed-degree sensor for exercising the fusion logic.
    struct Fixed {
        pose: Pose,
        degrees: Vec<(CoveragePoint, f64)>,
        refused: Vec<CoveragePoint>,
    }

    impl Sensor for Fixed {
        fn strength(&self, point: &CoveragePoint, _params: &TaskParams) -> Result<f64> {
            if self.refused.contains(point) {
                return Err(Error::InvalidInput("refused point"));
            }
            Ok(self
                .degrees
                .iter()
                .find(|(p, _)| p == point)
                .map_or(0.0, |(_, mu)| *mu))
        }

        fn pose(&self) -> &Pose {
            &self.pose
        }
    }

    fn fixed(degrees: &[(CoveragePoint, f64)]) -> Fixed {
        Fixed {
            pose: Pose::from_translation(Vector3::new(0.0, 0.0, 1000.0)),
            degrees: degrees.to_vec(),
            refused: Vec::new(),
        }
    }

    fn refusing(points: &[CoveragePoint]) -> Fixed {
        Fixed {
            refused: points.to_vec(),
            ..fixed(&[])
        }
    }

    fn grid() -> Vec<CoveragePoint> {
        (-5..=5)
            .flat_map(|i| {
                (-5..=5).map(move |j| {
                    CoveragePoint::plain(f64::from(i) * 60.0, f64::from(j) * 60.0, 0.0)
                })
            })
            .collect()
    }

    #[test]
    fn ocular_must_be_positive() {
        assert!(matches!(
            MultiCamera::<Camera>::new(0, Scene::new()),
            Err(Error::InvalidOcular(0))
        ));
    }

    #[test]
    fn too_few_cameras() {
        let mut network = MultiCamera::new(2, Scene::new()).unwrap();
        network.add_camera("a", camera_above(0.0, 0.0, 1000.0)).unwrap();
        assert!(matches!(
            network.update_model(),
            Err(Error::TooFewCameras { cameras: 1, ocular: 2 })
        ));
        assert!(network.mu(&CoveragePoint::plain(0.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn binocular_takes_minimum() {
        let p = CoveragePoint::plain(0.0, 0.0, 0.0);
        let q = CoveragePoint::plain(1.0, 0.0, 0.0);
        let mut network = MultiCamera::new(2, Scene::new()).unwrap();
        network.add_points([p, q]).unwrap();
        network.add_camera("a", fixed(&[(p, 0.8), (q, 0.9)])).unwrap();
        network.add_camera("b", fixed(&[(p, 0.6)])).unwrap();
        let model = network.model().unwrap();
        assert_abs_diff_eq!(model.mu(&p), 0.6);
        // only one camera sees q
        assert!(!model.contains(&q));
    }

    #[test]
    fn product_norm() {
        let p = CoveragePoint::plain(0.0, 0.0, 0.0);
        let mut network = MultiCamera::new(2, Scene::new())
            .unwrap()
            .with_fusion_norm(FusionNorm::Product);
        network.add_point(p).unwrap();
        network.add_camera("a", fixed(&[(p, 0.8)])).unwrap();
        network.add_camera("b", fixed(&[(p, 0.5)])).unwrap();
        assert_abs_diff_eq!(network.mu(&p).unwrap(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn monocular_is_union() {
        let mut network = MultiCamera::new(1, Scene::new()).unwrap();
        network.add_points(grid()).unwrap();
        network.add_camera("a", camera_above(-150.0, 0.0, 1000.0)).unwrap();
        network.add_camera("b", camera_above(150.0, 0.0, 1000.0)).unwrap();
        let union = network
            .inscene("a")
            .unwrap()
            .union(network.inscene("b").unwrap());
        assert!(!union.is_empty());
        assert_eq!(network.model().unwrap(), &union);
    }

    #[test]
    fn adding_a_camera_never_decreases_coverage() {
        let mut network = MultiCamera::new(2, Scene::new()).unwrap();
        network.add_points(grid()).unwrap();
        network.add_camera("a", camera_above(-100.0, 0.0, 1000.0)).unwrap();
        network.add_camera("b", camera_above(100.0, 0.0, 1000.0)).unwrap();
        let before = network.model().unwrap().clone();
        assert!(!before.is_empty());
        network.add_camera("c", camera_above(0.0, 100.0, 1000.0)).unwrap();
        assert!(!network.is_model_current());
        let after = network.model().unwrap();
        for (p, mu) in before.iter() {
            assert!(after.mu(p) >= mu);
        }
    }

    #[test]
    fn occluded_points_are_omitted() {
        let mut scene = Scene::new();
        scene.insert(
            "blocker",
            SceneObject::plane(
                Pose::from_translation(Vector3::new(0.0, 0.0, 500.0)),
                (-10.0, 10.0),
                (-10.0, 10.0),
            ),
        );
        let mut network = MultiCamera::new(1, scene).unwrap();
        let hidden = CoveragePoint::plain(0.0, 0.0, 0.0);
        let visible = CoveragePoint::plain(120.0, 0.0, 0.0);
        network.add_camera("a", camera_above(0.0, 0.0, 1000.0)).unwrap();
        network.add_point(hidden).unwrap();
        network.add_point(visible).unwrap();

        let camera = network.camera("a").unwrap();
        assert!(camera.mu(&hidden) > 0.0);
        let inscene = network.inscene("a").unwrap();
        assert!(!inscene.contains(&hidden));
        assert!(inscene.contains(&visible));
        assert_abs_diff_eq!(network.mu(&hidden).unwrap(), 0.0);
    }

    #[test]
    fn add_point_matches_full_update() {
        let mut incremental = MultiCamera::new(1, Scene::new()).unwrap();
        incremental.add_camera("a", camera_above(0.0, 0.0, 1000.0)).unwrap();
        for p in grid() {
            incremental.add_point(p).unwrap();
        }
        let mut batch = MultiCamera::new(1, Scene::new()).unwrap();
        batch.add_points(grid()).unwrap();
        batch.add_camera("a", camera_above(0.0, 0.0, 1000.0)).unwrap();
        assert_eq!(incremental.inscene("a").unwrap(), batch.inscene("a").unwrap());
    }

    #[test]
    fn untracked_point_on_the_fly() {
        let mut network = MultiCamera::new(2, Scene::new()).unwrap();
        network.add_camera("a", camera_above(-50.0, 0.0, 1000.0)).unwrap();
        network.add_camera("b", camera_above(50.0, 0.0, 1000.0)).unwrap();
        network.add_camera("c", camera_above(5000.0, 0.0, 1000.0)).unwrap();
        let p = CoveragePoint::plain(0.0, 0.0, 0.0);
        let expected = network
            .camera("a")
            .unwrap()
            .mu(&p)
            .min(network.camera("b").unwrap().mu(&p));
        assert!(expected > 0.0);
        assert_abs_diff_eq!(network.mu(&p).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn performance_against_desired() {
        let mut network = MultiCamera::new(1, Scene::new()).unwrap();
        let p = CoveragePoint::plain(0.0, 0.0, 0.0);
        network.add_point(p).unwrap();
        network.add_camera("a", fixed(&[(p, 1.0)])).unwrap();
        let desired: PointCache = [(p, 1.0)].into_iter().collect();
        assert_abs_diff_eq!(network.performance(&desired).unwrap(), 1.0);
        let elsewhere: PointCache = [(CoveragePoint::plain(9.0, 9.0, 9.0), 1.0)]
            .into_iter()
            .collect();
        assert_abs_diff_eq!(network.performance(&elsewhere).unwrap(), 0.0);
    }

    #[test]
    fn remove_and_move_cameras() {
        let mut network = MultiCamera::new(1, Scene::new()).unwrap();
        network.add_points(grid()).unwrap();
        network.add_camera("a", camera_above(0.0, 0.0, 1000.0)).unwrap();
        let covered = network.model().unwrap().len();
        assert!(covered > 0);

        network
            .modify_camera("a", |camera| {
                camera.set_pose(Pose::from_view(
                    &Vector3::new(0.0, 0.0, 1000.0),
                    &Vector3::new(0.0, 0.0, 2000.0),
                    &Unit::new_normalize(Vector3::new(0.0, 1.0, 0.0)),
                ))
            })
            .unwrap();
        assert!(network.model().unwrap().is_empty());

        network.remove_camera("a").unwrap();
        assert!(matches!(network.remove_camera("a"), Err(Error::UnknownCamera(_))));
        assert!(network.update_model().is_err());
    }

    #[test]
    fn coverage_of_a_task_subset() {
        let mut network = MultiCamera::new(1, Scene::new()).unwrap();
        network.add_camera("a", camera_above(-2000.0, 0.0, 1000.0)).unwrap();
        network.add_camera("b", camera_above(0.0, 0.0, 1000.0)).unwrap();
        let p = CoveragePoint::plain(0.0, 0.0, 0.0);
        let task = Task::new(TaskParams::new(), [(p, 1.0)].into_iter().collect());
        let all = network.coverage(&task, None).unwrap();
        let only_a = network.coverage(&task, Some(&["a"][..])).unwrap();
        assert!(all.contains(&p));
        assert!(only_a.is_empty());
        assert!(matches!(
            network.coverage(&task, Some(&["zz"][..])),
            Err(Error::UnknownCamera(_))
        ));
        // tracked points untouched
        assert_eq!(network.points().count(), 0);
    }

    #[test]
    fn failed_add_camera_leaves_network_unchanged() {
        let p = CoveragePoint::plain(0.0, 0.0, 0.0);
        let mut network = MultiCamera::new(1, Scene::new()).unwrap();
        network.add_point(p).unwrap();
        network.add_camera("a", fixed(&[(p, 0.5)])).unwrap();

        assert!(matches!(
            network.add_camera("b", refusing(&[p])),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(network.len(), 1);
        assert!(network.camera("b").is_err());
        assert!(matches!(network.inscene("b"), Err(Error::UnknownCamera(_))));
        assert_abs_diff_eq!(network.model().unwrap().mu(&p), 0.5);

        let mut empty = MultiCamera::new(1, Scene::new()).unwrap();
        empty.add_point(p).unwrap();
        assert!(empty.add_camera("b", refusing(&[p])).is_err());
        assert!(empty.is_empty());
        assert!(matches!(
            empty.update_model(),
            Err(Error::TooFewCameras { cameras: 0, ocular: 1 })
        ));
    }

    #[test]
    fn failed_add_point_is_not_tracked() {
        let p = CoveragePoint::plain(0.0, 0.0, 0.0);
        let q = CoveragePoint::plain(1.0, 0.0, 0.0);
        let mut network = MultiCamera::new(1, Scene::new()).unwrap();
        network.add_camera("a", fixed(&[(p, 0.5), (q, 0.7)])).unwrap();
        network.add_camera("b", refusing(&[q])).unwrap();
        network.add_point(p).unwrap();

        assert!(network.add_point(q).is_err());
        assert_eq!(network.points().collect::<Vec<_>>(), vec![&p]);
        assert!(!network.inscene("a").unwrap().contains(&q));

        assert!(network.add_points([q, CoveragePoint::plain(2.0, 0.0, 0.0)]).is_err());
        assert_eq!(network.points().count(), 1);
        assert!(!network.model().unwrap().contains(&q));
    }

    #[test]
    fn failed_scene_change_is_rolled_back() {
        let p = CoveragePoint::plain(0.0, 0.0, 0.0);
        let mut network = MultiCamera::new(1, Scene::new()).unwrap();
        network.add_point(p).unwrap();
        network.add_camera("a", fixed(&[(p, 0.5)])).unwrap();

        let result = network.modify_scene(|scene| {
            scene.insert(
                "wall",
                SceneObject::plane(Pose::identity(), (-10.0, 10.0), (-10.0, 10.0)),
            );
            scene.set_pose("missing", Pose::identity())
        });
        assert!(matches!(result, Err(Error::UnknownTarget(_))));
        assert!(network.scene().get("wall").is_none());
        assert!(network.inscene("a").unwrap().contains(&p));
    }

    #[test]
    fn task_params_builder() {
        let mut params = TaskParams::new();
        params.set("hres_min_ideal", 1.0);
        let network = MultiCamera::<Fixed>::new(1, Scene::new())
            .unwrap()
            .with_task_params(params.clone())
            .unwrap();
        assert_eq!(network.task_params(), &params);
    }
}
