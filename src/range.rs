//! Range imaging: line lasers projected onto a target that is transported
//! through the laser plane, observed by range cameras.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::camera::depth_at_resolution;
use crate::{
    sight_line_blocked, Camera, CoveragePoint, Error, LineLaser, MultiCamera, PointCache, Pose,
    Result, Scene, Sensor, Task, TaskParams, Triangle,
};

/// Task parameter: horizontal resolution at which the height term is 1.
pub const HRES_MIN_IDEAL: &str = "hres_min_ideal";
/// Task parameter: horizontal resolution at which the height term reaches 0.
pub const HRES_MIN_ACCEPTABLE: &str = "hres_min_acceptable";

/// A camera used for laser triangulation.
///
/// Its coverage strength adds a height resolution term to the four terms of
/// an ordinary [`Camera`].
#[derive(Debug, Clone, PartialEq)]
pub struct RangeCamera {
    camera: Camera,
}

impl RangeCamera {
    /// Wrap a camera.
    pub fn new(camera: Camera) -> Self {
        Self { camera }
    }

    /// The underlying camera.
    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Move the camera.
    #[inline]
    pub fn set_pose(&mut self, pose: Pose) {
        self.camera.set_pose(pose);
    }

    /// Depth at which the given horizontal resolution occurs. Infinite for
    /// zero resolution.
    pub fn zres(&self, resolution: f64) -> f64 {
        let intrinsics = self.camera.intrinsics();
        let mr = f64::from(intrinsics.params().dim[0]) / intrinsics.cache.fov[0].chord();
        depth_at_resolution(mr, resolution)
    }

    /// Height resolution term of a world-frame point.
    ///
    /// Plain points carry no surface direction and score 0.
    pub fn ch(&self, point: &CoveragePoint, params: &TaskParams) -> Result<f64> {
        let campoint = point.map_inverse(self.camera.pose());
        let dp = match campoint.direction() {
            None => return Ok(0.0),
            Some(dp) => dp,
        };
        let ideal = params.get(HRES_MIN_IDEAL)?;
        let acceptable = params.get(HRES_MIN_ACCEPTABLE)?;

        let intrinsics = self.camera.intrinsics();
        let ascale = dp.direction_unit().angle(&(-dp.point.coords)).sin();
        let mr = ascale * f64::from(intrinsics.params().dim[1]) / intrinsics.cache.fov[1].chord();
        let zhmini = depth_at_resolution(mr, ideal);
        let zhmina = depth_at_resolution(mr, acceptable);
        let z = dp.point.z;

        if zhmina.is_infinite() {
            return Ok(1.0);
        }
        if zhmina == zhmini {
            return Ok(if z < zhmina { 1.0 } else { 0.0 });
        }
        Ok(((zhmina - z) / (zhmina - zhmini)).clamp(0.0, 1.0))
    }
}

impl Sensor for RangeCamera {
    fn strength(&self, point: &CoveragePoint, params: &TaskParams) -> Result<f64> {
        let ch = self.ch(point, params)?;
        Ok(self.camera.mu(point) * ch)
    }

    fn pose(&self) -> &Pose {
        self.camera.pose()
    }
}

/// How the target moves through the laser plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum TransportStyle {
    /// Straight-line translation along an axis.
    #[default]
    Linear,
    /// Rotation about an axis. Not supported yet.
    Rotary,
}

impl std::str::FromStr for TransportStyle {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Self::Linear),
            "rotary" => Ok(Self::Rotary),
            _ => Err(Error::UnsupportedTransport(s.to_string())),
        }
    }
}

/// Geometry of a transport sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transport {
    /// Sampling pitch along the laser line.
    pub lpitch: f64,
    /// Distance the target moves between profiles.
    pub tpitch: f64,
    /// Transport direction; need not be normalized.
    pub taxis: Vector3<f64>,
    /// Kind of motion.
    pub style: TransportStyle,
}

/// A camera network for range imaging together with its line lasers.
#[derive(Debug, Clone)]
pub struct RangeModel {
    network: MultiCamera<RangeCamera>,
    lasers: BTreeMap<String, LineLaser>,
}

impl RangeModel {
    /// Create a model with no cameras or lasers.
    pub fn new(ocular: usize, scene: Scene) -> Result<Self> {
        Ok(Self {
            network: MultiCamera::new(ocular, scene)?,
            lasers: BTreeMap::new(),
        })
    }

    /// The camera network.
    #[inline]
    pub fn network(&self) -> &MultiCamera<RangeCamera> {
        &self.network
    }

    /// Mutable access to the camera network.
    #[inline]
    pub fn network_mut(&mut self) -> &mut MultiCamera<RangeCamera> {
        &mut self.network
    }

    /// Add (or replace) a range camera.
    pub fn add_camera(&mut self, name: impl Into<String>, camera: RangeCamera) -> Result<()> {
        self.network.add_camera(name, camera)
    }

    /// Task parameters used for the network's tracked points.
    ///
    /// Directional points can only be tracked once the height resolution
    /// parameters are set.
    pub fn set_task_params(&mut self, params: TaskParams) -> Result<()> {
        self.network.set_task_params(params)
    }

    /// Add (or replace) a laser. A scene object with the same name is taken
    /// to be the laser body and never occludes its own fan.
    pub fn add_laser(&mut self, name: impl Into<String>, laser: LineLaser) {
        self.lasers.insert(name.into(), laser);
    }

    /// Look up a laser.
    pub fn laser(&self, name: &str) -> Result<&LineLaser> {
        self.lasers
            .get(name)
            .ok_or_else(|| Error::UnknownLaser(name.to_string()))
    }

    /// Iterate over named lasers.
    pub fn lasers(&self) -> impl Iterator<Item = (&str, &LineLaser)> {
        self.lasers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Project the laser onto the target at its current pose.
    ///
    /// The fan is sampled every `lpitch` along the laser's local x axis. Each
    /// sample keeps the nearest hit on the target within the fan, provided
    /// the laser reaches it unobstructed. The resulting points face the laser
    /// and are expressed in, and mounted on, the laser frame.
    pub fn project(
        &self,
        params: &TaskParams,
        laser_name: &str,
        target: &str,
        lpitch: f64,
    ) -> Result<Task> {
        self.project_in(self.network.scene(), params, laser_name, target, lpitch)
    }

    fn project_in(
        &self,
        scene: &Scene,
        params: &TaskParams,
        laser_name: &str,
        target: &str,
        lpitch: f64,
    ) -> Result<Task> {
        if !(lpitch > 0.0) {
            return Err(Error::InvalidInput("laser pitch must be positive"));
        }
        let laser = self.laser(laser_name)?;
        let target = scene.target(target)?;
        let pose = laser.pose();
        let origin = pose.origin();

        let blockers: Vec<&Triangle> = scene
            .triangles_except(Some(laser_name))
            .filter(|t| laser.occluded_by(t))
            .collect();

        let width = laser.half_width(laser.depth());
        let start = (-width / lpitch).trunc() * lpitch;
        let samples = ((width - start) / lpitch).ceil() as usize;
        let mut points = PointCache::new();
        for i in 0..samples {
            let x = start + i as f64 * lpitch;
            if x >= width {
                break;
            }

            let pa = pose.map(&Point3::new(x, 0.0, 0.0));
            let pb = pose.map(&Point3::new(x, 0.0, laser.depth()));
            let nearest = target
                .mapped_triangles()
                .iter()
                .filter_map(|t| t.intersection(&pa, &pb))
                .map(|ip| pose.map_inverse(&ip))
                .filter(|local| laser.in_fan(local))
                .min_by(|a, b| a.z.total_cmp(&b.z));
            let local = match nearest {
                Some(local) => local,
                None => continue,
            };
            if sight_line_blocked(blockers.iter().copied(), &pose.map(&local), &origin) {
                log::trace!("laser {laser_name} blocked at x = {x}");
                continue;
            }
            points.insert(
                CoveragePoint::directional(local.x, local.y, local.z, PI, 0.0),
                1.0,
            );
        }
        log::trace!("laser {laser_name} profile: {} points", points.len());
        Ok(Task::mounted(params.clone(), points, laser))
    }

    /// Coverage of the target surface swept through the laser plane.
    ///
    /// Returns the fused coverage and the task of every profiled point, both
    /// in the world frame at the target's current pose. Where profiles from
    /// different steps meet the same point, the later step wins.
    ///
    /// The target is moved in a copy of the scene. The model's own scene,
    /// tracked points and network model are left as they were.
    pub fn range_coverage(
        &self,
        params: &TaskParams,
        laser: &str,
        target: &str,
        transport: &Transport,
        subset: Option<&[&str]>,
    ) -> Result<(PointCache, Task)> {
        if transport.style == TransportStyle::Rotary {
            return Err(Error::RotaryTransportUnimplemented);
        }
        if !(transport.tpitch > 0.0) {
            return Err(Error::InvalidInput("transport pitch must be positive"));
        }
        let norm = transport.taxis.norm();
        if !(norm > 0.0) {
            return Err(Error::InvalidInput("transport axis must be nonzero"));
        }
        self.laser(laser)?;
        let mut scene = self.network.scene().clone();
        let original = scene.target(target)?.pose().clone();
        let axis = transport.taxis / norm;

        let (lv, gv) = scene
            .target(target)?
            .mapped_triangles()
            .iter()
            .flat_map(|t| t.vertices.iter())
            .map(|v| axis.dot(&v.coords))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)));
        let steps = if gv > lv {
            ((gv - lv) / transport.tpitch) as usize
        } else {
            0
        };
        if steps == 0 {
            log::warn!("target {target} is shorter than one transport step");
        }

        let mut coverage = PointCache::new();
        let mut desired = PointCache::new();
        for step in 0..steps {
            let offset = axis * (transport.tpitch * step as f64 - gv);
            let current = original.then(&Pose::from_translation(offset));
            scene.set_pose(target, current.clone())?;

            let profile = self.project_in(&scene, params, laser, target, transport.lpitch)?;
            let profile_coverage = self.network.coverage_in(&scene, &profile, subset)?;
            log::debug!(
                "transport step {step}/{steps}: {} of {} profile points covered",
                profile_coverage.len(),
                profile.points().len()
            );

            let restore = |p: &CoveragePoint| p.map_inverse(&current).map(&original);
            for (p, _) in profile.mapped_points().iter() {
                desired.insert(restore(p), 1.0);
            }
            for (p, mu) in profile_coverage.iter() {
                coverage.insert(restore(p), mu);
            }
        }
        Ok((coverage, Task::new(params.clone(), desired)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::tests::test_params;
    use crate::laser::tests::laser_above;
    use crate::{LaserParams, SceneObject};
    use approx::assert_abs_diff_eq;
    use nalgebra::Unit;
    use std::f64::consts::FRAC_PI_2;

    fn params() -> TaskParams {
        [(HRES_MIN_IDEAL, 1.0), (HRES_MIN_ACCEPTABLE, 0.5)]
            .into_iter()
            .collect()
    }

    /// A camera 1000 units from the origin, looking at it obliquely from -Y.
    fn oblique_camera() -> RangeCamera {
        let pose = Pose::from_view(
            &Vector3::new(0.0, -600.0, 800.0),
            &Vector3::new(0.0, 0.0, 0.0),
            &Unit::new_normalize(Vector3::new(0.0, 1.0, 0.0)),
        );
        RangeCamera::new(Camera::new(test_params().try_into().unwrap(), pose))
    }

    /// A plate on z = 0 scanned by a laser 100 units above it.
    fn plate_model() -> RangeModel {
        let mut scene = Scene::new();
        scene.insert(
            "plate",
            SceneObject::plane(Pose::identity(), (-55.0, 55.0), (-55.0, 45.0)),
        );
        let mut model = RangeModel::new(1, scene).unwrap();
        model.add_laser("laser", laser_above(100.0));
        model.add_camera("cam", oblique_camera()).unwrap();
        model
    }

    fn linear(lpitch: f64, tpitch: f64) -> Transport {
        Transport {
            lpitch,
            tpitch,
            taxis: Vector3::new(0.0, 1.0, 0.0),
            style: TransportStyle::Linear,
        }
    }

    #[test]
    fn zres_scales_inversely() {
        let camera = oblique_camera();
        assert!(camera.zres(0.0).is_infinite());
        assert_abs_diff_eq!(camera.zres(1.0), 2.0 * camera.zres(2.0), epsilon = 1e-9);
        let intrinsics = camera.camera().intrinsics();
        assert_abs_diff_eq!(
            camera.zres(1.0),
            f64::from(intrinsics.params().dim[0]) / intrinsics.cache.fov[0].chord(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn height_term() {
        let camera = oblique_camera();
        let facing_up = CoveragePoint::directional(0.0, 0.0, 0.0, 0.0, 0.0);
        assert_abs_diff_eq!(camera.ch(&facing_up, &params()).unwrap(), 1.0);
        assert_abs_diff_eq!(
            camera.ch(&CoveragePoint::plain(0.0, 0.0, 0.0), &params()).unwrap(),
            0.0
        );
        assert!(matches!(
            camera.ch(&facing_up, &TaskParams::new()),
            Err(Error::MissingTaskParameter(_))
        ));

        // equal thresholds give a step
        let strict: TaskParams = [(HRES_MIN_IDEAL, 100.0), (HRES_MIN_ACCEPTABLE, 100.0)]
            .into_iter()
            .collect();
        assert_abs_diff_eq!(camera.ch(&facing_up, &strict).unwrap(), 0.0);
        let lax: TaskParams = [(HRES_MIN_IDEAL, 0.1), (HRES_MIN_ACCEPTABLE, 0.1)]
            .into_iter()
            .collect();
        assert_abs_diff_eq!(camera.ch(&facing_up, &lax).unwrap(), 1.0);

        // zero acceptable resolution never limits
        let unlimited: TaskParams = [(HRES_MIN_IDEAL, 100.0), (HRES_MIN_ACCEPTABLE, 0.0)]
            .into_iter()
            .collect();
        assert_abs_diff_eq!(camera.ch(&facing_up, &unlimited).unwrap(), 1.0);
    }

    #[test]
    fn strength_is_five_term_product() {
        let camera = oblique_camera();
        let p = CoveragePoint::directional(10.0, 0.0, 0.0, 0.0, 0.0);
        let expected = camera.camera().mu(&p) * camera.ch(&p, &params()).unwrap();
        assert!(expected > 0.0);
        assert_abs_diff_eq!(camera.strength(&p, &params()).unwrap(), expected);
        assert_abs_diff_eq!(
            camera.strength(&CoveragePoint::plain(10.0, 0.0, 0.0), &params()).unwrap(),
            0.0
        );
    }

    #[test]
    fn transport_style_from_str() {
        assert_eq!("linear".parse::<TransportStyle>().unwrap(), TransportStyle::Linear);
        assert_eq!("rotary".parse::<TransportStyle>().unwrap(), TransportStyle::Rotary);
        assert!(matches!(
            "helical".parse::<TransportStyle>(),
            Err(Error::UnsupportedTransport(s)) if s == "helical"
        ));
    }

    #[test]
    fn project_onto_plate() {
        let model = plate_model();
        let task = model.project(&params(), "laser", "plate", 10.0).unwrap();
        assert_eq!(task.points().len(), 11);
        for (p, mu) in task.points().iter() {
            assert_abs_diff_eq!(mu, 1.0);
            assert_abs_diff_eq!(p.position().z, 100.0, epsilon = 1e-9);
            assert!(p.position().x.abs() <= 50.0 + 1e-9);
            let dp = p.direction().unwrap();
            assert_abs_diff_eq!(dp.rho, PI);
        }
        for (p, _) in task.mapped_points().iter() {
            assert_abs_diff_eq!(p.position().z, 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(p.position().y, 0.0, epsilon = 1e-9);
        }
        assert_eq!(task.mount(), Some(model.laser("laser").unwrap().pose()));
    }

    #[test]
    fn project_is_idempotent() {
        let model = plate_model();
        let a = model.project(&params(), "laser", "plate", 7.0).unwrap();
        let b = model.project(&params(), "laser", "plate", 7.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn project_skips_shadowed_points() {
        let mut model = plate_model();
        model
            .network_mut()
            .modify_scene(|scene| {
                scene.insert(
                    "shade",
                    SceneObject::plane(
                        Pose::from_translation(Vector3::new(0.0, 0.0, 50.0)),
                        (-100.0, -22.0),
                        (-10.0, 10.0),
                    ),
                );
                Ok(())
            })
            .unwrap();
        let task = model.project(&params(), "laser", "plate", 10.0).unwrap();
        assert_eq!(task.points().len(), 10);
        assert!(task.points().keys().all(|p| p.position().x > -45.0));
    }

    #[test]
    fn project_unknown_ids() {
        let model = plate_model();
        assert!(matches!(
            model.project(&params(), "nope", "plate", 10.0),
            Err(Error::UnknownLaser(_))
        ));
        assert!(matches!(
            model.project(&params(), "laser", "nope", 10.0),
            Err(Error::UnknownTarget(_))
        ));
        assert!(model.project(&params(), "laser", "plate", 0.0).is_err());
    }

    #[test]
    fn sweep_covers_plate_and_restores_pose() {
        let model = plate_model();
        let (coverage, task) = model
            .range_coverage(&params(), "laser", "plate", &linear(10.0, 30.0), None)
            .unwrap();
        assert!(!coverage.is_empty());
        assert!(coverage.len() <= task.points().len());
        for (p, mu) in coverage.iter() {
            assert!(task.points().contains(p));
            assert!(mu > 0.0 && mu <= 1.0);
            // back in the plate's original frame
            assert_abs_diff_eq!(p.position().z, 0.0, epsilon = 1e-9);
            assert!(p.position().y >= -55.0 - 1e-9 && p.position().y <= 45.0 + 1e-9);
        }
        let plate = model.network().scene().target("plate").unwrap();
        assert_eq!(plate.pose(), &Pose::identity());
    }

    #[test]
    fn sweep_shorter_than_one_step() {
        let model = plate_model();
        let (coverage, task) = model
            .range_coverage(&params(), "laser", "plate", &linear(10.0, 200.0), None)
            .unwrap();
        assert!(coverage.is_empty());
        assert!(task.points().is_empty());
    }

    #[test]
    fn sweep_errors() {
        let model = plate_model();
        let mut rotary = linear(10.0, 30.0);
        rotary.style = TransportStyle::Rotary;
        assert!(matches!(
            model.range_coverage(&params(), "laser", "plate", &rotary, None),
            Err(Error::RotaryTransportUnimplemented)
        ));
        assert!(matches!(
            model.range_coverage(&params(), "nope", "plate", &linear(10.0, 30.0), None),
            Err(Error::UnknownLaser(_))
        ));
        assert!(matches!(
            model.range_coverage(&params(), "laser", "nope", &linear(10.0, 30.0), None),
            Err(Error::UnknownTarget(_))
        ));

        // fails mid-sweep, after the first move of the target
        let ghost: &[&str] = &["ghost"];
        assert!(matches!(
            model.range_coverage(&params(), "laser", "plate", &linear(10.0, 30.0), Some(ghost)),
            Err(Error::UnknownCamera(_))
        ));
        let plate = model.network().scene().target("plate").unwrap();
        assert_eq!(plate.pose(), &Pose::identity());
    }

    #[test]
    fn project_fine_pitch() {
        let model = plate_model();
        let task = model.project(&params(), "laser", "plate", 0.3).unwrap();
        // samples at -199.8 + 0.3 i strictly inside the plate's (-55, 55)
        assert_eq!(task.points().len(), 367);
    }

    #[test]
    fn tracked_points_need_task_params() {
        let mut model = plate_model();
        let p = CoveragePoint::directional(10.0, 0.0, 0.0, 0.0, 0.0);
        assert!(matches!(
            model.network_mut().add_point(p),
            Err(Error::MissingTaskParameter(_))
        ));
        assert_eq!(model.network().points().count(), 0);

        model.set_task_params(params()).unwrap();
        model.network_mut().add_point(p).unwrap();
        let expected = model
            .network()
            .camera("cam")
            .unwrap()
            .strength(&p, &params())
            .unwrap();
        assert!(expected > 0.0);
        assert_abs_diff_eq!(model.network_mut().mu(&p).unwrap(), expected);
        model.add_camera("other", oblique_camera()).unwrap();
        assert!(model.network().inscene("other").unwrap().contains(&p));

        assert!(model.set_task_params(TaskParams::new()).is_err());
        assert_eq!(model.network().task_params(), &params());
        assert!(model.network().inscene("cam").unwrap().contains(&p));

        // a sweep leaves the tracked model alone
        model.network_mut().update_model().unwrap();
        model
            .range_coverage(&params(), "laser", "plate", &linear(10.0, 30.0), None)
            .unwrap();
        assert!(model.network().is_model_current());
        assert_eq!(model.network().points().count(), 1);
    }

    #[test]
    fn later_step_wins_on_overlap() {
        // a laser below the plate, looking up; the plate moves along x by
        // half its length so the two profiles share restored points
        let mut scene = Scene::new();
        scene.insert(
            "plate",
            SceneObject::plane(Pose::identity(), (-150.0, 150.0), (-50.0, 80.0)),
        );
        let mut model = RangeModel::new(1, scene).unwrap();
        let laser = LineLaser::new(
            LaserParams {
                fan: FRAC_PI_2,
                depth: 200.0,
            },
            Pose::from_translation(Vector3::new(0.0, 0.0, -100.0)),
        )
        .unwrap();
        model.add_laser("laser", laser);
        let below = Pose::from_view(
            &Vector3::new(0.0, -600.0, -800.0),
            &Vector3::new(0.0, 0.0, 0.0),
            &Unit::new_normalize(Vector3::new(0.0, 1.0, 0.0)),
        );
        model
            .add_camera(
                "cam",
                RangeCamera::new(Camera::new(test_params().try_into().unwrap(), below)),
            )
            .unwrap();
        // height term varies along the laser line
        let params: TaskParams = [(HRES_MIN_IDEAL, 2.0), (HRES_MIN_ACCEPTABLE, 1.0)]
            .into_iter()
            .collect();
        let transport = Transport {
            lpitch: 10.0,
            tpitch: 150.0,
            taxis: Vector3::new(1.0, 0.0, 0.0),
            style: TransportStyle::Linear,
        };
        let (coverage, _) = model
            .range_coverage(&params, "laser", "plate", &transport, None)
            .unwrap();

        let step = |offset: f64| -> PointCache {
            let mut moved = model.clone();
            let shift = Pose::from_translation(Vector3::new(offset, 0.0, 0.0));
            let current = Pose::identity().then(&shift);
            moved
                .network_mut()
                .modify_scene(|scene| scene.set_pose("plate", current.clone()))
                .unwrap();
            let profile = moved.project(&params, "laser", "plate", 10.0).unwrap();
            moved
                .network()
                .coverage(&profile, None)
                .unwrap()
                .iter()
                .map(|(p, mu)| (p.map_inverse(&current).map(&Pose::identity()), mu))
                .collect()
        };
        let first = step(-150.0);
        let last = step(0.0);

        let shared: Vec<&CoveragePoint> = last.keys().filter(|p| first.contains(p)).collect();
        assert!(!shared.is_empty());
        assert!(shared.iter().any(|p| (first.mu(p) - last.mu(p)).abs() > 1e-6));
        for (p, mu) in last.iter() {
            assert_abs_diff_eq!(coverage.mu(p), mu, epsilon = 1e-12);
        }
    }
}
