//! Simulate a laser line scanner: a plate moves under a line laser while two
//! range cameras watch the laser line from either side.
//!
//! Run with `RUST_LOG=debug` to follow the transport steps.

use cam_coverage::*;
use nalgebra::{Unit, Vector3};

fn main() -> Result<()> {
    pretty_env_logger::init();

    let params = CameraParams {
        aperture: 8.0,
        focal_length: 12.0,
        pixel_size: [0.00465, 0.00465],
        principal_point: [512.0, 384.0],
        dim: [1024, 768],
        subject_distance: 1000.0,
        gamma: 20.0,
        r1: 3.0,
        r2: 0.5,
        cmax: 0.0093,
        zeta: 0.3,
    };
    let up = Unit::new_normalize(Vector3::new(0.0, 1.0, 0.0));
    let origin = Vector3::new(0.0, 0.0, 0.0);

    let mut scene = Scene::new();
    scene.insert(
        "plate",
        SceneObject::plane(Pose::identity(), (-80.0, 80.0), (-60.0, 60.0)),
    );

    let mut model = RangeModel::new(1, scene)?;
    for (name, y) in [("front", -600.0), ("back", 600.0)] {
        let pose = Pose::from_view(&Vector3::new(0.0, y, 800.0), &origin, &up);
        let camera = Camera::new(params.clone().try_into()?, pose);
        model.add_camera(name, RangeCamera::new(camera))?;
    }

    let laser = LineLaser::new(
        LaserParams {
            fan: 1.2,
            depth: 600.0,
        },
        Pose::from_view(&Vector3::new(0.0, 0.0, 300.0), &origin, &up),
    )?;
    model.add_laser("laser", laser);

    let task_params: TaskParams = [(range::HRES_MIN_IDEAL, 1.0), (range::HRES_MIN_ACCEPTABLE, 0.5)]
        .into_iter()
        .collect();
    let transport = Transport {
        lpitch: 4.0,
        tpitch: 4.0,
        taxis: Vector3::new(0.0, 1.0, 0.0),
        style: "linear".parse()?,
    };

    let (coverage, task) = model.range_coverage(&task_params, "laser", "plate", &transport, None)?;
    println!(
        "{} of {} surface points covered, performance {:.3}",
        coverage.len(),
        task.points().len(),
        coverage.overlap(task.points())
    );

    let single: &[&str] = &["front"];
    let (front_only, _) =
        model.range_coverage(&task_params, "laser", "plate", &transport, Some(single))?;
    println!("front camera alone covers {} points", front_only.len());
    Ok(())
}
