#![deny(rust_2018_idioms, unsafe_code, missing_docs)]
#![cfg_attr(not(doctest), doc = include_str!("../README.md"))]

//! # Examples
//!
//! ## Example - binocular coverage of a few points
//!
//! ```
//! use cam_coverage::*;
//! use nalgebra::{Unit, Vector3};
//!
//! let params = CameraParams {
//!     aperture: 8.0,
//!     focal_length: 12.0,
//!     pixel_size: [0.00465, 0.00465],
//!     principal_point: [512.0, 384.0],
//!     dim: [1024, 768],
//!     subject_distance: 1000.0,
//!     gamma: 20.0,
//!     r1: 3.0,
//!     r2: 0.5,
//!     cmax: 0.0093,
//!     zeta: 0.3,
//! };
//!
//! // Two cameras 1000 units above the floor, looking straight down.
//! let up = Unit::new_normalize(Vector3::new(0.0, 1.0, 0.0));
//! let mut network = MultiCamera::new(2, Scene::new()).unwrap();
//! for (name, x) in [("left", -60.0), ("right", 60.0)] {
//!     let pose = Pose::from_view(&Vector3::new(x, 0.0, 1000.0), &Vector3::new(x, 0.0, 0.0), &up);
//!     let camera = Camera::new(params.clone().try_into().unwrap(), pose);
//!     network.add_camera(name, camera).unwrap();
//! }
//!
//! // Track a point seen by both cameras.
//! let p = CoveragePoint::plain(0.0, 0.0, 0.0);
//! network.add_point(p).unwrap();
//!
//! let mu = network.mu(&p).unwrap();
//! assert!(mu > 0.0 && mu <= 1.0);
//!
//! // Compare against a desired model consisting of that single point.
//! let desired: PointCache = [(p, 1.0)].into_iter().collect();
//! assert!(network.performance(&desired).unwrap() > 0.0);
//! ```

mod pose;
pub use pose::{Mount, Pose, PoseChain, PoseConfig, RotationFormat};

mod geometry;
pub use geometry::{CoveragePoint, DirectionalPoint};

mod triangle;
pub use triangle::Triangle;

pub mod fuzzy;
pub use fuzzy::{FusionNorm, FuzzyNumber, FuzzySet, PointCache, PolygonalFuzzyNumber};

mod camera;
pub use camera::{Camera, CameraParams, CoverageIntrinsics, CoverageTerms, Sensor};

mod scene;
pub use scene::{sight_line_blocked, ObjectCategory, Scene, SceneObject};

mod task;
pub use task::{Task, TaskParams};

mod network;
pub use network::MultiCamera;

mod laser;
pub use laser::{LaserParams, LineLaser};

pub mod range;
pub use range::{RangeCamera, RangeModel, Transport, TransportStyle};

mod relevance;
pub use relevance::{RelevanceParams, RelevancePoint, RelevanceRange};

pub mod visualize;
pub use visualize::Renderer;

/// All possible errors.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A network must require at least one camera per point.
    #[error("ocular degree must be at least 1, got {0}")]
    InvalidOcular(usize),
    /// The network has fewer cameras than its ocular degree.
    #[error("{cameras} cameras cannot provide {ocular}-ocular coverage")]
    TooFewCameras {
        /// Number of cameras available.
        cameras: usize,
        /// Required ocular degree.
        ocular: usize,
    },
    /// No camera with this name.
    #[error("unknown camera {0:?}")]
    UnknownCamera(String),
    /// No laser with this name.
    #[error("unknown laser {0:?}")]
    UnknownLaser(String),
    /// No scene object with this name.
    #[error("unknown target {0:?}")]
    UnknownTarget(String),
    /// Transport style not recognized.
    #[error("unsupported transport style {0:?}")]
    UnsupportedTransport(String),
    /// Rotary transport is not implemented.
    #[error("rotary transport is not implemented")]
    RotaryTransportUnimplemented,
    /// Rotation format not recognized.
    #[error("unrecognized rotation format {0:?}")]
    UnrecognizedRotationFormat(String),
    /// Invalid rotation matrix
    #[error("invalid rotation")]
    InvalidRotation,
    /// Invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A task parameter needed for evaluation was not supplied.
    #[error("missing task parameter {0:?}")]
    MissingTaskParameter(String),
    /// No renderer was supplied.
    #[error("visualization is unavailable")]
    VisualizationUnavailable,
}

/// Result type with this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
