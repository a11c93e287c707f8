//! An optional rendering capability.
//!
//! Nothing in this crate draws anything itself. A caller that wants pictures
//! hands a [`Renderer`] to `visualize`; without one the call fails with
//! [`Error::VisualizationUnavailable`] and the coverage state is unchanged.

use crate::{
    CoveragePoint, Error, LineLaser, MultiCamera, ObjectCategory, Pose, RangeModel, Result,
    Sensor, Triangle,
};

/// Receives the primitives of a coverage model for display.
pub trait Renderer {
    /// A camera (or other sensor) at `pose`.
    fn camera(&mut self, name: &str, pose: &Pose);
    /// A line laser.
    fn laser(&mut self, name: &str, laser: &LineLaser);
    /// An opaque world-frame triangle.
    fn triangle(&mut self, triangle: &Triangle, category: ObjectCategory);
    /// A covered point, with opacity equal to its coverage degree.
    fn point(&mut self, point: &CoveragePoint, opacity: f64);
}

impl<C: Sensor> MultiCamera<C> {
    /// Render the cameras, the scene and the network model.
    pub fn visualize(&mut self, renderer: Option<&mut dyn Renderer>) -> Result<()> {
        let renderer = match renderer {
            Some(renderer) => renderer,
            None => {
                log::warn!("visualization requested without a renderer");
                return Err(Error::VisualizationUnavailable);
            }
        };
        self.model()?;
        for (name, camera) in self.cameras() {
            renderer.camera(name, camera.pose());
        }
        for (_, object) in self.scene().iter() {
            for t in object.mapped_triangles() {
                renderer.triangle(t, object.category());
            }
        }
        // up to date after the call to `model` above
        for (point, mu) in self.model()?.iter() {
            renderer.point(point, mu);
        }
        Ok(())
    }
}

impl RangeModel {
    /// Render the lasers followed by the camera network.
    pub fn visualize(&mut self, renderer: Option<&mut dyn Renderer>) -> Result<()> {
        let renderer = match renderer {
            Some(renderer) => renderer,
            None => {
                log::warn!("visualization requested without a renderer");
                return Err(Error::VisualizationUnavailable);
            }
        };
        for (name, laser) in self.lasers() {
            renderer.laser(name, laser);
        }
        self.network_mut().visualize(Some(renderer))
    }
}
