use std::collections::BTreeMap;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, Mount, PointCache, Pose, Result};

/// Named numeric thresholds of a coverage task.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(transparent))]
pub struct TaskParams(BTreeMap<String, f64>);

impl TaskParams {
    /// No parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter.
    pub fn set(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.0.insert(name.into(), value);
        self
    }

    /// Look up a parameter that must be present.
    pub fn get(&self, name: &str) -> Result<f64> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| Error::MissingTaskParameter(name.to_string()))
    }

    /// Look up an optional parameter.
    pub fn get_opt(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for TaskParams {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A coverage task: thresholds plus the points that should be covered.
///
/// When mounted, the points are given in the frame of the mount, whose pose
/// is captured when the task is created.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Task {
    /// Task parameters.
    pub params: TaskParams,
    points: PointCache,
    mount: Option<Pose>,
}

impl Task {
    /// A task whose points are given in the world frame.
    pub fn new(params: TaskParams, points: PointCache) -> Self {
        Self {
            params,
            points,
            mount: None,
        }
    }

    /// A task whose points are given in the frame of `mount`.
    pub fn mounted(params: TaskParams, points: PointCache, mount: &dyn Mount) -> Self {
        Self {
            params,
            points,
            mount: Some(mount.mount_pose()),
        }
    }

    /// The task points in their own frame.
    #[inline]
    pub fn points(&self) -> &PointCache {
        &self.points
    }

    /// The pose of the mount, if any.
    #[inline]
    pub fn mount(&self) -> Option<&Pose> {
        self.mount.as_ref()
    }

    /// The task points in the world frame.
    pub fn mapped_points(&self) -> PointCache {
        match &self.mount {
            None => self.points.clone(),
            Some(pose) => self
                .points
                .iter()
                .map(|(p, mu)| (p.map(pose), mu))
                .collect(),
        }
    }
}
