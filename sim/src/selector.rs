//! Configuration branch classification and filtering.

use std::collections::BTreeSet;

use arm_model::{ConfigurationFlags, JointAngles};

use crate::robot_config::ArmGeometry;

/// A1 magnitude up to which the shoulder is in front.
const FRONT_LIMIT_DEG: f64 = 90.0;

#[derive(Debug, Clone, Copy)]
pub struct ConfigurationSelector {
    elbow_threshold: f64,
}

impl ConfigurationSelector {
    pub fn new(geometry: &ArmGeometry) -> Self {
        Self {
            elbow_threshold: geometry.elbow_threshold(),
        }
    }

    /// A3 value at which upper arm and forearm are collinear.
    pub fn elbow_threshold(&self) -> f64 {
        self.elbow_threshold
    }

    pub fn classify(&self, angles: &JointAngles) -> ConfigurationFlags {
        ConfigurationFlags {
            front: angles[0].abs() <= FRONT_LIMIT_DEG,
            up: angles[2] > self.elbow_threshold,
            flip: angles[4] < 0.0,
        }
    }

    /// Candidates whose branch matches `flags`, in their original order.
    pub fn select(&self, candidates: &[JointAngles], flags: ConfigurationFlags) -> Vec<JointAngles> {
        candidates
            .iter()
            .filter(|candidate| self.classify(candidate) == flags)
            .copied()
            .collect()
    }

    /// Every flag combination with at least one candidate.
    pub fn scan_all_configurations(&self, candidates: &[JointAngles]) -> BTreeSet<ConfigurationFlags> {
        ConfigurationFlags::all()
            .into_iter()
            .filter(|flags| !self.select(candidates, *flags).is_empty())
            .collect()
    }
}
