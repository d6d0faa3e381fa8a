//! Analytic reachability test run before inverse kinematics.
//!
//! The wrist centre must sit inside the annulus swept by the upper arm and
//! forearm around J2. Seen from J1 the J2 axis is either on the same side as
//! the target (near) or on the opposite side (far), so each height band has
//! two half-plane predicates and the pose is reachable when either holds.

use arm_model::Pose;
use tracing::debug;

use crate::kinematics::wrist_center;
use crate::robot_config::ArmGeometry;

/// Slack on every band and circle comparison.
pub const WORKSPACE_EPSILON: f64 = 1e-9;

/// Below this horizontal radius the wrist centre is on the J1 axis.
const AXIS_RADIUS_EPSILON: f64 = 1e-9;

/// Height band of the wrist centre relative to the J2 axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightBand {
    /// `[-Rmax, -Rmin)`: only the outer circle constrains the radius.
    Lower,
    /// `[-Rmin, Rmin]`: the radius lies between the inner and outer circles.
    Middle,
    /// `(Rmin, Rmax]`: only the outer circle constrains the radius.
    Upper,
}

/// Height interval and the radial bounds that apply inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandDescriptor {
    pub band: HeightBand,
    pub lower: f64,
    pub upper: f64,
    pub includes_lower: bool,
    pub includes_upper: bool,
    pub outer_radius: f64,
    pub inner_radius: Option<f64>,
}

impl BandDescriptor {
    pub fn contains(&self, h: f64) -> bool {
        let above = if self.includes_lower {
            h >= self.lower - WORKSPACE_EPSILON
        } else {
            h > self.lower
        };
        let below = if self.includes_upper {
            h <= self.upper + WORKSPACE_EPSILON
        } else {
            h < self.upper
        };
        above && below
    }

    /// Circle test of one half-plane: J2 at signed distance `offset` from J1.
    fn half_plane_holds(&self, rho: f64, h: f64, offset: f64) -> bool {
        let radial = rho - offset;
        let d_squared = radial * radial + h * h;
        let outer_ok = d_squared <= self.outer_radius * self.outer_radius + WORKSPACE_EPSILON;
        let inner_ok = self
            .inner_radius
            .map_or(true, |inner| d_squared >= inner * inner - WORKSPACE_EPSILON);
        outer_ok && inner_ok
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceModel {
    li1: f64,
    lambda1: f64,
    lambda6: f64,
    bands: [BandDescriptor; 3],
}

impl WorkspaceModel {
    pub fn new(geometry: &ArmGeometry) -> Self {
        let r_min = geometry.min_wrist_radius();
        let r_max = geometry.max_wrist_radius();
        let band = |band, lower, upper, includes_lower, includes_upper, inner_radius| BandDescriptor {
            band,
            lower,
            upper,
            includes_lower,
            includes_upper,
            outer_radius: r_max,
            inner_radius,
        };

        Self {
            li1: geometry.li1,
            lambda1: geometry.lambda1,
            lambda6: geometry.lambda6,
            bands: [
                band(HeightBand::Lower, -r_max, -r_min, true, false, None),
                band(HeightBand::Middle, -r_min, r_min, true, true, Some(r_min)),
                band(HeightBand::Upper, r_min, r_max, false, true, None),
            ],
        }
    }

    /// Bands ordered from the lowest up.
    pub fn bands(&self) -> &[BandDescriptor] {
        &self.bands
    }

    /// Band containing a height offset from J2, if any.
    pub fn band_for(&self, h: f64) -> Option<&BandDescriptor> {
        self.bands.iter().find(|band| band.contains(h))
    }

    /// Whether the wrist centre of `pose` is inside the reachable volume.
    ///
    /// Axis limits are not considered; the solver applies them.
    pub fn is_reachable(&self, pose: &Pose) -> bool {
        let wrist = wrist_center(pose, self.lambda6);
        let rho = wrist.x.hypot(wrist.y);
        let h = wrist.z - self.lambda1;

        let Some(band) = self.band_for(h) else {
            debug!(h, "wrist centre outside every height band");
            return false;
        };

        if rho < AXIS_RADIUS_EPSILON {
            return true;
        }

        let near = band.half_plane_holds(rho, h, self.li1);
        let far = band.half_plane_holds(rho, h, -self.li1);
        if !(near || far) {
            debug!(rho, h, band = ?band.band, "wrist centre outside the reachable annulus");
        }
        near || far
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::ArmKinematics;
    use arm_model::JointAngles;

    fn model() -> WorkspaceModel {
        WorkspaceModel::new(&ArmGeometry::compact())
    }

    #[test]
    fn test_forward_kinematics_points_are_reachable() {
        let kin = ArmKinematics::default();
        let workspace = model();
        let samples = [
            JointAngles::ZERO,
            JointAngles::new(30.0, 40.0, -20.0, 50.0, 60.0, -70.0),
            JointAngles::new(-120.0, 10.0, 30.0, -100.0, -45.0, 200.0),
            JointAngles::new(0.0, 150.0, -200.0, 0.0, 90.0, 0.0),
            JointAngles::new(90.0, -80.0, 70.0, 10.0, -30.0, 0.0),
        ];
        for angles in &samples {
            let pose = kin.forward_kinematics(angles);
            assert!(workspace.is_reachable(&pose), "{} should be reachable", angles);
        }
    }

    #[test]
    fn test_far_points_are_rejected() {
        let workspace = model();
        assert!(!workspace.is_reachable(&Pose::from_position(3.0, 0.0, 0.5)));
        assert!(!workspace.is_reachable(&Pose::from_position(0.0, 0.0, 3.0)));
        assert!(!workspace.is_reachable(&Pose::from_position(0.2, 0.1, -2.0)));
    }

    #[test]
    fn test_reference_target_is_reachable() {
        assert!(model().is_reachable(&Pose::from_position(0.5, 0.0, 0.3)));
    }

    #[test]
    fn test_band_classification() {
        let workspace = model();
        let geometry = ArmGeometry::compact();
        let r_min = geometry.min_wrist_radius();
        let r_max = geometry.max_wrist_radius();
        let band = |h: f64| workspace.band_for(h).map(|b| b.band);

        assert_eq!(workspace.bands().len(), 3);
        assert_eq!(band(0.0), Some(HeightBand::Middle));
        assert_eq!(band(r_min), Some(HeightBand::Middle));
        assert_eq!(band(-r_min), Some(HeightBand::Middle));
        assert_eq!(band(-r_min - 1e-6), Some(HeightBand::Lower));
        assert_eq!(band(r_min + 1e-6), Some(HeightBand::Upper));
        assert_eq!(band(r_max), Some(HeightBand::Upper));
        assert_eq!(band(-r_max), Some(HeightBand::Lower));
        assert_eq!(band(r_max + 1e-3), None);
    }

    #[test]
    fn test_only_middle_band_has_inner_bound() {
        let workspace = model();
        let inner: Vec<bool> = workspace.bands().iter().map(|b| b.inner_radius.is_some()).collect();
        assert_eq!(inner, vec![false, true, false]);
    }

    #[test]
    fn test_no_flapping_across_band_edges() {
        let workspace = model();
        let r_min = ArmGeometry::compact().min_wrist_radius();
        let lambda1 = ArmGeometry::compact().lambda1;
        let lambda6 = ArmGeometry::compact().lambda6;

        // Identity orientation: the wrist centre is lambda6 behind the TCP along X
        for rho in [0.05, 0.15, 0.4, 0.8, 1.2, 1.5] {
            for edge in [r_min, -r_min] {
                let z = lambda1 + edge;
                let below = workspace.is_reachable(&Pose::from_position(rho + lambda6, 0.0, z - 1e-12));
                let at = workspace.is_reachable(&Pose::from_position(rho + lambda6, 0.0, z));
                let above = workspace.is_reachable(&Pose::from_position(rho + lambda6, 0.0, z + 1e-12));
                assert_eq!(below, at, "rho {rho} edge {edge}");
                assert_eq!(at, above, "rho {rho} edge {edge}");
            }
        }
    }

    #[test]
    fn test_point_on_j1_axis_inside_band() {
        let workspace = model();
        let lambda1 = ArmGeometry::compact().lambda1;
        let lambda6 = ArmGeometry::compact().lambda6;
        assert!(workspace.is_reachable(&Pose::from_position(lambda6, 0.0, lambda1 + 0.3)));
    }
}
