// Closed-form kinematics for the six-axis training arm.
//
// Frames (angles in radians inside this module, degrees at the API):
//   R03  = Rz(J1) * Ry(J2 + J3 + 90°)          forearm axis is the Z axis of frame 3
//   R36  = Rz(J4) * Ry(J5) * Rz(J6)            spherical wrist
//   Rtool = R03 * R36 * Ry(-90°)               all-zero joints give identity orientation
//   TCP  = W + lambda6 * Rtool * X
// with the wrist centre W in the arm plane
//   r = li1 + li2·sin J2 + li3·sin(J2+J3) + lambda4·cos(J2+J3)
//   z = lambda1 + li2·cos J2 + li3·cos(J2+J3) - lambda4·sin(J2+J3)

use std::f64::consts::{FRAC_PI_2, PI};

use arm_model::{JointAngles, Pose, AXIS_COUNT};
use nalgebra::{Matrix3, Rotation3, Vector3};
use tracing::debug;

use crate::robot_config::{ArmGeometry, AxisLimits};

/// Below this the wrist sub-vector is treated as zero (J5 at a singularity).
pub const WRIST_SINGULARITY_EPSILON: f64 = 1e-6;

/// Slack on the law-of-cosines term before a root is discarded.
const COSINE_EPSILON: f64 = 1e-12;

/// Default element-wise tolerance of the FK cross-check.
pub const DEFAULT_VERIFY_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct ArmKinematics {
    geometry: ArmGeometry,
    verify_tolerance: f64,
}

impl ArmKinematics {
    pub fn new(geometry: ArmGeometry) -> Self {
        Self {
            geometry,
            verify_tolerance: DEFAULT_VERIFY_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, verify_tolerance: f64) -> Self {
        self.verify_tolerance = verify_tolerance;
        self
    }

    pub fn geometry(&self) -> &ArmGeometry {
        &self.geometry
    }
}

impl Default for ArmKinematics {
    fn default() -> Self {
        Self::new(ArmGeometry::default())
    }
}

// ============================================================================
// Rotation helpers
// ============================================================================

fn rot_z(angle: f64) -> Matrix3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), angle).into_inner()
}

fn rot_y(angle: f64) -> Matrix3<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), angle).into_inner()
}

/// Rotation of frame 3 (forearm) in the base frame.
fn shoulder_rotation(j1: f64, j2: f64, j3: f64) -> Matrix3<f64> {
    rot_z(j1) * rot_y(j2 + j3 + FRAC_PI_2)
}

/// Tool rotation to flange rotation (flange Z is the tool X axis).
fn flange_from_tool(tool: &Matrix3<f64>) -> Matrix3<f64> {
    tool * rot_y(FRAC_PI_2)
}

/// Wrist centre of a tool pose: the TCP stepped back along the tool X axis.
pub fn wrist_center(pose: &Pose, lambda6: f64) -> Vector3<f64> {
    pose.translation() - pose.rotation_matrix().column(0) * lambda6
}

/// Expands an angle into every 360° alias that lies inside `limits`.
///
/// Aliases are ordered by distance to `near`, the value the axis holds now.
/// Ties keep the order wrapped value, -360, +360.
pub fn periodic_candidates(angle: f64, limits: &AxisLimits, near: f64) -> Vec<f64> {
    let base = arm_model::wrap_degrees(angle.to_degrees());
    let mut values: Vec<f64> = [base, base - 360.0, base + 360.0]
        .into_iter()
        .filter(|value| limits.contains(*value))
        .collect();
    values.sort_by(|a, b| (a - near).abs().total_cmp(&(b - near).abs()));
    values
}

/// Elbow opening angles (radians) for a law-of-cosines term.
///
/// Two roots inside the domain, one when the triangle is degenerate, none
/// when the wrist centre is out of reach for this shoulder branch.
pub fn elbow_roots(cos_delta: f64) -> Vec<f64> {
    if cos_delta > 1.0 + COSINE_EPSILON || cos_delta < -1.0 - COSINE_EPSILON {
        return Vec::new();
    }
    let clamped = cos_delta.clamp(-1.0, 1.0);
    if 1.0 - clamped.abs() <= COSINE_EPSILON {
        return vec![clamped.acos()];
    }
    let delta = clamped.acos();
    vec![delta, -delta]
}

impl ArmKinematics {
    // ============================================================================
    // Forward Kinematics
    // ============================================================================

    /// Wrist centre and tool rotation for joint angles in radians.
    fn chain(&self, q: &[f64; AXIS_COUNT]) -> (Vector3<f64>, Matrix3<f64>) {
        let g = &self.geometry;
        let [j1, j2, j3, j4, j5, j6] = *q;
        let j23 = j2 + j3;

        // Wrist centre in the arm plane, then swung about J1
        let r = g.li1 + g.li2 * j2.sin() + g.li3 * j23.sin() + g.lambda4 * j23.cos();
        let z = g.lambda1 + g.li2 * j2.cos() + g.li3 * j23.cos() - g.lambda4 * j23.sin();
        let wrist = Vector3::new(r * j1.cos(), r * j1.sin(), z);

        let r03 = shoulder_rotation(j1, j2, j3);
        let r36 = rot_z(j4) * rot_y(j5) * rot_z(j6);
        let tool = r03 * r36 * rot_y(-FRAC_PI_2);

        (wrist, tool)
    }

    /// Tool-center-point translation and rotation matrix.
    pub fn forward_transform(&self, angles: &JointAngles) -> (Vector3<f64>, Matrix3<f64>) {
        let (wrist, tool) = self.chain(&angles.to_radians());
        let tcp = wrist + tool.column(0) * self.geometry.lambda6;
        (tcp, tool)
    }

    /// Forward kinematics: tool-center-point pose for a joint vector in degrees.
    pub fn forward_kinematics(&self, angles: &JointAngles) -> Pose {
        let (tcp, tool) = self.forward_transform(angles);
        Pose::from_parts(tcp, &Rotation3::from_matrix_unchecked(tool))
    }

    /// Wrist centre for a tool pose.
    pub fn wrist_center(&self, pose: &Pose) -> Vector3<f64> {
        wrist_center(pose, self.geometry.lambda6)
    }

    // ============================================================================
    // Inverse Kinematics
    // ============================================================================

    /// Enumerates joint vectors reaching `pose`.
    ///
    /// The list is over-generated: every 360° alias inside the axis limits is
    /// emitted and no forward check is applied, so pass the result through
    /// [`ArmKinematics::verify`]. `reference` supplies J4 when the wrist is
    /// singular. An empty list is a normal outcome.
    pub fn solve(&self, pose: &Pose, reference: &JointAngles) -> Vec<JointAngles> {
        let g = &self.geometry;
        let limits = &g.limits;
        let tool = pose.rotation_matrix();
        let flange = flange_from_tool(&tool);
        let wrist = self.wrist_center(pose);

        let k = g.forearm_reach();
        let psi = g.forearm_offset_angle();
        let rho = wrist.x.hypot(wrist.y);
        let phi = wrist.y.atan2(wrist.x);
        let h = wrist.z - g.lambda1;

        let mut candidates = Vec::new();

        // Step 1: J1, direct and mirrored families
        for (side, j1_raw) in [(1.0, phi), (-1.0, phi + PI)] {
            // Signed radial distance of the wrist from J2 in the arm plane
            let r = side * rho - g.li1;
            let d_squared = r * r + h * h;
            let cos_delta = (d_squared - g.li2 * g.li2 - k * k) / (2.0 * g.li2 * k);
            let roots = elbow_roots(cos_delta);
            if roots.is_empty() {
                continue;
            }

            for j1 in periodic_candidates(j1_raw, &limits[0], reference[0]) {
                // Step 2: J3 from the elbow opening, then Step 3: J2 from the same triangle
                for &delta in &roots {
                    let j3_raw = delta - FRAC_PI_2 + psi;
                    let j2_raw = r.atan2(h) - (k * delta.sin()).atan2(g.li2 + k * delta.cos());

                    for j3 in periodic_candidates(j3_raw, &limits[2], reference[2]) {
                        for j2 in periodic_candidates(j2_raw, &limits[1], reference[1]) {
                            // Step 4: decouple the wrist
                            let r03 = shoulder_rotation(j1.to_radians(), j2.to_radians(), j3.to_radians());
                            let r36 = r03.transpose() * flange;
                            self.solve_wrist(&r36, reference, |j4, j5, j6| {
                                candidates.push(JointAngles::new(j1, j2, j3, j4, j5, j6));
                            });
                        }
                    }
                }
            }
        }

        debug!(pose = %pose, candidates = candidates.len(), "solved inverse kinematics");
        candidates
    }

    /// J4, J5, J6 candidates for a wrist rotation, in degrees.
    fn solve_wrist(&self, r36: &Matrix3<f64>, reference: &JointAngles, mut emit: impl FnMut(f64, f64, f64)) {
        let limits = &self.geometry.limits;
        let sx = r36[(0, 2)];
        let sy = r36[(1, 2)];

        if sx.hypot(sy) > WRIST_SINGULARITY_EPSILON {
            let j4_raw = sy.atan2(sx);
            for family in [j4_raw, j4_raw + PI] {
                for j4 in periodic_candidates(family, &limits[3], reference[3]) {
                    // Residual Ry(J5) * Rz(J6)
                    let residual = rot_z(j4.to_radians()).transpose() * r36;
                    let j5_raw = residual[(0, 2)].atan2(residual[(2, 2)]);
                    for j5 in periodic_candidates(j5_raw, &limits[4], reference[4]) {
                        // Residual Rz(J6)
                        let last = rot_y(j5.to_radians()).transpose() * residual;
                        let j6_raw = last[(1, 0)].atan2(last[(0, 0)]);
                        for j6 in periodic_candidates(j6_raw, &limits[5], reference[5]) {
                            emit(j4, j5, j6);
                        }
                    }
                }
            }
            return;
        }

        // Wrist singularity: J4 and J6 are coaxial. J4 keeps its last value and
        // J6 takes the remainder of the combined rotation.
        let j4 = reference[3];
        if !limits[3].contains(j4) {
            return;
        }
        let (j5, j6_raw) = if r36[(2, 2)] > 0.0 {
            // Rz(J4 + J6)
            let sum = r36[(1, 0)].atan2(r36[(0, 0)]);
            (0.0, sum - j4.to_radians())
        } else {
            // Rz(J4) * Ry(180°) * Rz(J6) depends on J6 - J4
            let difference = r36[(1, 0)].atan2(r36[(1, 1)]);
            (180.0, difference + j4.to_radians())
        };
        if !limits[4].contains(j5) {
            return;
        }
        debug!(j4, j5, "wrist singularity, J4 held at last value");
        for j6 in periodic_candidates(j6_raw, &limits[5], reference[5]) {
            emit(j4, j5, j6);
        }
    }

    // ============================================================================
    // Solution verification
    // ============================================================================

    /// Forward check of a candidate against the requested pose.
    ///
    /// Positions (metres) and rotation matrix elements are compared one by one.
    pub fn verify(&self, candidate: &JointAngles, target: &Pose) -> bool {
        let (tcp, tool) = self.forward_transform(candidate);
        let desired_rotation = target.rotation_matrix();
        let desired_position = target.translation();

        let position_ok = (tcp - desired_position)
            .iter()
            .all(|error| error.abs() <= self.verify_tolerance);
        let rotation_ok = (tool - desired_rotation)
            .iter()
            .all(|error| error.abs() <= self.verify_tolerance);

        position_ok && rotation_ok
    }

    /// Solve and keep only candidates that reproduce the pose.
    pub fn verified_solutions(&self, pose: &Pose, reference: &JointAngles) -> Vec<JointAngles> {
        self.solve(pose, reference)
            .into_iter()
            .filter(|candidate| self.verify(candidate, pose))
            .collect()
    }
}
