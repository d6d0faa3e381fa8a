use serde::{Deserialize, Serialize};
use std::fmt;

pub mod errors;
pub use errors::*;

pub mod transforms;

/// Number of actuated axes on the arm.
pub const AXIS_COUNT: usize = 6;

/// Tool-center-point pose.
///
/// X, Y, Z are in metres in the base frame. W, P, R are Cardan angles in
/// degrees with `R = Rz(r) * Ry(p) * Rx(w)`, the same W-P-R convention used
/// by the teach pendant.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
    pub p: f64,
    pub r: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, z: f64, w: f64, p: f64, r: f64) -> Self {
        Self { x, y, z, w, p, r }
    }

    /// Pose with identity orientation.
    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, 0.0, 0.0, 0.0)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::from_position(0.0, 0.0, 0.0)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}, {:.4} | {:.2}, {:.2}, {:.2}]",
            self.x, self.y, self.z, self.w, self.p, self.r
        )
    }
}

/// Joint angles in degrees, J1 through J6.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(transparent)]
pub struct JointAngles(pub [f64; AXIS_COUNT]);

impl JointAngles {
    pub const ZERO: JointAngles = JointAngles([0.0; AXIS_COUNT]);

    pub fn new(j1: f64, j2: f64, j3: f64, j4: f64, j5: f64, j6: f64) -> Self {
        Self([j1, j2, j3, j4, j5, j6])
    }

    pub fn as_array(&self) -> &[f64; AXIS_COUNT] {
        &self.0
    }

    pub fn to_radians(&self) -> [f64; AXIS_COUNT] {
        self.0.map(f64::to_radians)
    }

    /// Largest absolute per-axis difference, together with the axis index.
    pub fn max_delta(&self, other: &JointAngles) -> (usize, f64) {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .enumerate()
            .fold((0, 0.0), |best, (axis, delta)| if delta > best.1 { (axis, delta) } else { best })
    }

    /// Per-axis linear blend; `fraction` 0 gives `self`, 1 gives `other`.
    pub fn lerp(&self, other: &JointAngles, fraction: f64) -> Self {
        let mut out = self.0;
        for (value, (start, end)) in out.iter_mut().zip(self.0.iter().zip(other.0.iter())) {
            *value = start + (end - start) * fraction;
        }
        Self(out)
    }

    pub fn approx_eq(&self, other: &JointAngles, tolerance: f64) -> bool {
        self.max_delta(other).1 <= tolerance
    }

    /// Every axis mapped into (-180, 180].
    pub fn wrapped(&self) -> Self {
        Self(self.0.map(wrap_degrees))
    }
}

impl std::ops::Index<usize> for JointAngles {
    type Output = f64;

    fn index(&self, axis: usize) -> &f64 {
        &self.0[axis]
    }
}

impl From<[f64; AXIS_COUNT]> for JointAngles {
    fn from(values: [f64; AXIS_COUNT]) -> Self {
        Self(values)
    }
}

impl fmt::Display for JointAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [j1, j2, j3, j4, j5, j6] = self.0;
        write!(f, "[{j1:.3}, {j2:.3}, {j3:.3}, {j4:.3}, {j5:.3}, {j6:.3}]")
    }
}

/// Maps an angle in degrees into (-180, 180].
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Arm configuration branch selection.
///
/// Mirrors the pendant configuration string: `N`/`F` for the wrist,
/// `U`/`D` for the elbow and `T`/`B` for the shoulder.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigurationFlags {
    pub front: bool,
    pub up: bool,
    pub flip: bool,
}

impl ConfigurationFlags {
    pub fn new(front: bool, up: bool, flip: bool) -> Self {
        Self { front, up, flip }
    }

    /// All eight combinations in a fixed order.
    pub fn all() -> [ConfigurationFlags; 8] {
        let mut out = [ConfigurationFlags::default(); 8];
        for (bits, slot) in out.iter_mut().enumerate() {
            *slot = ConfigurationFlags {
                front: bits & 0b100 == 0,
                up: bits & 0b010 == 0,
                flip: bits & 0b001 != 0,
            };
        }
        out
    }
}

impl Default for ConfigurationFlags {
    fn default() -> Self {
        Self {
            front: true,
            up: true,
            flip: false,
        }
    }
}

impl fmt::Display for ConfigurationFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            if self.flip { 'F' } else { 'N' },
            if self.up { 'U' } else { 'D' },
            if self.front { 'T' } else { 'B' },
        )
    }
}

/// Reference frame of a motion request.
///
/// `Joint` requests are interpolated in joint space; the Cartesian kinds are
/// interpolated linearly along the tool path.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementKind {
    #[default]
    Base,
    Tool,
    User,
    Joint,
}

/// Requested speed as a percentage of the arm's rated speed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct Speed(pub f64);

impl Speed {
    pub const FULL: Speed = Speed(100.0);

    pub fn percent(value: f64) -> Self {
        Self(value)
    }

    pub fn fraction(&self) -> f64 {
        self.0 / 100.0
    }

    /// True for percentages in (0, 100].
    pub fn is_valid(&self) -> bool {
        self.0 > 0.0 && self.0 <= 100.0
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::FULL
    }
}

/// Coarse or fine jog increment selected on the pendant.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JogMode {
    #[default]
    Coarse,
    Fine,
}

/// Whether a submitted target replaces the active move or waits behind it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    #[default]
    Now,
    Queued,
}

/// What the arm should move to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum Goal {
    Cartesian(Pose),
    Joint(JointAngles),
}

/// A motion request as submitted by the program executor or jog input.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Target {
    pub goal: Goal,
    pub kind: MovementKind,
    #[serde(default)]
    pub speed: Speed,
}

impl Target {
    pub fn pose(pose: Pose, kind: MovementKind, speed: Speed) -> Self {
        Self {
            goal: Goal::Cartesian(pose),
            kind,
            speed,
        }
    }

    pub fn joints(angles: JointAngles, speed: Speed) -> Self {
        Self {
            goal: Goal::Joint(angles),
            kind: MovementKind::Joint,
            speed,
        }
    }

    /// Linear move to a pose in the base frame.
    pub fn linear(pose: Pose, speed: Speed) -> Self {
        Self::pose(pose, MovementKind::Base, speed)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.goal {
            Goal::Cartesian(pose) => write!(f, "{:?} {} @{:.0}%", self.kind, pose, self.speed.0),
            Goal::Joint(angles) => write!(f, "{:?} {} @{:.0}%", self.kind, angles, self.speed.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-370.0), -10.0);
        assert_eq!(wrap_degrees(720.0), 0.0);
    }

    #[test]
    fn test_speed_range() {
        assert!(Speed::FULL.is_valid());
        assert!(Speed::percent(0.5).is_valid());
        assert!(!Speed::percent(0.0).is_valid());
        assert!(!Speed::percent(100.5).is_valid());
        assert!(!Speed::percent(f64::NAN).is_valid());
    }

    #[test]
    fn test_wrapped_angles() {
        let angles = JointAngles::new(190.0, -180.0, 45.0, -270.0, 360.0, 540.0);
        assert_eq!(angles.wrapped(), JointAngles::new(-170.0, 180.0, 45.0, 90.0, 0.0, 180.0));
    }

    #[test]
    fn test_max_delta_reports_axis() {
        let a = JointAngles::new(0.0, 10.0, 0.0, 0.0, 0.0, 0.0);
        let b = JointAngles::new(1.0, -5.0, 3.0, 0.0, 0.0, 0.0);
        assert_eq!(a.max_delta(&b), (1, 15.0));
        assert_eq!(a.max_delta(&a), (0, 0.0));
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = JointAngles::new(0.0, 10.0, -20.0, 30.0, -40.0, 50.0);
        let b = JointAngles::new(10.0, 0.0, 20.0, -30.0, 40.0, 0.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert!(a.lerp(&b, 1.0).approx_eq(&b, 1e-12));
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid, JointAngles::new(5.0, 5.0, 0.0, 0.0, 0.0, 25.0));
    }

    #[test]
    fn test_configuration_combinations_are_distinct() {
        let all = ConfigurationFlags::all();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(all[0], ConfigurationFlags::new(true, true, false));
    }

    #[test]
    fn test_configuration_display() {
        assert_eq!(ConfigurationFlags::default().to_string(), "N U T");
        assert_eq!(ConfigurationFlags::new(false, false, true).to_string(), "F D B");
    }
}
