//! Arm geometry and motion configuration for the training arm.
//!
//! Link constants follow the closed-form model used by the kinematics core:
//! a base rotation, a shoulder offset `li1` at height `lambda1`, an upper arm
//! `li2`, an elbow with perpendicular offset `li3`, a forearm `lambda4` to the
//! wrist centre and a spherical wrist with flange distance `lambda6`.

use std::path::Path;

use arm_model::{ConfigurationFlags, JointAngles, MotionError, Pose, Target, AXIS_COUNT};
use serde::{Deserialize, Serialize};

/// Supported arm presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RobotModel {
    /// 0.6 m upper arm, ~1.7 m reach.
    #[default]
    Compact,
    /// Compact geometry scaled by 1.4.
    LongReach,
}

impl RobotModel {
    pub fn all() -> Vec<RobotModel> {
        vec![RobotModel::Compact, RobotModel::LongReach]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RobotModel::Compact => "Compact (0.60 m upper arm)",
            RobotModel::LongReach => "Long reach (0.84 m upper arm)",
        }
    }
}

/// Inclusive travel range of one axis, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    pub min: f64,
    pub max: f64,
}

impl AxisLimits {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min - LIMIT_EPSILON && value <= self.max + LIMIT_EPSILON
    }
}

/// Slack applied to limit checks so values produced by `atan2` exactly on a
/// limit are not rejected by rounding.
pub const LIMIT_EPSILON: f64 = 1e-9;

/// Link lengths (metres) and axis limits (degrees) of one arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmGeometry {
    pub model: RobotModel,

    /// Horizontal offset from the J1 axis to the J2 axis.
    pub li1: f64,
    /// Upper arm, J2 to J3.
    pub li2: f64,
    /// Elbow offset perpendicular to the forearm.
    pub li3: f64,
    /// Height of the J2 axis above the base.
    pub lambda1: f64,
    /// Forearm, J3 to the wrist centre.
    pub lambda4: f64,
    /// Wrist centre to the tool-center-point.
    pub lambda6: f64,

    pub limits: [AxisLimits; AXIS_COUNT],
}

impl ArmGeometry {
    pub fn compact() -> Self {
        Self {
            model: RobotModel::Compact,
            li1: 0.15,
            li2: 0.6,
            li3: 0.12,
            lambda1: 0.475,
            lambda4: 0.72,
            lambda6: 0.085,
            limits: [
                AxisLimits::new(-180.0, 180.0),
                AxisLimits::new(-90.0, 155.0),
                AxisLimits::new(-230.0, 80.0),
                AxisLimits::new(-190.0, 190.0),
                AxisLimits::new(-125.0, 125.0),
                AxisLimits::new(-360.0, 360.0),
            ],
        }
    }

    pub fn long_reach() -> Self {
        const SCALE_FACTOR: f64 = 1.4;

        let base = Self::compact();
        Self {
            model: RobotModel::LongReach,
            li1: base.li1 * SCALE_FACTOR,
            li2: base.li2 * SCALE_FACTOR,
            li3: base.li3 * SCALE_FACTOR,
            lambda1: base.lambda1 * SCALE_FACTOR,
            lambda4: base.lambda4 * SCALE_FACTOR,
            lambda6: base.lambda6 * SCALE_FACTOR,
            limits: base.limits,
        }
    }

    pub fn from_model(model: RobotModel) -> Self {
        match model {
            RobotModel::Compact => Self::compact(),
            RobotModel::LongReach => Self::long_reach(),
        }
    }

    /// Distance from the elbow joint to the wrist centre.
    pub fn forearm_reach(&self) -> f64 {
        self.li3.hypot(self.lambda4)
    }

    /// Angle (radians) between the forearm axis and the elbow-to-wrist line.
    pub fn forearm_offset_angle(&self) -> f64 {
        self.li3.atan2(self.lambda4)
    }

    /// J3 value (degrees) at which the upper arm and the elbow-to-wrist line
    /// are collinear. Above it the elbow is up.
    pub fn elbow_threshold(&self) -> f64 {
        self.forearm_offset_angle().to_degrees() - 90.0
    }

    /// Radius of the inner boundary of the wrist-centre annulus.
    pub fn min_wrist_radius(&self) -> f64 {
        (self.li2 - self.forearm_reach()).abs()
    }

    /// Radius of the outer boundary of the wrist-centre annulus.
    pub fn max_wrist_radius(&self) -> f64 {
        self.li2 + self.forearm_reach()
    }

    /// First axis whose value is outside its limits.
    pub fn check_limits(&self, angles: &JointAngles) -> Result<(), MotionError> {
        for (axis, (value, limits)) in angles.as_array().iter().zip(self.limits.iter()).enumerate() {
            if !limits.contains(*value) {
                return Err(MotionError::JointLimit {
                    axis: axis + 1,
                    value: *value,
                    min: limits.min,
                    max: limits.max,
                });
            }
        }
        Ok(())
    }

    pub fn within_limits(&self, angles: &JointAngles) -> bool {
        self.check_limits(angles).is_ok()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.li2 <= 0.0 || self.lambda4 <= 0.0 {
            return Err("Upper arm and forearm lengths must be greater than 0.".to_string());
        }
        if self.li1 < 0.0 || self.li3 < 0.0 || self.lambda1 < 0.0 || self.lambda6 < 0.0 {
            return Err("Link offsets cannot be negative.".to_string());
        }
        for (axis, limits) in self.limits.iter().enumerate() {
            if limits.min >= limits.max {
                return Err(format!("Axis {} has an empty travel range.", axis + 1));
            }
        }
        Ok(())
    }
}

impl Default for ArmGeometry {
    fn default() -> Self {
        Self::compact()
    }
}

/// Tuning of the motion driver and continuity guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Entries kept for rollback.
    pub history_capacity: usize,
    /// Largest per-axis change (degrees) accepted between two ticks.
    pub max_step_deg: f64,
    /// Element-wise tolerance of the forward-kinematics cross-check.
    pub verify_tolerance: f64,
    /// Rated joint speed (degrees/s) of the axis with the largest travel.
    pub max_joint_speed: f64,
    /// Rated tool-center-point speed (m/s).
    pub max_linear_speed: f64,
    /// Rated tool reorientation speed (degrees/s).
    pub max_rotation_speed: f64,
    pub coarse_multiplier: f64,
    pub fine_multiplier: f64,
    /// Operator speed override in percent.
    pub speed_override: f64,
    /// Frame that `MovementKind::User` targets are expressed in.
    pub user_frame: Pose,
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.history_capacity == 0 {
            return Err("History capacity must be greater than 0.".to_string());
        }
        if self.max_step_deg <= 0.0 {
            return Err("Maximum step must be greater than 0.".to_string());
        }
        if self.verify_tolerance <= 0.0 {
            return Err("Verify tolerance must be greater than 0.".to_string());
        }
        if self.max_joint_speed <= 0.0 || self.max_linear_speed <= 0.0 || self.max_rotation_speed <= 0.0 {
            return Err("Rated speeds must be greater than 0.".to_string());
        }
        if self.coarse_multiplier <= 0.0 || self.fine_multiplier <= 0.0 {
            return Err("Jog multipliers must be greater than 0.".to_string());
        }
        if !(self.speed_override > 0.0 && self.speed_override <= 100.0) {
            return Err("Speed override must be greater than 0 and at most 100.".to_string());
        }
        Ok(())
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            history_capacity: 20,
            max_step_deg: 30.0,
            verify_tolerance: 1e-3,
            max_joint_speed: 180.0,
            max_linear_speed: 1.0,
            max_rotation_speed: 180.0,
            coarse_multiplier: 1.0,
            fine_multiplier: 0.1,
            speed_override: 100.0,
            user_frame: Pose::default(),
        }
    }
}

/// Everything the host binary needs to bring up a simulated arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub geometry: ArmGeometry,
    pub motion: MotionConfig,
    pub initial_angles: JointAngles,
    pub flags: ConfigurationFlags,
    /// Targets queued at start-up.
    pub program: Vec<Target>,
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, MotionError> {
        let config: SimConfig =
            serde_json::from_str(json).map_err(|e| MotionError::InvalidConfig(e.to_string()))?;
        config.validate().map_err(MotionError::InvalidConfig)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MotionError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| MotionError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.geometry.validate()?;
        self.motion.validate()?;
        self.geometry
            .check_limits(&self.initial_angles)
            .map_err(|e| format!("Initial angles: {}", e))
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            geometry: ArmGeometry::default(),
            motion: MotionConfig::default(),
            initial_angles: JointAngles::new(0.0, 0.0, 0.0, 0.0, 90.0, 0.0),
            flags: ConfigurationFlags::default(),
            program: Vec::new(),
        }
    }
}
