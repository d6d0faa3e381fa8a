use int_enum::IntEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Target;

/// Fault codes raised towards the alarm subsystem.
#[repr(u16)]
#[derive(Debug, Serialize, Deserialize, IntEnum, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Target lies outside the workspace or the axis limits.
    Unreachable = 100,
    /// Target is inside the workspace but no branch matches the active configuration.
    NoSolution = 101,
    /// A matching branch exists but it is too far from the current joint state.
    LargeJump = 102,
}

impl FaultKind {
    pub fn code(&self) -> u16 {
        u16::from(*self)
    }

    pub fn message(&self) -> &'static str {
        match self {
            FaultKind::Unreachable => "Position is not reachable.",
            FaultKind::NoSolution => "No solution for the selected configuration.",
            FaultKind::LargeJump => "Joint step exceeds the continuity limit.",
        }
    }
}

/// Payload delivered to the fault observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MotionFault {
    pub kind: FaultKind,
    pub target: Target,
}

impl MotionFault {
    pub fn new(kind: FaultKind, target: Target) -> Self {
        Self { kind, target }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    #[error("target {0} is outside the workspace")]
    Unreachable(Target),
    #[error("no solution for target {0} in the active configuration")]
    NoSolution(Target),
    #[error("axis {axis} would step {delta:.2} degrees in one tick")]
    LargeJump { axis: usize, delta: f64 },
    #[error("axis {axis} value {value:.3} is outside [{min}, {max}]")]
    JointLimit { axis: usize, value: f64, min: f64, max: f64 },
    #[error("effective speed must be positive, got {0}")]
    InvalidSpeed(f64),
    #[error("unknown move handle {0}")]
    UnknownHandle(u64),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MotionError {
    /// Fault code for errors that are reported to the alarm subsystem.
    pub fn fault_kind(&self) -> Option<FaultKind> {
        match self {
            MotionError::Unreachable(_) | MotionError::JointLimit { .. } => Some(FaultKind::Unreachable),
            MotionError::NoSolution(_) => Some(FaultKind::NoSolution),
            MotionError::LargeJump { .. } => Some(FaultKind::LargeJump),
            _ => None,
        }
    }
}
