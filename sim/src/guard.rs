//! Last-valid-state history and the per-tick continuity checks.

use std::collections::VecDeque;

use arm_model::{FaultKind, JointAngles, MotionError, Target};
use tracing::warn;

/// A committed joint state and the target it was committed for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateEntry {
    pub target: Target,
    pub angles: JointAngles,
}

/// Bounded ring of committed states; the oldest entry is dropped when full.
#[derive(Debug, Clone)]
pub struct StateHistory {
    entries: VecDeque<StateEntry>,
    capacity: usize,
}

impl StateHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, target: Target, angles: JointAngles) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(StateEntry { target, angles });
    }

    /// Most recent entry. Rollback reads it without removing it.
    pub fn newest(&self) -> Option<&StateEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &StateEntry> {
        self.entries.iter()
    }
}

/// Step-size check plus the edge latch that keeps a persisting fault from
/// being reported on every tick.
#[derive(Debug, Clone)]
pub struct ContinuityGuard {
    max_step_deg: f64,
    latched: bool,
}

impl ContinuityGuard {
    pub fn new(max_step_deg: f64) -> Self {
        Self {
            max_step_deg,
            latched: false,
        }
    }

    /// Rejects a candidate when any axis would move more than the step limit.
    pub fn check_step(&self, current: &JointAngles, candidate: &JointAngles) -> Result<(), MotionError> {
        let (axis, delta) = current.max_delta(candidate);
        if delta > self.max_step_deg {
            return Err(MotionError::LargeJump { axis: axis + 1, delta });
        }
        Ok(())
    }

    /// Arms the latch. Returns true only on the transition that should be reported.
    pub fn raise(&mut self, kind: FaultKind) -> bool {
        if self.latched {
            return false;
        }
        self.latched = true;
        warn!(code = kind.code(), "{}", kind.message());
        true
    }

    /// Called on a successful commit or a new request.
    pub fn clear(&mut self) {
        self.latched = false;
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }
}
