//! Tick-driven motion execution.
//!
//! [`MotionDriver`] owns the live joint state, the rollback history, the
//! active move and the FIFO of queued moves. The host calls
//! [`MotionDriver::advance`] once per tick; everything else is synchronous.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use arm_model::{
    ConfigurationFlags, Dispatch, FaultKind, Goal, JogMode, JointAngles, MotionError, MotionFault,
    MovementKind, Pose, Speed, Target,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::guard::{ContinuityGuard, StateHistory};
use crate::kinematics::ArmKinematics;
use crate::observer::FaultObserver;
use crate::robot_config::{ArmGeometry, MotionConfig, SimConfig};
use crate::selector::ConfigurationSelector;
use crate::workspace::WorkspaceModel;

/// Finished moves remembered for [`MotionDriver::status`].
const OUTCOME_CAPACITY: usize = 32;

/// Identifies a submitted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MoveHandle(u64);

impl MoveHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MoveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveStatus {
    /// Nothing to execute.
    Idle,
    Queued,
    InProgress,
    Completed,
    Aborted,
}

impl MoveStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, MoveStatus::Completed | MoveStatus::Aborted)
    }
}

#[derive(Debug, Clone, Copy)]
enum MotionPath {
    /// Per-axis blend; all axes arrive together.
    Joint { start: JointAngles, end: JointAngles },
    /// Straight tool path, re-solved every tick.
    Linear { start: Pose, end: Pose },
}

#[derive(Debug, Clone, Copy)]
struct ActiveMove {
    handle: MoveHandle,
    request: Target,
    path: MotionPath,
    duration: f64,
    elapsed: f64,
}

impl ActiveMove {
    fn fraction(&self) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct QueuedMove {
    handle: MoveHandle,
    target: Target,
}

pub struct MotionDriver<O: FaultObserver> {
    kinematics: ArmKinematics,
    workspace: WorkspaceModel,
    selector: ConfigurationSelector,
    guard: ContinuityGuard,
    history: StateHistory,
    config: MotionConfig,
    observer: O,

    current: JointAngles,
    commanded: Target,
    flags: ConfigurationFlags,
    jog_mode: JogMode,
    speed_override: f64,

    active: Option<ActiveMove>,
    queue: VecDeque<QueuedMove>,
    outcomes: VecDeque<(MoveHandle, MoveStatus)>,
    next_handle: u64,
}

impl<O: FaultObserver> MotionDriver<O> {
    pub fn new(
        geometry: ArmGeometry,
        config: MotionConfig,
        initial: JointAngles,
        observer: O,
    ) -> Result<Self, MotionError> {
        geometry.validate().map_err(MotionError::InvalidConfig)?;
        config.validate().map_err(MotionError::InvalidConfig)?;
        geometry.check_limits(&initial)?;

        let workspace = WorkspaceModel::new(&geometry);
        let selector = ConfigurationSelector::new(&geometry);
        let kinematics = ArmKinematics::new(geometry).with_tolerance(config.verify_tolerance);
        let guard = ContinuityGuard::new(config.max_step_deg);

        let commanded = Target::joints(initial, Speed::FULL);
        let mut history = StateHistory::new(config.history_capacity);
        history.push(commanded, initial);

        Ok(Self {
            kinematics,
            workspace,
            selector,
            guard,
            history,
            speed_override: config.speed_override,
            config,
            observer,
            current: initial,
            commanded,
            flags: ConfigurationFlags::default(),
            jog_mode: JogMode::default(),
            active: None,
            queue: VecDeque::new(),
            outcomes: VecDeque::with_capacity(OUTCOME_CAPACITY),
            next_handle: 1,
        })
    }

    /// Driver for a loaded simulator configuration, with its flags applied.
    pub fn from_config(config: &SimConfig, observer: O) -> Result<Self, MotionError> {
        let mut driver = Self::new(
            config.geometry.clone(),
            config.motion.clone(),
            config.initial_angles,
            observer,
        )?;
        driver.flags = config.flags;
        Ok(driver)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn current_angles(&self) -> JointAngles {
        self.current
    }

    pub fn current_pose(&self) -> Pose {
        self.kinematics.forward_kinematics(&self.current)
    }

    /// Target the arm is currently commanded towards.
    pub fn commanded_target(&self) -> Target {
        self.commanded
    }

    pub fn is_reachable(&self, pose: &Pose) -> bool {
        self.workspace.is_reachable(pose)
    }

    /// Configurations that can reach `pose`; the active flags are untouched.
    pub fn feasible_configurations(&self, pose: &Pose) -> BTreeSet<ConfigurationFlags> {
        if !self.workspace.is_reachable(pose) {
            return BTreeSet::new();
        }
        let pool = self.kinematics.verified_solutions(pose, &self.current);
        self.selector.scan_all_configurations(&pool)
    }

    pub fn status(&self, handle: MoveHandle) -> Option<MoveStatus> {
        if self.active.as_ref().is_some_and(|active| active.handle == handle) {
            return Some(MoveStatus::InProgress);
        }
        if self.queue.iter().any(|queued| queued.handle == handle) {
            return Some(MoveStatus::Queued);
        }
        self.outcomes
            .iter()
            .rev()
            .find(|(finished, _)| *finished == handle)
            .map(|(_, status)| *status)
    }

    pub fn active_handle(&self) -> Option<MoveHandle> {
        self.active.as_ref().map(|active| active.handle)
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn flags(&self) -> ConfigurationFlags {
        self.flags
    }

    pub fn jog_mode(&self) -> JogMode {
        self.jog_mode
    }

    pub fn speed_override(&self) -> f64 {
        self.speed_override
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn kinematics(&self) -> &ArmKinematics {
        &self.kinematics
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Applies to every solve from the next tick on.
    pub fn set_flags(&mut self, flags: ConfigurationFlags) {
        if flags != self.flags {
            info!(from = %self.flags, to = %flags, "configuration changed");
        }
        self.flags = flags;
    }

    /// Takes effect for moves started after the call.
    pub fn set_jog_mode(&mut self, mode: JogMode) {
        self.jog_mode = mode;
    }

    /// Operator override in percent, (0, 100]. Takes effect for moves started after the call.
    pub fn set_speed_override(&mut self, percent: f64) -> Result<(), MotionError> {
        if !(percent > 0.0 && percent <= 100.0) {
            return Err(MotionError::InvalidSpeed(percent));
        }
        self.speed_override = percent;
        Ok(())
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Starts `target` now, preempting any active move.
    pub fn begin_move(&mut self, target: Target) -> Result<MoveHandle, MotionError> {
        self.submit(target, Dispatch::Now)
    }

    /// Rejections that do not depend on the arm state at move start are
    /// reported here. Tool-frame goals are checked when they start.
    pub fn submit(&mut self, target: Target, dispatch: Dispatch) -> Result<MoveHandle, MotionError> {
        self.guard.clear();
        if let Err(err) = self.precheck(&target) {
            self.reject(&target, &err);
            return Err(err);
        }

        let handle = MoveHandle(self.next_handle);
        self.next_handle += 1;

        match dispatch {
            Dispatch::Now => {
                let active = match self.plan(handle, target) {
                    Ok(active) => active,
                    Err(err) => {
                        self.reject(&target, &err);
                        return Err(err);
                    }
                };
                if let Some(preempted) = self.active.take() {
                    info!(handle = %preempted.handle, "move preempted");
                    self.record(preempted.handle, MoveStatus::Aborted);
                }
                self.activate(active);
            }
            Dispatch::Queued => {
                debug!(%handle, %target, "move queued");
                self.queue.push_back(QueuedMove { handle, target });
            }
        }
        Ok(handle)
    }

    /// Aborts an active or queued move. Angles stay where they are.
    pub fn cancel(&mut self, handle: MoveHandle) -> Result<(), MotionError> {
        if self.active.as_ref().is_some_and(|active| active.handle == handle) {
            self.active = None;
            self.commanded = Target::joints(self.current, Speed::FULL);
            info!(%handle, angles = %self.current, "move cancelled");
            self.record(handle, MoveStatus::Aborted);
            return Ok(());
        }
        if let Some(index) = self.queue.iter().position(|queued| queued.handle == handle) {
            self.queue.remove(index);
            info!(%handle, "queued move cancelled");
            self.record(handle, MoveStatus::Aborted);
            return Ok(());
        }
        if self.outcomes.iter().any(|(finished, _)| *finished == handle) {
            return Ok(());
        }
        Err(MotionError::UnknownHandle(handle.id()))
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the active move by `dt` seconds and reports its state.
    ///
    /// When no move is active the next queued move is started first.
    pub fn advance(&mut self, dt: f64) -> MoveStatus {
        if self.active.is_none() {
            self.start_next_queued();
        }
        let Some(mut active) = self.active.take() else {
            return MoveStatus::Idle;
        };

        active.elapsed += dt.max(0.0);
        let fraction = active.fraction();

        let step = match active.path {
            MotionPath::Joint { start, end } => {
                let angles = if fraction >= 1.0 { end } else { start.lerp(&end, fraction) };
                self.commit(Target::joints(angles, active.request.speed), angles);
                Ok(())
            }
            MotionPath::Linear { start, end } => {
                let pose = if fraction >= 1.0 { end } else { start.interpolate(&end, fraction) };
                self.step_linear(&pose, active.request.speed)
            }
        };

        match step {
            Ok(()) if fraction >= 1.0 => {
                info!(handle = %active.handle, angles = %self.current, "move completed");
                self.record(active.handle, MoveStatus::Completed);
                MoveStatus::Completed
            }
            Ok(()) => {
                debug!(handle = %active.handle, fraction, angles = %self.current, "tick");
                self.active = Some(active);
                MoveStatus::InProgress
            }
            Err(err) => {
                self.rollback(&active, &err);
                MoveStatus::Aborted
            }
        }
    }

    /// One linear-mode intermediate: reachability, solve, verify, select,
    /// then the continuity check against the current state.
    fn step_linear(&mut self, pose: &Pose, speed: Speed) -> Result<(), MotionError> {
        let target = Target::pose(*pose, MovementKind::Base, speed);
        if !self.workspace.is_reachable(pose) {
            return Err(MotionError::NoSolution(target));
        }
        let pool = self.kinematics.verified_solutions(pose, &self.current);
        let candidate = self
            .selector
            .select(&pool, self.flags)
            .into_iter()
            .next()
            .ok_or(MotionError::NoSolution(target))?;
        self.guard.check_step(&self.current, &candidate)?;
        self.commit(target, candidate);
        Ok(())
    }

    fn commit(&mut self, target: Target, angles: JointAngles) {
        self.current = angles;
        self.history.push(target, angles);
        self.guard.clear();
    }

    /// Freezes at the newest committed state and aborts the move.
    fn rollback(&mut self, active: &ActiveMove, err: &MotionError) {
        if let Some(entry) = self.history.newest() {
            self.current = entry.angles;
            self.commanded = entry.target;
        }
        info!(handle = %active.handle, error = %err, angles = %self.current, "move aborted");
        self.record(active.handle, MoveStatus::Aborted);
        let kind = err.fault_kind().unwrap_or(FaultKind::NoSolution);
        self.report(kind, active.request);
    }

    // ========================================================================
    // Planning
    // ========================================================================

    fn effective_speed(&self, speed: Speed) -> Result<f64, MotionError> {
        if !speed.is_valid() {
            return Err(MotionError::InvalidSpeed(speed.0));
        }
        let multiplier = match self.jog_mode {
            JogMode::Coarse => self.config.coarse_multiplier,
            JogMode::Fine => self.config.fine_multiplier,
        };
        let effective = speed.fraction() * multiplier * self.speed_override / 100.0;
        if effective.is_finite() && effective > 0.0 {
            Ok(effective)
        } else {
            Err(MotionError::InvalidSpeed(effective))
        }
    }

    /// Goal pose in the base frame. Tool goals are relative to the current TCP.
    fn resolve_pose(&self, pose: &Pose, kind: MovementKind) -> Pose {
        match kind {
            MovementKind::Base | MovementKind::Joint => *pose,
            MovementKind::Tool => pose.relative_to(&self.current_pose()),
            MovementKind::User => pose.relative_to(&self.config.user_frame),
        }
    }

    fn precheck(&self, target: &Target) -> Result<(), MotionError> {
        self.effective_speed(target.speed)?;
        match target.goal {
            Goal::Joint(angles) => self.kinematics.geometry().check_limits(&angles),
            Goal::Cartesian(_) if target.kind == MovementKind::Tool => Ok(()),
            Goal::Cartesian(pose) => {
                let resolved = self.resolve_pose(&pose, target.kind);
                if self.workspace.is_reachable(&resolved) {
                    Ok(())
                } else {
                    Err(MotionError::Unreachable(*target))
                }
            }
        }
    }

    /// Fixes the path and duration of a move from the current state.
    fn plan(&self, handle: MoveHandle, target: Target) -> Result<ActiveMove, MotionError> {
        let effective = self.effective_speed(target.speed)?;
        let path = match (target.goal, target.kind) {
            (Goal::Joint(end), MovementKind::Joint) => {
                self.kinematics.geometry().check_limits(&end)?;
                MotionPath::Joint { start: self.current, end }
            }
            (Goal::Joint(end), _) => {
                self.kinematics.geometry().check_limits(&end)?;
                MotionPath::Linear {
                    start: self.current_pose(),
                    end: self.kinematics.forward_kinematics(&end),
                }
            }
            (Goal::Cartesian(pose), MovementKind::Joint) => {
                if !self.workspace.is_reachable(&pose) {
                    return Err(MotionError::Unreachable(target));
                }
                let pool = self.kinematics.verified_solutions(&pose, &self.current);
                let end = self
                    .selector
                    .select(&pool, self.flags)
                    .into_iter()
                    .next()
                    .ok_or(MotionError::NoSolution(target))?;
                MotionPath::Joint { start: self.current, end }
            }
            (Goal::Cartesian(pose), kind) => {
                let end = self.resolve_pose(&pose, kind);
                if !self.workspace.is_reachable(&end) {
                    return Err(MotionError::Unreachable(target));
                }
                MotionPath::Linear { start: self.current_pose(), end }
            }
        };

        let duration = match path {
            MotionPath::Joint { start, end } => {
                start.max_delta(&end).1 / (self.config.max_joint_speed * effective)
            }
            MotionPath::Linear { start, end } => {
                let travel = start.distance_to(&end) / (self.config.max_linear_speed * effective);
                let turn = start.angle_to(&end) / (self.config.max_rotation_speed * effective);
                travel.max(turn)
            }
        };

        Ok(ActiveMove {
            handle,
            request: target,
            path,
            duration,
            elapsed: 0.0,
        })
    }

    fn activate(&mut self, active: ActiveMove) {
        info!(
            handle = %active.handle,
            target = %active.request,
            duration = active.duration,
            "move started"
        );
        self.commanded = active.request;
        self.active = Some(active);
    }

    /// Each dequeued move is a new request, so the fault latch is cleared for it.
    fn start_next_queued(&mut self) {
        while let Some(queued) = self.queue.pop_front() {
            self.guard.clear();
            match self.plan(queued.handle, queued.target) {
                Ok(active) => {
                    self.activate(active);
                    return;
                }
                Err(err) => {
                    info!(handle = %queued.handle, error = %err, "queued move rejected");
                    self.record(queued.handle, MoveStatus::Aborted);
                    self.reject(&queued.target, &err);
                }
            }
        }
    }

    // ========================================================================
    // Faults and bookkeeping
    // ========================================================================

    fn reject(&mut self, target: &Target, err: &MotionError) {
        if let Some(kind) = err.fault_kind() {
            self.report(kind, *target);
        }
    }

    fn report(&mut self, kind: FaultKind, target: Target) {
        if self.guard.raise(kind) {
            self.observer.on_fault(&MotionFault::new(kind, target));
        }
    }

    fn record(&mut self, handle: MoveHandle, status: MoveStatus) {
        if self.outcomes.len() == OUTCOME_CAPACITY {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back((handle, status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::FaultLog;

    fn driver() -> MotionDriver<FaultLog> {
        let config = SimConfig::default();
        MotionDriver::from_config(&config, FaultLog::new()).unwrap()
    }

    fn run_to_end(driver: &mut MotionDriver<FaultLog>, dt: f64) -> MoveStatus {
        for _ in 0..10_000 {
            let status = driver.advance(dt);
            if status.is_finished() {
                return status;
            }
        }
        panic!("move did not finish");
    }

    #[test]
    fn test_history_seeded_with_initial_state() {
        let driver = driver();
        assert_eq!(driver.history().len(), 1);
        assert_eq!(
            driver.history().newest().map(|e| e.angles),
            Some(SimConfig::default().initial_angles)
        );
    }

    #[test]
    fn test_idle_advance() {
        let mut driver = driver();
        let before = driver.current_angles();
        assert_eq!(driver.advance(0.01), MoveStatus::Idle);
        assert_eq!(driver.current_angles(), before);
    }

    #[test]
    fn test_joint_duration_from_largest_delta() {
        let mut driver = driver();
        let goal = JointAngles::new(45.0, 0.0, 0.0, 0.0, 90.0, 0.0);
        driver.begin_move(Target::joints(goal, Speed::FULL)).unwrap();

        // 45 degrees at 180 deg/s: 0.25 s
        assert_eq!(driver.advance(0.125), MoveStatus::InProgress);
        assert!((driver.current_angles()[0] - 22.5).abs() < 1e-9);
        assert_eq!(driver.advance(0.125), MoveStatus::Completed);
        assert_eq!(driver.current_angles(), goal);
    }

    #[test]
    fn test_half_speed_doubles_duration() {
        let mut driver = driver();
        let goal = JointAngles::new(45.0, 0.0, 0.0, 0.0, 90.0, 0.0);
        driver.begin_move(Target::joints(goal, Speed::percent(50.0))).unwrap();
        assert_eq!(driver.advance(0.25), MoveStatus::InProgress);
        assert_eq!(driver.advance(0.25), MoveStatus::Completed);
    }

    #[test]
    fn test_fine_jog_and_override_scale_speed() {
        let mut driver = driver();
        driver.set_jog_mode(JogMode::Fine);
        driver.set_speed_override(50.0).unwrap();
        assert_eq!(driver.jog_mode(), JogMode::Fine);
        assert_eq!(driver.speed_override(), 50.0);
        let goal = JointAngles::new(9.0, 0.0, 0.0, 0.0, 90.0, 0.0);
        driver.begin_move(Target::joints(goal, Speed::FULL)).unwrap();

        // 180 * 0.1 * 0.5 = 9 deg/s
        assert_eq!(driver.advance(0.5), MoveStatus::InProgress);
        assert!((driver.current_angles()[0] - 4.5).abs() < 1e-9);
        assert_eq!(driver.advance(0.5), MoveStatus::Completed);
    }

    #[test]
    fn test_zero_speed_rejected_without_fault() {
        let mut driver = driver();
        let goal = JointAngles::new(10.0, 0.0, 0.0, 0.0, 90.0, 0.0);
        let err = driver.begin_move(Target::joints(goal, Speed::percent(0.0))).unwrap_err();
        assert!(matches!(err, MotionError::InvalidSpeed(_)));
        assert!(driver.observer().is_empty());
        let err = driver.begin_move(Target::joints(goal, Speed::percent(150.0))).unwrap_err();
        assert_eq!(err, MotionError::InvalidSpeed(150.0));
        assert!(driver.set_speed_override(0.0).is_err());
        assert!(driver.set_speed_override(120.0).is_err());
    }

    #[test]
    fn test_joint_goal_outside_limits() {
        let mut driver = driver();
        let goal = JointAngles::new(0.0, 0.0, 0.0, 0.0, 150.0, 0.0);
        let err = driver.begin_move(Target::joints(goal, Speed::FULL)).unwrap_err();
        assert!(matches!(err, MotionError::JointLimit { axis: 5, .. }));
        assert_eq!(driver.observer().count(FaultKind::Unreachable), 1);
    }

    #[test]
    fn test_unreachable_pose_leaves_state_unchanged() {
        let mut driver = driver();
        let before = driver.current_angles();
        let target = Target::linear(Pose::from_position(2.5, 0.0, 0.5), Speed::FULL);

        let err = driver.begin_move(target).unwrap_err();
        assert_eq!(err, MotionError::Unreachable(target));
        assert_eq!(driver.current_angles(), before);
        assert_eq!(driver.observer().len(), 1);
        assert_eq!(driver.observer().last().map(|f| f.target), Some(target));

        assert_eq!(driver.advance(0.01), MoveStatus::Idle);
        assert_eq!(driver.observer().len(), 1);

        driver.observer_mut().clear();
        assert!(driver.begin_move(target).is_err());
        assert_eq!(driver.observer().len(), 1);
    }

    #[test]
    fn test_wrong_configuration_aborts_first_tick() {
        let mut driver = driver();
        driver.set_flags(ConfigurationFlags::new(true, false, false));
        let before = driver.current_angles();
        let handle = driver
            .begin_move(Target::linear(Pose::from_position(0.5, 0.0, 0.3), Speed::FULL))
            .unwrap();

        assert_eq!(driver.advance(0.01), MoveStatus::Aborted);
        assert_eq!(driver.current_angles(), before);
        assert_eq!(driver.status(handle), Some(MoveStatus::Aborted));
        assert_eq!(driver.observer().count(FaultKind::NoSolution), 1);

        assert_eq!(driver.advance(0.01), MoveStatus::Idle);
        assert_eq!(driver.observer().len(), 1);
    }

    #[test]
    fn test_joint_kind_pose_without_branch() {
        let mut driver = driver();
        driver.set_flags(ConfigurationFlags::new(true, false, false));
        let target = Target::pose(Pose::from_position(0.5, 0.0, 0.3), MovementKind::Joint, Speed::FULL);

        let err = driver.begin_move(target).unwrap_err();
        assert_eq!(err, MotionError::NoSolution(target));
        assert_eq!(driver.observer().count(FaultKind::NoSolution), 1);
        assert!(driver.is_idle());
    }

    #[test]
    fn test_cancel_freezes_angles() {
        let mut driver = driver();
        let goal = JointAngles::new(90.0, 0.0, 0.0, 0.0, 90.0, 0.0);
        let handle = driver.begin_move(Target::joints(goal, Speed::FULL)).unwrap();
        for _ in 0..5 {
            driver.advance(0.01);
        }
        let frozen = driver.current_angles();
        assert!(frozen[0] > 0.0 && frozen[0] < 90.0);

        driver.cancel(handle).unwrap();
        assert_eq!(driver.status(handle), Some(MoveStatus::Aborted));
        assert_eq!(driver.advance(0.01), MoveStatus::Idle);
        assert_eq!(driver.current_angles(), frozen);
        assert!(driver.observer().is_empty());
    }

    #[test]
    fn test_cancel_unknown_handle() {
        let mut driver = driver();
        assert_eq!(driver.cancel(MoveHandle(99)), Err(MotionError::UnknownHandle(99)));
    }

    #[test]
    fn test_now_preempts_active_move() {
        let mut driver = driver();
        let first = driver
            .begin_move(Target::joints(JointAngles::new(90.0, 0.0, 0.0, 0.0, 90.0, 0.0), Speed::FULL))
            .unwrap();
        driver.advance(0.05);
        let second = driver
            .begin_move(Target::joints(JointAngles::new(0.0, 10.0, 0.0, 0.0, 90.0, 0.0), Speed::FULL))
            .unwrap();

        assert_eq!(driver.status(first), Some(MoveStatus::Aborted));
        assert_eq!(driver.status(second), Some(MoveStatus::InProgress));
        assert_eq!(driver.active_handle(), Some(second));
    }

    #[test]
    fn test_queued_moves_run_in_order() {
        let mut driver = driver();
        let a = JointAngles::new(20.0, 0.0, 0.0, 0.0, 90.0, 0.0);
        let b = JointAngles::new(20.0, 15.0, 0.0, 0.0, 90.0, 0.0);
        let first = driver.submit(Target::joints(a, Speed::FULL), Dispatch::Now).unwrap();
        let second = driver.submit(Target::joints(b, Speed::FULL), Dispatch::Queued).unwrap();

        assert_eq!(driver.status(second), Some(MoveStatus::Queued));
        assert_eq!(driver.queued_len(), 1);
        assert_eq!(run_to_end(&mut driver, 0.01), MoveStatus::Completed);
        assert_eq!(driver.status(first), Some(MoveStatus::Completed));
        assert_eq!(driver.current_angles(), a);

        assert_eq!(run_to_end(&mut driver, 0.01), MoveStatus::Completed);
        assert_eq!(driver.status(second), Some(MoveStatus::Completed));
        assert_eq!(driver.current_angles(), b);
        assert!(driver.is_idle());
    }

    #[test]
    fn test_each_tick_pushes_history() {
        let mut driver = driver();
        let goal = JointAngles::new(11.25, 0.0, 0.0, 0.0, 90.0, 0.0);
        driver.begin_move(Target::joints(goal, Speed::FULL)).unwrap();
        // 1/16 s total in four ticks
        run_to_end(&mut driver, 1.0 / 64.0);
        assert_eq!(driver.history().len(), 5);
        assert_eq!(driver.history().newest().map(|e| e.angles), Some(goal));
    }

    #[test]
    fn test_feasible_configurations_do_not_change_flags() {
        let driver = driver();
        let flags = driver.flags();
        let feasible = driver.feasible_configurations(&Pose::from_position(0.5, 0.0, 0.3));
        assert!(feasible.contains(&ConfigurationFlags::new(true, true, false)));
        assert!(!feasible.contains(&ConfigurationFlags::new(true, false, false)));
        assert_eq!(driver.flags(), flags);
        assert!(driver.feasible_configurations(&Pose::from_position(4.0, 0.0, 0.0)).is_empty());
    }
}
