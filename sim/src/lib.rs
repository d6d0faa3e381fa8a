// Motion core for the six-axis training arm: kinematics, reachability,
// configuration selection and the tick-driven motion driver.

pub mod driver;
pub mod guard;
pub mod kinematics;
pub mod observer;
pub mod robot_config;
pub mod selector;
pub mod workspace;

pub use driver::{MotionDriver, MoveHandle, MoveStatus};
pub use guard::{ContinuityGuard, StateEntry, StateHistory};
pub use kinematics::ArmKinematics;
pub use observer::{FaultLog, FaultObserver, NoopObserver};
pub use robot_config::{ArmGeometry, AxisLimits, MotionConfig, RobotModel, SimConfig};
pub use selector::ConfigurationSelector;
pub use workspace::{BandDescriptor, HeightBand, WorkspaceModel};
