// Headless host for the arm motion core.
// Run with: cargo run -p arm_sim -- --config arm.json --rate 100

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use arm_model::{Dispatch, Goal, JointAngles, MotionFault, MovementKind, Pose, Speed, Target};
use arm_sim::{MotionDriver, MoveStatus, SimConfig};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arm_sim", about = "Runs a motion program against the simulated arm")]
struct Args {
    /// JSON simulator configuration; the built-in demo is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host tick rate in Hz.
    #[arg(long, default_value_t = 100.0)]
    rate: f64,

    /// Stop after this many ticks even if moves are pending.
    #[arg(long, default_value_t = 10_000)]
    max_ticks: u64,
}

fn demo_program() -> Vec<Target> {
    vec![
        Target::joints(JointAngles::new(10.0, 10.0, 0.0, 0.0, 80.0, 0.0), Speed::percent(50.0)),
        Target::pose(Pose::from_position(0.0, 0.0, 0.05), MovementKind::Tool, Speed::percent(25.0)),
        Target::pose(Pose::from_position(0.5, 0.0, 0.3), MovementKind::Joint, Speed::FULL),
        Target::joints(JointAngles::new(0.0, 0.0, 0.0, 0.0, 90.0, 0.0), Speed::FULL),
    ]
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if !(args.rate > 0.0 && args.rate.is_finite()) {
        return Err(format!("tick rate must be positive, got {}", args.rate).into());
    }

    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    if config.program.is_empty() {
        config.program = demo_program();
    }

    info!(
        model = config.geometry.model.display_name(),
        flags = %config.flags,
        moves = config.program.len(),
        "starting arm simulator"
    );

    let observer = |fault: &MotionFault| {
        warn!(code = fault.kind.code(), target = %fault.target, "fault: {}", fault.kind.message());
    };
    let mut driver = MotionDriver::from_config(&config, observer)?;

    for target in &config.program {
        if let Goal::Cartesian(pose) = target.goal {
            let feasible: Vec<String> = driver
                .feasible_configurations(&pose)
                .iter()
                .map(|flags| flags.to_string())
                .collect();
            info!(%target, ?feasible, "program target");
        }
        if let Err(e) = driver.submit(*target, Dispatch::Queued) {
            warn!(%target, error = %e, "move rejected");
        }
    }

    let dt = 1.0 / args.rate;
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(dt));
    let mut ticks = 0u64;

    while ticks < args.max_ticks && !driver.is_idle() {
        ticker.tick().await;
        ticks += 1;
        match driver.advance(dt) {
            MoveStatus::Completed | MoveStatus::Aborted => {
                info!(ticks, angles = %driver.current_angles(), pose = %driver.current_pose(), "move finished");
            }
            _ => {}
        }
    }

    info!(ticks, angles = %driver.current_angles(), wrapped = %driver.current_angles().wrapped(), "simulation finished");
    Ok(())
}
