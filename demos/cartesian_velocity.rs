// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

use std::f64::consts::PI;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use crossbeam_channel as cc;
use log::{info, warn, LevelFilter};

use cartvel::{
    CartesianVelocityController, ChannelSink, CommandWriter, ControllerConfig, ControllerResult,
    DirectVelocity, JointTrajectory, PoseTwist, SimulatedIntegration, SimulatedJoints,
};

const UR5_JOINTS: [&str; 6] = [
    "shoulder_pan_joint",
    "shoulder_lift_joint",
    "elbow_joint",
    "wrist_1_joint",
    "wrist_2_joint",
    "wrist_3_joint",
];

/// Moves a simulated UR5 along a smooth back and forth motion with a Cartesian velocity
/// controller and prints the published tool pose.
#[derive(Parser, Debug)]
#[clap(author, version, name = "cartesian_velocity")]
struct CommandLineArguments {
    /// Controller configuration. Defaults to the UR5 configuration next to this demo.
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Command velocities directly instead of integrating them to positions
    #[clap(short, long, action)]
    pub direct: bool,
    /// Duration of the motion in seconds
    #[clap(long, default_value_t = 8.)]
    pub duration: f64,
    /// Control cycle in milliseconds
    #[clap(long, default_value_t = 2)]
    pub cycle: u64,
    /// Print debug messages
    #[clap(short, long, action)]
    pub verbose: bool,
}

fn main() -> ControllerResult<()> {
    let args = CommandLineArguments::parse();
    init_logger(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    let config_path = args.config.clone().unwrap_or_else(|| {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/controller.toml")
    });
    let config = ControllerConfig::from_file(&config_path)?;
    let joints = SimulatedJoints::new(UR5_JOINTS.iter().copied())
        .with_positions(&[0., -PI / 3., PI / 2., -PI / 2., -PI / 2., 0.]);

    if args.direct {
        let (trajectory_tx, trajectory_rx) = cc::bounded::<JointTrajectory>(1);
        let writer = DirectVelocity::new(ChannelSink::new(trajectory_tx));
        run(&config, joints, writer, &args)?;
        if let Ok(trajectory) = trajectory_rx.try_recv() {
            info!(
                "First trajectory command for {:?}: {:?}",
                trajectory.joint_names, trajectory.points[0].velocities
            );
        }
        Ok(())
    } else {
        run(&config, joints, SimulatedIntegration, &args)
    }
}

fn run<W: CommandWriter<SimulatedJoints>>(
    config: &ControllerConfig,
    joints: SimulatedJoints,
    writer: W,
    args: &CommandLineArguments,
) -> ControllerResult<()> {
    let (feedback_tx, feedback_rx) = cc::unbounded::<PoseTwist>();
    let printer = std::thread::spawn(move || {
        for feedback in feedback_rx.iter() {
            let p = feedback.pose.translation.vector;
            println!(
                "{:8.3}s  x {:7.4}  y {:7.4}  z {:7.4}  |v| {:6.4}",
                feedback.stamp.as_secs_f64(),
                p.x,
                p.y,
                p.z,
                feedback.twist.linear.norm()
            );
        }
    });

    let mut controller =
        CartesianVelocityController::init(config, joints, writer, ChannelSink::new(feedback_tx))?;
    let command = controller.command_handle();

    let period = Duration::from_millis(args.cycle.max(1));
    let time_max = args.duration / 2.;
    let v_max = 0.05;
    let mut time = Duration::ZERO;
    controller.starting(time);
    while time.as_secs_f64() < args.duration {
        time += period;
        let t = time.as_secs_f64();
        let direction = if t < time_max { 1. } else { -1. };
        let v = direction * v_max / 2. * (1. - f64::cos(2. * PI / time_max * t));
        command.command_cartesian_velocity([v, 0., -v / 2., 0., 0., 0.]);
        controller.update(time, period)?;
        controller.hardware_mut().step(period);
    }
    controller.stopping(time);

    let stats = controller.stats();
    info!(
        "{} cycles, {} published, {} skipped",
        stats.cycles, stats.publishes, stats.publish_skipped
    );
    if stats.degenerate_solutions > 0 {
        warn!(
            "{} cycles close to a singularity",
            stats.degenerate_solutions
        );
    }
    info!("Final joint positions: {:?}", controller.hardware().positions());
    drop(controller);
    if printer.join().is_err() {
        warn!("Feedback printer panicked");
    }
    Ok(())
}

fn init_logger(level: LevelFilter) {
    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            let level = match record.level() {
                log::Level::Error => "ERROR".red(),
                log::Level::Warn => " WARN".yellow(),
                log::Level::Info => " INFO".green(),
                log::Level::Debug => "DEBUG".blue(),
                log::Level::Trace => "TRACE".normal(),
            };
            out.finish(format_args!("[{}] {}", level, message))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply();
    if let Err(e) = result {
        eprintln!("Could not set up the logger: {}", e);
    }
}
