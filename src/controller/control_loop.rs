// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use nalgebra::Isometry3;
use parking_lot::Mutex;

use crate::chain::{build_chain_from_xml, JointChain, JointLimits};
use crate::config::ControllerConfig;
use crate::controller::command_writer::CommandWriter;
use crate::controller::hardware::{resolve_handles, JointState, JointStateInterface};
use crate::controller::rate_limiting::PublishThrottle;
use crate::controller::realtime_publisher::RealtimePublisher;
use crate::controller::sinks::FeedbackSink;
use crate::controller::stats::ControllerStats;
use crate::exception::{ControllerError, ControllerResult};
use crate::kinematics::{ChainSolvers, FrameVel, IkStatus, Twist, VelocityKinematics};
use crate::utils::JntArray;

/// Lifecycle state of a [`CartesianVelocityController`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControllerState {
    /// Initialized. `update` is rejected until the controller is started.
    Ready,
    /// Started by the host. `update` runs the control cycle.
    Running,
}

/// Thread-safe handle to set the desired twist of a running controller.
///
/// The twist is copied under a lock which is held only for the copy, so the control cycle
/// always sees either the old or the new twist as a whole.
#[derive(Clone, Default)]
pub struct CartesianCommandHandle {
    goal: Arc<Mutex<Twist>>,
}

impl CartesianCommandHandle {
    /// Replaces the desired twist. It stays active until it is replaced again.
    pub fn command_cartesian_velocity<T: Into<Twist>>(&self, twist: T) {
        let twist = twist.into();
        debug!(
            "Received Cartesian velocity command {:?} {:?}",
            twist.linear.as_slice(),
            twist.angular.as_slice()
        );
        *self.goal.lock() = twist;
    }

    /// The current desired twist.
    pub fn desired_twist(&self) -> Twist {
        *self.goal.lock()
    }

    fn reset(&self) {
        *self.goal.lock() = Twist::zero();
    }
}

impl fmt::Debug for CartesianCommandHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartesianCommandHandle")
            .field("goal", &self.desired_twist())
            .finish()
    }
}

/// Closed-loop Cartesian velocity controller for a joint chain.
///
/// Every control cycle reads the joints of the chain from the hardware `H`, solves the inverse
/// velocity kinematics `K` for the desired twist, hands the joint velocities to the command
/// writer `W`, computes pose and twist of the tip and publishes them at a bounded rate.
///
/// # Example
/// ```no_run
/// use cartvel::{
///     CartesianVelocityController, ControllerConfig, PoseTwist, SimulatedIntegration,
///     SimulatedJoints,
/// };
/// use std::time::Duration;
///
/// # fn main() -> cartvel::ControllerResult<()> {
/// let config = ControllerConfig::from_file("controller.toml")?;
/// let joints = SimulatedJoints::new(vec![
///     "shoulder_pan_joint",
///     "shoulder_lift_joint",
///     "elbow_joint",
///     "wrist_1_joint",
///     "wrist_2_joint",
///     "wrist_3_joint",
/// ]);
/// let mut controller = CartesianVelocityController::init(
///     &config,
///     joints,
///     SimulatedIntegration,
///     |feedback: &PoseTwist| println!("{:?}", feedback.pose.translation),
/// )?;
/// let command = controller.command_handle();
/// controller.starting(Duration::ZERO);
/// command.command_cartesian_velocity([0.05, 0., 0., 0., 0., 0.]);
/// let period = Duration::from_millis(8);
/// let mut time = Duration::ZERO;
/// for _ in 0..100 {
///     time += period;
///     controller.update(time, period)?;
///     controller.hardware_mut().step(period);
/// }
/// # Ok(())
/// # }
/// ```
pub struct CartesianVelocityController<H, W, K = ChainSolvers> {
    state: ControllerState,
    hardware: H,
    writer: W,
    kinematics: K,
    chain: JointChain,
    limits: JointLimits,
    handles: Vec<usize>,
    joint_state: JointState,
    qdot_cmd: JntArray,
    command: CartesianCommandHandle,
    desired_twist: Twist,
    feedback: FrameVel,
    throttle: PublishThrottle,
    publisher: RealtimePublisher,
    stats: ControllerStats,
    last_status: IkStatus,
}

impl<H, W> CartesianVelocityController<H, W, ChainSolvers>
where
    H: JointStateInterface,
    W: CommandWriter<H>,
{
    /// Initializes the controller from its configuration.
    ///
    /// Builds the chain between `root_name` and `tip_name` of the robot description and the
    /// [`ChainSolvers`] for it.
    ///
    /// # Arguments
    /// * `config` - Configuration of the controller.
    /// * `hardware` - Joints the controller reads and commands.
    /// * `writer` - Strategy which writes the joint velocity command to `hardware`.
    /// * `feedback` - Receives pose and twist of the tip at `publish_rate`.
    /// # Errors
    /// * MissingParameter if the description, root, tip or publish rate is missing.
    /// * ParseError if the description can not be parsed.
    /// * ChainExtractionError if there is no chain between root and tip.
    /// * MissingJointHandle if `hardware` has no handle for a chain joint.
    /// * InvalidParameter if `writer` rejects the configuration.
    /// * ConfigError if the description file can not be read.
    /// * PublisherError if the feedback publisher can not be started.
    pub fn init<S: FeedbackSink + Send + 'static>(
        config: &ControllerConfig,
        hardware: H,
        writer: W,
        feedback: S,
    ) -> ControllerResult<Self> {
        let description = config.resolve_robot_description()?;
        let (root, tip) = config.link_names()?;
        let (chain, limits) = build_chain_from_xml(&description, root, tip)?;
        let kinematics = ChainSolvers::new(
            chain.clone(),
            config.pinv_epsilon,
            config.pinv_max_iterations,
        );
        CartesianVelocityController::with_kinematics(
            config, chain, limits, kinematics, hardware, writer, feedback,
        )
    }
}

impl<H, W, K> CartesianVelocityController<H, W, K>
where
    H: JointStateInterface,
    W: CommandWriter<H>,
    K: VelocityKinematics,
{
    /// Initializes the controller for an already built chain with custom kinematics.
    ///
    /// Only `publish_rate` and the writer settings of `config` are used.
    /// # Errors
    /// * MissingParameter if the publish rate is missing.
    /// * InvalidParameter if `kinematics` does not fit the chain or `writer` rejects the
    /// configuration.
    /// * MissingJointHandle if `hardware` has no handle for a chain joint.
    /// * PublisherError if the feedback publisher can not be started.
    #[allow(clippy::too_many_arguments)]
    pub fn with_kinematics<S: FeedbackSink + Send + 'static>(
        config: &ControllerConfig,
        chain: JointChain,
        limits: JointLimits,
        kinematics: K,
        hardware: H,
        mut writer: W,
        feedback: S,
    ) -> ControllerResult<Self> {
        let publish_rate = config.publish_rate()?;
        let num_joints = chain.num_joints();
        if kinematics.num_joints() != num_joints || limits.len() != num_joints {
            return Err(ControllerError::InvalidParameter {
                name: "kinematics".to_string(),
                message: format!(
                    "chain has {} joints but the kinematics has {} and the limits {}",
                    num_joints,
                    kinematics.num_joints(),
                    limits.len()
                ),
            });
        }
        let handles = resolve_handles(&hardware, &chain.joint_names())?;
        writer.configure(config, num_joints)?;
        let throttle = PublishThrottle::new(publish_rate);
        if throttle.period().is_none() {
            info!("Publish rate {} disables the feedback publication", publish_rate);
        }
        let publisher = RealtimePublisher::new(feedback)?;
        info!(
            "Cartesian velocity controller initialized for {} joints: {:?}",
            num_joints,
            chain.joint_names()
        );
        Ok(CartesianVelocityController {
            state: ControllerState::Ready,
            hardware,
            writer,
            kinematics,
            limits,
            handles,
            joint_state: JointState::zeros(num_joints),
            qdot_cmd: JntArray::zeros(num_joints),
            command: CartesianCommandHandle::default(),
            desired_twist: Twist::zero(),
            feedback: FrameVel::default(),
            throttle,
            publisher,
            stats: ControllerStats::default(),
            last_status: IkStatus::Ok,
            chain,
        })
    }

    /// Starts the controller at `time`.
    ///
    /// Zeroes the joint velocity command and the desired twist and measures the publish
    /// cadence from `time`. May be called again after [`stopping`](`Self::stopping`).
    pub fn starting(&mut self, time: Duration) {
        self.qdot_cmd.fill(0.);
        self.command.reset();
        self.desired_twist = Twist::zero();
        self.throttle.reset(time);
        self.last_status = IkStatus::Ok;
        self.state = ControllerState::Running;
        info!("Cartesian velocity controller started at {:?}", time);
    }

    /// Runs one control cycle.
    ///
    /// # Arguments
    /// * `time` - Time of the cycle, used to stamp and throttle the feedback.
    /// * `period` - Time since the previous cycle.
    /// # Errors
    /// InvalidState if the controller was not started. The hardware is not touched in that case.
    pub fn update(&mut self, time: Duration, period: Duration) -> ControllerResult<()> {
        if self.state != ControllerState::Running {
            return Err(ControllerError::InvalidState {
                message: "update called before the controller was started".to_string(),
            });
        }

        self.joint_state.read(&self.hardware, &self.handles);

        self.desired_twist = self.command.desired_twist();
        let status = self.kinematics.inverse_velocity(
            &self.joint_state.position,
            &self.desired_twist,
            &mut self.qdot_cmd,
        );
        self.record_status(status);

        self.writer.write(
            &mut self.hardware,
            &self.handles,
            &self.joint_state,
            &self.qdot_cmd,
            period,
        );

        let twist = self
            .kinematics
            .forward_velocity(&self.joint_state.position, &self.joint_state.velocity)
            .twist;
        let pose = self.kinematics.forward_position(&self.joint_state.position);
        self.feedback = FrameVel { pose, twist };

        if self.throttle.is_due(time) {
            let feedback = self.feedback;
            if self.publisher.try_publish(|message| {
                message.stamp = time;
                message.pose = feedback.pose;
                message.twist = feedback.twist;
            }) {
                self.throttle.advance();
                self.stats.publishes += 1;
            } else {
                self.stats.publish_skipped += 1;
            }
        }
        self.stats.cycles += 1;
        Ok(())
    }

    /// Stops the controller at `time`.
    ///
    /// Zeroes the joint velocity command and writes it once, so a velocity interface comes to
    /// rest and a position interface holds the last read positions. The controller is
    /// [`Ready`](`ControllerState::Ready`) afterwards. Does nothing if it was not running.
    pub fn stopping(&mut self, time: Duration) {
        if self.state != ControllerState::Running {
            return;
        }
        self.qdot_cmd.fill(0.);
        self.writer.write(
            &mut self.hardware,
            &self.handles,
            &self.joint_state,
            &self.qdot_cmd,
            Duration::ZERO,
        );
        self.state = ControllerState::Ready;
        info!("Cartesian velocity controller stopped at {:?}", time);
    }

    /// Replaces the desired twist. See [`CartesianCommandHandle`] for other threads.
    pub fn command_cartesian_velocity<T: Into<Twist>>(&self, twist: T) {
        self.command.command_cartesian_velocity(twist);
    }

    /// A handle which can be moved to the thread receiving the commands.
    pub fn command_handle(&self) -> CartesianCommandHandle {
        self.command.clone()
    }

    fn record_status(&mut self, status: IkStatus) {
        if status.is_degenerate() {
            self.stats.degenerate_solutions += 1;
            if !self.last_status.is_degenerate() {
                warn!(
                    "Inverse velocity solution is degenerate at joint positions {:?}",
                    self.joint_state.position.as_slice()
                );
            }
        } else if self.last_status.is_degenerate() {
            info!("Inverse velocity solution recovered from a degenerate configuration");
        }
        self.last_status = status;
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn chain(&self) -> &JointChain {
        &self.chain
    }

    pub fn joint_limits(&self) -> &JointLimits {
        &self.limits
    }

    /// Joint state read in the last cycle.
    pub fn joint_state(&self) -> &JointState {
        &self.joint_state
    }

    /// Joint velocities commanded in the last cycle.
    pub fn joint_velocity_command(&self) -> &JntArray {
        &self.qdot_cmd
    }

    /// Pose of the tip computed in the last cycle.
    pub fn pose(&self) -> &Isometry3<f64> {
        &self.feedback.pose
    }

    /// Twist of the tip computed in the last cycle.
    pub fn twist(&self) -> &Twist {
        &self.feedback.twist
    }

    /// Desired twist used in the last cycle.
    pub fn desired_twist(&self) -> &Twist {
        &self.desired_twist
    }

    /// Status of the inverse velocity solve of the last cycle.
    pub fn last_ik_status(&self) -> IkStatus {
        self.last_status
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    /// Whether a feedback message is still waiting for or in delivery.
    pub fn feedback_in_flight(&self) -> bool {
        self.publisher.is_busy()
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn kinematics(&self) -> &K {
        &self.kinematics
    }
}
