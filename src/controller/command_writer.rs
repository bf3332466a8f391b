// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the strategies which turn the joint velocity command of a control cycle into a
//! hardware write.
//!
//! The strategy is chosen when the controller is constructed. Reading the joints and solving
//! the kinematics is the same for all of them.
use std::time::Duration;

use crate::config::ControllerConfig;
use crate::controller::hardware::{JointState, PositionJointInterface, VelocityJointInterface};
use crate::controller::messages::{JointTrajectory, JointTrajectoryPoint};
use crate::controller::sinks::TrajectorySink;
use crate::exception::{ControllerError, ControllerResult};
use crate::utils::JntArray;

/// Writes the joint velocity command of one control cycle to the hardware `H`.
#[cfg_attr(test, mockall::automock)]
pub trait CommandWriter<H> {
    /// Called once during initialization with the number of chain joints.
    /// # Errors
    /// Any error aborts the initialization of the controller.
    fn configure(&mut self, _config: &ControllerConfig, _num_joints: usize) -> ControllerResult<()> {
        Ok(())
    }

    /// Writes `command` for the joints behind `handles`, both in chain order.
    ///
    /// `state` holds the positions read in the same cycle and `period` is the time since the
    /// last cycle.
    fn write(
        &mut self,
        hardware: &mut H,
        handles: &[usize],
        state: &JointState,
        command: &JntArray,
        period: Duration,
    );
}

/// Writes the velocities to the velocity interface of the joints and also emits them as a
/// single point trajectory to a [`TrajectorySink`].
///
/// The trajectory addresses the configured
/// [`trajectory_joints`](`crate::ControllerConfig::trajectory_joints`), taking their velocities
/// from the first chain joints. Its positions are left empty.
pub struct DirectVelocity<T: TrajectorySink> {
    sink: T,
    trajectory: JointTrajectory,
    dropped: u64,
}

impl<T: TrajectorySink> DirectVelocity<T> {
    pub fn new(sink: T) -> Self {
        let config = ControllerConfig::default();
        let time_from_start = time_from_start(&config).unwrap_or_default();
        let mut writer = DirectVelocity {
            sink,
            trajectory: JointTrajectory::default(),
            dropped: 0,
        };
        writer.apply(&config, time_from_start);
        writer
    }

    /// The trajectory emitted in the last cycle.
    pub fn trajectory(&self) -> &JointTrajectory {
        &self.trajectory
    }

    pub fn sink(&self) -> &T {
        &self.sink
    }

    /// Number of trajectories the sink dropped.
    pub fn dropped_trajectories(&self) -> u64 {
        self.dropped
    }

    fn apply(&mut self, config: &ControllerConfig, time_from_start: Duration) {
        self.trajectory.frame_id = config.trajectory_frame_id.clone();
        self.trajectory.joint_names = config.trajectory_joints.clone();
        self.trajectory.points = vec![JointTrajectoryPoint {
            positions: Vec::new(),
            velocities: vec![0.; config.trajectory_joints.len()],
            time_from_start,
        }];
    }
}

/// `trajectory_time_from_start` as a duration.
/// # Errors
/// InvalidParameter if it is negative, not finite or too large for a [`Duration`].
fn time_from_start(config: &ControllerConfig) -> ControllerResult<Duration> {
    Duration::try_from_secs_f64(config.trajectory_time_from_start).map_err(|e| {
        ControllerError::InvalidParameter {
            name: "trajectory_time_from_start".to_string(),
            message: format!("{} s: {}", config.trajectory_time_from_start, e),
        }
    })
}

impl<H: VelocityJointInterface, T: TrajectorySink> CommandWriter<H> for DirectVelocity<T> {
    fn configure(&mut self, config: &ControllerConfig, num_joints: usize) -> ControllerResult<()> {
        if config.trajectory_joints.len() > num_joints {
            return Err(ControllerError::InvalidParameter {
                name: "trajectory_joints".to_string(),
                message: format!(
                    "{} trajectory joints configured but the chain has only {} joints",
                    config.trajectory_joints.len(),
                    num_joints
                ),
            });
        }
        let time_from_start = time_from_start(config)?;
        self.apply(config, time_from_start);
        Ok(())
    }

    fn write(
        &mut self,
        hardware: &mut H,
        handles: &[usize],
        _state: &JointState,
        command: &JntArray,
        _period: Duration,
    ) {
        for (i, &handle) in handles.iter().enumerate() {
            hardware.set_velocity_command(handle, command[i]);
        }
        for point in self.trajectory.points.iter_mut() {
            for (velocity, &commanded) in point.velocities.iter_mut().zip(command.iter()) {
                *velocity = commanded;
            }
        }
        if !self.sink.send(&self.trajectory) {
            self.dropped += 1;
        }
    }
}

/// Integrates the velocities over one period and writes the result to the position interface
/// of the joints: `q + qdot * period`.
///
/// For simulators which only accept position commands.
#[derive(Debug, Copy, Clone, Default)]
pub struct SimulatedIntegration;

impl<H: PositionJointInterface> CommandWriter<H> for SimulatedIntegration {
    fn write(
        &mut self,
        hardware: &mut H,
        handles: &[usize],
        state: &JointState,
        command: &JntArray,
        period: Duration,
    ) {
        let dt = period.as_secs_f64();
        for (i, &handle) in handles.iter().enumerate() {
            hardware.set_position_command(handle, state.position[i] + command[i] * dt);
        }
    }
}
