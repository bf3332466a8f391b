// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the seams between the controller and the joints it drives.
//!
//! A host resolves every joint name to a handle once during initialization. All reads and
//! writes in the control cycle go through those handles and must not block.
use std::time::Duration;

use crate::exception::{ControllerError, ControllerResult};
use crate::utils::JntArray;

/// Read side of the joints: measured position and velocity.
pub trait JointStateInterface {
    /// Resolves a joint name to a handle. Returns None if the hardware has no such joint.
    fn handle(&self, joint: &str) -> Option<usize>;
    /// Position in \[rad\] or \[m\].
    fn position(&self, handle: usize) -> f64;
    /// Velocity in \[rad/s\] or \[m/s\].
    fn velocity(&self, handle: usize) -> f64;
}

/// Joints which accept velocity commands.
pub trait VelocityJointInterface: JointStateInterface {
    fn set_velocity_command(&mut self, handle: usize, velocity: f64);
}

/// Joints which accept position commands.
pub trait PositionJointInterface: JointStateInterface {
    fn set_position_command(&mut self, handle: usize, position: f64);
}

/// Resolves the handles of `joints` in the given order.
/// # Errors
/// MissingJointHandle for the first joint the hardware does not know.
pub fn resolve_handles<H: JointStateInterface + ?Sized, S: AsRef<str>>(
    hardware: &H,
    joints: &[S],
) -> ControllerResult<Vec<usize>> {
    joints
        .iter()
        .map(|joint| {
            let joint = joint.as_ref();
            hardware
                .handle(joint)
                .ok_or_else(|| ControllerError::MissingJointHandle {
                    joint: joint.to_string(),
                })
        })
        .collect()
}

/// Measured positions and velocities of the chain joints, in chain order.
#[derive(Debug, Clone, PartialEq)]
pub struct JointState {
    pub position: JntArray,
    pub velocity: JntArray,
}

impl JointState {
    pub fn zeros(num_joints: usize) -> Self {
        JointState {
            position: JntArray::zeros(num_joints),
            velocity: JntArray::zeros(num_joints),
        }
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Refreshes the state from the hardware. `handles` has one entry per joint.
    pub fn read<H: JointStateInterface + ?Sized>(&mut self, hardware: &H, handles: &[usize]) {
        for (i, &handle) in handles.iter().enumerate() {
            self.position[i] = hardware.position(handle);
            self.velocity[i] = hardware.velocity(handle);
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum JointCommand {
    None,
    Velocity(f64),
    Position(f64),
}

/// Named joints which follow their commands perfectly.
///
/// A velocity command is integrated over the step, a position command is reached within the
/// step. Useful to run a controller without a robot.
#[derive(Debug, Clone)]
pub struct SimulatedJoints {
    names: Vec<String>,
    positions: Vec<f64>,
    velocities: Vec<f64>,
    commands: Vec<JointCommand>,
}

impl SimulatedJoints {
    /// Creates joints at position zero.
    pub fn new<S: Into<String>, I: IntoIterator<Item = S>>(names: I) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let n = names.len();
        SimulatedJoints {
            names,
            positions: vec![0.; n],
            velocities: vec![0.; n],
            commands: vec![JointCommand::None; n],
        }
    }

    /// Sets the positions of the first `positions.len()` joints.
    pub fn with_positions(mut self, positions: &[f64]) -> Self {
        for (target, &position) in self.positions.iter_mut().zip(positions) {
            *target = position;
        }
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn velocities(&self) -> &[f64] {
        &self.velocities
    }

    /// Last velocity command of a joint, if its last command was a velocity.
    pub fn velocity_command(&self, handle: usize) -> Option<f64> {
        match self.commands[handle] {
            JointCommand::Velocity(velocity) => Some(velocity),
            _ => None,
        }
    }

    /// Last position command of a joint, if its last command was a position.
    pub fn position_command(&self, handle: usize) -> Option<f64> {
        match self.commands[handle] {
            JointCommand::Position(position) => Some(position),
            _ => None,
        }
    }

    /// Advances the joints by `period` according to their last commands.
    pub fn step(&mut self, period: Duration) {
        let dt = period.as_secs_f64();
        for i in 0..self.names.len() {
            match self.commands[i] {
                JointCommand::None => self.velocities[i] = 0.,
                JointCommand::Velocity(velocity) => {
                    self.positions[i] += velocity * dt;
                    self.velocities[i] = velocity;
                }
                JointCommand::Position(position) => {
                    self.velocities[i] = if dt > 0. {
                        (position - self.positions[i]) / dt
                    } else {
                        0.
                    };
                    self.positions[i] = position;
                }
            }
        }
    }
}

impl JointStateInterface for SimulatedJoints {
    fn handle(&self, joint: &str) -> Option<usize> {
        self.names.iter().position(|name| name == joint)
    }

    fn position(&self, handle: usize) -> f64 {
        self.positions[handle]
    }

    fn velocity(&self, handle: usize) -> f64 {
        self.velocities[handle]
    }
}

impl VelocityJointInterface for SimulatedJoints {
    fn set_velocity_command(&mut self, handle: usize, velocity: f64) {
        self.commands[handle] = JointCommand::Velocity(velocity);
    }
}

impl PositionJointInterface for SimulatedJoints {
    fn set_position_command(&mut self, handle: usize, position: f64) {
        self.commands[handle] = JointCommand::Position(position);
    }
}

#[cfg(test)]
mockall::mock! {
    pub Hardware {}
    impl JointStateInterface for Hardware {
        fn handle(&self, joint: &str) -> Option<usize>;
        fn position(&self, handle: usize) -> f64;
        fn velocity(&self, handle: usize) -> f64;
    }
    impl VelocityJointInterface for Hardware {
        fn set_velocity_command(&mut self, handle: usize, velocity: f64);
    }
    impl PositionJointInterface for Hardware {
        fn set_position_command(&mut self, handle: usize, position: f64);
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::hardware::{
        resolve_handles, JointState, JointStateInterface, MockHardware, PositionJointInterface,
        SimulatedJoints, VelocityJointInterface,
    };
    use crate::exception::ControllerError;
    use approx::assert_relative_eq;
    use mockall::predicate::eq;
    use std::time::Duration;

    #[test]
    fn handles_follow_requested_order() {
        let joints = SimulatedJoints::new(vec!["a", "b", "c"]);
        assert_eq!(resolve_handles(&joints, &["c", "a"]).unwrap(), vec![2, 0]);
        match resolve_handles(&joints, &["a", "x"]) {
            Err(ControllerError::MissingJointHandle { joint }) => assert_eq!(joint, "x"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn joint_state_reads_through_handles() {
        let mut hardware = MockHardware::new();
        hardware.expect_position().with(eq(4)).return_const(1.5);
        hardware.expect_position().with(eq(2)).return_const(-0.5);
        hardware.expect_velocity().with(eq(4)).return_const(0.1);
        hardware.expect_velocity().with(eq(2)).return_const(0.2);

        let mut state = JointState::zeros(2);
        state.read(&hardware, &[4, 2]);
        assert_eq!(state.position.as_slice(), &[1.5, -0.5]);
        assert_eq!(state.velocity.as_slice(), &[0.1, 0.2]);
    }

    #[test]
    fn simulated_velocity_is_integrated() {
        let mut joints = SimulatedJoints::new(vec!["a", "b"]).with_positions(&[1., 2.]);
        joints.set_velocity_command(0, 0.5);
        joints.step(Duration::from_millis(100));
        assert_relative_eq!(joints.position(0), 1.05);
        assert_relative_eq!(joints.velocity(0), 0.5);
        assert_relative_eq!(joints.position(1), 2.);
        assert_eq!(joints.velocity_command(0), Some(0.5));
        assert_eq!(joints.position_command(0), None);
    }

    #[test]
    fn simulated_position_is_reached() {
        let mut joints = SimulatedJoints::new(vec!["a"]);
        joints.set_position_command(0, 0.02);
        joints.step(Duration::from_millis(10));
        assert_relative_eq!(joints.position(0), 0.02);
        assert_relative_eq!(joints.velocity(0), 2., epsilon = 1e-9);
        assert_eq!(joints.position_command(0), Some(0.02));
    }
}
