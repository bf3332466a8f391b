// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! # cartvel-rs
//! cartvel-rs is a closed-loop Cartesian velocity controller for serial manipulators.
//! It turns a desired twist of the end effector into joint velocity or joint position
//! commands, using a kinematic chain extracted from an URDF robot description.
//!
//! **ALWAYS HAVE THE EMERGENCY STOP AT HAND WHILE CONTROLLING A REAL ROBOT!**
//!
//! ## Design
//! The library is divided into the following modules:
//! * [description](`crate::description`) - the tree of links and joints read from URDF.
//! * [chain](`crate::chain`) - the joint chain between a root and a tip link and its limits.
//! * [kinematics](`crate::kinematics`) - forward and inverse velocity kinematics of a chain.
//! * [config](`crate::config`) - the configuration of a controller.
//! * [controller](`crate::controller`) - the control loop, the hardware seams and the command
//! writers.
//!
//! The host of the controller owns the control thread. It calls
//! [`starting`](`crate::CartesianVelocityController::starting`) once and
//! [`update`](`crate::CartesianVelocityController::update`) in every cycle. The desired twist
//! is set from any other thread through a
//! [`CartesianCommandHandle`](`crate::CartesianCommandHandle`). `update` never blocks: the
//! feedback is handed to a background thread and skipped if the previous message is still in
//! delivery.
//!
//! Two command writers are available:
//! * [`DirectVelocity`] writes the joint velocities to the velocity interface of the hardware
//! and emits them as a single point trajectory.
//! * [`SimulatedIntegration`] integrates the joint velocities over one cycle and writes
//! positions, for simulators which only accept position commands.
//!
//! # Example:
//!```no_run
//! use cartvel::{
//!     CartesianVelocityController, ControllerConfig, ControllerResult, PoseTwist,
//!     SimulatedIntegration, SimulatedJoints,
//! };
//! use std::time::Duration;
//!
//! fn main() -> ControllerResult<()> {
//!     let config = ControllerConfig::default()
//!         .with_robot_description_path("ur5.urdf")
//!         .with_root_name("base_link")
//!         .with_tip_name("tool0")
//!         .with_publish_rate(50.);
//!     let joints = SimulatedJoints::new(vec![
//!         "shoulder_pan_joint",
//!         "shoulder_lift_joint",
//!         "elbow_joint",
//!         "wrist_1_joint",
//!         "wrist_2_joint",
//!         "wrist_3_joint",
//!     ])
//!     .with_positions(&[0., -1.2, 1.4, -1.6, -1.5, 0.]);
//!     let mut controller = CartesianVelocityController::init(
//!         &config,
//!         joints,
//!         SimulatedIntegration,
//!         |feedback: &PoseTwist| println!("{:?}", feedback.pose.translation.vector),
//!     )?;
//!     controller.starting(Duration::ZERO);
//!     controller.command_cartesian_velocity([0., 0., 0.02, 0., 0., 0.]);
//!     let period = Duration::from_millis(2);
//!     let mut time = Duration::ZERO;
//!     while time < Duration::from_secs(2) {
//!         time += period;
//!         controller.update(time, period)?;
//!         controller.hardware_mut().step(period);
//!     }
//!     controller.stopping(time);
//!     Ok(())
//! }
//! ```
//!
//! All fallible operations return a [`ControllerResult`]. Errors only occur while the
//! controller is brought up. Degenerate inverse kinematics and skipped publications are counted
//! in the [`ControllerStats`] and logged through the [`log`](https://docs.rs/log) facade.

pub mod chain;
pub mod config;
pub mod controller;
pub mod description;
pub mod exception;
pub mod kinematics;
pub mod utils;

#[cfg(test)]
mod fixtures;

pub use chain::{build_chain, build_chain_from_xml, ChainJoint, JointChain, JointLimits};
pub use config::ControllerConfig;
pub use controller::command_writer::{CommandWriter, DirectVelocity, SimulatedIntegration};
pub use controller::control_loop::{
    CartesianCommandHandle, CartesianVelocityController, ControllerState,
};
pub use controller::hardware::{
    JointState, JointStateInterface, PositionJointInterface, SimulatedJoints,
    VelocityJointInterface,
};
pub use controller::messages::{JointTrajectory, JointTrajectoryPoint, PoseTwist, TwistCommand};
pub use controller::sinks::{ChannelSink, FeedbackSink, TrajectorySink};
pub use controller::stats::ControllerStats;
pub use description::RobotDescription;
pub use exception::{ControllerError, ControllerResult};
pub use kinematics::{ChainSolvers, FrameVel, IkStatus, Twist, VelocityKinematics};
pub use utils::*;
