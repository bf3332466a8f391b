// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the velocity kinematics capability the controller relies on.
//!
//! The controller only depends on the [`VelocityKinematics`] trait. [`ChainSolvers`] is the
//! implementation used by default, any other solver for a [`JointChain`](`crate::JointChain`)
//! can be plugged in instead.
use nalgebra::{Isometry3, Vector3, Vector6};
use serde::{Deserialize, Serialize};

use crate::utils::{stack_twist, JntArray};

mod solvers;

pub use solvers::ChainSolvers;

/// Linear and angular velocity of a frame.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Twist {
    /// Linear velocity in \[m/s\].
    pub linear: Vector3<f64>,
    /// Angular velocity in \[rad/s\].
    pub angular: Vector3<f64>,
}

impl Twist {
    pub fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Twist { linear, angular }
    }

    pub fn zero() -> Self {
        Twist::new(Vector3::zeros(), Vector3::zeros())
    }

    /// {vx, vy, vz, wx, wy, wz}
    pub fn to_vector(&self) -> Vector6<f64> {
        stack_twist(&self.linear, &self.angular)
    }
}

impl Default for Twist {
    fn default() -> Self {
        Twist::zero()
    }
}

impl From<Vector6<f64>> for Twist {
    fn from(vector: Vector6<f64>) -> Self {
        Twist::new(
            Vector3::new(vector[0], vector[1], vector[2]),
            Vector3::new(vector[3], vector[4], vector[5]),
        )
    }
}

impl From<[f64; 6]> for Twist {
    fn from(array: [f64; 6]) -> Self {
        Twist::from(Vector6::from(array))
    }
}

/// Pose and twist of a frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameVel {
    pub pose: Isometry3<f64>,
    pub twist: Twist,
}

impl Default for FrameVel {
    fn default() -> Self {
        FrameVel {
            pose: Isometry3::identity(),
            twist: Twist::zero(),
        }
    }
}

/// Outcome of an inverse velocity solve.
#[must_use]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IkStatus {
    /// The joint velocities realize the requested twist.
    Ok,
    /// The chain is at or close to a singular configuration. The joint velocities are the best
    /// effort of the solver and still have one entry per joint.
    Degenerate,
}

impl IkStatus {
    pub fn is_degenerate(&self) -> bool {
        *self == IkStatus::Degenerate
    }
}

/// Velocity kinematics of a joint chain.
///
/// All vectors are in chain order, twists and poses refer to the tip of the chain and are
/// expressed in the root frame.
///
/// # Panics
/// Implementations may panic if a joint vector does not have
/// [`num_joints`](`Self::num_joints`) entries. The controller checks this once at
/// initialization.
#[cfg_attr(test, mockall::automock)]
pub trait VelocityKinematics {
    /// Number of joints the solver was built for.
    fn num_joints(&self) -> usize;

    /// Computes the joint velocities `qdot` which move the tip with `twist` at the joint
    /// positions `q`.
    ///
    /// `qdot` must have [`num_joints`](`Self::num_joints`) entries and is overwritten even when
    /// [`IkStatus::Degenerate`] is returned.
    fn inverse_velocity(&mut self, q: &JntArray, twist: &Twist, qdot: &mut JntArray) -> IkStatus;

    /// Computes pose and twist of the tip.
    fn forward_velocity(&mut self, q: &JntArray, qdot: &JntArray) -> FrameVel;

    /// Computes the pose of the tip.
    fn forward_position(&mut self, q: &JntArray) -> Isometry3<f64>;
}
