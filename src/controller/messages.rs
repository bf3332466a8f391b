// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the messages the controller receives and emits.
use std::time::Duration;

use nalgebra::{Isometry3, Vector3};
use serde::{Deserialize, Serialize};

use crate::kinematics::Twist;

/// Desired twist of the tip as received from a command source.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Default)]
pub struct TwistCommand {
    /// {x, y, z} in \[m/s\]
    pub linear: [f64; 3],
    /// {x, y, z} in \[rad/s\]
    pub angular: [f64; 3],
}

impl From<TwistCommand> for Twist {
    fn from(command: TwistCommand) -> Self {
        Twist::new(
            Vector3::from(command.linear),
            Vector3::from(command.angular),
        )
    }
}

impl From<Twist> for TwistCommand {
    fn from(twist: Twist) -> Self {
        TwistCommand {
            linear: twist.linear.into(),
            angular: twist.angular.into(),
        }
    }
}

/// Pose and twist of the tip, stamped with the control cycle time they were computed at.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct PoseTwist {
    pub stamp: Duration,
    pub pose: Isometry3<f64>,
    pub twist: Twist,
}

impl Default for PoseTwist {
    fn default() -> Self {
        PoseTwist {
            stamp: Duration::ZERO,
            pose: Isometry3::identity(),
            twist: Twist::zero(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct JointTrajectoryPoint {
    /// Left empty when only velocities are commanded.
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
    pub time_from_start: Duration,
}

/// Trajectory command for a set of named joints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct JointTrajectory {
    pub frame_id: String,
    pub joint_names: Vec<String>,
    pub points: Vec<JointTrajectoryPoint>,
}
