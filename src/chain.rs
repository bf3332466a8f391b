// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the joint chain between two links of a robot description and the builder which
//! extracts it together with the position limits of its joints.
use log::{error, info};
use nalgebra::{Isometry3, Unit, Vector3};

use crate::description::{JointKind, PositionLimits, RobotDescription};
use crate::exception::{missing_parameter, ControllerError, ControllerResult};
use crate::utils::JntArray;

/// An actuated joint of a [`JointChain`].
#[derive(Debug, Clone)]
pub struct ChainJoint {
    pub name: String,
    /// Whether the joint translates along its axis instead of rotating about it.
    pub prismatic: bool,
    /// Transform from the previous joint's child frame to this joint frame. Fixed joints in
    /// between are folded into it.
    pub origin: Isometry3<f64>,
    /// Joint axis in the joint frame.
    pub axis: Unit<Vector3<f64>>,
}

/// Ordered sequence of the actuated joints between a root and a tip link, root first.
#[derive(Debug, Clone)]
pub struct JointChain {
    root: String,
    tip: String,
    joints: Vec<ChainJoint>,
    /// Names of the links passed from root to tip, excluding the root itself.
    segments: Vec<String>,
    /// Transform from the child frame of the last joint to the tip link.
    tip_offset: Isometry3<f64>,
}

impl JointChain {
    /// Name of the root link.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Name of the tip link.
    pub fn tip(&self) -> &str {
        &self.tip
    }

    /// Number of actuated joints.
    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    /// Number of links passed from root to tip, fixed ones included.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn joints(&self) -> &[ChainJoint] {
        &self.joints
    }

    /// Joint names in chain order.
    pub fn joint_names(&self) -> Vec<&str> {
        self.joints.iter().map(|j| j.name.as_str()).collect()
    }

    pub fn segment_names(&self) -> &[String] {
        &self.segments
    }

    pub fn tip_offset(&self) -> &Isometry3<f64> {
        &self.tip_offset
    }
}

/// Position limits of the joints of a [`JointChain`], index-aligned with the chain.
///
/// A joint without declared limits has all three entries set to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct JointLimits {
    pub min: JntArray,
    pub max: JntArray,
    /// (min + max) / 2
    pub center: JntArray,
}

impl JointLimits {
    /// Creates limits for `num_joints` joints with all entries zero.
    pub fn zeros(num_joints: usize) -> Self {
        JointLimits {
            min: JntArray::zeros(num_joints),
            max: JntArray::zeros(num_joints),
            center: JntArray::zeros(num_joints),
        }
    }

    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    /// Writes the limits of one joint. `None` writes zeros.
    pub fn set(&mut self, index: usize, limits: Option<PositionLimits>) {
        match limits {
            Some(limits) => {
                self.min[index] = limits.lower;
                self.max[index] = limits.upper;
                self.center[index] = (limits.lower + limits.upper) / 2.;
            }
            None => {
                self.min[index] = 0.;
                self.max[index] = 0.;
                self.center[index] = 0.;
            }
        }
    }
}

/// Slot of the limits arrays for the `visited`-th (0-based) joint found while walking a chain of
/// `num_joints` joints from the tip towards the root.
pub(crate) fn limits_index_from_tip(num_joints: usize, visited: usize) -> usize {
    num_joints - 1 - visited
}

/// Parses an URDF document and extracts the chain from `root` to `tip`.
///
/// See [`build_chain`].
/// # Errors
/// * MissingParameter if the description, `root` or `tip` is empty.
/// * ParseError if the description can not be parsed into a tree.
/// * ChainExtractionError if there is no chain from `root` to `tip`.
pub fn build_chain_from_xml(
    robot_description: &str,
    root: &str,
    tip: &str,
) -> ControllerResult<(JointChain, JointLimits)> {
    check_link_names(root, tip)?;
    let description = RobotDescription::from_xml(robot_description)?;
    build_chain(&description, root, tip)
}

/// Extracts the chain of joints from `root` to `tip` and the position limits of its joints.
///
/// `root` has to be an ancestor of `tip`. The limits are read by walking from `tip` towards
/// `root`, the i-th actuated joint visited lands in slot `N-1-i`, so slot 0 belongs to the
/// root-most joint.
/// # Errors
/// * MissingParameter if `root` or `tip` is empty.
/// * ChainExtractionError if there is no chain from `root` to `tip`. The error carries the
///   names of all segments of the tree.
pub fn build_chain(
    description: &RobotDescription,
    root: &str,
    tip: &str,
) -> ControllerResult<(JointChain, JointLimits)> {
    check_link_names(root, tip)?;
    let chain = match extract_chain(description, root, tip) {
        Some(chain) => chain,
        None => {
            let segments = description.segment_names();
            error!("Failed to get chain from tree: {} --> {}", root, tip);
            error!("  Tree has {} joints", description.num_joints());
            error!("  Tree has {} segments", segments.len());
            error!("  The segments are:");
            for segment in &segments {
                error!("    {}", segment);
            }
            return Err(ControllerError::ChainExtractionError {
                root: root.to_string(),
                tip: tip.to_string(),
                joints_in_tree: description.num_joints(),
                segments,
            });
        }
    };

    info!("tip_name:  {}", tip);
    info!("root_name: {}", root);
    info!("Number of segments: {}", chain.num_segments());
    info!("Number of joints in chain: {}", chain.num_joints());
    for (i, segment) in chain.segment_names().iter().enumerate() {
        info!("segment({}): {}", i, segment);
    }

    let limits = extract_limits(description, tip, chain.num_joints());
    Ok((chain, limits))
}

fn check_link_names(root: &str, tip: &str) -> ControllerResult<()> {
    if root.is_empty() {
        return Err(missing_parameter("root_name"));
    }
    if tip.is_empty() {
        return Err(missing_parameter("tip_name"));
    }
    Ok(())
}

/// Walks up from `tip` until `root` is reached, then assembles the chain in root-to-tip order.
fn extract_chain(description: &RobotDescription, root: &str, tip: &str) -> Option<JointChain> {
    if !description.has_link(root) || !description.has_link(tip) {
        return None;
    }
    let mut path = Vec::new();
    let mut link = tip;
    while link != root {
        let joint = description.parent_joint(link)?;
        path.push(joint);
        link = &joint.parent;
    }
    path.reverse();

    let mut joints = Vec::new();
    let mut segments = Vec::with_capacity(path.len());
    let mut accumulated_fixed = Isometry3::identity();
    for joint in path {
        segments.push(joint.child.clone());
        if joint.kind.is_actuated() {
            joints.push(ChainJoint {
                name: joint.name.clone(),
                prismatic: joint.kind == JointKind::Prismatic,
                origin: accumulated_fixed * joint.origin,
                axis: joint.axis,
            });
            accumulated_fixed = Isometry3::identity();
        } else {
            accumulated_fixed *= joint.origin;
        }
    }
    Some(JointChain {
        root: root.to_string(),
        tip: tip.to_string(),
        joints,
        segments,
        tip_offset: accumulated_fixed,
    })
}

/// Reads the limits of `num_joints` actuated joints, walking parent links from `tip`.
///
/// Stops after `num_joints` joints or when the root of the tree is reached.
fn extract_limits(description: &RobotDescription, tip: &str, num_joints: usize) -> JointLimits {
    let mut limits = JointLimits::zeros(num_joints);
    let mut visited = 0;
    let mut link = tip;
    while visited < num_joints {
        let joint = match description.parent_joint(link) {
            Some(joint) => joint,
            None => break,
        };
        link = &joint.parent;
        if !joint.kind.is_actuated() {
            continue;
        }
        info!("Getting limits for joint: {}", joint.name);
        if joint.limits.is_none() {
            info!("joint {} declares no limits", joint.name);
        }
        limits.set(limits_index_from_tip(num_joints, visited), joint.limits);
        visited += 1;
    }
    limits
}
