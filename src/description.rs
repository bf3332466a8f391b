// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the robot description tree.
//!
//! The XML itself is parsed by `urdf-rs`. This module only turns the flat list of links and
//! joints into a tree in which every link knows the joint connecting it to its parent.
use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};
use nalgebra::{Isometry3, Unit, Vector3};

use crate::exception::{missing_parameter, ControllerError, ControllerResult};
use crate::utils::origin_to_isometry;

/// Kinematic type of a joint in the description.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JointKind {
    Revolute,
    /// Revolute joint without position limits.
    Continuous,
    Prismatic,
    /// Joints which do not move. Floating, planar and spherical joints of the description are
    /// mapped to this kind as they can not be part of a serial velocity chain.
    Fixed,
}

impl JointKind {
    /// Whether the joint contributes a degree of freedom to a chain.
    pub fn is_actuated(&self) -> bool {
        !matches!(self, JointKind::Fixed)
    }
}

/// Position limits as declared in the description.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PositionLimits {
    /// Lower limit in \[rad\] or \[m\].
    pub lower: f64,
    /// Upper limit in \[rad\] or \[m\].
    pub upper: f64,
}

/// A joint of the description tree.
#[derive(Debug, Clone)]
pub struct DescriptionJoint {
    pub name: String,
    pub kind: JointKind,
    /// Name of the parent link.
    pub parent: String,
    /// Name of the child link.
    pub child: String,
    /// Transform from the parent link frame to the joint frame.
    pub origin: Isometry3<f64>,
    /// Joint axis in the joint frame.
    pub axis: Unit<Vector3<f64>>,
    /// Declared position limits, `None` if the joint declares none.
    pub limits: Option<PositionLimits>,
}

/// Tree representation of a robot description.
///
/// Links are the segments of the tree, joints connect a parent segment to a child segment.
#[derive(Debug, Clone)]
pub struct RobotDescription {
    name: String,
    root_link: String,
    links: BTreeSet<String>,
    joints: BTreeMap<String, DescriptionJoint>,
    /// child link name -> name of the joint connecting it to its parent
    parent_joints: BTreeMap<String, String>,
}

impl RobotDescription {
    /// Parses an URDF document and builds the tree.
    ///
    /// # Errors
    /// * MissingParameter if the document is empty.
    /// * ParseError if the document is not a valid URDF or does not describe a single tree.
    pub fn from_xml(xml: &str) -> ControllerResult<Self> {
        if xml.trim().is_empty() {
            return Err(missing_parameter("robot_description"));
        }
        let robot = urdf_rs::read_from_string(xml).map_err(|e| ControllerError::ParseError {
            message: e.to_string(),
        })?;
        let description = RobotDescription::from_robot(&robot)?;
        info!("Successfully parsed urdf of robot '{}'", description.name);
        Ok(description)
    }

    /// Builds the tree from an already parsed URDF robot.
    ///
    /// # Errors
    /// ParseError if a joint references an unknown link, a link has more than one parent or
    /// the description has not exactly one root link.
    pub fn from_robot(robot: &urdf_rs::Robot) -> ControllerResult<Self> {
        let links: BTreeSet<String> = robot.links.iter().map(|l| l.name.clone()).collect();
        let mut joints = BTreeMap::new();
        let mut parent_joints = BTreeMap::new();

        for joint in &robot.joints {
            for link in [&joint.parent.link, &joint.child.link] {
                if !links.contains(link) {
                    return Err(parse_error(format!(
                        "joint '{}' references unknown link '{}'",
                        joint.name, link
                    )));
                }
            }
            if let Some(other) = parent_joints.insert(joint.child.link.clone(), joint.name.clone())
            {
                return Err(parse_error(format!(
                    "link '{}' is the child of both '{}' and '{}'",
                    joint.child.link, other, joint.name
                )));
            }
            let converted = convert_joint(joint)?;
            if joints.insert(joint.name.clone(), converted).is_some() {
                return Err(parse_error(format!("joint '{}' is declared twice", joint.name)));
            }
        }

        let mut roots = links.iter().filter(|l| !parent_joints.contains_key(*l));
        let root_link = match (roots.next(), roots.next()) {
            (Some(root), None) => root.clone(),
            (None, _) => return Err(parse_error("no root link found".to_string())),
            (Some(first), Some(second)) => {
                return Err(parse_error(format!(
                    "found more than one root link ('{}' and '{}')",
                    first, second
                )))
            }
        };

        Ok(RobotDescription {
            name: robot.name.clone(),
            root_link,
            links,
            joints,
            parent_joints,
        })
    }

    /// Name of the robot.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the root link of the tree.
    pub fn root_link(&self) -> &str {
        &self.root_link
    }

    /// Whether the tree contains a link of the given name.
    pub fn has_link(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    /// Names of all segments (links) in the tree, sorted.
    pub fn segment_names(&self) -> Vec<String> {
        self.links.iter().cloned().collect()
    }

    /// Number of segments in the tree.
    pub fn num_segments(&self) -> usize {
        self.links.len()
    }

    /// Number of actuated joints in the tree.
    pub fn num_joints(&self) -> usize {
        self.joints.values().filter(|j| j.kind.is_actuated()).count()
    }

    /// Looks up a joint by name.
    pub fn joint(&self, name: &str) -> Option<&DescriptionJoint> {
        self.joints.get(name)
    }

    /// The joint connecting `link` to its parent link, `None` for the root link or unknown links.
    pub fn parent_joint(&self, link: &str) -> Option<&DescriptionJoint> {
        self.parent_joints
            .get(link)
            .and_then(|joint| self.joints.get(joint))
    }
}

fn parse_error(message: String) -> ControllerError {
    ControllerError::ParseError { message }
}

fn convert_joint(joint: &urdf_rs::Joint) -> ControllerResult<DescriptionJoint> {
    let kind = match joint.joint_type {
        urdf_rs::JointType::Revolute => JointKind::Revolute,
        urdf_rs::JointType::Continuous => JointKind::Continuous,
        urdf_rs::JointType::Prismatic => JointKind::Prismatic,
        urdf_rs::JointType::Fixed => JointKind::Fixed,
        ref other => {
            warn!(
                "Converting unknown joint type {:?} of joint '{}' into a fixed joint",
                other, joint.name
            );
            JointKind::Fixed
        }
    };
    let xyz = [joint.origin.xyz[0], joint.origin.xyz[1], joint.origin.xyz[2]];
    let rpy = [joint.origin.rpy[0], joint.origin.rpy[1], joint.origin.rpy[2]];
    let axis = Vector3::new(joint.axis.xyz[0], joint.axis.xyz[1], joint.axis.xyz[2]);
    let axis = Unit::try_new(axis, f64::EPSILON).ok_or_else(|| {
        parse_error(format!("joint '{}' has a zero-length axis", joint.name))
    })?;
    // urdf-rs fills lower = upper = 0 when no <limit> element is present
    let limits = match kind {
        JointKind::Revolute | JointKind::Prismatic
            if joint.limit.lower != 0. || joint.limit.upper != 0. =>
        {
            Some(PositionLimits {
                lower: joint.limit.lower,
                upper: joint.limit.upper,
            })
        }
        _ => None,
    };
    Ok(DescriptionJoint {
        name: joint.name.clone(),
        kind,
        parent: joint.parent.link.clone(),
        child: joint.child.link.clone(),
        origin: origin_to_isometry(&xyz, &rpy),
        axis,
        limits,
    })
}
