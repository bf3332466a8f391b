// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the configuration of a [`CartesianVelocityController`](`crate::CartesianVelocityController`).
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::exception::{missing_parameter, ControllerError, ControllerResult};
use crate::kinematics::ChainSolvers;

/// Joints addressed by the trajectory command of the
/// [`DirectVelocity`](`crate::DirectVelocity`) writer unless configured otherwise.
pub const DEFAULT_TRAJECTORY_JOINTS: [&str; 6] = [
    "shoulder_pan_joint",
    "shoulder_lift_joint",
    "elbow_joint",
    "wrist_1_joint",
    "wrist_2_joint",
    "wrist_3_joint",
];

/// Everything a controller reads once during initialization.
///
/// Can be loaded from a TOML file:
/// ```toml
/// robot_description_path = "ur5.urdf"
/// root_name = "base_link"
/// tip_name = "tool0"
/// publish_rate = 50.0
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    /// URDF document of the robot.
    pub robot_description: Option<String>,
    /// File to read the URDF document from if `robot_description` is not set.
    pub robot_description_path: Option<PathBuf>,
    /// Root link of the controlled chain.
    pub root_name: Option<String>,
    /// Tip link of the controlled chain.
    pub tip_name: Option<String>,
    /// Rate of the feedback publication in \[Hz\]. A non-positive rate disables publishing.
    pub publish_rate: Option<f64>,
    /// Joint names of the trajectory command emitted by the
    /// [`DirectVelocity`](`crate::DirectVelocity`) writer.
    pub trajectory_joints: Vec<String>,
    /// Frame id of the trajectory command.
    pub trajectory_frame_id: String,
    /// Time from start of the single trajectory point in \[s\]. Must not be negative.
    pub trajectory_time_from_start: f64,
    /// Singular values of the Jacobian below this threshold count as zero.
    pub pinv_epsilon: f64,
    /// Iteration bound of the SVD of the Jacobian.
    pub pinv_max_iterations: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            robot_description: None,
            robot_description_path: None,
            root_name: None,
            tip_name: None,
            publish_rate: None,
            trajectory_joints: DEFAULT_TRAJECTORY_JOINTS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            trajectory_frame_id: "base_link".to_string(),
            trajectory_time_from_start: 1.,
            pinv_epsilon: ChainSolvers::DEFAULT_EPSILON,
            pinv_max_iterations: ChainSolvers::DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ControllerConfig {
    /// Parses a configuration from a TOML string.
    /// # Errors
    /// ConfigError if the string is not a valid configuration.
    pub fn from_toml_str(toml_str: &str) -> ControllerResult<Self> {
        toml::from_str(toml_str).map_err(|e| ControllerError::ConfigError {
            message: format!("Cannot read the configuration: {}", e),
        })
    }

    /// Loads a configuration file.
    ///
    /// A relative `robot_description_path` inside the file is resolved relative to the
    /// directory of the configuration file.
    /// # Errors
    /// ConfigError if the file can not be read or is not a valid configuration.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ControllerResult<Self> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|e| ControllerError::ConfigError {
            message: format!("Cannot load the configuration file {:?}: {}", path, e),
        })?;
        let mut config = ControllerConfig::from_toml_str(&content)?;
        if let (Some(description_path), Some(dir)) =
            (config.robot_description_path.as_mut(), path.parent())
        {
            if description_path.is_relative() {
                *description_path = dir.join(&*description_path);
            }
        }
        Ok(config)
    }

    pub fn with_robot_description<S: Into<String>>(mut self, robot_description: S) -> Self {
        self.robot_description = Some(robot_description.into());
        self
    }

    pub fn with_robot_description_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.robot_description_path = Some(path.into());
        self
    }

    pub fn with_root_name<S: Into<String>>(mut self, root_name: S) -> Self {
        self.root_name = Some(root_name.into());
        self
    }

    pub fn with_tip_name<S: Into<String>>(mut self, tip_name: S) -> Self {
        self.tip_name = Some(tip_name.into());
        self
    }

    pub fn with_publish_rate(mut self, publish_rate: f64) -> Self {
        self.publish_rate = Some(publish_rate);
        self
    }

    pub fn with_trajectory_joints<S: Into<String>, I: IntoIterator<Item = S>>(
        mut self,
        joints: I,
    ) -> Self {
        self.trajectory_joints = joints.into_iter().map(Into::into).collect();
        self
    }

    /// The URDF document, either given inline or read from `robot_description_path`.
    /// # Errors
    /// * MissingParameter if neither is set or the document is empty.
    /// * ConfigError if the file can not be read.
    pub fn resolve_robot_description(&self) -> ControllerResult<String> {
        let description = match (&self.robot_description, &self.robot_description_path) {
            (Some(description), _) => description.clone(),
            (None, Some(path)) => read_to_string(path).map_err(|e| ControllerError::ConfigError {
                message: format!("Cannot load the robot description {:?}: {}", path, e),
            })?,
            (None, None) => return Err(missing_parameter("robot_description")),
        };
        if description.trim().is_empty() {
            return Err(missing_parameter("robot_description"));
        }
        Ok(description)
    }

    /// Root and tip link names.
    /// # Errors
    /// MissingParameter if one of them is not set or empty.
    pub fn link_names(&self) -> ControllerResult<(&str, &str)> {
        let root = non_empty(&self.root_name).ok_or_else(|| missing_parameter("root_name"))?;
        let tip = non_empty(&self.tip_name).ok_or_else(|| missing_parameter("tip_name"))?;
        Ok((root, tip))
    }

    /// The publish rate.
    /// # Errors
    /// MissingParameter if it is not set.
    pub fn publish_rate(&self) -> ControllerResult<f64> {
        self.publish_rate
            .ok_or_else(|| missing_parameter("publish_rate"))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use crate::config::{ControllerConfig, DEFAULT_TRAJECTORY_JOINTS};
    use crate::exception::ControllerError;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.trajectory_joints, DEFAULT_TRAJECTORY_JOINTS);
        assert_eq!(config.trajectory_frame_id, "base_link");
        assert_eq!(config.trajectory_time_from_start, 1.);
        assert!(config.publish_rate.is_none());
    }

    #[test]
    fn from_toml() {
        let config = ControllerConfig::from_toml_str(
            r#"
            robot_description = "<robot name='r'/>"
            root_name = "base_link"
            tip_name = "tool0"
            publish_rate = 25.0
            trajectory_joints = ["a", "b"]
            "#,
        )
        .unwrap();
        assert_eq!(config.link_names().unwrap(), ("base_link", "tool0"));
        assert_eq!(config.publish_rate().unwrap(), 25.);
        assert_eq!(config.trajectory_joints, vec!["a", "b"]);
        assert_eq!(config.trajectory_frame_id, "base_link");
    }

    #[test]
    fn invalid_toml_is_config_error() {
        assert!(matches!(
            ControllerConfig::from_toml_str("publish_rate = \"fast\""),
            Err(ControllerError::ConfigError { .. })
        ));
    }

    #[test]
    fn missing_parameters() {
        let config = ControllerConfig::default();
        assert!(matches!(
            config.resolve_robot_description(),
            Err(ControllerError::MissingParameter { name }) if name == "robot_description"
        ));
        assert!(matches!(
            config.link_names(),
            Err(ControllerError::MissingParameter { name }) if name == "root_name"
        ));
        assert!(matches!(
            config.clone().with_root_name("base").link_names(),
            Err(ControllerError::MissingParameter { name }) if name == "tip_name"
        ));
        assert!(matches!(
            config.clone().with_root_name("").with_tip_name("tool0").link_names(),
            Err(ControllerError::MissingParameter { name }) if name == "root_name"
        ));
        assert!(matches!(
            config.publish_rate(),
            Err(ControllerError::MissingParameter { name }) if name == "publish_rate"
        ));
        assert!(matches!(
            config.with_robot_description(" ").resolve_robot_description(),
            Err(ControllerError::MissingParameter { .. })
        ));
    }

    #[test]
    fn description_from_file_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut urdf = std::fs::File::create(dir.path().join("robot.urdf")).unwrap();
        urdf.write_all(b"<robot name=\"r\"><link name=\"a\"/></robot>")
            .unwrap();
        let config_path = dir.path().join("controller.toml");
        std::fs::write(
            &config_path,
            "robot_description_path = \"robot.urdf\"\nroot_name = \"a\"\ntip_name = \"a\"\n",
        )
        .unwrap();

        let config = ControllerConfig::from_file(&config_path).unwrap();
        assert_eq!(
            config.robot_description_path.as_deref(),
            Some(dir.path().join("robot.urdf").as_path())
        );
        assert!(config
            .resolve_robot_description()
            .unwrap()
            .contains("<link name=\"a\"/>"));
    }

    #[test]
    fn unreadable_file_is_config_error() {
        assert!(matches!(
            ControllerConfig::from_file("/nonexistent/controller.toml"),
            Err(ControllerError::ConfigError { .. })
        ));
    }
}
