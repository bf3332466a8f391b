// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains error and Result definitions
use thiserror::Error;

/// Represents all kind of errors which can abort the bring-up of a controller or reject a call
/// into it.
///
/// Runtime conditions of the control cycle (degenerate inverse kinematics, skipped publishes)
/// are not errors. They are reported through [`IkStatus`](`crate::IkStatus`) and
/// [`ControllerStats`](`crate::ControllerStats`).
#[derive(Error, Debug)]
pub enum ControllerError {
    /// A required parameter was not supplied or is empty.
    #[error("Parameter '{name}' not set")]
    MissingParameter {
        /// Name of the missing parameter.
        name: String,
    },

    /// A parameter was supplied but its value can not be used.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: String,
        /// Explanatory string.
        message: String,
    },

    /// The robot description could not be parsed into a tree.
    #[error("Failed to parse robot description: {message}")]
    ParseError { message: String },

    /// No chain exists between the requested root and tip links.
    ///
    /// Holds the names of all segments of the tree so the operator can see which links the
    /// description actually contains.
    #[error(
        "Failed to get chain from tree: {root} --> {tip}. Tree has {joints_in_tree} joints and {} segments: [{}]",
        .segments.len(),
        .segments.join(", ")
    )]
    ChainExtractionError {
        /// Requested root link.
        root: String,
        /// Requested tip link.
        tip: String,
        /// Number of joints in the tree.
        joints_in_tree: usize,
        /// Names of all segments in the tree, sorted.
        segments: Vec<String>,
    },

    /// The hardware interface does not expose a joint of the chain.
    #[error("Hardware interface has no handle for joint '{joint}'")]
    MissingJointHandle { joint: String },

    /// The configuration file could not be loaded.
    #[error("{message}")]
    ConfigError { message: String },

    /// The delivery thread of the feedback publisher could not be started.
    #[error("Failed to start the feedback publisher: {message}")]
    PublisherError { message: String },

    /// A call was made in a controller state which does not allow it.
    #[error("{message}")]
    InvalidState { message: String },
}

/// creates a MissingParameter error from a parameter name
pub(crate) fn missing_parameter(name: &str) -> ControllerError {
    ControllerError::MissingParameter {
        name: name.to_string(),
    }
}

/// Result type which can have ControllerError as Error
pub type ControllerResult<T> = Result<T, ControllerError>;
