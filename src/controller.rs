// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the [`CartesianVelocityController`](`control_loop::CartesianVelocityController`)
//! and everything it talks to: hardware, command writers, sinks and the feedback publisher.

pub mod command_writer;
pub mod control_loop;
pub mod hardware;
pub mod messages;
pub mod rate_limiting;
pub mod realtime_publisher;
pub mod sinks;
pub mod stats;
