// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the outputs of the controller other than the hardware.
use crossbeam_channel as cc;
use log::debug;

use crate::controller::messages::{JointTrajectory, PoseTwist};

/// Receives the rate limited feedback of the controller.
///
/// Called on the delivery thread of the
/// [`RealtimePublisher`](`crate::controller::realtime_publisher::RealtimePublisher`), never on
/// the control thread, so it may block.
#[cfg_attr(test, mockall::automock)]
pub trait FeedbackSink {
    fn publish(&mut self, feedback: &PoseTwist);
}

/// Receives the trajectory command of the [`DirectVelocity`](`crate::DirectVelocity`) writer.
///
/// Called on the control thread in every cycle and must not block.
#[cfg_attr(test, mockall::automock)]
pub trait TrajectorySink {
    /// Returns false if the trajectory was dropped.
    fn send(&mut self, trajectory: &JointTrajectory) -> bool;
}

impl<F: FnMut(&PoseTwist)> FeedbackSink for F {
    fn publish(&mut self, feedback: &PoseTwist) {
        self(feedback)
    }
}

impl<F: FnMut(&JointTrajectory)> TrajectorySink for F {
    fn send(&mut self, trajectory: &JointTrajectory) -> bool {
        self(trajectory);
        true
    }
}

/// Forwards messages into a crossbeam channel.
///
/// Feedback is sent blocking, trajectories with `try_send` and dropped when the channel is full.
#[derive(Debug, Clone)]
pub struct ChannelSink<T> {
    sender: cc::Sender<T>,
}

impl<T> ChannelSink<T> {
    pub fn new(sender: cc::Sender<T>) -> Self {
        ChannelSink { sender }
    }
}

impl FeedbackSink for ChannelSink<PoseTwist> {
    fn publish(&mut self, feedback: &PoseTwist) {
        if self.sender.send(*feedback).is_err() {
            debug!("Feedback receiver disconnected");
        }
    }
}

impl TrajectorySink for ChannelSink<JointTrajectory> {
    fn send(&mut self, trajectory: &JointTrajectory) -> bool {
        // dropped when full or disconnected
        self.sender.try_send(trajectory.clone()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::messages::{JointTrajectory, PoseTwist};
    use crate::controller::sinks::{ChannelSink, FeedbackSink, TrajectorySink};
    use crossbeam_channel as cc;
    use std::time::Duration;

    #[test]
    fn closures_are_sinks() {
        let mut stamps = Vec::new();
        {
            let mut sink = |feedback: &PoseTwist| stamps.push(feedback.stamp);
            sink.publish(&PoseTwist {
                stamp: Duration::from_millis(3),
                ..Default::default()
            });
        }
        assert_eq!(stamps, vec![Duration::from_millis(3)]);
    }

    #[test]
    fn trajectory_channel_drops_on_full() {
        let (tx, rx) = cc::bounded::<JointTrajectory>(1);
        let mut sink = ChannelSink::new(tx);
        let trajectory = JointTrajectory {
            frame_id: "base_link".to_string(),
            ..Default::default()
        };
        assert!(sink.send(&trajectory));
        assert!(!sink.send(&trajectory));
        assert_eq!(rx.try_recv().unwrap(), trajectory);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn feedback_channel_survives_disconnect() {
        let (tx, rx) = cc::unbounded::<PoseTwist>();
        let mut sink = ChannelSink::new(tx);
        drop(rx);
        sink.publish(&PoseTwist::default());
    }
}
