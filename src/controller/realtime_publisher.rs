// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains a publisher which can be fed from the control thread without ever blocking it.
//!
//! The publisher owns a single message slot. The control thread tries to lock the slot and
//! fills it only if it is free; a background thread hands the message to a
//! [`FeedbackSink`] and frees the slot once the sink returned. At most one message is in flight.
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error};
use parking_lot::{Condvar, Mutex};

use crate::controller::messages::PoseTwist;
use crate::controller::sinks::FeedbackSink;
use crate::exception::{ControllerError, ControllerResult};

struct Slot {
    message: PoseTwist,
    pending: bool,
    shutdown: bool,
}

struct Shared {
    slot: Mutex<Slot>,
    ready: Condvar,
}

/// Non-blocking, single-slot feedback publisher.
pub struct RealtimePublisher {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl RealtimePublisher {
    /// Starts the delivery thread.
    /// # Errors
    /// PublisherError if the thread can not be spawned.
    pub fn new<S: FeedbackSink + Send + 'static>(mut sink: S) -> ControllerResult<Self> {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                message: PoseTwist::default(),
                pending: false,
                shutdown: false,
            }),
            ready: Condvar::new(),
        });
        let thread_shared = shared.clone();
        let thread = thread::Builder::new()
            .name("cartvel-feedback".to_string())
            .spawn(move || deliver(&thread_shared, &mut sink))
            .map_err(|e| ControllerError::PublisherError {
                message: e.to_string(),
            })?;
        Ok(RealtimePublisher {
            shared,
            thread: Some(thread),
        })
    }

    /// Fills the slot with `fill` and hands it to the delivery thread, unless the slot is locked
    /// or still holds a message which was not delivered yet.
    ///
    /// Never blocks. Returns whether the message was accepted.
    pub fn try_publish<F: FnOnce(&mut PoseTwist)>(&self, fill: F) -> bool {
        let mut slot = match self.shared.slot.try_lock() {
            Some(slot) => slot,
            None => return false,
        };
        if slot.pending {
            return false;
        }
        fill(&mut slot.message);
        slot.pending = true;
        drop(slot);
        self.shared.ready.notify_one();
        true
    }

    /// Whether a message is waiting for or in delivery.
    pub fn is_busy(&self) -> bool {
        self.shared.slot.lock().pending
    }
}

fn deliver<S: FeedbackSink>(shared: &Shared, sink: &mut S) {
    loop {
        let message = {
            let mut slot = shared.slot.lock();
            while !slot.pending && !slot.shutdown {
                shared.ready.wait(&mut slot);
            }
            if !slot.pending {
                break;
            }
            slot.message
        };
        sink.publish(&message);
        shared.slot.lock().pending = false;
    }
    debug!("Feedback publisher stopped");
}

impl Drop for RealtimePublisher {
    /// Delivers a pending message and joins the delivery thread.
    fn drop(&mut self) {
        self.shared.slot.lock().shutdown = true;
        self.shared.ready.notify_one();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Feedback sink panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::messages::PoseTwist;
    use crate::controller::realtime_publisher::RealtimePublisher;
    use crate::controller::sinks::MockFeedbackSink;
    use crossbeam_channel as cc;
    use std::time::{Duration, Instant};

    fn wait_until_idle(publisher: &RealtimePublisher) {
        let start = Instant::now();
        while publisher.is_busy() {
            assert!(start.elapsed() < Duration::from_secs(5));
            std::thread::yield_now();
        }
    }

    #[test]
    fn delivers_filled_message() {
        let (tx, rx) = cc::unbounded();
        let publisher = RealtimePublisher::new(move |feedback: &PoseTwist| {
            tx.send(feedback.stamp).unwrap();
        })
        .unwrap();
        assert!(publisher.try_publish(|message| message.stamp = Duration::from_millis(7)));
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            Duration::from_millis(7)
        );
        wait_until_idle(&publisher);
        assert!(publisher.try_publish(|message| message.stamp = Duration::from_millis(8)));
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            Duration::from_millis(8)
        );
    }

    #[test]
    fn busy_while_previous_message_in_flight() {
        let (release_tx, release_rx) = cc::bounded::<()>(0);
        let (done_tx, done_rx) = cc::unbounded();
        let publisher = RealtimePublisher::new(move |feedback: &PoseTwist| {
            release_rx.recv().unwrap();
            done_tx.send(feedback.stamp).unwrap();
        })
        .unwrap();

        assert!(publisher.try_publish(|message| message.stamp = Duration::from_secs(1)));
        let mut filled = false;
        assert!(!publisher.try_publish(|_| filled = true));
        assert!(!filled);
        assert!(publisher.is_busy());

        release_tx.send(()).unwrap();
        assert_eq!(
            done_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            Duration::from_secs(1)
        );
        wait_until_idle(&publisher);
        assert!(!publisher.is_busy());
    }

    #[test]
    fn drop_flushes_pending_message() {
        let mut sink = MockFeedbackSink::new();
        sink.expect_publish()
            .withf(|feedback| feedback.stamp == Duration::from_millis(42))
            .times(1)
            .return_const(());
        let publisher = RealtimePublisher::new(sink).unwrap();
        assert!(publisher.try_publish(|message| message.stamp = Duration::from_millis(42)));
        drop(publisher);
    }
}
