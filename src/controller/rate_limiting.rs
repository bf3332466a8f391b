// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the throttle which limits the rate of the feedback publication.
use std::time::Duration;

use crate::utils::period_from_rate;

/// Decides in which control cycles feedback is published.
///
/// A publication is due once `time >= last_publish + 1/rate`. After a successful publication
/// `last_publish` advances by exactly one period, not to the current time, so the cadence stays
/// fixed independent of the jitter of the control cycle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PublishThrottle {
    period: Option<Duration>,
    last_publish: Duration,
}

impl PublishThrottle {
    /// Creates a throttle for `publish_rate` in \[Hz\]. A non-positive rate disables publishing.
    pub fn new(publish_rate: f64) -> Self {
        PublishThrottle {
            period: period_from_rate(publish_rate),
            last_publish: Duration::ZERO,
        }
    }

    /// None if publishing is disabled.
    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn last_publish(&self) -> Duration {
        self.last_publish
    }

    /// Measures the cadence from `time`.
    pub fn reset(&mut self, time: Duration) {
        self.last_publish = time;
    }

    pub fn is_due(&self, time: Duration) -> bool {
        match self.period {
            Some(period) => match self.last_publish.checked_add(period) {
                Some(next) => time >= next,
                None => false,
            },
            None => false,
        }
    }

    /// Records a successful publication.
    pub fn advance(&mut self) {
        if let Some(period) = self.period {
            self.last_publish = self.last_publish.saturating_add(period);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::rate_limiting::PublishThrottle;
    use std::time::Duration;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn disabled_for_non_positive_rates() {
        for rate in [0., -5., f64::NAN] {
            let throttle = PublishThrottle::new(rate);
            assert!(throttle.period().is_none());
            assert!(!throttle.is_due(ms(1_000_000)));
        }
    }

    #[test]
    fn huge_period_is_never_due() {
        let mut throttle = PublishThrottle::new(1e-12);
        assert!(throttle.period().is_some());
        throttle.reset(ms(500));
        assert!(!throttle.is_due(Duration::from_secs(1_000_000)));
        // next publication beyond the range of Duration
        throttle.reset(Duration::MAX);
        assert!(!throttle.is_due(Duration::MAX));
        throttle.advance();
        assert_eq!(throttle.last_publish(), Duration::MAX);
        assert!(!PublishThrottle::new(1e-20).is_due(Duration::MAX));
    }

    #[test]
    fn due_at_exactly_one_period() {
        let mut throttle = PublishThrottle::new(10.);
        throttle.reset(ms(500));
        assert!(!throttle.is_due(ms(599)));
        assert!(throttle.is_due(ms(600)));
    }

    #[test]
    fn advance_keeps_fixed_cadence() {
        let mut throttle = PublishThrottle::new(10.);
        throttle.reset(ms(0));
        // late check: still advances by one period only
        assert!(throttle.is_due(ms(130)));
        throttle.advance();
        assert_eq!(throttle.last_publish(), ms(100));
        assert!(!throttle.is_due(ms(199)));
        assert!(throttle.is_due(ms(200)));
    }

    #[test]
    fn catches_up_after_a_gap() {
        let mut throttle = PublishThrottle::new(100.);
        throttle.reset(ms(0));
        let mut published = 0;
        // one check after a 35ms gap, then every 1ms
        for time in std::iter::once(35).chain(36..=40) {
            if throttle.is_due(ms(time)) {
                throttle.advance();
                published += 1;
            }
        }
        assert_eq!(published, 4);
        assert_eq!(throttle.last_publish(), ms(40));
    }
}
