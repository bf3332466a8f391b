// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use serde::Serialize;

/// Counters of the control cycles since the controller was initialized.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ControllerStats {
    /// Completed `update` calls.
    pub cycles: u64,
    /// Cycles in which the inverse velocity solve was degenerate.
    pub degenerate_solutions: u64,
    /// Feedback messages handed to the publisher.
    pub publishes: u64,
    /// Due publications skipped because the previous one was still in flight.
    pub publish_skipped: u64,
}

impl ControllerStats {
    /// Share of the cycles with a degenerate solve.
    pub fn degenerate_ratio(&self) -> f64 {
        if self.cycles == 0 {
            0.
        } else {
            self.degenerate_solutions as f64 / self.cycles as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::stats::ControllerStats;

    #[test]
    fn degenerate_ratio() {
        assert_eq!(ControllerStats::default().degenerate_ratio(), 0.);
        let stats = ControllerStats {
            cycles: 8,
            degenerate_solutions: 2,
            ..Default::default()
        };
        assert_eq!(stats.degenerate_ratio(), 0.25);
    }
}
