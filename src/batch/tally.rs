//! Reduction of per-part outcomes into one job outcome.

use tracing::warn;

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every part succeeded.
    Success,
    /// At least one part failed.
    Failure,
}

/// Running count of terminal parts.
///
/// [`Tally::record`] yields the job outcome exactly once: on the call that
/// makes the tally cover every part. Repeated or out-of-range indices are
/// ignored so a misbehaving part can neither double-count nor double-fire.
#[derive(Debug)]
pub struct Tally {
    reported: Vec<bool>,
    succeeded: usize,
    failed: usize,
    fired: bool,
}

impl Tally {
    /// Create a tally for `total` parts.
    pub fn new(total: usize) -> Self {
        Self {
            reported: vec![false; total],
            succeeded: 0,
            failed: 0,
            fired: false,
        }
    }

    /// Number of parts.
    pub fn total(&self) -> usize {
        self.reported.len()
    }

    /// Parts that succeeded so far.
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Parts that failed so far.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Return `true` once every part reported.
    pub fn is_complete(&self) -> bool {
        self.succeeded + self.failed == self.total()
    }

    /// Return `true` if the part already reported its outcome.
    pub fn is_reported(&self, index: usize) -> bool {
        self.reported.get(index).copied().unwrap_or(false)
    }

    /// Indices that have not reported yet.
    pub fn pending(&self) -> Vec<usize> {
        self.reported
            .iter()
            .enumerate()
            .filter(|(_, reported)| !**reported)
            .map(|(index, _)| index)
            .collect()
    }

    /// Record the terminal outcome of a part.
    ///
    /// Returns the job outcome when this call completes the tally.
    pub fn record(&mut self, index: usize, succeeded: bool) -> Option<BatchOutcome> {
        match self.reported.get_mut(index) {
            Some(reported) if !*reported => *reported = true,
            Some(_) => {
                warn!("Ignoring duplicate outcome for part {}", index);
                return None;
            }
            None => {
                warn!("Ignoring outcome for unknown part {}", index);
                return None;
            }
        }

        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }

        self.check()
    }

    /// Yield the job outcome if the tally is complete and has not fired yet.
    ///
    /// An empty tally completes on the first check.
    pub fn check(&mut self) -> Option<BatchOutcome> {
        if self.fired || !self.is_complete() {
            return None;
        }
        self.fired = true;
        if self.failed == 0 {
            Some(BatchOutcome::Success)
        } else {
            Some(BatchOutcome::Failure)
        }
    }
}
