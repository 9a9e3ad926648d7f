#[cfg(feature = "serde")]
use serde::Serialize;

/// Final request counters of a run.
///
/// Only meaningful once every worker has been joined; partial sums observed
/// mid-run are not required to balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Counters {
    pub total: u64,
    pub success: u64,
    pub throttled: u64,
    pub errors: u64,
}

impl Counters {
    /// Every attempt landed in exactly one outcome bucket.
    pub fn is_balanced(&self) -> bool {
        self.total == self.success + self.throttled + self.errors
    }

    /// `errors / total`, zero for an empty run.
    pub fn error_rate(&self) -> f64 {
        ratio(self.errors, self.total)
    }

    /// `throttled / total`, zero for an empty run.
    pub fn throttle_rate(&self) -> f64 {
        ratio(self.throttled, self.total)
    }

    /// `success / total`, zero for an empty run.
    pub fn success_rate(&self) -> f64 {
        ratio(self.success, self.total)
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.
    } else {
        part as f64 / total as f64
    }
}
