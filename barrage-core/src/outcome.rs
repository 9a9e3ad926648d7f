#[cfg(feature = "serde")]
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Classification of a single request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Outcome {
    /// The issuer considered the request successful. Its latency is sampled.
    Success,
    /// The target signalled overload (429/503, `RESOURCE_EXHAUSTED`, a full
    /// producer queue).
    Throttled,
    /// Transport failure, timeout, or any status that is neither success nor
    /// overload.
    Error,
}

impl Outcome {
    /// Whether the latency of this outcome belongs in percentile and average
    /// calculations.
    pub fn is_countable(self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Throttled => "throttled",
            Outcome::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed request: how it went and how long it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub outcome: Outcome,
    pub latency: Duration,
}

impl Attempt {
    pub fn new(outcome: Outcome, latency: Duration) -> Self {
        Self { outcome, latency }
    }
}
