//! Final statistics of a run.
use barrage_core::Counters;
#[cfg(feature = "serde")]
use serde::Serialize;
#[allow(unused_imports)]
#[cfg(feature = "serde")]
use serde_with::{serde_as, DurationMilliSecondsWithFrac};
use std::fmt;
use std::time::Duration;

/// Summary of a finished run, computed once after every worker has joined.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", cfg_eval::cfg_eval, serde_as)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Report {
    /// Wall time from the first worker spawn to the last worker join.
    #[cfg_attr(feature = "serde", serde_as(as = "DurationMilliSecondsWithFrac<f64>"))]
    pub elapsed: Duration,
    pub counters: Counters,
    /// All attempts per second.
    pub rps: f64,
    /// Successful attempts per second.
    pub success_rps: f64,
    pub error_rate: f64,
    pub throttle_rate: f64,
    /// `None` when no attempt succeeded.
    pub latency: Option<LatencySummary>,
}

/// Latency distribution of the countable outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", cfg_eval::cfg_eval, serde_as)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LatencySummary {
    pub samples: usize,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationMilliSecondsWithFrac<f64>"))]
    pub average: Duration,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationMilliSecondsWithFrac<f64>"))]
    pub min: Duration,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationMilliSecondsWithFrac<f64>"))]
    pub p50: Duration,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationMilliSecondsWithFrac<f64>"))]
    pub p90: Duration,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationMilliSecondsWithFrac<f64>"))]
    pub p99: Duration,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationMilliSecondsWithFrac<f64>"))]
    pub max: Duration,
}

impl Report {
    pub fn new(counters: Counters, samples: Vec<Duration>, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let per_sec = |count: u64| {
            if secs > 0. {
                count as f64 / secs
            } else {
                0.
            }
        };

        Self {
            elapsed,
            counters,
            rps: per_sec(counters.total),
            success_rps: per_sec(counters.success),
            error_rate: counters.error_rate(),
            throttle_rate: counters.throttle_rate(),
            latency: LatencySummary::from_samples(samples),
        }
    }
}

impl LatencySummary {
    /// Sorts the samples and summarizes them. `None` for an empty set.
    pub fn from_samples(mut samples: Vec<Duration>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_unstable();

        let total_nanos: u128 = samples.iter().map(Duration::as_nanos).sum();
        let average_nanos = total_nanos / samples.len() as u128;

        Some(Self {
            samples: samples.len(),
            average: Duration::from_nanos(u64::try_from(average_nanos).unwrap_or(u64::MAX)),
            min: samples[0],
            p50: percentile(&samples, 50)?,
            p90: percentile(&samples, 90)?,
            p99: percentile(&samples, 99)?,
            max: samples[samples.len() - 1],
        })
    }
}

/// Nearest-rank percentile over ascending samples: `sorted[floor(len * pct / 100)]`,
/// clamped to the last element.
pub fn percentile(sorted: &[Duration], pct: u32) -> Option<Duration> {
    let last = sorted.len().checked_sub(1)?;
    let idx = (sorted.len() * pct as usize / 100).min(last);
    Some(sorted[idx])
}

fn percent(rate: f64) -> f64 {
    rate * 100.
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        writeln!(f, "Total Requests:   {}", c.total)?;
        writeln!(
            f,
            "Successful:       {} ({:.1}%)",
            c.success,
            percent(c.success_rate())
        )?;
        writeln!(
            f,
            "Throttled:        {} ({:.1}%)",
            c.throttled,
            percent(self.throttle_rate)
        )?;
        writeln!(f, "Errors:           {}", c.errors)?;
        writeln!(f, "Duration:         {:.2?}", self.elapsed)?;
        writeln!(f, "Requests/sec:     {:.2}", self.rps)?;
        writeln!(f, "Successful/sec:   {:.2}", self.success_rps)?;
        write!(f, "Error Rate:       {:.1}%", percent(self.error_rate))?;

        match &self.latency {
            Some(latency) => {
                writeln!(f)?;
                writeln!(f, "Avg Latency:      {:.2?}", latency.average)?;
                writeln!(f, "Min Latency:      {:.2?}", latency.min)?;
                writeln!(f, "P50 Latency:      {:.2?}", latency.p50)?;
                writeln!(f, "P90 Latency:      {:.2?}", latency.p90)?;
                writeln!(f, "P99 Latency:      {:.2?}", latency.p99)?;
                write!(f, "Max Latency:      {:.2?}", latency.max)
            }
            None => write!(f, "\nNo successful requests."),
        }
    }
}
