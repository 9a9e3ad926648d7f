use std::time::Duration;

/// Concurrency used when neither the command line nor a preset provides one.
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Run length used when neither the command line nor a preset provides one.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(10);
