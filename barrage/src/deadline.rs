//! Run-scoped cancellation signal.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineState {
    Armed,
    Expired,
}

/// Marks a run as expired once its duration has elapsed or on [`Deadline::cancel`].
///
/// Clones share the same state. Observers either poll [`Deadline::is_expired`]
/// between requests or await [`Deadline::expired`]; the transition happens
/// exactly once and is visible to every clone.
#[derive(Clone)]
pub struct Deadline {
    inner: Arc<Inner>,
}

struct Inner {
    // `None` when the duration does not fit in an `Instant`.
    expires_at: Option<Instant>,
    cancelled: AtomicBool,
    notify: Notify,
}

impl Deadline {
    /// Start the clock.
    pub fn arm(duration: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                expires_at: Instant::now().checked_add(duration),
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Expire early. Calling this more than once, or after the clock already
    /// ran out, has no further effect.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_expired(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
            || self
                .inner
                .expires_at
                .is_some_and(|at| Instant::now() >= at)
    }

    pub fn state(&self) -> DeadlineState {
        if self.is_expired() {
            DeadlineState::Expired
        } else {
            DeadlineState::Armed
        }
    }

    /// Time left before the clock runs out. Zero once expired.
    pub fn remaining(&self) -> Option<Duration> {
        if self.is_expired() {
            return Some(Duration::ZERO);
        }
        self.inner
            .expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Resolves once the deadline has expired.
    pub async fn expired(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent `cancel` is not missed.
            notified.as_mut().enable();

            if self.is_expired() {
                return;
            }

            match self.inner.expires_at {
                Some(at) => {
                    tokio::select! {
                        _ = sleep_until(at) => {}
                        _ = &mut notified => {}
                    }
                }
                None => notified.await,
            }
        }
    }
}

impl fmt::Debug for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deadline")
            .field("state", &self.state())
            .field("remaining", &self.remaining())
            .finish()
    }
}
