//! Wall-clock capability.
//!
//! Freshness checks compare the time an entry was fetched against the current
//! time. Reading the clock through [`Clock`] lets tests move time forward
//! deterministically instead of sleeping.

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(feature = "test-helpers")]
pub use manual::ManualClock;

#[cfg(feature = "test-helpers")]
mod manual {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::Duration;

    use chrono::{DateTime, TimeZone, Utc};

    use super::Clock;

    /// Clock that only moves when told to.
    ///
    /// Clones share the same time, so a clone handed to the proxy can be
    /// advanced from the test body.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        millis: Arc<AtomicI64>,
    }

    impl ManualClock {
        /// Creates a clock frozen at the given epoch milliseconds.
        pub fn at_millis(millis: i64) -> Self {
            ManualClock {
                millis: Arc::new(AtomicI64::new(millis)),
            }
        }

        /// Moves the clock forward.
        pub fn advance(&self, by: Duration) {
            self.millis
                .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
        }

        /// Sets the clock to the given epoch milliseconds.
        pub fn set_millis(&self, millis: i64) {
            self.millis.store(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_millis_opt(self.millis.load(Ordering::SeqCst))
                .single()
                .unwrap_or_default()
        }
    }
}
