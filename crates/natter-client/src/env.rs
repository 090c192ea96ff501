//! Environment abstraction for deterministic testing.
//!
//! Decouples engine logic from system time. Production supplies real clocks;
//! tests drive a virtual clock so timer behavior (typing expiry, send
//! throttling) is exact rather than sleep-based.

use std::time::Duration;

use natter_proto::Timestamp;

/// Abstract environment providing monotonic and wall-clock time.
///
/// # Invariants
///
/// - `now()` never goes backwards within a single execution context.
/// - `wall_clock()` yields a fresh, unique stamp per call: timestamps are the
///   sole identity of chat messages, so two messages must never share one.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; test environments
    /// use a manually advanced virtual clock.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Current wall-clock time as a wire timestamp.
    fn wall_clock(&self) -> Timestamp;
}

/// Test utilities: a deterministic environment with a virtual clock.
pub mod test_utils {
    use std::{
        sync::{Arc, Mutex},
        time::{Duration, Instant},
    };

    use chrono::{TimeZone, Utc};
    use natter_proto::Timestamp;

    use super::Environment;

    /// Deterministic environment for tests.
    ///
    /// The monotonic clock only moves when [`MockEnv::advance`] is called.
    /// Wall-clock stamps are derived from a fixed epoch plus the virtual
    /// offset, with a per-call sequence number so consecutive stamps within
    /// the same virtual millisecond stay unique.
    #[derive(Clone)]
    pub struct MockEnv {
        inner: Arc<Mutex<MockInner>>,
    }

    struct MockInner {
        start: Instant,
        offset: Duration,
        seq: i64,
    }

    impl MockEnv {
        /// Create a mock environment at virtual time zero.
        #[allow(clippy::disallowed_methods)]
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(MockInner {
                    start: Instant::now(),
                    offset: Duration::ZERO,
                    seq: 0,
                })),
            }
        }

        /// Advance the virtual clock.
        ///
        /// # Panics
        ///
        /// Panics if the internal mutex is poisoned. Acceptable for test code.
        #[allow(clippy::expect_used)]
        pub fn advance(&self, by: Duration) {
            self.inner.lock().expect("Mutex poisoned").offset += by;
        }
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Environment for MockEnv {
        type Instant = Instant;

        /// # Panics
        ///
        /// Panics if the internal mutex is poisoned. Acceptable for test code.
        #[allow(clippy::expect_used)]
        fn now(&self) -> Instant {
            let inner = self.inner.lock().expect("Mutex poisoned");
            inner.start + inner.offset
        }

        /// # Panics
        ///
        /// Panics if the internal mutex is poisoned. Acceptable for test code.
        #[allow(clippy::expect_used)]
        fn wall_clock(&self) -> Timestamp {
            let mut inner = self.inner.lock().expect("Mutex poisoned");
            inner.seq += 1;
            let base = Utc
                .timestamp_millis_opt(1_704_067_200_000) // 2024-01-01T00:00:00Z
                .single()
                .expect("invariant: fixed epoch is valid");
            let at = base
                + chrono::TimeDelta::milliseconds(inner.offset.as_millis() as i64)
                + chrono::TimeDelta::milliseconds(inner.seq);
            Timestamp::from_datetime(at)
        }
    }

}
