//! Production Environment implementation using system time.
//!
//! `SystemEnv` is the production implementation of the engine's Environment
//! trait: real monotonic time that advances naturally, and wall-clock
//! timestamps from the system clock. Deterministic tests use the engine's
//! `MockEnv` instead.

use chrono::Utc;
use natter_client::Environment;
use natter_proto::Timestamp;

/// Production environment using system clocks.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    #[allow(clippy::disallowed_methods)]
    fn wall_clock(&self) -> Timestamp {
        Timestamp::from_datetime(Utc::now())
    }
}
