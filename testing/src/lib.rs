//! # Volunteer Testing
//!
//! Testing utilities for the volunteer platform.
//!
//! This crate provides:
//! - [`InMemoryStore`]: every storage trait on `HashMap`s behind one mutex
//! - [`FixedClock`]: deterministic time
//! - [`fixtures`]: builders for events, users, organizations and causes
//!
//! ## Example
//!
//! ```ignore
//! use volunteer_testing::{InMemoryStore, fixtures, test_clock};
//!
//! #[tokio::test]
//! async fn registers() {
//!     let store = InMemoryStore::new();
//!     let event = fixtures::EventBuilder::new("Beach cleanup").capacity(1).build();
//!     store.create_event(&event).await?;
//!
//!     let actor = fixtures::enroll(&store, "ana@example.org", &[Role::User]).await?;
//!     let member = actor.require_member()?;
//!     registration::register(&store, &test_clock(), member, event.id, None).await?;
//! }
//! ```

pub mod fixtures;
mod memory;

pub use memory::InMemoryStore;

use chrono::{DateTime, Utc};
use volunteer_core::environment::Clock;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use volunteer_testing::mocks::FixedClock;
    /// use volunteer_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(crate::fixtures::date(2025, 1, 1))
    }
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs it. Honors
/// `RUST_LOG`.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
