//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

#![allow(dead_code, reason = "each test crate uses a different subset")]

use std::time::Duration;

use dropship::{PollPolicies, PollPolicy};

/// Client identifier sent by test transports.
pub const CLIENT_ID: &str = "test-client";

/// API key sent by test transports.
pub const API_KEY: &str = "test-api-key";

/// Droplet id used by the workflow scenarios.
pub const DROPLET_ID: i32 = 42;

/// Name of the droplet used by the workflow scenarios.
pub const DROPLET_NAME: &str = "web-0a1b2c3d";

/// Short polling budget shared by every event kind.
pub const TEST_POLICIES: PollPolicies = PollPolicies::uniform(PollPolicy {
    timeout: Duration::from_secs(30),
    initial_period: Duration::from_secs(1),
    max_period: Duration::from_secs(4),
});
