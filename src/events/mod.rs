//! Drives asynchronous provider operations to completion.
//!
//! Every v1 mutation answers with an event id. [`EventPoller::wait_for`]
//! polls `events/{id}` with exponential backoff until the event is done, the
//! event reports a failure, or the budget for the [`EventKind`] runs out.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::api::DigitalOceanTransport;
use crate::domain::EventStatus;
use crate::error::{DigitalOceanError, Result};

/// Operation being awaited; selects the polling budget.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EventKind {
    /// A droplet booting after create, reboot, or power on.
    NodeRunning,
    /// A droplet powering off.
    NodeSuspended,
    /// A droplet being destroyed.
    NodeTerminated,
    /// A snapshot or transferred image becoming usable.
    ImageAvailable,
}

impl EventKind {
    /// Stable label used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NodeRunning => "node-running",
            Self::NodeSuspended => "node-suspended",
            Self::NodeTerminated => "node-terminated",
            Self::ImageAvailable => "image-available",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timeout and backoff bounds for one event kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    /// Total time allowed before giving up.
    pub timeout: Duration,
    /// Delay after the first unsuccessful poll.
    pub initial_period: Duration,
    /// Cap on the doubling delay.
    pub max_period: Duration,
}

/// Poll policies for every [`EventKind`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicies {
    /// Policy for [`EventKind::NodeRunning`].
    pub node_running: PollPolicy,
    /// Policy for [`EventKind::NodeSuspended`].
    pub node_suspended: PollPolicy,
    /// Policy for [`EventKind::NodeTerminated`].
    pub node_terminated: PollPolicy,
    /// Policy for [`EventKind::ImageAvailable`].
    pub image_available: PollPolicy,
}

impl PollPolicies {
    /// Applies the same policy to every kind.
    #[must_use]
    pub const fn uniform(policy: PollPolicy) -> Self {
        Self {
            node_running: policy,
            node_suspended: policy,
            node_terminated: policy,
            image_available: policy,
        }
    }

    /// Returns the policy for `kind`.
    #[must_use]
    pub const fn get(&self, kind: EventKind) -> PollPolicy {
        match kind {
            EventKind::NodeRunning => self.node_running,
            EventKind::NodeSuspended => self.node_suspended,
            EventKind::NodeTerminated => self.node_terminated,
            EventKind::ImageAvailable => self.image_available,
        }
    }
}

/// Polls events until they complete.
///
/// The poller holds no per-event state, so concurrent waits on distinct
/// events share one instance safely. Dropping the returned future abandons
/// the wait between polls.
#[derive(Clone)]
pub struct EventPoller {
    transport: Arc<dyn DigitalOceanTransport>,
    policies: PollPolicies,
}

impl EventPoller {
    /// Creates a poller over `transport` using `policies`.
    #[must_use]
    pub fn new(transport: Arc<dyn DigitalOceanTransport>, policies: PollPolicies) -> Self {
        Self {
            transport,
            policies,
        }
    }

    /// Waits until `event_id` reports done.
    ///
    /// An event that is already done returns after a single fetch.
    ///
    /// # Errors
    ///
    /// Returns [`DigitalOceanError::OperationFailed`] when the event reports
    /// an error, [`DigitalOceanError::Timeout`] when the budget for `kind`
    /// elapses first, and propagates transport failures unchanged.
    pub async fn wait_for(&self, event_id: i32, kind: EventKind) -> Result<()> {
        let policy = self.policies.get(kind);
        let deadline = Instant::now().checked_add(policy.timeout);
        let mut period = policy.initial_period;

        loop {
            let event = self.transport.get_event(event_id).await?;
            match event.status {
                EventStatus::Done => {
                    debug!(event_id, %kind, "event done");
                    return Ok(());
                }
                EventStatus::Error => {
                    warn!(event_id, %kind, "event reported an error");
                    return Err(DigitalOceanError::OperationFailed { event_id });
                }
                EventStatus::Pending => {}
            }

            // A budget past the clock's range never expires.
            let delay = match deadline {
                Some(limit) => {
                    let remaining = limit.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        warn!(event_id, %kind, timeout_secs = policy.timeout.as_secs(), "event wait timed out");
                        return Err(DigitalOceanError::Timeout { kind, event_id });
                    }
                    period.min(remaining)
                }
                None => period,
            };
            debug!(
                event_id,
                %kind,
                status = ?event.status,
                percentage = event.percentage.as_deref().unwrap_or("-"),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "event pending"
            );
            sleep(delay).await;
            period = period.saturating_mul(2).min(policy.max_period);
        }
    }
}

#[cfg(test)]
mod tests;
