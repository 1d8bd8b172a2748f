//! Unit tests for the event poller.

use std::sync::Arc;
use std::time::Duration;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::EventStatus::{Done, Error, Pending};
use crate::test_support::ScriptedTransport;

const POLICY: PollPolicy = PollPolicy {
    timeout: Duration::from_secs(30),
    initial_period: Duration::from_secs(1),
    max_period: Duration::from_secs(4),
};

#[fixture]
fn transport() -> ScriptedTransport {
    ScriptedTransport::new()
}

fn poller(transport: &ScriptedTransport, policy: PollPolicy) -> EventPoller {
    EventPoller::new(Arc::new(transport.clone()), PollPolicies::uniform(policy))
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn waits_until_event_is_done(transport: ScriptedTransport) {
    transport.script_event(7, [Pending, Pending, Done]);

    poller(&transport, POLICY)
        .wait_for(7, EventKind::NodeRunning)
        .await
        .expect("event completes");

    assert_eq!(transport.event_fetches(7), 3);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn done_event_returns_after_one_fetch(transport: ScriptedTransport) {
    transport.script_event(9, [Done]);
    let poller = poller(&transport, POLICY);

    poller
        .wait_for(9, EventKind::ImageAvailable)
        .await
        .expect("first wait");
    poller
        .wait_for(9, EventKind::ImageAvailable)
        .await
        .expect("second wait");

    assert_eq!(transport.event_fetches(9), 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn error_event_fails_fast(transport: ScriptedTransport) {
    transport.script_event(11, [Pending, Error]);

    let err = poller(&transport, POLICY)
        .wait_for(11, EventKind::NodeSuspended)
        .await
        .expect_err("error event must fail");

    assert_eq!(err, DigitalOceanError::OperationFailed { event_id: 11 });
    assert_eq!(transport.event_fetches(11), 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn pending_event_times_out(transport: ScriptedTransport) {
    transport.script_event(13, [Pending]);
    let started = Instant::now();

    let err = poller(&transport, POLICY)
        .wait_for(13, EventKind::NodeTerminated)
        .await
        .expect_err("pending event must time out");

    assert_eq!(
        err,
        DigitalOceanError::Timeout {
            kind: EventKind::NodeTerminated,
            event_id: 13,
        }
    );
    assert!(started.elapsed() >= POLICY.timeout);
    // Delays of 1, 2, 4, 4, ... seconds fit ten polls into thirty seconds.
    assert_eq!(transport.event_fetches(13), 10);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn backoff_doubles_up_to_the_cap(transport: ScriptedTransport) {
    transport.script_event(15, [Pending, Pending, Pending, Pending, Done]);
    let started = Instant::now();

    poller(&transport, POLICY)
        .wait_for(15, EventKind::NodeRunning)
        .await
        .expect("event completes");

    assert_eq!(started.elapsed(), Duration::from_secs(1 + 2 + 4 + 4));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn unbounded_timeout_waits_without_a_deadline(transport: ScriptedTransport) {
    transport.script_event(17, [Pending, Pending, Done]);
    let policy = PollPolicy {
        timeout: Duration::from_secs(u64::MAX),
        ..POLICY
    };

    poller(&transport, policy)
        .wait_for(17, EventKind::NodeRunning)
        .await
        .expect("event completes");

    assert_eq!(transport.event_fetches(17), 3);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn transport_errors_propagate(transport: ScriptedTransport) {
    let err = poller(&transport, POLICY)
        .wait_for(404, EventKind::NodeRunning)
        .await
        .expect_err("unknown event must fail");

    assert!(matches!(err, DigitalOceanError::NotFound(_)));
}

#[test]
fn event_kind_labels_are_stable() {
    assert_eq!(EventKind::NodeRunning.to_string(), "node-running");
    assert_eq!(EventKind::ImageAvailable.to_string(), "image-available");
}
