//! Backoff reconnect behaviour

use std::time::Duration;

use pretty_assertions::assert_eq;
use test_case::test_case;

use quiz_live_client::domain::ConnectionState;

use crate::common::TestClient;

fn millis(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_millis).collect()
}

#[test_case(1001 ; "going away")]
#[test_case(1005 ; "no status")]
#[test_case(1006 ; "abnormal")]
#[test_case(1011 ; "server error")]
#[test_case(4000 ; "application code")]
fn abnormal_close_schedules_first_backoff(code: u16) {
    let client = TestClient::new().signed_in();
    client.open();
    client.transport.close_latest(code);

    assert_eq!(client.manager.state(), ConnectionState::Disconnected);
    assert_eq!(client.manager.reconnect_attempts(), 1);
    assert_eq!(client.scheduler.pending(), millis(&[1000]));
}

#[test]
fn normal_close_does_not_reconnect() {
    let client = TestClient::new().signed_in();
    client.open();
    client.transport.close_latest(1000);

    assert_eq!(client.scheduler.pending_count(), 0);
    assert_eq!(client.manager.reconnect_attempts(), 0);
}

#[test_case(0, 1000)]
#[test_case(1, 2000)]
#[test_case(2, 4000)]
#[test_case(3, 8000)]
#[test_case(4, 16000)]
fn each_failure_increments_attempts_by_one(prior_attempts: u32, expected_ms: u64) {
    let client = TestClient::new().signed_in();
    client.open();

    // Fail `prior_attempts` reconnects without an open in between
    client.transport.close_latest(1006);
    for _ in 0..prior_attempts {
        client.fire_reconnect();
        client.transport.close_latest(1006);
    }

    assert_eq!(client.manager.reconnect_attempts(), prior_attempts + 1);
    assert_eq!(
        client.manager.pending_reconnect(),
        Some(Duration::from_millis(expected_ms))
    );
}

#[test]
fn five_consecutive_failures_use_the_full_schedule_then_stop() {
    let client = TestClient::new().signed_in();
    client.open();

    for _ in 0..5 {
        client.transport.close_latest(1006);
        assert!(client.fire_reconnect().is_some());
    }
    client.transport.close_latest(1006);

    assert_eq!(
        client.scheduler.fired(),
        millis(&[1000, 2000, 4000, 8000, 16000])
    );
    assert_eq!(client.transport.open_count(), 6);
    assert!(client.manager.retries_exhausted());
    assert_eq!(client.fire_reconnect(), None);

    client.scheduler.advance(Duration::from_secs(600));
    assert_eq!(client.transport.open_count(), 6);
}

#[test]
fn reconnect_fires_only_after_the_full_delay() {
    let client = TestClient::new().signed_in();
    client.open();
    client.transport.close_latest(1006);
    client.fire_reconnect();
    client.transport.close_latest(1006);

    client.scheduler.advance(Duration::from_millis(1999));
    assert_eq!(client.transport.open_count(), 2);
    client.scheduler.advance(Duration::from_millis(1));
    assert_eq!(client.transport.open_count(), 3);
}

#[test]
fn successful_open_resets_attempts() {
    let client = TestClient::new().signed_in();
    client.open();
    for _ in 0..3 {
        client.transport.close_latest(1006);
        client.fire_reconnect();
    }
    assert_eq!(client.manager.reconnect_attempts(), 3);

    client.transport.open_latest();
    assert_eq!(client.manager.reconnect_attempts(), 0);

    client.transport.close_latest(1006);
    assert_eq!(client.manager.pending_reconnect(), Some(Duration::from_millis(1000)));
}

#[test]
fn disconnect_cancels_pending_reconnect() {
    let client = TestClient::new().signed_in();
    client.open();
    client.transport.close_latest(1006);
    assert_eq!(client.scheduler.pending_count(), 1);

    client.manager.disconnect("user request");

    assert_eq!(client.scheduler.pending_count(), 0);
    client.scheduler.advance(Duration::from_secs(60));
    assert_eq!(client.transport.open_count(), 1);
    assert_eq!(client.manager.reconnect_attempts(), 0);
}

#[test]
fn signing_out_stops_reconnects() {
    let client = TestClient::new().signed_in();
    client.open();
    client.transport.close_latest(1006);

    // The timer fires after sign-out: connect() is a silent no-op
    client.auth.logout();
    client.fire_reconnect();
    assert_eq!(client.transport.open_count(), 1);

    // And an abnormal close while signed out schedules nothing
    client.auth.login(&crate::common::access_token(7), "ana").unwrap();
    client.open();
    client.auth.logout();
    client.transport.close_latest(1006);
    assert_eq!(client.scheduler.pending_count(), 0);
}

#[test]
fn handshake_failure_counts_as_abnormal_close() {
    let client = TestClient::new().signed_in();
    client.manager.connect();
    assert_eq!(client.manager.state(), ConnectionState::Connecting);

    client.transport.close_latest(1006);
    assert_eq!(client.manager.reconnect_attempts(), 1);
    assert_eq!(client.scheduler.pending(), millis(&[1000]));
}

#[test]
fn custom_policy_from_settings() {
    let client = TestClient::with_settings(|s| {
        s.reconnect.max_attempts = 2;
        s.reconnect.base_delay_ms = 500;
        s.reconnect.max_delay_ms = 800;
    })
    .signed_in();
    client.open();

    client.transport.close_latest(1006);
    client.fire_reconnect();
    client.transport.close_latest(1006);
    client.fire_reconnect();
    client.transport.close_latest(1006);

    assert_eq!(client.scheduler.fired(), millis(&[500, 800]));
    assert!(client.manager.retries_exhausted());
}
