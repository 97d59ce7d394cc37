//! Connection lifecycle driven by sign-in state

use pretty_assertions::assert_eq;

use tokio::sync::watch;

use quiz_live_client::domain::{AuthProvider, CloseCode, ConnectionState};

use crate::common::{access_token, settle, TestClient};

#[tokio::test]
async fn signing_in_connects_with_token() {
    let client = TestClient::new();
    let follower = client.manager.clone().follow_auth(client.auth.watch());
    settle().await;
    assert_eq!(client.transport.open_count(), 0);

    let token = access_token(11);
    client.auth.login(&token, "ana").unwrap();
    settle().await;

    assert_eq!(client.transport.open_count(), 1);
    assert_eq!(
        client.transport.url(0).query(),
        Some(format!("token={}", token).as_str())
    );
    assert_eq!(client.manager.state(), ConnectionState::Connecting);
    follower.abort();
}

#[tokio::test]
async fn signing_out_closes_normally_and_cancels_reconnect() {
    let client = TestClient::new().signed_in();
    let follower = client.manager.clone().follow_auth(client.auth.watch());
    settle().await;
    client.transport.open_latest();
    client.manager.subscribe_to_quiz("5");

    client.transport.close_latest(1006);
    client.fire_reconnect();
    client.transport.open_latest();

    client.auth.logout();
    settle().await;

    assert_eq!(
        client.transport.closed(1),
        Some((CloseCode::NORMAL, "signed out".to_string()))
    );
    assert_eq!(client.manager.state(), ConnectionState::Disconnected);
    assert!(client.manager.subscriptions().is_empty());
    assert_eq!(client.scheduler.pending_count(), 0);
    follower.abort();
}

#[tokio::test]
async fn exhausted_retries_recover_after_auth_toggle() {
    let client = TestClient::new().signed_in();
    let follower = client.manager.clone().follow_auth(client.auth.watch());
    settle().await;
    client.transport.open_latest();

    for _ in 0..5 {
        client.transport.close_latest(1006);
        client.fire_reconnect();
    }
    client.transport.close_latest(1006);
    assert!(client.manager.retries_exhausted());
    assert_eq!(client.transport.open_count(), 6);

    client.auth.logout();
    settle().await;
    assert_eq!(client.transport.open_count(), 6);

    client.auth.login(&access_token(7), "ana").unwrap();
    settle().await;

    assert_eq!(client.transport.open_count(), 7);
    assert!(!client.manager.retries_exhausted());
    assert_eq!(client.manager.reconnect_attempts(), 0);

    client.transport.close_latest(1006);
    assert!(client.manager.pending_reconnect().is_some());
    follower.abort();
}

#[tokio::test]
async fn expired_stored_token_never_connects() {
    let client = TestClient::new();
    let follower = client.manager.clone().follow_auth(client.auth.watch());

    assert!(client.auth.restore("header.payload.signature", Some("ana")).is_err());
    client.manager.connect();
    settle().await;

    assert_eq!(client.transport.open_count(), 0);
    follower.abort();
}

#[tokio::test]
async fn follower_disconnects_when_auth_source_closes() {
    let client = TestClient::new().signed_in();
    let (signed_in, rx) = watch::channel(true);
    let follower = client.manager.clone().follow_auth(rx);
    settle().await;
    client.transport.open_latest();
    assert!(client.manager.is_connected());

    drop(signed_in);
    follower.await.unwrap();

    assert_eq!(client.manager.state(), ConnectionState::Disconnected);
    assert_eq!(
        client.transport.closed(0),
        Some((CloseCode::NORMAL, "shutting down".to_string()))
    );
}
