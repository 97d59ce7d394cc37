//! Application wiring and the status loop

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use quiz_live_client::application::LeaderboardKey;
use quiz_live_client::config::Settings;
use quiz_live_client::domain::{AuthProvider, CloseCode, QuizId};
use quiz_live_client::infrastructure::ManualScheduler;
use quiz_live_client::presentation::StatusLine;
use quiz_live_client::startup::Application;

use crate::common::{access_token, settle, RecordingTransport};

fn settings(token: Option<String>) -> Settings {
    let mut settings = Settings::from_defaults().unwrap();
    settings.auth.token = token;
    settings.auth.username = Some("ana".into());
    settings.live.subscribe_quizzes = vec!["42".into(), "7".into()];
    settings.telemetry.metrics = false;
    settings
}

#[tokio::test]
async fn stored_token_connects_and_subscribes_configured_quizzes() {
    let transport = RecordingTransport::new();
    let scheduler = Arc::new(ManualScheduler::new());
    let app = Application::build_with(
        settings(Some(access_token(5))),
        transport.clone(),
        scheduler.clone(),
    )
    .unwrap();
    let state = app.state().clone();
    assert!(state.auth.credential().is_some());

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(app.run_until(async {
        let _ = stop_rx.await;
    }));
    settle().await;
    assert_eq!(transport.open_count(), 1);

    transport.open_latest();
    settle().await;
    assert_eq!(
        transport.sent(0),
        vec![
            r#"{"type":"subscribe_quiz","quiz_id":"42"}"#.to_string(),
            r#"{"type":"subscribe_quiz","quiz_id":"7"}"#.to_string(),
        ]
    );
    assert_eq!(
        state.manager.subscriptions(),
        vec![QuizId::new("42"), QuizId::new("7")]
    );

    transport.message(r#"{"type":"quiz_leaderboard_updated","data":{"quiz_id":"42"}}"#);
    settle().await;
    // The status loop consumed the invalidation
    assert!(state.leaderboard.take_stale().is_empty());
    assert!(state.leaderboard.last_update().is_some());

    let status = StatusLine::capture(&state.manager).to_string();
    assert!(status.starts_with("[Connected] last: quiz_leaderboard_updated"));

    stop_tx.send(()).unwrap();
    running.await.unwrap().unwrap();
    assert_eq!(
        transport.closed(0),
        Some((CloseCode::NORMAL, "client shutting down".to_string()))
    );
}

#[tokio::test]
async fn back_to_back_frames_keep_the_invalidation() {
    let transport = RecordingTransport::new();
    let scheduler = Arc::new(ManualScheduler::new());
    let mut settings = settings(Some(access_token(5)));
    settings.live.subjects = vec!["math".into(), " ".into()];
    let app = Application::build_with(settings, transport.clone(), scheduler).unwrap();
    let state = app.state().clone();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(app.run_until(async {
        let _ = stop_rx.await;
    }));
    settle().await;
    transport.open_latest();
    settle().await;

    // Both frames land before the status loop gets to run
    transport.message(r#"{"type":"leaderboard_updated"}"#);
    transport.message(r#"{"type":"pong"}"#);
    assert!(state.leaderboard.is_stale(&LeaderboardKey::Global));
    assert!(state.leaderboard.is_stale(&LeaderboardKey::Subject("math".into())));
    assert!(state.leaderboard.is_stale(&LeaderboardKey::Quiz(QuizId::new("7"))));
    assert!(!state.leaderboard.is_stale(&LeaderboardKey::Subject(" ".into())));

    settle().await;
    assert!(state.leaderboard.last_update().is_some());
    assert!(state.leaderboard.take_stale().is_empty());
    assert_eq!(state.manager.last_message().unwrap().message_type, "pong");

    stop_tx.send(()).unwrap();
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn no_stored_token_waits_for_sign_in() {
    let transport = RecordingTransport::new();
    let scheduler = Arc::new(ManualScheduler::new());
    let app = Application::build_with(settings(None), transport.clone(), scheduler).unwrap();
    let state = app.state().clone();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(app.run_until(async {
        let _ = stop_rx.await;
    }));
    settle().await;
    assert_eq!(transport.open_count(), 0);

    state.auth.login(&access_token(9), "ana").unwrap();
    settle().await;
    assert_eq!(transport.open_count(), 1);

    stop_tx.send(()).unwrap();
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn invalid_stored_token_is_discarded() {
    let transport = RecordingTransport::new();
    let scheduler = Arc::new(ManualScheduler::new());
    let app = Application::build_with(
        settings(Some("not-a-token".into())),
        transport.clone(),
        scheduler.clone(),
    )
    .unwrap();

    assert!(app.state().auth.credential().is_none());

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(app.run_until(async {
        let _ = stop_rx.await;
    }));
    settle().await;
    scheduler.advance(Duration::from_secs(60));
    assert_eq!(transport.open_count(), 0);

    stop_tx.send(()).unwrap();
    running.await.unwrap().unwrap();
}
