//! Application Startup
//!
//! Client building and the status loop.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;

use crate::application::{
    AuthState, ConnectionManager, ConnectionOptions, LeaderboardCache, LeaderboardKey,
    NotificationQueue,
};
use crate::config::Settings;
use crate::domain::{AuthProvider, QuizId, Scheduler, Transport};
use crate::infrastructure::{metrics, TokioScheduler, WebSocketTransport};
use crate::presentation::StatusLine;

/// Services shared by everything that observes the live feed
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub auth: Arc<AuthState>,
    pub manager: Arc<ConnectionManager>,
    pub notifications: NotificationQueue,
    pub leaderboard: Arc<LeaderboardCache>,
}

/// Application instance
pub struct Application {
    state: AppState,
    quizzes: Vec<QuizId>,
}

impl Application {
    /// Build the client from settings with the real transport and tokio timers
    pub fn build(settings: Settings) -> Result<Self> {
        let transport = Arc::new(WebSocketTransport::new(&settings.websocket));
        Self::build_with(settings, transport, Arc::new(TokioScheduler::new()))
    }

    /// Build the client with the given transport and scheduler
    pub fn build_with(
        settings: Settings,
        transport: Arc<dyn Transport>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self> {
        // Restore the stored credential, if any
        let auth = Arc::new(AuthState::new());
        if let Some(token) = settings.auth.token.as_deref().filter(|t| !t.is_empty()) {
            match auth.restore(token, settings.auth.username.as_deref()) {
                Ok(credential) => tracing::info!(
                    username = %credential.username,
                    expires_at = %credential.expires_at,
                    "Stored credential restored"
                ),
                Err(e) => tracing::warn!(error = %e, "Stored credential discarded"),
            }
        } else {
            tracing::info!("No stored credential, waiting for sign-in");
        }

        let notifications =
            NotificationQueue::with_ttl(scheduler.clone(), settings.notifications.ttl());

        let manager = ConnectionManager::new(
            ConnectionOptions::from_settings(&settings),
            auth.clone(),
            transport,
            scheduler,
            notifications.clone(),
        );

        let quizzes = settings.live.quiz_ids();
        let leaderboard = Arc::new(LeaderboardCache::new());
        leaderboard.track(LeaderboardKey::Global);
        for subject in settings.live.subject_names() {
            leaderboard.track(LeaderboardKey::Subject(subject));
        }
        for quiz_id in &quizzes {
            leaderboard.track(LeaderboardKey::Quiz(quiz_id.clone()));
        }
        manager.add_observer(leaderboard.clone());

        let state = AppState {
            settings: Arc::new(settings),
            auth,
            manager,
            notifications,
            leaderboard,
        };

        Ok(Self { state, quizzes })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run until Ctrl-C
    pub async fn run_until_stopped(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
        })
        .await
    }

    /// Run until `shutdown` completes, then close the connection normally
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let AppState {
            settings,
            auth,
            manager,
            notifications,
            leaderboard,
        } = self.state;

        let follower = manager.clone().follow_auth(auth.watch());

        let mut state_rx = manager.watch_state();
        let mut message_rx = manager.watch_last_message();
        let mut notice_rx = notifications.watch();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *state_rx.borrow_and_update();
                    if state.is_open() {
                        let subscribed = manager.subscriptions();
                        for quiz_id in self.quizzes.iter().filter(|q| !subscribed.contains(*q)) {
                            manager.subscribe_to_quiz(quiz_id.clone());
                        }
                    }
                }
                // The cache already saw every message; this only reports it.
                changed = message_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    message_rx.mark_unchanged();
                    let stale = leaderboard.take_stale();
                    if !stale.is_empty() {
                        let views: Vec<String> = stale.iter().map(ToString::to_string).collect();
                        tracing::info!(?views, "Leaderboard views need a refresh");
                    }
                }
                changed = notice_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(notification) = notice_rx.borrow_and_update().as_ref() {
                        tracing::info!(
                            severity = %notification.severity,
                            message = %notification.message,
                            "Notification"
                        );
                    }
                }
            }

            tracing::info!(status = %StatusLine::capture(&manager), "Status");
        }

        tracing::info!("Shutting down");
        follower.abort();
        manager.disconnect("client shutting down");

        if settings.telemetry.metrics {
            println!("{}", metrics::gather_metrics());
        }
        Ok(())
    }
}
