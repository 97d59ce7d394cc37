//! Client settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;
use validator::Validate;

use crate::domain::{QuizId, ReconnectPolicy};
use crate::shared::Result;

/// Root configuration structure containing all client settings.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    /// Live feed endpoint configuration
    #[validate(nested)]
    pub websocket: WebSocketSettings,

    /// Reconnect backoff configuration
    #[validate(nested)]
    pub reconnect: ReconnectSettings,

    /// Notification display configuration
    #[validate(nested)]
    pub notifications: NotificationSettings,

    /// Stored credential restored at start-up
    #[serde(default)]
    pub auth: AuthSettings,

    /// What the binary subscribes to once connected
    #[serde(default)]
    pub live: LiveSettings,

    /// Logging and metrics switches
    pub telemetry: TelemetrySettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Live feed endpoint configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WebSocketSettings {
    /// Base URL of the push server (ws:// or wss://)
    #[validate(url)]
    pub url: String,

    /// Endpoint path appended to the base URL
    pub path: String,

    /// Maximum inbound message size in bytes (default: 64KB)
    #[validate(range(min = 1024))]
    pub max_message_size: usize,

    /// Maximum inbound frame size in bytes (default: 16KB)
    #[validate(range(min = 1024))]
    pub max_frame_size: usize,
}

/// Reconnect backoff configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReconnectSettings {
    /// Consecutive abnormal closes tolerated before giving up
    #[validate(range(min = 1))]
    pub max_attempts: u32,

    /// Delay before the first attempt in milliseconds
    #[validate(range(min = 1))]
    pub base_delay_ms: u64,

    /// Upper bound for any delay in milliseconds
    #[validate(range(min = 1))]
    pub max_delay_ms: u64,

    /// Re-send subscribe requests for known quizzes after a reconnect opens
    pub resubscribe_on_reconnect: bool,
}

/// Notification display configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NotificationSettings {
    /// How long a notification stays visible in milliseconds
    #[validate(range(min = 1))]
    pub ttl_ms: u64,
}

/// Stored credential.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettings {
    /// Bearer token issued by the auth endpoint
    pub token: Option<String>,

    /// Display name stored alongside the token
    pub username: Option<String>,
}

/// Live subscriptions requested by the binary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveSettings {
    /// Quiz ids to subscribe to once the connection opens
    pub subscribe_quizzes: Vec<String>,

    /// Subjects whose aggregate leaderboards are displayed
    #[serde(default)]
    pub subjects: Vec<String>,
}

/// Logging and metrics switches.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// Emit JSON log lines instead of the human-readable format
    pub json: bool,

    /// Dump Prometheus metrics on shutdown
    pub metrics: bool,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. built-in defaults
    /// 2. config/default.toml
    /// 3. config/{RUN_ENV}.toml
    /// 4. `APP__SECTION__KEY` environment variables
    /// 5. `WS_URL`, `AUTH_TOKEN`, `AUTH_USERNAME` (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if configuration cannot be loaded or
    /// parsed, or if it fails validation.
    pub fn load() -> Result<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let builder = Self::defaults(Config::builder(), &environment)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__RECONNECT__MAX_ATTEMPTS=3 -> reconnect.max_attempts = 3
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("live.subscribe_quizzes")
                    .with_list_parse_key("live.subjects"),
            )
            .set_override_option("websocket.url", std::env::var("WS_URL").ok())?
            .set_override_option("auth.token", std::env::var("AUTH_TOKEN").ok())?
            .set_override_option("auth.username", std::env::var("AUTH_USERNAME").ok())?;

        Ok(builder.build()?.try_deserialize().and_then(Self::validated)?)
    }

    /// Settings built from defaults only, without touching files or the environment.
    pub fn from_defaults() -> Result<Self> {
        let settings = Self::defaults(Config::builder(), "test")?
            .build()?
            .try_deserialize()
            .and_then(Self::validated)?;
        Ok(settings)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("environment", environment)?
            .set_default("websocket.url", "ws://localhost:8000")?
            .set_default("websocket.path", "/ws/leaderboard/")?
            .set_default("websocket.max_message_size", 65536_i64)? // 64KB
            .set_default("websocket.max_frame_size", 16384_i64)? // 16KB
            .set_default("reconnect.max_attempts", 5_i64)?
            .set_default("reconnect.base_delay_ms", 1000_i64)?
            .set_default("reconnect.max_delay_ms", 30000_i64)?
            .set_default("reconnect.resubscribe_on_reconnect", false)?
            .set_default("notifications.ttl_ms", 5000_i64)?
            .set_default("live.subscribe_quizzes", Vec::<String>::new())?
            .set_default("live.subjects", Vec::<String>::new())?
            .set_default("telemetry.json", false)?
            .set_default("telemetry.metrics", true)
    }

    fn validated(settings: Self) -> Result<Self, ConfigError> {
        settings
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid configuration: {}", e)))?;

        let url = settings.websocket.base_url()?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::Message(format!(
                "websocket.url must use ws:// or wss://, got {}://",
                url.scheme()
            )));
        }
        if settings.reconnect.max_delay_ms < settings.reconnect.base_delay_ms {
            return Err(ConfigError::Message(
                "reconnect.max_delay_ms must not be smaller than reconnect.base_delay_ms".into(),
            ));
        }

        Ok(settings)
    }
}

impl WebSocketSettings {
    /// Parsed base URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.url)
            .map_err(|e| ConfigError::Message(format!("Invalid websocket.url: {}", e)))
    }

    /// Endpoint URL for the given bearer token: `{url}{path}?token=<bearer>`.
    ///
    /// `path` is appended to whatever path the base URL already has.
    pub fn endpoint(&self, token: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url)?;
        let path = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        url.set_path(&path);
        url.query_pairs_mut().clear().append_pair("token", token);
        Ok(url)
    }
}

impl ReconnectSettings {
    /// Backoff policy described by these settings.
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

impl NotificationSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl LiveSettings {
    pub fn quiz_ids(&self) -> Vec<QuizId> {
        self.subscribe_quizzes
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(QuizId::from)
            .collect()
    }

    pub fn subject_names(&self) -> Vec<String> {
        self.subjects
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
