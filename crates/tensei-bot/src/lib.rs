//! Process wiring for the Tensei notifier.
//!
//! Holds the configuration schema and the top-level HTTP router. The binary
//! in `main.rs` loads a [`BotConfig`], builds the collaborators, and runs the
//! poll scheduler next to the operator API.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, middleware, routing::get};
use config::{Config, Environment};
use serde::Deserialize;
use tensei_core::{gateway::MessageGateway, source::StatusSource, store::EntityStore};
use tensei_discord::DiscordConfig;
use tensei_engine::{Monitor, MonitorSettings};
use tensei_twitch::HelixConfig;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `tensei.toml` and `TENSEI_*`
/// environment variables (`TENSEI_DISCORD__TOKEN`, ...).
#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
  #[serde(default)]
  pub store_path: PathBuf,
  #[serde(default)]
  pub discord:    DiscordSection,
  #[serde(default)]
  pub twitch:     TwitchSection,
  #[serde(default)]
  pub poll:       PollSection,
  #[serde(default)]
  pub api:        ApiSection,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DiscordSection {
  pub token:        String,
  pub prefix:       String,
  pub owner_id:     String,
  pub api_base_url: String,
}

impl Default for DiscordSection {
  fn default() -> Self {
    Self {
      token:        String::new(),
      prefix:       "!".to_string(),
      owner_id:     String::new(),
      api_base_url: tensei_discord::DEFAULT_API_BASE_URL.to_string(),
    }
  }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TwitchSection {
  pub client_id:     String,
  pub client_secret: String,
  pub api_base_url:  String,
  pub auth_url:      String,
}

impl Default for TwitchSection {
  fn default() -> Self {
    Self {
      client_id:     String::new(),
      client_secret: String::new(),
      api_base_url:  tensei_twitch::DEFAULT_API_BASE_URL.to_string(),
      auth_url:      tensei_twitch::DEFAULT_AUTH_URL.to_string(),
    }
  }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollSection {
  pub interval_secs: u64,
}

impl Default for PollSection {
  fn default() -> Self { Self { interval_secs: 60 } }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiSection {
  pub host:               String,
  pub port:               u16,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

impl Default for ApiSection {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".to_string(),
      port:               8089,
      auth_username:      String::new(),
      auth_password_hash: String::new(),
    }
  }
}

impl ApiSection {
  /// The API is only served once credentials are configured.
  pub fn enabled(&self) -> bool {
    !self.auth_username.is_empty() && !self.auth_password_hash.is_empty()
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

impl BotConfig {
  /// Layer `path` (optional) under the `TENSEI_*` environment.
  pub fn load(path: &std::path::Path) -> Result<Self, Error> {
    Self::from_source(config::File::from(path).required(false))
  }

  fn from_source<S>(file: S) -> Result<Self, Error>
  where
    S: config::Source + Send + Sync + 'static,
  {
    let cfg = Config::builder()
      .add_source(file)
      .add_source(
        Environment::with_prefix("TENSEI")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?
      .try_deserialize()?;
    Ok(cfg)
  }

  /// Fail on the first mandatory value that is missing.
  pub fn validate(&self) -> Result<(), Error> {
    if self.discord.token.trim().is_empty() {
      return Err(Error::MissingConfig("discord.token"));
    }
    if self.twitch.client_id.trim().is_empty() {
      return Err(Error::MissingConfig("twitch.client_id"));
    }
    if self.twitch.client_secret.trim().is_empty() {
      return Err(Error::MissingConfig("twitch.client_secret"));
    }
    if self.store_path.as_os_str().is_empty() {
      return Err(Error::MissingConfig("store_path"));
    }
    Ok(())
  }

  /// Configuration that is valid but leaves features unreachable.
  pub fn warnings(&self) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if !self.api.enabled() {
      warnings.push(
        "api.auth_username or api.auth_password_hash is not set; the operator API and the chat \
         command relay (POST /api/commands) are disabled",
      );
    }
    if self.discord.owner_id.trim().is_empty() {
      warnings.push("discord.owner_id is not set; !uptime and !stats are unavailable");
    }
    warnings
  }

  pub fn poll_interval(&self) -> Duration { Duration::from_secs(self.poll.interval_secs.max(1)) }

  pub fn helix(&self) -> HelixConfig {
    HelixConfig {
      client_id:     self.twitch.client_id.clone(),
      client_secret: self.twitch.client_secret.clone(),
      api_base_url:  self.twitch.api_base_url.clone(),
      auth_url:      self.twitch.auth_url.clone(),
    }
  }

  pub fn discord(&self) -> DiscordConfig {
    DiscordConfig {
      token:        self.discord.token.clone(),
      api_base_url: self.discord.api_base_url.clone(),
    }
  }

  pub fn monitor_settings(&self) -> MonitorSettings {
    MonitorSettings {
      owner_id: self.discord.owner_id.clone(),
      prefix:   self.discord.prefix.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level router: `/health` plus the authenticated `/api` tree.
pub fn router<St, Src, Gw>(monitor: Arc<Monitor<St, Src, Gw>>, auth: AuthConfig) -> Router
where
  St: EntityStore + 'static,
  Src: StatusSource + 'static,
  Gw: MessageGateway + 'static,
{
  let api = tensei_api::api_router(monitor)
    .layer(middleware::from_fn_with_state(Arc::new(auth), require_auth));

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use config::FileFormat;
  use rand_core::OsRng;
  use tensei_discord::DiscordGateway;
  use tensei_store_sqlite::SqliteStore;
  use tensei_twitch::HelixClient;
  use tower::ServiceExt as _;

  use super::*;

  const FULL: &str = r#"
    store_path = "~/.local/share/tensei/tensei.db"

    [discord]
    token = "bot-token"
    owner_id = "1234"

    [twitch]
    client_id = "cid"
    client_secret = "secret"

    [poll]
    interval_secs = 30
  "#;

  fn parse(toml: &str) -> BotConfig {
    BotConfig::from_source(config::File::from_str(toml, FileFormat::Toml)).unwrap()
  }

  #[test]
  fn defaults_fill_optional_values() {
    let cfg = parse(FULL);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.discord.prefix, "!");
    assert_eq!(cfg.discord.api_base_url, "https://discord.com/api/v10");
    assert_eq!(cfg.twitch.api_base_url, "https://api.twitch.tv/helix");
    assert_eq!(cfg.api.port, 8089);
    assert!(!cfg.api.enabled());
    assert_eq!(cfg.poll_interval(), Duration::from_secs(30));
    assert_eq!(cfg.monitor_settings().owner_id, "1234");
  }

  #[test]
  fn disabled_api_is_reported() {
    let cfg = parse(FULL);
    let warnings = cfg.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("command relay"));

    let cfg = parse(&format!(
      "{FULL}\n[api]\nauth_username = \"op\"\nauth_password_hash = \"$argon2id$x\"\n"
    ));
    assert!(cfg.api.enabled());
    assert!(cfg.warnings().is_empty());
  }

  #[test]
  fn validate_names_first_missing_value() {
    let cfg = parse("store_path = \"x.db\"\n[twitch]\nclient_id = \"cid\"\n");
    assert!(matches!(cfg.validate(), Err(Error::MissingConfig("discord.token"))));

    let cfg = parse("[discord]\ntoken = \"t\"\n[twitch]\nclient_id = \"c\"\nclient_secret = \"s\"\n");
    assert!(matches!(cfg.validate(), Err(Error::MissingConfig("store_path"))));
  }

  async fn app(password: &str) -> Router {
    let cfg = parse(FULL);
    let store = SqliteStore::open_in_memory().await.unwrap();
    let helix = HelixClient::new(cfg.helix()).unwrap();
    let discord = DiscordGateway::new(cfg.discord()).unwrap();
    let monitor = Monitor::load(store, helix, discord, cfg.monitor_settings())
      .await
      .unwrap();

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    router(Arc::new(monitor), AuthConfig { username: "user".into(), password_hash: hash })
  }

  fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
  }

  #[tokio::test]
  async fn api_requires_credentials() {
    let app = app("secret").await;
    let resp = app.oneshot(get("/api/entities", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn api_accepts_valid_credentials() {
    let app = app("secret").await;
    let auth = format!("Basic {}", B64.encode("user:secret"));
    let resp = app.oneshot(get("/api/entities", Some(&auth))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn health_is_open() {
    let app = app("secret").await;
    let resp = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
