//! The live-status monitoring engine.
//!
//! [`Monitor`] ties the registry to the three collaborators: a
//! [`StatusSource`], a [`MessageGateway`] and the [`EntityStore`] behind the
//! registry. It is generic over all three so tests can drive it with
//! in-memory fakes. The poll loop lives in [`scheduler`], the chat command
//! surface in [`commands`].
//!
//! # Wiring
//!
//! ```rust,ignore
//! let monitor = Arc::new(Monitor::load(store, helix, discord, settings).await?);
//! tokio::spawn(Arc::clone(&monitor).run(interval, shutdown_rx));
//! ```

pub mod commands;
pub mod fanout;
pub mod registry;
pub mod scheduler;
mod worker;


use chrono::{DateTime, Utc};
use serde::Serialize;
use tensei_core::{
  Error, Result,
  cooldown::CooldownGate,
  entity::{CommunitySettings, NotificationSubscription, Phase, TrackedEntity},
  gateway::MessageGateway,
  ratelimit::RateLimitSnapshot,
  source::{StatusRecord, StatusSource},
  store::EntityStore,
};
use tracing::{debug, info, warn};

pub use registry::Registry;
pub use scheduler::TickReport;

/// Process-wide settings the engine needs from configuration.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
  /// Chat user id of the bot owner; always treated as an admin.
  pub owner_id: String,
  /// Prefix every chat command starts with.
  pub prefix:   String,
}

impl Default for MonitorSettings {
  fn default() -> Self { Self { owner_id: String::new(), prefix: "!".into() } }
}

/// An entity together with what the status source says about it right now.
#[derive(Debug, Clone, Serialize)]
pub struct LiveStatus {
  pub entity:   TrackedEntity,
  pub phase:    Phase,
  /// `None` when the source reports the entity offline.
  pub stream:   Option<StatusRecord>,
  pub category: Option<String>,
}

pub struct Monitor<St, Src, Gw> {
  registry:   Registry<St>,
  source:     Src,
  gateway:    Gw,
  cooldowns:  CooldownGate,
  settings:   MonitorSettings,
  started_at: DateTime<Utc>,
}

impl<St, Src, Gw> Monitor<St, Src, Gw>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  /// Load every tracked entity from `store` and build the engine.
  pub async fn load(store: St, source: Src, gateway: Gw, settings: MonitorSettings) -> Result<Self> {
    let registry = Registry::load(store).await?;
    info!(entities = registry.len().await, "monitor ready");
    Ok(Self {
      registry,
      source,
      gateway,
      cooldowns: CooldownGate::new(),
      settings,
      started_at: Utc::now(),
    })
  }

  pub fn registry(&self) -> &Registry<St> { &self.registry }

  pub fn source(&self) -> &Src { &self.source }

  pub fn gateway(&self) -> &Gw { &self.gateway }

  pub fn settings(&self) -> &MonitorSettings { &self.settings }

  pub fn started_at(&self) -> DateTime<Utc> { self.started_at }

  /// The last quota the status source reported, read straight from the
  /// source so every call it makes is reflected.
  pub fn rate_limit(&self) -> Option<RateLimitSnapshot> { self.source.rate_limit() }

  fn log_rate_limit(&self) {
    if let Some(snapshot) = self.source.rate_limit() {
      debug!(
        limit = snapshot.limit,
        remaining = snapshot.remaining,
        reset = %snapshot.reset_time,
        "rate limit updated"
      );
    }
  }

  // ─── Operator operations ───────────────────────────────────────────────────

  /// Resolve `login` on the status source and start tracking it.
  pub async fn track(&self, login: &str) -> Result<TrackedEntity> {
    if self.registry.find_by_name(login).await.is_ok() {
      return Err(Error::AlreadyTracked(login.to_lowercase()));
    }

    let profile = self
      .source
      .find_profile_by_login(login)
      .await?
      .ok_or_else(|| Error::NotFound(format!("twitch user {login}")))?;
    self.log_rate_limit();

    let mut entity = TrackedEntity::new(profile.id, profile.login, profile.display_name);
    entity.profile_image_url = profile.profile_image_url;
    let entity = self.registry.add(entity).await?;
    info!(entity = %entity.login, id = %entity.id, "now tracking");
    Ok(entity)
  }

  /// Subscribe `channel` to the entity named by `key` (id or login).
  ///
  /// `community` is the community the request comes from; the channel must
  /// belong to it.
  pub async fn subscribe(&self, key: &str, channel: &str, community: &str) -> Result<TrackedEntity> {
    let entity = self.registry.find(key).await?;
    let owner = self.gateway.channel_community(channel).await?;
    if owner != community {
      return Err(Error::ForeignDestination {
        channel:   channel.to_owned(),
        community: community.to_owned(),
      });
    }

    let entity = self
      .registry
      .add_subscription(&entity.id, NotificationSubscription::new(channel, owner))
      .await?;
    info!(entity = %entity.login, %channel, %community, "subscription added");
    Ok(entity)
  }

  /// Removing a destination has no defined policy yet.
  pub async fn unsubscribe(&self, key: &str, channel: &str) -> Result<TrackedEntity> {
    let entity = self.registry.find(key).await?;
    warn!(entity = %entity.login, %channel, "unsubscribe requested but not supported");
    Err(Error::Unsupported("removing a subscription"))
  }

  /// Ask the status source about one tracked entity right now.
  pub async fn live_status(&self, key: &str) -> Result<LiveStatus> {
    let entity = self.registry.find(key).await?;
    let mut statuses = self.source.get_status(std::slice::from_ref(&entity.id)).await?;
    self.log_rate_limit();

    let stream = statuses.remove(&entity.id);
    let category = match &stream {
      Some(record) => Some(self.category_name(&record.category_id).await),
      None => None,
    };
    Ok(LiveStatus { phase: entity.phase(), entity, stream, category })
  }

  pub async fn community(&self, community_id: &str) -> Result<CommunitySettings> {
    self
      .registry
      .store()
      .get_community(community_id)
      .await
      .map_err(Error::persistence)?
      .ok_or_else(|| Error::NotFound(format!("community {community_id}")))
  }

  pub async fn put_community(&self, settings: &CommunitySettings) -> Result<()> {
    self
      .registry
      .store()
      .upsert_community(settings)
      .await
      .map_err(Error::persistence)?;
    info!(community = %settings.community_id, "community settings saved");
    Ok(())
  }
}
