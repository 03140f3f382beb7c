//! Command relay and rate-limit inspection.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;
use tensei_core::{
  card::Card, gateway::MessageGateway, ratelimit::RateLimitSnapshot, source::StatusSource,
  store::EntityStore,
};
use tensei_engine::{Monitor, commands::CommandEvent};

#[derive(Debug, Serialize)]
pub struct RelayResponse {
  /// The card posted back to the channel; `null` if the message was ignored.
  pub reply: Option<Card>,
}

/// `POST /commands`: feed one chat message through the dispatcher.
pub async fn relay<St, Src, Gw>(
  State(monitor): State<Arc<Monitor<St, Src, Gw>>>,
  Json(event): Json<CommandEvent>,
) -> Json<RelayResponse>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  let reply = monitor.dispatch(&event, Utc::now()).await;
  Json(RelayResponse { reply })
}

/// `GET /ratelimit`: `null` until the source has answered once.
pub async fn rate_limit<St, Src, Gw>(
  State(monitor): State<Arc<Monitor<St, Src, Gw>>>,
) -> Json<Option<RateLimitSnapshot>>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  Json(monitor.rate_limit())
}
