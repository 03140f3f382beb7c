//! Handlers for `/communities` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Deserialize;
use tensei_core::{
  entity::{CommunitySettings, DEFAULT_COMMAND_COOLDOWN_SECS},
  gateway::MessageGateway,
  source::StatusSource,
  store::EntityStore,
};
use tensei_engine::Monitor;

use crate::error::ApiError;

/// `GET /communities/{id}`
pub async fn get_one<St, Src, Gw>(
  State(monitor): State<Arc<Monitor<St, Src, Gw>>>,
  Path(id): Path<String>,
) -> Result<Json<CommunitySettings>, ApiError>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  Ok(Json(monitor.community(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PutBody {
  pub owner_id:              String,
  #[serde(default)]
  pub admin_role_id:         Option<String>,
  #[serde(default = "default_cooldown")]
  pub command_cooldown_secs: i64,
}

fn default_cooldown() -> i64 { DEFAULT_COMMAND_COOLDOWN_SECS }

/// `PUT /communities/{id}`: replaces the community's settings.
pub async fn put<St, Src, Gw>(
  State(monitor): State<Arc<Monitor<St, Src, Gw>>>,
  Path(id): Path<String>,
  Json(body): Json<PutBody>,
) -> Result<Json<CommunitySettings>, ApiError>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  if body.command_cooldown_secs < 0 {
    return Err(ApiError::BadRequest("command_cooldown_secs must not be negative".into()));
  }

  let settings = CommunitySettings {
    community_id:          id,
    owner_id:              body.owner_id,
    admin_role_id:         body.admin_role_id,
    command_cooldown_secs: body.command_cooldown_secs,
  };
  monitor.put_community(&settings).await?;
  Ok(Json(settings))
}
