//! Handlers for `/entities` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/entities` | Registration order |
//! | `POST`   | `/entities` | Body: `{"login":"foo"}` |
//! | `GET`    | `/entities/{id}` | Id or login; 404 if not tracked |
//! | `GET`    | `/entities/{id}/live` | Asks the status source now |
//! | `POST`   | `/entities/{id}/subscriptions` | Body: `{"channel":"..","community":".."}` |
//! | `DELETE` | `/entities/{id}/subscriptions/{channel}` | Always 501 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tensei_core::{
  entity::TrackedEntity, gateway::MessageGateway, source::StatusSource, store::EntityStore,
};
use tensei_engine::{LiveStatus, Monitor};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /entities`
pub async fn list<St, Src, Gw>(
  State(monitor): State<Arc<Monitor<St, Src, Gw>>>,
) -> Json<Vec<TrackedEntity>>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  Json(monitor.registry().snapshot().await)
}

// ─── Track ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TrackBody {
  pub login: String,
}

/// `POST /entities`: body: `{"login":"foo"}`
pub async fn create<St, Src, Gw>(
  State(monitor): State<Arc<Monitor<St, Src, Gw>>>,
  Json(body): Json<TrackBody>,
) -> Result<impl IntoResponse, ApiError>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  let login = body.login.trim();
  if login.is_empty() {
    return Err(ApiError::BadRequest("login must not be empty".into()));
  }
  let entity = monitor.track(login).await?;
  Ok((StatusCode::CREATED, Json(entity)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /entities/{id}`
pub async fn get_one<St, Src, Gw>(
  State(monitor): State<Arc<Monitor<St, Src, Gw>>>,
  Path(id): Path<String>,
) -> Result<Json<TrackedEntity>, ApiError>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  Ok(Json(monitor.registry().find(&id).await?))
}

/// `GET /entities/{id}/live`
pub async fn live<St, Src, Gw>(
  State(monitor): State<Arc<Monitor<St, Src, Gw>>>,
  Path(id): Path<String>,
) -> Result<Json<LiveStatus>, ApiError>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  Ok(Json(monitor.live_status(&id).await?))
}

// ─── Subscriptions ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscribeBody {
  pub channel:   String,
  /// The community the request is made on behalf of.
  pub community: String,
}

/// `POST /entities/{id}/subscriptions`
pub async fn subscribe<St, Src, Gw>(
  State(monitor): State<Arc<Monitor<St, Src, Gw>>>,
  Path(id): Path<String>,
  Json(body): Json<SubscribeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  let entity = monitor
    .subscribe(&id, &body.channel, &body.community)
    .await?;
  Ok((StatusCode::CREATED, Json(entity)))
}

/// `DELETE /entities/{id}/subscriptions/{channel}`
pub async fn unsubscribe<St, Src, Gw>(
  State(monitor): State<Arc<Monitor<St, Src, Gw>>>,
  Path((id, channel)): Path<(String, String)>,
) -> Result<Json<TrackedEntity>, ApiError>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  Ok(Json(monitor.unsubscribe(&id, &channel).await?))
}
