//! JSON REST API for operating the notifier.
//!
//! Exposes an axum [`Router`] backed by a shared [`Monitor`]. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tensei_api::api_router(monitor.clone()))
//! ```

pub mod commands;
pub mod communities;
pub mod entities;
pub mod error;


use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use tensei_core::{gateway::MessageGateway, source::StatusSource, store::EntityStore};
use tensei_engine::Monitor;

pub use error::ApiError;

/// Build a fully-materialised API router for `monitor`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<St, Src, Gw>(monitor: Arc<Monitor<St, Src, Gw>>) -> Router<()>
where
  St: EntityStore + 'static,
  Src: StatusSource + 'static,
  Gw: MessageGateway + 'static,
{
  Router::new()
    // Entities
    .route(
      "/entities",
      get(entities::list::<St, Src, Gw>).post(entities::create::<St, Src, Gw>),
    )
    .route("/entities/{id}", get(entities::get_one::<St, Src, Gw>))
    .route("/entities/{id}/live", get(entities::live::<St, Src, Gw>))
    .route(
      "/entities/{id}/subscriptions",
      post(entities::subscribe::<St, Src, Gw>),
    )
    .route(
      "/entities/{id}/subscriptions/{channel}",
      delete(entities::unsubscribe::<St, Src, Gw>),
    )
    // Communities
    .route(
      "/communities/{id}",
      get(communities::get_one::<St, Src, Gw>).put(communities::put::<St, Src, Gw>),
    )
    // Source quota and commands
    .route("/ratelimit", get(commands::rate_limit::<St, Src, Gw>))
    .route("/commands", post(commands::relay::<St, Src, Gw>))
    .with_state(monitor)
}
