//! The `MessageGateway` trait: how cards reach chat destinations.
//!
//! Implemented by `tensei-discord`. Every call succeeds or fails on its own;
//! callers decide how a failure affects sibling destinations.

use std::future::Future;

use crate::{DeliveryError, card::Card};

pub trait MessageGateway: Send + Sync {
  /// Post a new card to `channel` and return its handle.
  fn send<'a>(
    &'a self,
    channel: &'a str,
    card: &'a Card,
  ) -> impl Future<Output = Result<String, DeliveryError>> + Send + 'a;

  /// Replace the content of a previously sent card in place.
  fn edit<'a>(
    &'a self,
    channel: &'a str,
    handle: &'a str,
    card: &'a Card,
  ) -> impl Future<Output = Result<(), DeliveryError>> + Send + 'a;

  /// The community a channel belongs to.
  fn channel_community<'a>(
    &'a self,
    channel: &'a str,
  ) -> impl Future<Output = Result<String, DeliveryError>> + Send + 'a;
}
