//! Delivery of one transition's card to every subscribed destination.

use tensei_core::{
  DeliveryError, card::Card, entity::TrackedEntity, gateway::MessageGateway,
  transition::Transition,
};
use tracing::{error, warn};

/// Per-destination outcome counts for one fan-out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanoutReport {
  pub sent:    usize,
  pub edited:  usize,
  pub failed:  usize,
  /// Destinations with nothing to do (an ended broadcast with no card).
  pub skipped: usize,
}

/// Send or edit `card` at every destination of `entity`, in subscription
/// order, recording handles on the entity as they change.
///
/// Never fails: each destination's error is logged and counted, then the
/// next destination is tried. Destinations whose channel is gone stay
/// subscribed.
pub async fn apply<Gw: MessageGateway>(
  gateway: &Gw,
  entity: &mut TrackedEntity,
  transition: Transition,
  card: &Card,
) -> FanoutReport {
  let mut report = FanoutReport::default();

  for sub in &mut entity.subscriptions {
    let channel = sub.destination_channel.as_str();

    let result = match (transition, sub.last_message_handle.as_deref()) {
      (Transition::Started, _) | (Transition::Update, None) => {
        sub.last_message_handle = None;
        gateway.send(channel, card).await.map(|handle| {
          sub.last_message_handle = Some(handle);
          report.sent += 1;
        })
      }
      (Transition::Update | Transition::Ended, Some(handle)) => gateway
        .edit(channel, handle, card)
        .await
        .map(|()| report.edited += 1),
      (Transition::Ended, None) | (Transition::CoolingOff | Transition::StillOffline, _) => {
        report.skipped += 1;
        Ok(())
      }
    };

    match result {
      Ok(()) => {}
      Err(DeliveryError::ChannelMissing(_)) => {
        report.failed += 1;
        warn!(entity = %entity.login, %channel, "destination channel no longer exists");
      }
      Err(DeliveryError::MessageMissing(_)) => {
        report.failed += 1;
        // The card was deleted; a new one goes out on the next live tick.
        sub.last_message_handle = None;
        warn!(entity = %entity.login, %channel, "tracked card was deleted");
      }
      Err(err) => {
        report.failed += 1;
        error!(entity = %entity.login, %channel, ?transition, error = %err, "delivery failed");
      }
    }
  }

  if transition == Transition::Ended {
    entity.clear_handles();
  }
  report
}
