//! The in-memory entity registry.
//!
//! The registry owns the authoritative list of tracked entities while the
//! process runs. Every mutation takes the write lock for both the list update
//! and the store write, so commands and poll workers serialise here and
//! nowhere else. [`Registry::snapshot`] copies under a short read lock so no
//! network call ever runs while the lock is held.

use tensei_core::{
  Error, Result,
  entity::{NotificationSubscription, TrackedEntity},
  store::EntityStore,
};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

pub struct Registry<St> {
  store:    St,
  entities: RwLock<Vec<TrackedEntity>>,
}

impl<St: EntityStore> Registry<St> {
  /// Build the registry from everything the store holds.
  pub async fn load(store: St) -> Result<Self> {
    let entities = store.load_all().await.map_err(Error::persistence)?;
    debug!(entities = entities.len(), "registry loaded");
    Ok(Self { store, entities: RwLock::new(entities) })
  }

  pub fn store(&self) -> &St { &self.store }

  /// A point-in-time copy of every entity, in registration order.
  pub async fn snapshot(&self) -> Vec<TrackedEntity> { self.entities.read().await.clone() }

  pub async fn len(&self) -> usize { self.entities.read().await.len() }

  // ─── Lookups ───────────────────────────────────────────────────────────────

  pub async fn find_by_id(&self, id: &str) -> Result<TrackedEntity> {
    self
      .entities
      .read()
      .await
      .iter()
      .find(|e| e.id == id)
      .cloned()
      .ok_or_else(|| Error::NotFound(format!("entity {id}")))
  }

  /// Case-insensitive exact match on the login name.
  pub async fn find_by_name(&self, name: &str) -> Result<TrackedEntity> {
    self
      .entities
      .read()
      .await
      .iter()
      .find(|e| e.login.eq_ignore_ascii_case(name))
      .cloned()
      .ok_or_else(|| Error::NotFound(format!("entity {name}")))
  }

  /// Resolve an operator-supplied reference: an id first, then a name.
  pub async fn find(&self, key: &str) -> Result<TrackedEntity> {
    match self.find_by_id(key).await {
      Err(Error::NotFound(_)) => self.find_by_name(key).await,
      other => other,
    }
  }

  // ─── Mutations ─────────────────────────────────────────────────────────────

  /// Start tracking a new entity.
  ///
  /// The entity is in the registry once this returns, even if the store
  /// write failed.
  pub async fn add(&self, entity: TrackedEntity) -> Result<TrackedEntity> {
    let mut entities = self.entities.write().await;
    if entities
      .iter()
      .any(|e| e.id == entity.id || e.login == entity.login)
    {
      return Err(Error::AlreadyTracked(entity.login));
    }

    entities.push(entity.clone());
    self.persist(&entity).await;
    Ok(entity)
  }

  /// Append a destination to an entity. Fails if the channel is already
  /// subscribed to that entity.
  pub async fn add_subscription(
    &self,
    entity_id: &str,
    subscription: NotificationSubscription,
  ) -> Result<TrackedEntity> {
    let mut entities = self.entities.write().await;
    let current = entities
      .iter_mut()
      .find(|e| e.id == entity_id)
      .ok_or_else(|| Error::NotFound(format!("entity {entity_id}")))?;

    if current.has_subscription(&subscription.destination_channel) {
      return Err(Error::AlreadySubscribed {
        entity:  current.login.clone(),
        channel: subscription.destination_channel,
      });
    }

    current.subscriptions.push(subscription);
    self.persist(current).await;
    Ok(current.clone())
  }

  /// Commit a worker's copy of an entity back into the registry, then persist.
  ///
  /// Only the fields a poll cycle owns are taken from `worked`: descriptive
  /// profile data, the stream timestamps, and each destination's handle.
  /// Subscriptions added while the worker ran are kept. A failed store write
  /// is logged and the in-memory state stays as committed.
  pub async fn update_after_cycle(&self, worked: TrackedEntity) {
    let mut entities = self.entities.write().await;
    let Some(current) = entities.iter_mut().find(|e| e.id == worked.id) else {
      warn!(entity = %worked.login, "entity vanished during poll cycle");
      return;
    };

    current.login = worked.login;
    current.display_name = worked.display_name;
    current.profile_image_url = worked.profile_image_url;
    current.stream_start_time = worked.stream_start_time;
    current.stream_end_time = worked.stream_end_time;
    for sub in &mut current.subscriptions {
      if let Some(done) = worked
        .subscriptions
        .iter()
        .find(|w| w.subscription_id == sub.subscription_id)
      {
        sub.last_message_handle = done.last_message_handle.clone();
      }
    }

    self.persist(current).await;
  }

  /// Mirror `entity` to the store. Failures are logged and never undo the
  /// in-memory change; the next successful save catches the store up.
  async fn persist(&self, entity: &TrackedEntity) {
    if let Err(err) = self.store.upsert(entity).await {
      error!(entity = %entity.login, error = %err, "failed to persist entity");
    }
  }
}
