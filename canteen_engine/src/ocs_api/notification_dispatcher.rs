use futures_util::future::join_all;
use log::*;

use crate::{
    db_types::{NotificationTarget, ProfileRole},
    events::{OrderCreatedEvent, OrderStatusChangedEvent, OwnerCreatedEvent, OwnerDeletedEvent, TriggerEvent},
    ocs_api::{account_reaper::AccountReaper, notification_objects::PushMessage},
    traits::{IdentityStore, ProfileManagement, PushTransport, ReapLedger},
};

/// Reacts to order and owner lifecycle events.
///
/// Every handler is best effort. Lookup misses mean there is nobody to notify; lookup and delivery failures are
/// logged and dropped. Nothing here can fail or roll back the change that produced the event.
#[derive(Clone)]
pub struct NotificationDispatcher<B, T, I> {
    profiles: B,
    transport: T,
    reaper: AccountReaper<B, I>,
}

impl<B, T, I> NotificationDispatcher<B, T, I> {
    pub fn new(profiles: B, transport: T, reaper: AccountReaper<B, I>) -> Self {
        Self { profiles, transport, reaper }
    }
}

impl<B, T, I> NotificationDispatcher<B, T, I>
where
    B: ProfileManagement + ReapLedger,
    T: PushTransport,
    I: IdentityStore,
{
    pub async fn dispatch(&self, event: &TriggerEvent) {
        match event {
            TriggerEvent::OrderCreated(ev) => self.on_order_created(ev).await,
            TriggerEvent::OrderStatusChanged(ev) => self.on_order_status_changed(ev).await,
            TriggerEvent::OwnerCreated(ev) => self.on_owner_created(ev).await,
            TriggerEvent::OwnerDeleted(ev) => self.on_owner_deleted(ev).await,
        }
    }

    /// Tells the canteen owner that a paid order has arrived.
    pub async fn on_order_created(&self, event: &OrderCreatedEvent) {
        let order = &event.order;
        let owner = match self.profiles.owner_for_canteen(&order.canteen_id).await {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                debug!("📣️ Canteen {} has no owner profile. Order {} goes unannounced.", order.canteen_id, order.id);
                return;
            },
            Err(e) => {
                warn!("📣️ Could not look up the owner of canteen {}: {e}", order.canteen_id);
                return;
            },
        };
        let Some(target) = owner.target() else {
            debug!("📣️ Owner {} has no notification target. Order {} goes unannounced.", owner.id, order.id);
            return;
        };
        self.send(target, &PushMessage::new_order(order)).await;
    }

    /// Tells the customer that their order moved on. Updates that leave the status alone are ignored.
    pub async fn on_order_status_changed(&self, event: &OrderStatusChangedEvent) {
        if !event.status_changed() {
            trace!("📣️ Order {} was updated but its status is still {}", event.after.id, event.after.status);
            return;
        }
        let order = &event.after;
        let user = match self.profiles.fetch_profile(ProfileRole::User, &order.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("📣️ User {} has no profile. Status change of order {} not sent.", order.user_id, order.id);
                return;
            },
            Err(e) => {
                warn!("📣️ Could not look up user {}: {e}", order.user_id);
                return;
            },
        };
        let Some(target) = user.target() else {
            debug!("📣️ User {} has no notification target.", user.id);
            return;
        };
        self.send(target, &PushMessage::status_update(order)).await;
    }

    /// Asks every admin to approve the new owner. A failed delivery to one admin does not affect the others.
    pub async fn on_owner_created(&self, event: &OwnerCreatedEvent) {
        let admins = match self.profiles.admin_profiles().await {
            Ok(admins) => admins,
            Err(e) => {
                warn!("📣️ Could not fetch admin profiles: {e}");
                return;
            },
        };
        let message = PushMessage::owner_pending_approval(&event.profile);
        let targets = admins.iter().filter_map(|a| a.target()).collect::<Vec<_>>();
        if targets.is_empty() {
            debug!("📣️ No admin can be notified about new owner {}", event.profile.id);
            return;
        }
        let results = join_all(targets.iter().map(|t| self.send(t, &message))).await;
        let delivered = results.into_iter().filter(|ok| *ok).count();
        info!("📣️ New owner {} announced to {delivered} of {} admin(s)", event.profile.id, targets.len());
    }

    pub async fn on_owner_deleted(&self, event: &OwnerDeletedEvent) {
        let outcome = self.reaper.reap(&event.owner_id).await;
        debug!("📣️ Owner {} deleted. Identity reap: {outcome:?}", event.owner_id);
    }

    async fn send(&self, target: &NotificationTarget, message: &PushMessage) -> bool {
        match self.transport.send(target, message).await {
            Ok(()) => {
                trace!("📣️ '{}' delivered", message.title);
                true
            },
            Err(e) => {
                warn!("📣️ Could not deliver '{}': {e}", message.title);
                false
            },
        }
    }
}
