use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Profile};

pub const NEW_ORDER_TITLE: &str = "New Order Received!";
pub const STATUS_UPDATE_TITLE: &str = "Order Update";
pub const OWNER_APPROVAL_TITLE: &str = "New Canteen Owner Awaiting Approval";

/// A push notification as handed to the transport. `data` is delivered to the app alongside the visible text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    pub fn new<T: Into<String>, B: Into<String>>(title: T, body: B) -> Self {
        Self { title: title.into(), body: body.into(), data: BTreeMap::new() }
    }

    pub fn with_data<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Sent to the canteen owner when a paid order lands.
    pub fn new_order(order: &Order) -> Self {
        Self::new(NEW_ORDER_TITLE, format!("You have a new order with token #{}.", order.token_number))
            .with_data("orderId", order.id.as_str())
            .with_data("tokenNumber", order.token_number.as_str())
    }

    /// Sent to the customer when the kitchen moves their order along.
    pub fn status_update(order: &Order) -> Self {
        Self::new(
            STATUS_UPDATE_TITLE,
            format!("Your order with token #{} is now {}.", order.token_number, order.status),
        )
        .with_data("orderId", order.id.as_str())
        .with_data("status", order.status.to_string())
    }

    /// Sent to every admin when a new canteen owner signs up.
    pub fn owner_pending_approval(owner: &Profile) -> Self {
        Self::new(OWNER_APPROVAL_TITLE, format!("{} has registered and is waiting for approval.", owner.name()))
            .with_data("ownerId", owner.id.as_str())
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::db_types::{OrderStatusType, ProfileRole};

    #[test]
    fn message_text() {
        let now = Utc::now();
        let order = Order {
            id: "abc".into(),
            user_id: "u1".into(),
            canteen_id: "C1".into(),
            items: vec![],
            total_amount: canteen_common::Paise::from(5000),
            token_number: "12".into(),
            status: OrderStatusType::Ready,
            payment_id: "pay_1".into(),
            intent_id: "order_1".into(),
            created_at: now,
            updated_at: now,
        };
        let msg = PushMessage::new_order(&order);
        assert_eq!(msg.title, NEW_ORDER_TITLE);
        assert_eq!(msg.body, "You have a new order with token #12.");
        assert_eq!(msg.data["orderId"], "abc");

        let msg = PushMessage::status_update(&order);
        assert_eq!(msg.body, "Your order with token #12 is now Ready.");
        assert_eq!(msg.data["status"], "Ready");

        let owner = Profile {
            id: "o1".into(),
            role: ProfileRole::Owner,
            display_name: Some("Campus Bites".into()),
            notification_target: None,
            created_at: now,
            updated_at: now,
        };
        let msg = PushMessage::owner_pending_approval(&owner);
        assert_eq!(msg.body, "Campus Bites has registered and is waiting for approval.");
    }
}
