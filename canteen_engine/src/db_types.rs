use std::{fmt::Display, str::FromStr};

use canteen_common::Paise;
use chrono::{DateTime, Utc};
use log::error;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Type;
use thiserror::Error;

/// Length of generated order record ids
pub const ORDER_ID_LENGTH: usize = 20;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

//--------------------------------------      Identifiers      ---------------------------------------------------------
string_id!(
    /// The generated identifier of an order record
    OrderId
);
string_id!(CanteenId);
string_id!(
    /// Identity id shared by a profile record and its authentication identity
    AccountId
);
string_id!(
    /// The gateway's payment id. Also the idempotency key for order commits.
    PaymentId
);
string_id!(
    /// The gateway's order (payment intent) id
    IntentId
);
string_id!(
    /// Opaque device or channel endpoint used to route push notifications
    NotificationTarget
);

impl OrderId {
    /// Generates a fresh document-style id of [`ORDER_ID_LENGTH`] alphanumeric characters.
    pub fn random() -> Self {
        let id = rand::thread_rng().sample_iter(&Alphanumeric).take(ORDER_ID_LENGTH).map(char::from).collect();
        Self(id)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The payment has been verified and the order is waiting for the kitchen.
    Pending,
    /// The kitchen has started on the order.
    Preparing,
    /// The order can be collected.
    Ready,
    /// The order has been collected.
    Completed,
    /// The order was cancelled by the canteen.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Preparing => write!(f, "Preparing"),
            OrderStatusType::Ready => write!(f, "Ready"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Preparing" => Ok(Self::Preparing),
            "Ready" => Ok(Self::Ready),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------       ScopeKey        ---------------------------------------------------------
/// Identifies one independent token sequence: a canteen on a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub canteen_id: CanteenId,
    /// Calendar date in the canteen's operating time zone, formatted `YYYY-M-D`
    pub date: String,
}

impl ScopeKey {
    pub fn new<C: Into<CanteenId>, S: Into<String>>(canteen_id: C, date: S) -> Self {
        Self { canteen_id: canteen_id.into(), date: date.into() }
    }
}

impl Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.canteen_id, self.date)
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// The order details supplied by the client when confirming a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: AccountId,
    pub canteen_id: CanteenId,
    /// Line items are opaque to the pipeline and stored as given
    pub items: Vec<Value>,
    pub total_amount: Paise,
    pub payment_id: PaymentId,
    pub intent_id: IntentId,
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: AccountId,
    pub canteen_id: CanteenId,
    pub items: Vec<Value>,
    pub total_amount: Paise,
    pub token_number: String,
    pub status: OrderStatusType,
    pub payment_id: PaymentId,
    pub intent_id: IntentId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The outcome of an idempotent order commit.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitResult {
    /// A token was allocated and a new order record written
    Created(Order),
    /// The payment id had already been committed. Nothing was written.
    AlreadyProcessed(Order),
}

impl CommitResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Created(o) | Self::AlreadyProcessed(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Created(o) | Self::AlreadyProcessed(o) => o,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

//--------------------------------------       Profiles        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    Owner,
    User,
    Admin,
}

impl Display for ProfileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileRole::Owner => write!(f, "owner"),
            ProfileRole::User => write!(f, "user"),
            ProfileRole::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: AccountId,
    pub role: ProfileRole,
    pub display_name: Option<String>,
    pub notification_target: Option<NotificationTarget>,
}

impl NewProfile {
    pub fn new<A: Into<AccountId>>(id: A, role: ProfileRole) -> Self {
        Self { id: id.into(), role, display_name: None, notification_target: None }
    }

    pub fn with_display_name<S: Into<String>>(mut self, name: S) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_notification_target<S: Into<NotificationTarget>>(mut self, target: S) -> Self {
        self.notification_target = Some(target.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: AccountId,
    pub role: ProfileRole,
    pub display_name: Option<String>,
    pub notification_target: Option<NotificationTarget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// The notification target, if one is set and non-empty.
    pub fn target(&self) -> Option<&NotificationTarget> {
        self.notification_target.as_ref().filter(|t| !t.is_empty())
    }

    pub fn name(&self) -> &str {
        self.display_name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or_else(|| self.id.as_str())
    }
}

//--------------------------------------    Document events    ---------------------------------------------------------
/// A persisted change feed has one stream per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStream {
    Order,
    Owner,
}

impl Display for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStream::Order => write!(f, "order"),
            EventStream::Owner => write!(f, "owner"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Created => write!(f, "created"),
            ChangeKind::Updated => write!(f, "updated"),
            ChangeKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// One entry in a document change stream. `seq` is strictly increasing across all streams.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEvent {
    pub seq: i64,
    pub stream: EventStream,
    pub kind: ChangeKind,
    pub document_id: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      PendingReap      ---------------------------------------------------------
/// An owner whose profile was deleted but whose authentication identity has not been removed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReap {
    pub owner_id: AccountId,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
