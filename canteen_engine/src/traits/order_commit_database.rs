use crate::{
    db_types::{CommitResult, NewOrder, Order, OrderId, OrderStatusType, PaymentId, ScopeKey},
    helpers::IsTransient,
};

/// Durable storage of order records.
#[allow(async_fn_in_trait)]
pub trait OrderCommitDatabase: Clone {
    type Error: std::error::Error + IsTransient;

    /// In a single serializable transaction:
    /// * allocates the next token for `scope`,
    /// * checks whether `order.payment_id` has already been committed. If so, the transaction is rolled back and the
    ///   existing order is returned as [`CommitResult::AlreadyProcessed`],
    /// * writes a new `Pending` order carrying the token. The order's payment id is unique, so the order row is also
    ///   the record that the payment has been processed,
    /// * appends an `order/created` entry to the order change stream.
    ///
    /// If two commits race, the loser fails with a transient error and can be retried from scratch.
    async fn commit_order(&self, scope: &ScopeKey, order: NewOrder) -> Result<CommitResult, Self::Error>;

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, Self::Error>;

    async fn fetch_order_by_payment_id(&self, payment_id: &PaymentId) -> Result<Option<Order>, Self::Error>;

    /// Sets the order status and appends an `order/updated` entry carrying the before and after snapshots. The entry
    /// is written even if the status is unchanged; consumers decide whether the change is interesting.
    ///
    /// Returns the updated order.
    async fn update_order_status(&self, id: &OrderId, status: OrderStatusType) -> Result<Order, Self::Error>;
}
