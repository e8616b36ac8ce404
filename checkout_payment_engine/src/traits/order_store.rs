use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId},
    order_objects::OrderQueryFilter,
    traits::data_objects::DeleteOutcome,
};

/// The durable order repository contract.
///
/// Orders are append-on-create. After creation, exactly two mutations exist, both driven by the reconciliation
/// flow, and both are single conditional operations so that replaying them is harmless:
///
/// * [`OrderStore::mark_paid_once`] transitions an unpaid online order to `Paid` and reports whether the
///   transition actually happened.
/// * [`OrderStore::delete_unpaid_order`] removes an unpaid online order, refusing to touch a paid one.
///
/// No other code path may modify an order.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Persists a new order, returning the stored record (including its assigned row id and timestamps).
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Fetches an order by its public order id, with line items attached.
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Fetches orders according to the criteria in the filter, newest first.
    ///
    /// Every caller that surfaces orders to a purchaser or to fulfilment staff must use the filter's
    /// `visible_only` flag rather than re-implementing the visibility rule.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StoreError>;

    /// Marks the given online order as `Paid` iff it is currently `Unpaid`.
    ///
    /// Returns the updated order when the transition happened, and `None` when there was nothing to do (the
    /// order is already paid, is not an online order, or does not exist). Safe to call any number of times.
    async fn mark_paid_once(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Deletes the given online order iff it is still `Unpaid`. A paid order is left untouched and reported as
    /// [`DeleteOutcome::AlreadyPaid`]; a missing order is a no-op. Safe to call any number of times.
    async fn delete_unpaid_order(&self, order_id: &OrderId) -> Result<DeleteOutcome, StoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
