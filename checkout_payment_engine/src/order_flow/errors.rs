use thiserror::Error;

use crate::{
    db_types::{OrderId, ProductId},
    traits::StoreError,
};

/// The closed error set for the order flow. Every failure a caller can observe maps onto one of these kinds;
/// messages are for humans, the kind is the contract.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    /// The checkout request is structurally invalid (missing address, empty item list). Nothing was persisted.
    #[error("Invalid order request. {0}")]
    InvalidRequest(String),
    /// A line item references a product the catalog cannot resolve. The whole request is rejected and nothing
    /// was persisted.
    #[error("Order contains an unknown product reference: {0}")]
    InvalidLineItem(ProductId),
    /// A gateway call failed or timed out. For placement this means the order exists but payment was not
    /// initiated; the call is never retried automatically.
    #[error("The payment gateway is unavailable. {0}")]
    GatewayUnavailable(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    /// A payment event whose reference matches no known checkout session. Surfaced as an error so the gateway
    /// redelivers later; the session may simply not be queryable yet.
    #[error("No checkout session matches payment reference {0}")]
    UnmatchedPaymentEvent(String),
    #[error("Internal database error. {0}")]
    DatabaseError(String),
}

impl From<StoreError> for OrderFlowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DatabaseError(msg) => OrderFlowError::DatabaseError(msg),
            StoreError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
        }
    }
}
