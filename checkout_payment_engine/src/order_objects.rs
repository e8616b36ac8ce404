use std::fmt::Display;

use cps_common::Cents;
use serde::{Deserialize, Serialize};

use crate::db_types::{AddressId, LineItem, Order, OwnerId, PaymentState, PaymentType};

//--------------------------------------   NewOrderRequest     -------------------------------------------------------
/// A checkout request as it arrives from the boundary, before validation. The owner is deliberately absent: it is
/// resolved by the authentication layer and passed alongside, never read from the payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub items: Vec<LineItem>,
    pub address_id: Option<AddressId>,
}

impl NewOrderRequest {
    pub fn new(items: Vec<LineItem>, address_id: AddressId) -> Self {
        Self { items, address_id: Some(address_id) }
    }
}

//--------------------------------------   OrderQueryFilter    -------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub owner_id: Option<OwnerId>,
    pub payment_type: Option<PaymentType>,
    pub payment_state: Option<PaymentState>,
    /// When set, only orders passing the visibility rule (`CashOnDelivery` OR `Paid`) are returned. This flag is
    /// the single place the rule is spelled out; both the purchaser and the fulfilment listings set it.
    #[serde(default)]
    pub visible_only: bool,
}

impl OrderQueryFilter {
    pub fn for_owner(mut self, owner_id: OwnerId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn with_payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = Some(payment_type);
        self
    }

    pub fn with_payment_state(mut self, payment_state: PaymentState) -> Self {
        self.payment_state = Some(payment_state);
        self
    }

    pub fn visible_only(mut self) -> Self {
        self.visible_only = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.owner_id.is_none() && self.payment_type.is_none() && self.payment_state.is_none() && !self.visible_only
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(owner_id) = &self.owner_id {
            write!(f, "owner_id: {owner_id}. ")?;
        }
        if let Some(payment_type) = &self.payment_type {
            write!(f, "payment_type: {payment_type}. ")?;
        }
        if let Some(payment_state) = &self.payment_state {
            write!(f, "payment_state: {payment_state}. ")?;
        }
        if self.visible_only {
            write!(f, "visible only. ")?;
        }
        Ok(())
    }
}

//--------------------------------------      OrderResult      -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub total_amount: Cents,
    pub orders: Vec<Order>,
}

impl OrderResult {
    pub fn new(orders: Vec<Order>) -> Self {
        let total_amount = orders.iter().map(|o| o.amount).sum();
        Self { total_amount, orders }
    }
}
