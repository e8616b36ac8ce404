use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use cps_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        OrderId        -------------------------------------------------------
/// Opaque order identifier. Assigned once at creation and never changed; this is the reference that payment-session
/// metadata carries back to us in gateway notifications.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh random order id.
    pub fn random() -> Self {
        Self(format!("ord-{:016x}", rand::random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------        OwnerId        -------------------------------------------------------
/// The purchasing identity that owns an order and a cart. Resolved by the authentication boundary; the core never
/// derives this from request payloads.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for OwnerId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       ProductId       -------------------------------------------------------
/// A lightweight wrapper around a string referencing a product in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for ProductId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       AddressId       -------------------------------------------------------
/// A reference to a previously stored delivery address. The order keeps the reference only; address records live with
/// the (out of scope) address book.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct AddressId(pub String);

impl Display for AddressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for AddressId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------      PaymentType      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentType {
    /// The order is settled in cash when it is delivered. No payment session exists for these orders.
    CashOnDelivery,
    /// The order is settled through the external payment gateway and must be reconciled via webhook events.
    Online,
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentType::CashOnDelivery => write!(f, "CashOnDelivery"),
            PaymentType::Online => write!(f, "Online"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid payment type: {0}")]
pub struct PaymentTypeConversionError(String);

impl FromStr for PaymentType {
    type Err = PaymentTypeConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CashOnDelivery" => Ok(Self::CashOnDelivery),
            "Online" => Ok(Self::Online),
            s => Err(PaymentTypeConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     PaymentState      -------------------------------------------------------
/// Settlement state of an order. For `CashOnDelivery` orders this is a display-only flag. For `Online` orders it is
/// the authoritative gate: the order is invisible to its owner and to fulfilment until it reads `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentState {
    Unpaid,
    Paid,
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentState::Unpaid => write!(f, "Unpaid"),
            PaymentState::Paid => write!(f, "Paid"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid payment state: {0}")]
pub struct PaymentStateConversionError(String);

impl FromStr for PaymentState {
    type Err = PaymentStateConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(Self::Unpaid),
            "Paid" => Ok(Self::Paid),
            s => Err(PaymentStateConversionError(s.to_string())),
        }
    }
}

//--------------------------------------       LineItem        -------------------------------------------------------
/// A single `{product, quantity}` pair in a checkout request or a stored order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl LineItem {
    pub fn new<P: Into<ProductId>>(product_id: P, quantity: i64) -> Self {
        Self { product_id: product_id.into(), quantity }
    }
}

//--------------------------------------        Product        -------------------------------------------------------
/// Catalog record, read as the authoritative price source when totals are computed.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Cents,
}

//--------------------------------------         Order         -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub owner_id: OwnerId,
    pub address_id: AddressId,
    /// The total, derived server-side from catalog prices at placement time. Never accepted from a client.
    pub amount: Cents,
    pub payment_type: PaymentType,
    pub payment_state: PaymentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Loaded from the order_items table after the row fetch.
    #[sqlx(skip)]
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Order {
    /// The single authoritative visibility rule: cash orders are always visible, online orders only once paid.
    pub fn is_visible(&self) -> bool {
        self.payment_type == PaymentType::CashOnDelivery || self.payment_state == PaymentState::Paid
    }
}

//--------------------------------------       NewOrder        -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub owner_id: OwnerId,
    pub address_id: AddressId,
    pub amount: Cents,
    pub payment_type: PaymentType,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Creates a new order record in the initial `Unpaid` state with a freshly assigned id.
    pub fn new(
        owner_id: OwnerId,
        address_id: AddressId,
        amount: Cents,
        payment_type: PaymentType,
        items: Vec<LineItem>,
    ) -> Self {
        Self {
            order_id: OrderId::random(),
            owner_id,
            address_id,
            amount,
            payment_type,
            items,
            created_at: Utc::now(),
        }
    }
}
