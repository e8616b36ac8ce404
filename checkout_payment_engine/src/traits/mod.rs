//! # Backend and collaborator contracts.
//!
//! This module defines the interface contracts the order flow core is written against. The core itself owns no
//! state; everything durable or external sits behind one of these traits.
//!
//! * [`OrderStore`] is the durable order repository: append-on-create, conditional single-statement state
//!   transitions, and filtered lookups. It is the sole coordination point between concurrent request handlers.
//! * [`ProductCatalog`] is the read-only price source used when order totals are computed.
//! * [`CartManagement`] exposes the one cross-cutting mutation the reconciliation flow needs: clearing a
//!   purchaser's cart after a successful payment.
//! * [`PaymentSessionGateway`] is the contract this engine expects from an external payment gateway: create a
//!   hosted checkout session, verify and parse signed event notifications, and look sessions up by payment
//!   reference.
mod cart_management;
mod data_objects;
mod order_store;
mod payment_gateway;
mod product_catalog;

pub use cart_management::CartManagement;
pub use data_objects::{DeleteOutcome, EventOutcome};
pub use order_store::{OrderStore, StoreError};

/// A complete engine backend: order store, price source and cart in one. Implemented automatically for any type
/// that provides the three contracts; exists so callers can name the full requirement with a single bound.
pub trait CheckoutBackend: OrderStore + ProductCatalog + CartManagement {}

impl<T> CheckoutBackend for T where T: OrderStore + ProductCatalog + CartManagement {}

pub use payment_gateway::{
    CheckoutSession,
    GatewayError,
    NewSessionRequest,
    PaymentEvent,
    PaymentSessionGateway,
    SessionLineItem,
    SessionMetadata,
};
pub use product_catalog::ProductCatalog;
