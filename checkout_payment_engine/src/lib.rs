//! Checkout Payment Engine
//!
//! The checkout payment engine is the core of the retail checkout flow: it accepts validated order requests
//! (cash-on-delivery or online), computes trustworthy totals from authoritative catalog prices, and reconciles
//! online orders against the payment gateway's asynchronous, at-least-once event notifications. It is
//! provider-agnostic: the gateway, the order store, the product catalog and the purchaser's cart are all
//! expressed as trait contracts.
//!
//! The library is divided into three main sections:
//! 1. The trait contracts ([`mod@traits`]). These define what the engine requires from a durable order store, a
//!    product catalog, a cart, and a payment session gateway. SQLite is the bundled backend; you should never
//!    need to access the database directly.
//! 2. The order flow API ([`OrderFlowApi`]). Placement (validation, pricing, persistence, payment session
//!    creation) and reconciliation (the idempotent per-order state machine driven by gateway events).
//! 3. The data types ([`mod@db_types`], [`mod@order_objects`]) shared across the engine and its callers.
pub mod db_types;
mod order_flow;
pub mod order_objects;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

pub use order_flow::{api::OrderFlowApi, errors::OrderFlowError, pricing};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
