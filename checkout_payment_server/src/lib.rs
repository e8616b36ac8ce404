//! # Checkout payment server
//! This crate hosts the HTTP layer of the checkout payment system. It is responsible for:
//! Resolving the authenticated identity at the boundary and passing it into the engine as a validated parameter.
//! Accepting order placement requests (cash-on-delivery and online) and returning payment redirect URLs.
//! Receiving signed webhook deliveries from the payment gateway as raw bytes and feeding verified events to the
//! reconciliation flow.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/order/cod`: Place a cash-on-delivery order.
//! * `/api/order/online`: Place an online order; responds with the gateway payment page URL.
//! * `/api/order/mine`: The authenticated purchaser's visible orders.
//! * `/api/order/fulfillment`: All fulfillable orders (requires the Fulfillment role).
//! * `/stripe`: The webhook receiver for payment gateway event deliveries.
pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
