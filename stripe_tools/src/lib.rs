//! Thin client for the hosted-checkout payment gateway.
//!
//! This crate knows the wire formats only: creating and listing checkout sessions over REST, and verifying the
//! signature on webhook deliveries. It has no opinion about orders or carts; the payment engine consumes it
//! through an adapter.
mod api;
mod config;
mod error;
mod webhook;

mod data_objects;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{
    CheckoutSession,
    EventData,
    EventObject,
    NewCheckoutSession,
    SessionLineItem,
    StripeEvent,
    EVENT_PAYMENT_FAILED,
    EVENT_PAYMENT_SUCCEEDED,
};
pub use error::StripeApiError;
pub use webhook::{sign_payload, verify_webhook_payload, WebhookError, SIGNATURE_HEADER};
