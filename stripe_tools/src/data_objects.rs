use std::collections::HashMap;

use cps_common::Cents;
use serde::{Deserialize, Serialize};

//--------------------------------------  NewCheckoutSession   -------------------------------------------------------
/// Everything needed to create a hosted checkout session. Amounts are minor currency units; the metadata map is
/// handed back verbatim by the gateway and is how events are matched to orders later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCheckoutSession {
    pub line_items: Vec<SessionLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLineItem {
    pub name: String,
    pub unit_amount: Cents,
    pub quantity: i64,
}

//--------------------------------------    CheckoutSession    -------------------------------------------------------
/// A checkout session as the gateway reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// The client-facing payment page URL. Present on freshly created sessions.
    #[serde(default)]
    pub url: Option<String>,
    /// The payment reference the session settled (or will settle) under.
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionList {
    pub data: Vec<CheckoutSession>,
}

//--------------------------------------      StripeEvent      -------------------------------------------------------
/// A webhook event after signature verification. Only the fields the reconciliation flow needs are retained;
/// the `kind` string is matched against the recognized set by the consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

/// The object an event reports on. For payment events this is the payment intent, and `id` is the payment
/// reference used to look the session up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventObject {
    pub id: String,
}

pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const EVENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";
