use std::fmt::Display;

use cps_common::Cents;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderId, OwnerId};

/// The contract this engine expects from an external payment gateway.
///
/// The engine is gateway-agnostic: a concrete adapter (e.g. over the Stripe REST API) implements this trait in
/// the server layer. Three semantics are pinned down here because the reconciliation flow depends on them:
///
/// 1. Session creation binds opaque metadata (`{order_id, owner_id}`) to the hosted payment attempt. Amounts are
///    minor currency units throughout.
/// 2. Event verification is a pure computation over the **exact** received payload bytes. A payload that fails
///    verification must never reach the reconciliation flow.
/// 3. Success/failure events carry only a payment reference; the session lookup recovers the business metadata
///    bound at creation time.
#[allow(async_fn_in_trait)]
pub trait PaymentSessionGateway {
    /// Creates a hosted checkout session and returns it, including the URL the purchaser is redirected to.
    ///
    /// This is a single-shot call: on timeout or transport failure the caller must surface the error rather than
    /// retry, otherwise duplicate sessions can be created for one order.
    async fn create_checkout_session(&self, request: NewSessionRequest) -> Result<CheckoutSession, GatewayError>;

    /// Verifies the signature over the raw payload and parses it into a [`PaymentEvent`].
    ///
    /// Fails with [`GatewayError::InvalidSignature`] when verification fails; the delivery must then be rejected
    /// without touching any order.
    fn verify_and_parse_event(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent, GatewayError>;

    /// Returns the checkout session(s) associated with the given payment reference, with their metadata.
    async fn find_sessions_by_payment_reference(
        &self,
        payment_intent_id: &str,
    ) -> Result<Vec<CheckoutSession>, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The event signature is invalid. {0}")]
    InvalidSignature(String),
    #[error("The payment gateway could not be reached. {0}")]
    Unavailable(String),
    #[error("The gateway sent a malformed payload. {0}")]
    MalformedPayload(String),
}

//--------------------------------------     PaymentEvent      -------------------------------------------------------
/// A verified gateway notification, reduced to the closed set of kinds the reconciliation state machine
/// understands. Anything else lands in `Unrecognized` and is acknowledged without effect, so the gateway is never
/// made to retry events this system does not handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentEvent {
    PaymentSucceeded { payment_intent_id: String },
    PaymentFailed { payment_intent_id: String },
    Unrecognized { kind: String },
}

impl Display for PaymentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentEvent::PaymentSucceeded { payment_intent_id } => {
                write!(f, "payment succeeded [{payment_intent_id}]")
            },
            PaymentEvent::PaymentFailed { payment_intent_id } => write!(f, "payment failed [{payment_intent_id}]"),
            PaymentEvent::Unrecognized { kind } => write!(f, "unrecognized event ({kind})"),
        }
    }
}

//--------------------------------------   NewSessionRequest   -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSessionRequest {
    pub line_items: Vec<SessionLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: SessionMetadata,
}

/// One displayable line on the hosted payment page. The unit amount already includes the checkout surcharge,
/// floor-rounded per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLineItem {
    pub name: String,
    pub unit_amount: Cents,
    pub quantity: i64,
}

/// The opaque binding between a gateway session and our records. Attached at session creation and read back when
/// a payment event has to be matched to its order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub order_id: OrderId,
    pub owner_id: OwnerId,
}

//--------------------------------------    CheckoutSession    -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    /// Client-facing redirect URL for the hosted payment page.
    pub url: String,
    /// The gateway's payment reference, once one exists for the session.
    pub payment_intent_id: Option<String>,
    pub metadata: Option<SessionMetadata>,
}
