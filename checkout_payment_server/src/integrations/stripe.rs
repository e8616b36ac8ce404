//! Adapter between the engine's gateway contract and the Stripe wire client.
//!
//! The engine speaks [`PaymentSessionGateway`]; `stripe_tools` speaks the gateway's REST and webhook formats.
//! This module converts between the two, including packing the `{order_id, owner_id}` binding into the session
//! metadata map and recovering it from session lookups.
use std::collections::HashMap;

use checkout_payment_engine::{
    db_types::{OrderId, OwnerId},
    traits::{
        CheckoutSession,
        GatewayError,
        NewSessionRequest,
        PaymentEvent,
        PaymentSessionGateway,
        SessionMetadata,
    },
};
use cps_common::Secret;
use log::*;
use stripe_tools::{
    verify_webhook_payload,
    NewCheckoutSession,
    SessionLineItem,
    StripeApi,
    StripeApiError,
    StripeConfig,
    WebhookError,
    EVENT_PAYMENT_FAILED,
    EVENT_PAYMENT_SUCCEEDED,
};

use crate::errors::ServerError;

const METADATA_ORDER_ID: &str = "order_id";
const METADATA_OWNER_ID: &str = "owner_id";

#[derive(Clone)]
pub struct StripeGateway {
    api: StripeApi,
    webhook_secret: Secret<String>,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, ServerError> {
        let webhook_secret = config.webhook_secret.clone();
        let api = StripeApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api, webhook_secret })
    }
}

impl PaymentSessionGateway for StripeGateway {
    async fn create_checkout_session(&self, request: NewSessionRequest) -> Result<CheckoutSession, GatewayError> {
        let metadata = HashMap::from([
            (METADATA_ORDER_ID.to_string(), request.metadata.order_id.as_str().to_string()),
            (METADATA_OWNER_ID.to_string(), request.metadata.owner_id.as_str().to_string()),
        ]);
        let new_session = NewCheckoutSession {
            line_items: request
                .line_items
                .into_iter()
                .map(|item| SessionLineItem { name: item.name, unit_amount: item.unit_amount, quantity: item.quantity })
                .collect(),
            success_url: request.success_url,
            cancel_url: request.cancel_url,
            metadata,
        };
        let session = self.api.create_checkout_session(&new_session).await.map_err(map_api_error)?;
        let url = session
            .url
            .clone()
            .ok_or_else(|| GatewayError::MalformedPayload("The created session has no redirect URL".to_string()))?;
        Ok(CheckoutSession {
            session_id: session.id,
            url,
            payment_intent_id: session.payment_intent,
            metadata: metadata_from_map(&session.metadata),
        })
    }

    fn verify_and_parse_event(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent, GatewayError> {
        let event = verify_webhook_payload(payload, signature_header, &self.webhook_secret).map_err(|e| match e {
            WebhookError::InvalidSignature | WebhookError::MalformedSignatureHeader(_) => {
                GatewayError::InvalidSignature(e.to_string())
            },
            WebhookError::MalformedPayload(msg) => GatewayError::MalformedPayload(msg),
        })?;
        let event = match event.kind.as_str() {
            EVENT_PAYMENT_SUCCEEDED => PaymentEvent::PaymentSucceeded { payment_intent_id: event.data.object.id },
            EVENT_PAYMENT_FAILED => PaymentEvent::PaymentFailed { payment_intent_id: event.data.object.id },
            kind => PaymentEvent::Unrecognized { kind: kind.to_string() },
        };
        Ok(event)
    }

    async fn find_sessions_by_payment_reference(
        &self,
        payment_intent_id: &str,
    ) -> Result<Vec<CheckoutSession>, GatewayError> {
        let sessions = self.api.list_sessions_by_payment_intent(payment_intent_id).await.map_err(map_api_error)?;
        let sessions = sessions
            .into_iter()
            .map(|session| {
                let metadata = metadata_from_map(&session.metadata);
                if metadata.is_none() {
                    debug!("💳️ Session {} carries no order binding in its metadata.", session.id);
                }
                CheckoutSession {
                    session_id: session.id,
                    url: session.url.unwrap_or_default(),
                    payment_intent_id: session.payment_intent,
                    metadata,
                }
            })
            .collect();
        Ok(sessions)
    }
}

fn metadata_from_map(map: &HashMap<String, String>) -> Option<SessionMetadata> {
    let order_id = map.get(METADATA_ORDER_ID)?;
    let owner_id = map.get(METADATA_OWNER_ID)?;
    Some(SessionMetadata { order_id: OrderId(order_id.clone()), owner_id: OwnerId(owner_id.clone()) })
}

fn map_api_error(e: StripeApiError) -> GatewayError {
    match e {
        StripeApiError::JsonError(msg) => GatewayError::MalformedPayload(msg),
        other => GatewayError::Unavailable(other.to_string()),
    }
}
