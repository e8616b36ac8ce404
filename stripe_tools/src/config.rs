use cps_common::Secret;
use log::*;

const DEFAULT_API_URL: &str = "https://api.stripe.com/v1";

#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Base URL for the gateway REST API. Overridable so tests and sandboxes can point elsewhere.
    pub api_url: String,
    /// The API secret key, sent as a bearer token on every call.
    pub secret_key: Secret<String>,
    /// The shared secret webhook deliveries are signed with.
    pub webhook_secret: Secret<String>,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self { api_url: DEFAULT_API_URL.to_string(), secret_key: Secret::default(), webhook_secret: Secret::default() }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("CPS_STRIPE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let secret_key = Secret::new(std::env::var("CPS_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("CPS_STRIPE_SECRET_KEY not set. Payment session calls will be rejected by the gateway.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("CPS_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("CPS_STRIPE_WEBHOOK_SECRET not set. Webhook deliveries will fail signature verification.");
            String::default()
        }));
        Self { api_url, secret_key, webhook_secret }
    }
}
