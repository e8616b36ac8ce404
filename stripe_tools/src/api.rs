use std::sync::Arc;

use cps_common::CURRENCY_CODE_LOWER;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::StripeConfig,
    data_objects::{CheckoutSession, NewCheckoutSession, SessionList},
    StripeApiError,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert("Authorization", val);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Creates a hosted checkout session. Single-shot: a transport failure is returned to the caller rather
    /// than retried, since a blind retry can create a duplicate session for the same order.
    pub async fn create_checkout_session(
        &self,
        new_session: &NewCheckoutSession,
    ) -> Result<CheckoutSession, StripeApiError> {
        debug!("Creating checkout session with {} line items", new_session.line_items.len());
        let params = session_form_params(new_session);
        let session = self.rest_query::<CheckoutSession>(Method::POST, "/checkout/sessions", &params).await?;
        info!("Created checkout session {}", session.id);
        Ok(session)
    }

    /// Returns the session(s) associated with a payment reference, metadata included.
    pub async fn list_sessions_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Vec<CheckoutSession>, StripeApiError> {
        debug!("Listing checkout sessions for payment reference [{payment_intent_id}]");
        let params = vec![("payment_intent".to_string(), payment_intent_id.to_string())];
        let list = self.rest_query::<SessionList>(Method::GET, "/checkout/sessions", &params).await?;
        trace!("Found {} session(s) for [{payment_intent_id}]", list.data.len());
        Ok(list.data)
    }

    /// The gateway API is form-encoded on writes and query-string on reads; responses are JSON either way.
    async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let req = if method == Method::GET {
            self.client.request(method, url).query(params)
        } else {
            self.client.request(method, url).form(params)
        };
        let response = req.send().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            Err(StripeApiError::QueryError { status, message })
        }
    }
}

/// Flattens a session request into the gateway's bracketed form-parameter encoding.
fn session_form_params(new_session: &NewCheckoutSession) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), new_session.success_url.clone()),
        ("cancel_url".to_string(), new_session.cancel_url.clone()),
    ];
    for (i, item) in new_session.line_items.iter().enumerate() {
        params.push((format!("line_items[{i}][price_data][currency]"), CURRENCY_CODE_LOWER.to_string()));
        params.push((format!("line_items[{i}][price_data][product_data][name]"), item.name.clone()));
        params.push((format!("line_items[{i}][price_data][unit_amount]"), item.unit_amount.value().to_string()));
        params.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
    }
    for (key, value) in &new_session.metadata {
        params.push((format!("metadata[{key}]"), value.clone()));
    }
    params
}
