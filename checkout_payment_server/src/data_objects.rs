use std::fmt::Display;

use checkout_payment_engine::{
    db_types::{AddressId, LineItem, ProductId},
    order_objects::NewOrderRequest,
    pricing,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Response to a successful online placement: the URL the client must redirect the purchaser to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRedirect {
    pub success: bool,
    pub url: String,
}

impl CheckoutRedirect {
    pub fn to(url: String) -> Self {
        Self { success: true, url }
    }
}

//--------------------------------------   PlaceOrderRequest   --------------------------------------------------------
/// The placement payload. Note there is no owner field; the owner comes from the authenticated identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<RequestedLineItem>,
    #[serde(default)]
    pub address_id: Option<AddressId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedLineItem {
    pub product_id: ProductId,
    /// Lenient by policy: non-numeric quantities deserialize to zero instead of rejecting the request, and
    /// negative values are clamped later by the pricing step.
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: i64,
}

impl From<PlaceOrderRequest> for NewOrderRequest {
    fn from(request: PlaceOrderRequest) -> Self {
        let items = request
            .items
            .into_iter()
            .map(|item| LineItem { product_id: item.product_id, quantity: pricing::coerce_quantity(item.quantity) })
            .collect();
        NewOrderRequest { items, address_id: request.address_id }
    }
}

fn lenient_quantity<'de, D>(deserializer: D) -> Result<i64, D::Error>
where D: Deserializer<'de> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_quantity_value(&value))
}

fn coerce_quantity_value(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().map(|f| f as i64)).unwrap_or(0)
        },
        _ => 0,
    }
}
