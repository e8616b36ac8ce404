//! Order pricing.
//!
//! Totals are always derived here, from catalog prices current at the moment of placement. The checkout
//! surcharge is a fixed 2%, applied with floor rounding in integer minor-unit arithmetic: the order total is
//! `subtotal + floor(subtotal * 2%)`, and each line item sent to the payment gateway carries
//! `unit_price + floor(unit_price * 2%)` so the hosted payment page shows surcharge-inclusive prices per line.
//!
//! Quantities are deliberately lenient: a negative quantity is clamped to zero rather than rejected. Zero-priced
//! lines still require a resolvable product reference; any unresolvable reference rejects the whole request.
use cps_common::Cents;
use futures_util::future::try_join_all;

use crate::{
    db_types::{LineItem, ProductId},
    order_flow::errors::OrderFlowError,
    traits::ProductCatalog,
};

/// The checkout surcharge, in basis points.
pub const SURCHARGE_RATE_BASIS_POINTS: i64 = 200;

/// Adds the surcharge to an amount, flooring the surcharge portion.
pub fn add_surcharge(amount: Cents) -> Cents {
    amount + Cents::from(amount.value() * SURCHARGE_RATE_BASIS_POINTS / 10_000)
}

/// Clamps a quantity to the non-negative range. Lenient by policy; see the module docs.
pub fn coerce_quantity(quantity: i64) -> i64 {
    quantity.max(0)
}

//--------------------------------------    PricedLineItem     -------------------------------------------------------
/// A line item after catalog resolution: quantity coerced, name and unit price taken from the catalog record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Cents,
}

impl PricedLineItem {
    pub fn line_total(&self) -> Cents {
        self.unit_price * self.quantity
    }

    /// The per-line surcharge-inclusive unit price, as displayed by the payment gateway.
    pub fn unit_price_with_surcharge(&self) -> Cents {
        add_surcharge(self.unit_price)
    }
}

//--------------------------------------      PricedOrder      -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct PricedOrder {
    /// The order total: surcharge-inclusive, floor-rounded over the subtotal.
    pub amount: Cents,
    pub items: Vec<PricedLineItem>,
}

/// Resolves and prices a set of line items against the catalog.
///
/// Read-only and side-effect free. Fails with [`OrderFlowError::InvalidLineItem`] if any product reference is
/// unresolvable, in which case the whole request is rejected.
pub async fn price_order<C>(items: &[LineItem], catalog: &C) -> Result<PricedOrder, OrderFlowError>
where C: ProductCatalog {
    let items = try_join_all(items.iter().map(|item| resolve_line_item(item, catalog))).await?;
    let subtotal: Cents = items.iter().map(PricedLineItem::line_total).sum();
    Ok(PricedOrder { amount: add_surcharge(subtotal), items })
}

async fn resolve_line_item<C>(item: &LineItem, catalog: &C) -> Result<PricedLineItem, OrderFlowError>
where C: ProductCatalog {
    let product = catalog
        .fetch_product(&item.product_id)
        .await?
        .ok_or_else(|| OrderFlowError::InvalidLineItem(item.product_id.clone()))?;
    Ok(PricedLineItem {
        product_id: product.product_id,
        name: product.name,
        quantity: coerce_quantity(item.quantity),
        unit_price: product.unit_price,
    })
}
