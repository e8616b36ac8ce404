use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderId, OwnerId, PaymentType},
    order_flow::{
        errors::OrderFlowError,
        pricing::{self, PricedOrder},
    },
    order_objects::{NewOrderRequest, OrderQueryFilter},
    traits::{
        CartManagement,
        DeleteOutcome,
        EventOutcome,
        NewSessionRequest,
        OrderStore,
        PaymentEvent,
        PaymentSessionGateway,
        ProductCatalog,
        SessionLineItem,
        SessionMetadata,
    },
};

/// `OrderFlowApi` is the primary API for placing orders and for reconciling them against asynchronous payment
/// gateway events.
///
/// Placement validates the request, derives a trusted total from catalog prices, and persists the order in the
/// initial `Unpaid` state. For online orders the payment session is created *after* the order exists, so that
/// the session metadata can carry a stable internal order reference back to us in gateway notifications.
///
/// Reconciliation consumes verified gateway events and drives the per-order state machine. Both transitions are
/// idempotent by construction (conditional update / conditional delete), so redelivered events converge on the
/// same end state without any event-id bookkeeping.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderStore + ProductCatalog + CartManagement
{
    /// Places a cash-on-delivery order.
    ///
    /// The order is visible to its owner and to fulfilment immediately; its payment state is a display-only flag
    /// that is never consulted for visibility.
    pub async fn place_cod_order(&self, owner_id: &OwnerId, request: NewOrderRequest) -> Result<Order, OrderFlowError> {
        let (priced, new_order) = self.validate_and_price(owner_id, request, PaymentType::CashOnDelivery).await?;
        let order = self.db.insert_order(new_order).await?;
        debug!(
            "🔄️📦️ COD order {} placed for {owner_id}: {} across {} line items",
            order.order_id,
            priced.amount,
            priced.items.len()
        );
        Ok(order)
    }

    /// Places an online order and creates the payment session for it.
    ///
    /// Returns the persisted order together with the gateway URL the purchaser must be redirected to. The order
    /// is persisted *before* the session is requested; if session creation then fails, the order remains
    /// `Unpaid` and invisible, the error is surfaced as [`OrderFlowError::GatewayUnavailable`], and no retry is
    /// attempted. Such orphans are inert and harmless (they can never be confirmed without a session) and are
    /// reaped out of band.
    pub async fn place_online_order<G>(
        &self,
        owner_id: &OwnerId,
        request: NewOrderRequest,
        return_origin: &str,
        gateway: &G,
    ) -> Result<(Order, String), OrderFlowError>
    where
        G: PaymentSessionGateway,
    {
        let (priced, new_order) = self.validate_and_price(owner_id, request, PaymentType::Online).await?;
        let order = self.db.insert_order(new_order).await?;
        let session_request = NewSessionRequest {
            line_items: priced
                .items
                .iter()
                .map(|item| SessionLineItem {
                    name: item.name.clone(),
                    unit_amount: item.unit_price_with_surcharge(),
                    quantity: item.quantity,
                })
                .collect(),
            success_url: format!("{return_origin}/loader?next=my-orders"),
            cancel_url: format!("{return_origin}/cart"),
            metadata: SessionMetadata { order_id: order.order_id.clone(), owner_id: owner_id.clone() },
        };
        let session = gateway.create_checkout_session(session_request).await.map_err(|e| {
            warn!(
                "🔄️📦️ Could not create a payment session for order {}. The order is kept as Unpaid; payment was \
                 not initiated. {e}",
                order.order_id
            );
            OrderFlowError::GatewayUnavailable(e.to_string())
        })?;
        debug!(
            "🔄️📦️ Online order {} placed for {owner_id} ({}). Payment session {} created.",
            order.order_id, priced.amount, session.session_id
        );
        Ok((order, session.url))
    }

    /// Applies one verified gateway event to the order it belongs to.
    ///
    /// | Current state   | Event             | Action                          | Next state |
    /// |-----------------|-------------------|---------------------------------|------------|
    /// | Unpaid (Online) | payment succeeded | mark Paid, clear owner's cart   | Paid       |
    /// | Unpaid (Online) | payment failed    | delete order                    | (removed)  |
    /// | Paid            | succeeded replay  | no-op                           | Paid       |
    /// | Paid            | payment failed    | no-op, logged                   | Paid       |
    ///
    /// The event body carries only the gateway's payment reference; the order and owner are recovered from the
    /// session metadata bound at creation time. Events that match no session return
    /// [`OrderFlowError::UnmatchedPaymentEvent`] so the gateway redelivers them later.
    pub async fn process_payment_event<G>(&self, event: PaymentEvent, gateway: &G) -> Result<EventOutcome, OrderFlowError>
    where G: PaymentSessionGateway {
        match event {
            PaymentEvent::PaymentSucceeded { payment_intent_id } => {
                self.confirm_payment(&payment_intent_id, gateway).await
            },
            PaymentEvent::PaymentFailed { payment_intent_id } => self.annul_order(&payment_intent_id, gateway).await,
            PaymentEvent::Unrecognized { kind } => {
                debug!("🔄️💰️ Ignoring gateway event of unhandled kind '{kind}'");
                Ok(EventOutcome::Ignored)
            },
        }
    }

    async fn confirm_payment<G>(&self, payment_intent_id: &str, gateway: &G) -> Result<EventOutcome, OrderFlowError>
    where G: PaymentSessionGateway {
        let meta = self.resolve_session_metadata(payment_intent_id, gateway).await?;
        match self.db.mark_paid_once(&meta.order_id).await? {
            Some(order) => {
                let cleared = self.db.clear_cart(&meta.owner_id).await?;
                info!(
                    "🔄️✅️ Order {} is paid ({}). Cleared {cleared} cart entries for {}.",
                    order.order_id, order.amount, meta.owner_id
                );
                Ok(EventOutcome::Confirmed(order))
            },
            None => {
                debug!(
                    "🔄️✅️ Success event for [{payment_intent_id}] did not change order {}. Most likely a \
                     redelivered notification.",
                    meta.order_id
                );
                Ok(EventOutcome::NoOp)
            },
        }
    }

    async fn annul_order<G>(&self, payment_intent_id: &str, gateway: &G) -> Result<EventOutcome, OrderFlowError>
    where G: PaymentSessionGateway {
        let meta = self.resolve_session_metadata(payment_intent_id, gateway).await?;
        match self.db.delete_unpaid_order(&meta.order_id).await? {
            DeleteOutcome::Deleted => {
                info!("🔄️❌️ Payment for order {} failed. The order has been removed.", meta.order_id);
                Ok(EventOutcome::Annulled(meta.order_id))
            },
            DeleteOutcome::AlreadyPaid => {
                warn!(
                    "🔄️❌️ Ignoring a payment-failed event for order {}, which is already Paid. Paid orders have \
                     no further transitions.",
                    meta.order_id
                );
                Ok(EventOutcome::NoOp)
            },
            DeleteOutcome::NotFound => {
                debug!(
                    "🔄️❌️ Failure event for [{payment_intent_id}]: order {} is already gone. Most likely a \
                     redelivered notification.",
                    meta.order_id
                );
                Ok(EventOutcome::NoOp)
            },
        }
    }

    /// Recovers the `{order_id, owner_id}` metadata for a payment reference by asking the gateway which
    /// session(s) the payment belongs to.
    async fn resolve_session_metadata<G>(
        &self,
        payment_intent_id: &str,
        gateway: &G,
    ) -> Result<SessionMetadata, OrderFlowError>
    where
        G: PaymentSessionGateway,
    {
        let sessions = gateway.find_sessions_by_payment_reference(payment_intent_id).await.map_err(|e| {
            warn!("🔄️💰️ Could not look up sessions for payment reference [{payment_intent_id}]. {e}");
            OrderFlowError::GatewayUnavailable(e.to_string())
        })?;
        sessions
            .into_iter()
            .find_map(|s| s.metadata)
            .ok_or_else(|| OrderFlowError::UnmatchedPaymentEvent(payment_intent_id.to_string()))
    }

    /// The authenticated owner's orders, newest first, visibility rule applied.
    pub async fn orders_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Order>, OrderFlowError> {
        let query = OrderQueryFilter::default().for_owner(owner_id.clone()).visible_only();
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }

    /// All orders ready for fulfilment, newest first. Applies the same visibility rule as the owner listing; an
    /// unpaid online order is exposed to nobody.
    pub async fn fulfillable_orders(&self) -> Result<Vec<Order>, OrderFlowError> {
        let query = OrderQueryFilter::default().visible_only();
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        let order = self.db.fetch_order_by_order_id(order_id).await?;
        Ok(order)
    }

    async fn validate_and_price(
        &self,
        owner_id: &OwnerId,
        request: NewOrderRequest,
        payment_type: PaymentType,
    ) -> Result<(PricedOrder, NewOrder), OrderFlowError> {
        let address_id = request
            .address_id
            .ok_or_else(|| OrderFlowError::InvalidRequest("No delivery address was supplied".to_string()))?;
        if request.items.is_empty() {
            return Err(OrderFlowError::InvalidRequest("The order contains no items".to_string()));
        }
        let priced = pricing::price_order(&request.items, &self.db).await?;
        let new_order = NewOrder::new(owner_id.clone(), address_id, priced.amount, payment_type, request.items);
        Ok((priced, new_order))
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
