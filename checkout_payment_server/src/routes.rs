//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will
//! cause the current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation
//! (I/O, database calls, gateway calls) is expressed as an async function so worker threads keep serving other
//! requests while it is in flight.
use actix_web::{get, http::header, web, HttpRequest, HttpResponse, Responder};
use checkout_payment_engine::{
    order_objects::OrderResult,
    traits::{CheckoutBackend, EventOutcome, GatewayError, PaymentSessionGateway},
    OrderFlowApi,
};
use log::*;

use crate::{
    auth::AuthenticatedIdentity,
    config::ServerOptions,
    data_objects::{CheckoutRedirect, JsonResponse, PlaceOrderRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Placement  ----------------------------------------------------

route!(place_cod_order => Post "/cod" impl CheckoutBackend);
/// Route handler for placing a cash-on-delivery order.
///
/// The purchaser is the authenticated identity; the payload carries only line items and the address reference.
/// The response confirms placement and nothing else, since there is no payment to redirect to.
pub async fn place_cod_order<B: CheckoutBackend>(
    identity: AuthenticatedIdentity,
    body: web::Json<PlaceOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST place COD order for {}", identity.owner_id);
    let order = api.place_cod_order(&identity.owner_id, body.into_inner().into()).await?;
    info!("💻️ COD order {} placed for {}.", order.order_id, identity.owner_id);
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {} placed successfully.", order.order_id))))
}

route!(place_online_order => Post "/online" impl CheckoutBackend, PaymentSessionGateway);
/// Route handler for placing an online order.
///
/// On success the response carries the gateway's hosted payment page URL. The redirect targets are derived from
/// the request's `Origin` header (falling back to the configured frontend origin), so the purchaser returns to
/// the storefront they came from.
pub async fn place_online_order<B, G>(
    req: HttpRequest,
    identity: AuthenticatedIdentity,
    body: web::Json<PlaceOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<G>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutBackend,
    G: PaymentSessionGateway,
{
    debug!("💻️ POST place online order for {}", identity.owner_id);
    let origin = return_origin(&req, &options);
    let (order, url) =
        api.place_online_order(&identity.owner_id, body.into_inner().into(), &origin, gateway.get_ref()).await?;
    info!("💻️ Online order {} placed for {}. Awaiting payment.", order.order_id, identity.owner_id);
    Ok(HttpResponse::Ok().json(CheckoutRedirect::to(url)))
}

fn return_origin(req: &HttpRequest, options: &ServerOptions) -> String {
    req.headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| options.default_return_origin.clone())
}

//----------------------------------------------   Listings  ----------------------------------------------------

route!(my_orders => Get "/mine" impl CheckoutBackend);
/// Route handler for the purchaser's own orders.
///
/// Returns the authenticated owner's orders, newest first. Unpaid online orders are filtered out by the store's
/// visibility rule; cash-on-delivery orders appear immediately.
pub async fn my_orders<B: CheckoutBackend>(
    identity: AuthenticatedIdentity,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my orders for {}", identity.owner_id);
    let orders = api.orders_for_owner(&identity.owner_id).await?;
    Ok(HttpResponse::Ok().json(OrderResult::new(orders)))
}

route!(fulfillment_orders => Get "/fulfillment" impl CheckoutBackend);
/// Route handler for the fulfilment listing.
///
/// Requires the `Fulfillment` role. Applies the same visibility rule as the owner listing; an unpaid online
/// order is exposed to nobody, staff included.
pub async fn fulfillment_orders<B: CheckoutBackend>(
    identity: AuthenticatedIdentity,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    identity.require_fulfillment()?;
    debug!("💻️ GET fulfillable orders for {}", identity.owner_id);
    let orders = api.fulfillable_orders().await?;
    Ok(HttpResponse::Ok().json(OrderResult::new(orders)))
}

//----------------------------------------------   Webhook  ----------------------------------------------------

route!(stripe_webhook => Post "/stripe" impl CheckoutBackend, PaymentSessionGateway);
/// Route handler for payment gateway webhook deliveries.
///
/// The body arrives as raw bytes and is verified against the signature header before anything is parsed;
/// signature verification operates on the exact bytes received, never a re-serialized form. Deliveries that fail
/// are rejected without touching any order. Processing failures answer non-2xx so the gateway redelivers later;
/// everything the system understands (including replays and unrecognized kinds) is acknowledged with 200.
pub async fn stripe_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<G>,
) -> HttpResponse
where
    B: CheckoutBackend,
    G: PaymentSessionGateway,
{
    trace!("💳️ Received webhook delivery: {}", req.uri());
    let signature = match req.headers().get(stripe_tools::SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        Some(signature) => signature,
        None => {
            warn!("💳️ Webhook delivery without a signature header. Denying.");
            return HttpResponse::BadRequest().json(JsonResponse::failure("No signature header found."));
        },
    };
    let event = match gateway.verify_and_parse_event(body.as_ref(), signature) {
        Ok(event) => event,
        Err(GatewayError::InvalidSignature(e)) => {
            warn!("💳️ Webhook delivery failed signature verification. Denying. {e}");
            return HttpResponse::BadRequest().json(JsonResponse::failure("Invalid signature."));
        },
        Err(e) => {
            warn!("💳️ Webhook delivery could not be parsed. {e}");
            return HttpResponse::BadRequest().json(JsonResponse::failure("Malformed event payload."));
        },
    };
    debug!("💳️ Verified webhook event: {event}");
    match api.process_payment_event(event, gateway.get_ref()).await {
        Ok(outcome) => {
            let message = match outcome {
                EventOutcome::Confirmed(order) => format!("Order {} confirmed.", order.order_id),
                EventOutcome::Annulled(order_id) => format!("Order {order_id} removed after failed payment."),
                EventOutcome::NoOp => "Event acknowledged. Nothing changed.".to_string(),
                EventOutcome::Ignored => "Event kind not handled.".to_string(),
            };
            HttpResponse::Ok().json(JsonResponse::success(message))
        },
        Err(e) => {
            warn!("💳️ Could not process webhook event. The gateway may redeliver it. {e}");
            HttpResponse::InternalServerError().json(JsonResponse::failure("Could not process event."))
        },
    }
}
