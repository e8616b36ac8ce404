use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use checkout_payment_engine::{
    db_types::{LineItem, NewOrder, Order, PaymentState, PaymentType, Product},
    traits::{CheckoutSession, GatewayError},
    OrderFlowApi,
};
use cps_common::Cents;
use serde_json::json;

use super::helpers::{get_request, issue_token, post_request};
use crate::{
    auth::Role,
    endpoint_tests::mocks::{MockBackend, MockGateway},
    routes::{FulfillmentOrdersRoute, MyOrdersRoute, PlaceCodOrderRoute, PlaceOnlineOrderRoute},
};

const OWNER: &str = "user-1001";

fn catalog_product(id: &str, name: &str, price: i64) -> Product {
    Product { product_id: id.into(), name: name.to_string(), unit_price: Cents::from(price) }
}

fn stub_catalog(backend: &mut MockBackend) {
    backend.expect_fetch_product().returning(|id| {
        let product = match id.as_str() {
            "apples" => Some(catalog_product("apples", "Apples", 100)),
            "honey" => Some(catalog_product("honey", "Honey", 250)),
            _ => None,
        };
        Ok(product)
    });
}

fn order_from_new(order: NewOrder) -> Order {
    Order {
        id: 1,
        order_id: order.order_id,
        owner_id: order.owner_id,
        address_id: order.address_id,
        amount: order.amount,
        payment_type: order.payment_type,
        payment_state: PaymentState::Unpaid,
        created_at: order.created_at,
        updated_at: order.created_at,
        items: order.items,
    }
}

fn placement_body() -> serde_json::Value {
    json!({
        "items": [
            { "product_id": "apples", "quantity": 2 },
            { "product_id": "honey", "quantity": 1 }
        ],
        "address_id": "addr-1"
    })
}

#[actix_web::test]
async fn place_cod_order_derives_amount_from_catalog() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(OWNER, Role::Customer);
    let (status, body) =
        post_request(&token, "/cod", placement_body(), configure_cod_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#), "unexpected body: {body}");
}

fn configure_cod_success(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    stub_catalog(&mut backend);
    backend
        .expect_insert_order()
        .withf(|order| {
            // The total is trusted: floor((2 * 100 + 250) * 1.02) from catalog prices, not the payload
            order.amount == Cents::from(459)
                && order.payment_type == PaymentType::CashOnDelivery
                && order.owner_id.as_str() == OWNER
        })
        .returning(|order| Ok(order_from_new(order)));
    let api = OrderFlowApi::new(backend);
    cfg.service(PlaceCodOrderRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn placement_requires_an_access_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("", "/cod", placement_body(), configure_untouched_backend).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token"), "unexpected body: {body}");
}

#[actix_web::test]
async fn empty_item_lists_are_rejected_before_persistence() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(OWNER, Role::Customer);
    let body = json!({ "items": [], "address_id": "addr-1" });
    let (status, body) = post_request(&token, "/cod", body, configure_untouched_backend).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid order request"), "unexpected body: {body}");
}

#[actix_web::test]
async fn missing_address_is_rejected_before_persistence() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(OWNER, Role::Customer);
    let body = json!({ "items": [{ "product_id": "apples", "quantity": 1 }] });
    let (status, body) = post_request(&token, "/cod", body, configure_untouched_backend).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid order request"), "unexpected body: {body}");
}

// No `insert_order` expectation is registered: the test fails if placement touches the store at all.
fn configure_untouched_backend(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    stub_catalog(&mut backend);
    let api = OrderFlowApi::new(backend);
    cfg.service(PlaceCodOrderRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn unresolvable_product_rejects_the_whole_request() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(OWNER, Role::Customer);
    let body = json!({
        "items": [
            { "product_id": "apples", "quantity": 1 },
            { "product_id": "discontinued", "quantity": 1 }
        ],
        "address_id": "addr-1"
    });
    let (status, body) = post_request(&token, "/cod", body, configure_untouched_backend).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("unknown product reference: discontinued"), "unexpected body: {body}");
}

#[actix_web::test]
async fn quantities_are_coerced_before_pricing_and_persistence() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(OWNER, Role::Customer);
    let body = json!({
        "items": [
            { "product_id": "apples", "quantity": "2" },
            { "product_id": "honey", "quantity": -1 }
        ],
        "address_id": "addr-1"
    });
    let (status, _) = post_request(&token, "/cod", body, configure_coerced_quantities).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
}

fn configure_coerced_quantities(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    stub_catalog(&mut backend);
    backend
        .expect_insert_order()
        .withf(|order| {
            // "2" parses to 2; -1 clamps to 0. Amount = floor(200 * 1.02)
            order.amount == Cents::from(204)
                && order.items == vec![LineItem::new("apples", 2), LineItem::new("honey", 0)]
        })
        .returning(|order| Ok(order_from_new(order)));
    let api = OrderFlowApi::new(backend);
    cfg.service(PlaceCodOrderRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn place_online_order_returns_the_payment_page_url() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(OWNER, Role::Customer);
    let (status, body) =
        post_request(&token, "/online", placement_body(), configure_online_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("https://checkout.test/pay/cs_1"), "unexpected body: {body}");
}

fn configure_online_success(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    stub_catalog(&mut backend);
    backend
        .expect_insert_order()
        .withf(|order| order.amount == Cents::from(459) && order.payment_type == PaymentType::Online)
        .returning(|order| Ok(order_from_new(order)));
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_checkout_session()
        .withf(|session| {
            // Redirect targets come from the configured origin; line prices are surcharge-inclusive per line
            session.success_url == "http://localhost:5173/loader?next=my-orders"
                && session.cancel_url == "http://localhost:5173/cart"
                && session.metadata.owner_id.as_str() == OWNER
                && session.line_items.iter().map(|li| li.unit_amount.value()).collect::<Vec<_>>() == vec![102, 255]
        })
        .returning(|session| {
            Ok(CheckoutSession {
                session_id: "cs_1".to_string(),
                url: "https://checkout.test/pay/cs_1".to_string(),
                payment_intent_id: None,
                metadata: Some(session.metadata),
            })
        });
    let api = OrderFlowApi::new(backend);
    cfg.service(PlaceOnlineOrderRoute::<MockBackend, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}

#[actix_web::test]
async fn gateway_failure_during_online_placement_answers_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(OWNER, Role::Customer);
    let (status, body) =
        post_request(&token, "/online", placement_body(), configure_online_gateway_down).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("payment gateway is unavailable"), "unexpected body: {body}");
}

fn configure_online_gateway_down(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    stub_catalog(&mut backend);
    // The order is persisted before the session call, and stays persisted when the call fails
    backend.expect_insert_order().times(1).returning(|order| Ok(order_from_new(order)));
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_checkout_session()
        .returning(|_| Err(GatewayError::Unavailable("timed out".to_string())));
    let api = OrderFlowApi::new(backend);
    cfg.service(PlaceOnlineOrderRoute::<MockBackend, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}

#[actix_web::test]
async fn my_orders_returns_the_owners_visible_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(OWNER, Role::Customer);
    let (status, body) = get_request(&token, "/mine", configure_my_orders).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDERS_JSON);
}

fn configure_my_orders(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    // The owner listing must be scoped to the token's owner AND flagged visible-only
    backend
        .expect_search_orders()
        .withf(|query| query.visible_only && query.owner_id.as_ref().map(|o| o.as_str()) == Some(OWNER))
        .returning(|_| Ok(orders_response()));
    let api = OrderFlowApi::new(backend);
    cfg.service(MyOrdersRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn fulfillment_listing_requires_the_fulfillment_role() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(OWNER, Role::Customer);
    let (status, body) = get_request(&token, "/fulfillment", configure_listings).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Insufficient Permissions"), "unexpected body: {body}");
}

#[actix_web::test]
async fn fulfillment_listing_returns_all_visible_orders_for_staff() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("staff-7", Role::Fulfillment);
    let (status, body) = get_request(&token, "/fulfillment", configure_listings).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDERS_JSON);
}

fn configure_listings(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    // The fulfilment listing is unscoped but must still carry the visibility flag
    backend
        .expect_search_orders()
        .withf(|query| query.visible_only && query.owner_id.is_none())
        .returning(|_| Ok(orders_response()));
    let api = OrderFlowApi::new(backend);
    cfg.service(FulfillmentOrdersRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

// Mock response to `search_orders` calls
fn orders_response() -> Vec<Order> {
    vec![Order {
        id: 1,
        order_id: "ord-000000000000002a".parse().unwrap(),
        owner_id: OWNER.into(),
        address_id: "addr-1".into(),
        amount: Cents::from(459),
        payment_type: PaymentType::Online,
        payment_state: PaymentState::Paid,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 45, 0).unwrap(),
        items: vec![LineItem::new("apples", 2), LineItem::new("honey", 1)],
    }]
}

const ORDERS_JSON: &str = r#"{"total_amount":459,"orders":[{"id":1,"order_id":"ord-000000000000002a","owner_id":"user-1001","address_id":"addr-1","amount":459,"payment_type":"Online","payment_state":"Paid","created_at":"2024-02-29T13:30:00Z","updated_at":"2024-02-29T13:45:00Z","items":[{"product_id":"apples","quantity":2},{"product_id":"honey","quantity":1}]}]}"#;
