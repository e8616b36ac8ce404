use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use checkout_payment_engine::{
    db_types::{LineItem, Order, OrderId, PaymentState, PaymentType},
    traits::{CheckoutSession, DeleteOutcome, GatewayError, PaymentEvent, SessionMetadata},
    OrderFlowApi,
};
use cps_common::Cents;

use super::helpers::post_raw;
use crate::{
    endpoint_tests::mocks::{MockBackend, MockGateway},
    routes::StripeWebhookRoute,
};

const OWNER: &str = "user-1001";
const ORDER_ID: &str = "ord-00000000000000ff";
const PAYMENT_INTENT: &str = "pi_test_1";

fn delivery_headers() -> Vec<(&'static str, String)> {
    vec![("Stripe-Signature", "t=1712345678,v1=0011aabb".to_string())]
}

fn delivery_body() -> Vec<u8> {
    br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_test_1"}}}"#.to_vec()
}

fn paid_order() -> Order {
    Order {
        id: 1,
        order_id: OrderId(ORDER_ID.to_string()),
        owner_id: OWNER.into(),
        address_id: "addr-1".into(),
        amount: Cents::from(459),
        payment_type: PaymentType::Online,
        payment_state: PaymentState::Paid,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 45, 0).unwrap(),
        items: vec![LineItem::new("apples", 2)],
    }
}

fn matched_session() -> CheckoutSession {
    CheckoutSession {
        session_id: "cs_test_1".to_string(),
        url: "https://checkout.test/pay/cs_test_1".to_string(),
        payment_intent_id: Some(PAYMENT_INTENT.to_string()),
        metadata: Some(SessionMetadata { order_id: OrderId(ORDER_ID.to_string()), owner_id: OWNER.into() }),
    }
}

#[actix_web::test]
async fn deliveries_without_a_signature_header_are_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_raw("/stripe", delivery_body(), vec![], configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("No signature header"), "unexpected body: {body}");
}

#[actix_web::test]
async fn deliveries_with_an_invalid_signature_never_touch_the_store() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_raw("/stripe", delivery_body(), delivery_headers(), configure_invalid_signature).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid signature"), "unexpected body: {body}");
}

// The backend carries no expectations: any store call fails the test.
fn configure_untouched(cfg: &mut ServiceConfig) {
    let backend = MockBackend::new();
    let gateway = MockGateway::new();
    let api = OrderFlowApi::new(backend);
    cfg.service(StripeWebhookRoute::<MockBackend, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}

fn configure_invalid_signature(cfg: &mut ServiceConfig) {
    let backend = MockBackend::new();
    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_and_parse_event()
        .returning(|_, _| Err(GatewayError::InvalidSignature("signature mismatch".to_string())));
    let api = OrderFlowApi::new(backend);
    cfg.service(StripeWebhookRoute::<MockBackend, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}

#[actix_web::test]
async fn a_verified_success_event_confirms_the_order_and_clears_the_cart() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_raw("/stripe", delivery_body(), delivery_headers(), configure_confirmation).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&format!("Order #{ORDER_ID} confirmed")), "unexpected body: {body}");
}

fn configure_confirmation(cfg: &mut ServiceConfig) {
    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_and_parse_event()
        .returning(|_, _| Ok(PaymentEvent::PaymentSucceeded { payment_intent_id: PAYMENT_INTENT.to_string() }));
    gateway
        .expect_find_sessions_by_payment_reference()
        .withf(|pi| pi == PAYMENT_INTENT)
        .returning(|_| Ok(vec![matched_session()]));
    let mut backend = MockBackend::new();
    backend
        .expect_mark_paid_once()
        .withf(|id| id.as_str() == ORDER_ID)
        .times(1)
        .returning(|_| Ok(Some(paid_order())));
    backend.expect_clear_cart().withf(|owner| owner.as_str() == OWNER).times(1).returning(|_| Ok(3));
    let api = OrderFlowApi::new(backend);
    cfg.service(StripeWebhookRoute::<MockBackend, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}

#[actix_web::test]
async fn a_replayed_success_event_is_acknowledged_without_a_second_cart_clear() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_raw("/stripe", delivery_body(), delivery_headers(), configure_replay).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Nothing changed"), "unexpected body: {body}");
}

fn configure_replay(cfg: &mut ServiceConfig) {
    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_and_parse_event()
        .returning(|_, _| Ok(PaymentEvent::PaymentSucceeded { payment_intent_id: PAYMENT_INTENT.to_string() }));
    gateway.expect_find_sessions_by_payment_reference().returning(|_| Ok(vec![matched_session()]));
    let mut backend = MockBackend::new();
    // The conditional update matches nothing on a replay, and the cart must not be cleared again
    backend.expect_mark_paid_once().times(1).returning(|_| Ok(None));
    backend.expect_clear_cart().times(0);
    let api = OrderFlowApi::new(backend);
    cfg.service(StripeWebhookRoute::<MockBackend, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}

#[actix_web::test]
async fn a_failure_event_removes_the_unpaid_order() {
    let _ = env_logger::try_init().ok();
    let body = br#"{"id":"evt_2","type":"payment_intent.payment_failed","data":{"object":{"id":"pi_test_1"}}}"#;
    let (status, response) =
        post_raw("/stripe", body.to_vec(), delivery_headers(), configure_annulment).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("removed after failed payment"), "unexpected body: {response}");
}

fn configure_annulment(cfg: &mut ServiceConfig) {
    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_and_parse_event()
        .returning(|_, _| Ok(PaymentEvent::PaymentFailed { payment_intent_id: PAYMENT_INTENT.to_string() }));
    gateway.expect_find_sessions_by_payment_reference().returning(|_| Ok(vec![matched_session()]));
    let mut backend = MockBackend::new();
    backend
        .expect_delete_unpaid_order()
        .withf(|id| id.as_str() == ORDER_ID)
        .times(1)
        .returning(|_| Ok(DeleteOutcome::Deleted));
    let api = OrderFlowApi::new(backend);
    cfg.service(StripeWebhookRoute::<MockBackend, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}

#[actix_web::test]
async fn a_failure_event_for_a_paid_order_is_acknowledged_as_a_noop() {
    let _ = env_logger::try_init().ok();
    let body = br#"{"id":"evt_3","type":"payment_intent.payment_failed","data":{"object":{"id":"pi_test_1"}}}"#;
    let (status, response) =
        post_raw("/stripe", body.to_vec(), delivery_headers(), configure_illegal_transition).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("Nothing changed"), "unexpected body: {response}");
}

fn configure_illegal_transition(cfg: &mut ServiceConfig) {
    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_and_parse_event()
        .returning(|_, _| Ok(PaymentEvent::PaymentFailed { payment_intent_id: PAYMENT_INTENT.to_string() }));
    gateway.expect_find_sessions_by_payment_reference().returning(|_| Ok(vec![matched_session()]));
    let mut backend = MockBackend::new();
    backend.expect_delete_unpaid_order().times(1).returning(|_| Ok(DeleteOutcome::AlreadyPaid));
    let api = OrderFlowApi::new(backend);
    cfg.service(StripeWebhookRoute::<MockBackend, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}

#[actix_web::test]
async fn unrecognized_event_kinds_are_acknowledged_without_lookups() {
    let _ = env_logger::try_init().ok();
    let body = br#"{"id":"evt_4","type":"charge.refund.updated","data":{"object":{"id":"re_1"}}}"#;
    let (status, response) =
        post_raw("/stripe", body.to_vec(), delivery_headers(), configure_unrecognized).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("not handled"), "unexpected body: {response}");
}

fn configure_unrecognized(cfg: &mut ServiceConfig) {
    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_and_parse_event()
        .returning(|_, _| Ok(PaymentEvent::Unrecognized { kind: "charge.refund.updated".to_string() }));
    gateway.expect_find_sessions_by_payment_reference().times(0);
    let backend = MockBackend::new();
    let api = OrderFlowApi::new(backend);
    cfg.service(StripeWebhookRoute::<MockBackend, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}

#[actix_web::test]
async fn events_matching_no_session_answer_non_2xx_so_the_gateway_retries() {
    let _ = env_logger::try_init().ok();
    let (status, response) =
        post_raw("/stripe", delivery_body(), delivery_headers(), configure_unmatched).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.contains("Could not process event"), "unexpected body: {response}");
}

fn configure_unmatched(cfg: &mut ServiceConfig) {
    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_and_parse_event()
        .returning(|_, _| Ok(PaymentEvent::PaymentSucceeded { payment_intent_id: PAYMENT_INTENT.to_string() }));
    gateway.expect_find_sessions_by_payment_reference().returning(|_| Ok(vec![]));
    let backend = MockBackend::new();
    let api = OrderFlowApi::new(backend);
    cfg.service(StripeWebhookRoute::<MockBackend, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}
