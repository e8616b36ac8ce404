use checkout_payment_engine::{
    db_types::{NewOrder, Order, OrderId, OwnerId, Product, ProductId},
    order_objects::OrderQueryFilter,
    traits::{
        CartManagement,
        CheckoutSession,
        DeleteOutcome,
        GatewayError,
        NewSessionRequest,
        OrderStore,
        PaymentEvent,
        PaymentSessionGateway,
        ProductCatalog,
        StoreError,
    },
};
use mockall::mock;

mock! {
    pub Backend {}
    impl OrderStore for Backend {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StoreError>;
        async fn mark_paid_once(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
        async fn delete_unpaid_order(&self, order_id: &OrderId) -> Result<DeleteOutcome, StoreError>;
    }
    impl ProductCatalog for Backend {
        async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, StoreError>;
    }
    impl CartManagement for Backend {
        async fn clear_cart(&self, owner_id: &OwnerId) -> Result<u64, StoreError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentSessionGateway for Gateway {
        async fn create_checkout_session(&self, request: NewSessionRequest) -> Result<CheckoutSession, GatewayError>;
        fn verify_and_parse_event(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent, GatewayError>;
        async fn find_sessions_by_payment_reference(&self, payment_intent_id: &str) -> Result<Vec<CheckoutSession>, GatewayError>;
    }
}
