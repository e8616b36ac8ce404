use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use checkout_payment_engine::{OrderFlowApi, SqliteDatabase};

use crate::{
    auth::TokenVerifier,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::stripe::StripeGateway,
    routes::{
        health,
        FulfillmentOrdersRoute,
        MyOrdersRoute,
        PlaceCodOrderRoute,
        PlaceOnlineOrderRoute,
        StripeWebhookRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = StripeGateway::new(config.stripe.clone())?;
    let srv = create_server_instance(config, db, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: StripeGateway,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone());
        let verifier = TokenVerifier::new(&config.auth);
        let options = ServerOptions::from_config(&config);
        // Placement and listing routes sit behind the authentication boundary; the webhook receiver does not,
        // since the gateway authenticates itself with the payload signature instead.
        let order_scope = web::scope("/api/order")
            .service(PlaceCodOrderRoute::<SqliteDatabase>::new())
            .service(PlaceOnlineOrderRoute::<SqliteDatabase, StripeGateway>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(FulfillmentOrdersRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cps::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(gateway.clone()))
            .app_data(web::Data::new(verifier))
            .app_data(web::Data::new(options))
            .service(health)
            .service(StripeWebhookRoute::<SqliteDatabase, StripeGateway>::new())
            .service(order_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
