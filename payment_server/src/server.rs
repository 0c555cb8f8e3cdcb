use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use razorpay_tools::RazorpayApi;
use settlement_engine::{events::EventProducers, SettlementApi, SqliteDatabase};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::razorpay::create_settlement_event_handlers,
    middleware::HmacMiddlewareFactory,
    routes::{health, CreatePaymentRoute, RazorpayWebhookRoute, VerifyPaymentRoute},
};

pub const RAZORPAY_SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_settlement_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let gateway = RazorpayApi::new(config.razorpay_config.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("💻️ Razorpay API at {}", config.razorpay_config.api_url);
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let settlement_api = SettlementApi::new(db.clone(), config.payment_secret(), producers.clone());
        let options = ServerOptions::from_config(&config);
        let webhook_scope = web::scope("/payment/webhook")
            .wrap(HmacMiddlewareFactory::new(RAZORPAY_SIGNATURE_HEADER, config.webhook_secret(), config.hmac_checks))
            .service(RazorpayWebhookRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pod::access_log"))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(gateway.clone()))
            .app_data(web::Data::new(options))
            .service(health)
            .service(VerifyPaymentRoute::<SqliteDatabase>::new())
            .service(CreatePaymentRoute::<SqliteDatabase, RazorpayApi>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
