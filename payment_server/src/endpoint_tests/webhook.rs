use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::Value;
use settlement_engine::{
    db_types::{Order, PaymentStatus},
    helpers::calculate_hmac,
};

use super::{
    helpers::{mock_db, pending_order, post_request, settlement_api, webhook_secret},
    mocks::MockDatabase,
};
use crate::{
    config::ServerOptions,
    middleware::HmacMiddlewareFactory,
    routes::RazorpayWebhookRoute,
    server::RAZORPAY_SIGNATURE_HEADER,
};

const CAPTURED: &str = r#"{"entity":"event","event":"payment.captured","contains":["payment"],"payload":{"payment":
{"entity":{"id":"pay_1","entity":"payment","amount":80000,"currency":"INR","status":"captured","order_id":"order_1",
"notes":{"orderId":"ord-100"}}}},"created_at":1714557900}"#;

const FAILED_WITHOUT_NOTES: &str = r#"{"entity":"event","event":"payment.failed","payload":{"payment":
{"entity":{"id":"pay_1","amount":80000,"currency":"INR","status":"failed","order_id":"order_1","notes":[]}}}}"#;

const REFUNDED: &str = r#"{"entity":"event","event":"refund.processed","payload":{"refund":{"entity":{"id":"rfnd_1",
"payment_id":"pay_1","amount":80000,"notes":{"orderId":"ord-100"}}}}}"#;

fn configure(order: Option<Order>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = settlement_api(mock_db(order));
        let scope = web::scope("/payment/webhook")
            .wrap(HmacMiddlewareFactory::new(RAZORPAY_SIGNATURE_HEADER, webhook_secret(), true))
            .service(RazorpayWebhookRoute::<MockDatabase>::new());
        cfg.app_data(web::Data::new(api)).app_data(web::Data::new(ServerOptions::default())).service(scope);
    }
}

async fn deliver(body: &str, order: Option<Order>) -> (StatusCode, Value) {
    let sig = calculate_hmac(&webhook_secret(), body.as_bytes()).unwrap();
    let (status, body) =
        post_request("/payment/webhook", body, &[(RAZORPAY_SIGNATURE_HEADER, sig.as_str())], configure(order)).await;
    (status, serde_json::from_str(&body).unwrap_or(Value::String(body)))
}

#[actix_web::test]
async fn captured_payment_settles_the_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = deliver(CAPTURED, Some(pending_order())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true, "was: {body}");
    assert_eq!(body["message"], "Order ord-100 settled. 2 earnings records created.");
}

#[actix_web::test]
async fn failed_payment_is_matched_by_gateway_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = deliver(FAILED_WITHOUT_NOTES, Some(pending_order())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true, "was: {body}");
    assert_eq!(body["message"], "Payment attempt pay_1 for order ord-100 failed. The order remains open.");
}

#[actix_web::test]
async fn capture_after_a_failed_attempt_settles() {
    let _ = env_logger::try_init().ok();
    let mut order = pending_order();
    order.payment_status = PaymentStatus::Failed;
    let (status, body) = deliver(CAPTURED, Some(order)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true, "was: {body}");
    assert_eq!(body["message"], "Order ord-100 settled. 2 earnings records created.");
}

#[actix_web::test]
async fn failed_payment_for_unknown_gateway_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = deliver(FAILED_WITHOUT_NOTES, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false, "was: {body}");
}

#[actix_web::test]
async fn refund_of_unpaid_order_is_acknowledged_but_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, body) = deliver(REFUNDED, Some(pending_order())).await;
    // Not retryable, so the gateway must not redeliver
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false, "was: {body}");
}

#[actix_web::test]
async fn other_events_are_ignored() {
    let _ = env_logger::try_init().ok();
    let (status, body) = deliver(r#"{"event":"payment.authorized","payload":{}}"#, Some(pending_order())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event ignored.");
}

#[actix_web::test]
async fn forged_webhook_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let sig = calculate_hmac(&webhook_secret(), b"something else").unwrap();
    let headers = [(RAZORPAY_SIGNATURE_HEADER, sig.as_str())];
    let (status, body) = post_request("/payment/webhook", CAPTURED, &headers, configure(Some(pending_order()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "Invalid HMAC signature.");
}

#[actix_web::test]
async fn unsigned_webhook_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/payment/webhook", CAPTURED, &[], configure(Some(pending_order()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "No HMAC signature found.");
}
