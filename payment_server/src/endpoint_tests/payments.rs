use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use pod_common::Money;
use razorpay_tools::{GatewayOrder, Notes};
use serde_json::{json, Value};
use settlement_engine::db_types::{Order, OrderStatusType, PaymentStatus};

use super::{
    helpers::{mock_db, pending_order, post_request, settlement_api, signature},
    mocks::{MockDatabase, MockGateway},
};
use crate::routes::{CreatePaymentRoute, VerifyPaymentRoute};

fn configure_verify(order: Option<Order>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = settlement_api(mock_db(order));
        cfg.app_data(web::Data::new(api)).service(VerifyPaymentRoute::<MockDatabase>::new());
    }
}

fn verify_body(order_id: &str, gateway_order_id: &str, payment_id: &str, signature: &str) -> String {
    json!({
        "razorpay_order_id": gateway_order_id,
        "razorpay_payment_id": payment_id,
        "razorpay_signature": signature,
        "orderId": order_id,
    })
    .to_string()
}

fn error_code(body: &str) -> String {
    let v: Value = serde_json::from_str(body).unwrap();
    assert_eq!(v["success"], false, "was: {body}");
    v["error"]["code"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn verify_authentic_payment() {
    let _ = env_logger::try_init().ok();
    let body = verify_body("ord-100", "order_1", "pay_1", &signature("order_1", "pay_1"));
    let (status, body) = post_request("/payment/verify", &body, &[], configure_verify(Some(pending_order()))).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["success"], true);
    assert_eq!(v["order_id"], "ord-100");
    assert_eq!(v["order_status"], "confirmed");
    assert_eq!(v["payment_status"], "paid");
    assert_eq!(v["earnings_created"], 2);
    assert_eq!(v["earnings_existing"], 0);
    assert_eq!(v["already_settled"], false);
}

#[actix_web::test]
async fn verify_forged_payment() {
    let _ = env_logger::try_init().ok();
    let body = verify_body("ord-100", "order_1", "pay_1", &signature("order_1", "pay_2"));
    let (status, body) = post_request("/payment/verify", &body, &[], configure_verify(Some(pending_order()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_SIGNATURE");
}

#[actix_web::test]
async fn verify_malformed_body() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"razorpay_order_id":"order_1","orderId":"ord-100"}"#;
    let (status, _) = post_request("/payment/verify", body, &[], configure_verify(Some(pending_order()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn verify_unknown_order() {
    let _ = env_logger::try_init().ok();
    let body = verify_body("ord-404", "order_1", "pay_1", &signature("order_1", "pay_1"));
    let (status, body) = post_request("/payment/verify", &body, &[], configure_verify(Some(pending_order()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "ORDER_NOT_FOUND");
}

#[actix_web::test]
async fn verify_against_another_gateway_order() {
    let _ = env_logger::try_init().ok();
    let body = verify_body("ord-100", "order_2", "pay_1", &signature("order_2", "pay_1"));
    let (status, body) = post_request("/payment/verify", &body, &[], configure_verify(Some(pending_order()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "GATEWAY_ORDER_MISMATCH");
}

#[actix_web::test]
async fn verify_cancelled_order() {
    let _ = env_logger::try_init().ok();
    let mut order = pending_order();
    order.order_status = OrderStatusType::Cancelled;
    order.cancelled_at = Some(Utc::now());
    let body = verify_body("ord-100", "order_1", "pay_1", &signature("order_1", "pay_1"));
    let (status, body) = post_request("/payment/verify", &body, &[], configure_verify(Some(order))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ILLEGAL_TRANSITION");
}

#[actix_web::test]
async fn verify_twice_is_a_no_op() {
    let _ = env_logger::try_init().ok();
    let mut order = pending_order();
    order.payment_status = PaymentStatus::Paid;
    order.order_status = OrderStatusType::Confirmed;
    order.gateway_payment_id = Some("pay_1".into());
    let body = verify_body("ord-100", "order_1", "pay_1", &signature("order_1", "pay_1"));
    let (status, body) = post_request("/payment/verify", &body, &[], configure_verify(Some(order))).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["already_settled"], true);
    assert_eq!(v["earnings_created"], 0);
    assert_eq!(v["earnings_existing"], 2);
}

//----------------------------------------------   Create  ----------------------------------------------------

fn unpaid_order() -> Order {
    let mut order = pending_order();
    order.gateway_order_id = None;
    order
}

fn configure_create(order: Option<Order>, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = settlement_api(mock_db(order));
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(gateway))
            .service(CreatePaymentRoute::<MockDatabase, MockGateway>::new());
    }
}

fn gateway_creating(id: &'static str) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_create_gateway_order().times(1).returning(move |order_id, amount: Money, currency| {
        Ok(GatewayOrder {
            id: id.to_string(),
            amount: amount.to_minor_units(),
            amount_paid: 0,
            amount_due: amount.to_minor_units(),
            currency: currency.to_string(),
            receipt: Some(order_id.to_string()),
            status: "created".into(),
            notes: Notes::for_order(order_id.as_str()),
            created_at: Utc::now(),
        })
    });
    gateway
}

fn idle_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_create_gateway_order().never();
    gateway
}

#[actix_web::test]
async fn create_payment() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"orderId":"ord-100","amount":800,"currency":"INR"}"#;
    let config = configure_create(Some(unpaid_order()), gateway_creating("order_new"));
    let (status, body) = post_request("/payment/create", body, &[], config).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(body, r#"{"success":true,"razorpayOrderId":"order_new","amount":80000,"currency":"INR"}"#);
}

#[actix_web::test]
async fn create_payment_again_replaces_the_gateway_order() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"orderId":"ord-100","amount":"800.00","currency":"inr"}"#;
    let config = configure_create(Some(pending_order()), gateway_creating("order_retry"));
    let (status, body) = post_request("/payment/create", body, &[], config).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert!(body.contains(r#""razorpayOrderId":"order_retry""#));
}

#[actix_web::test]
async fn create_payment_after_a_failed_attempt() {
    let _ = env_logger::try_init().ok();
    let mut order = pending_order();
    order.payment_status = PaymentStatus::Failed;
    let body = r#"{"orderId":"ord-100","amount":800,"currency":"INR"}"#;
    let config = configure_create(Some(order), gateway_creating("order_second_try"));
    let (status, body) = post_request("/payment/create", body, &[], config).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert!(body.contains(r#""razorpayOrderId":"order_second_try""#));
}

#[actix_web::test]
async fn create_payment_with_wrong_amount() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"orderId":"ord-100","amount":1,"currency":"INR"}"#;
    let config = configure_create(Some(unpaid_order()), idle_gateway());
    let (status, body) = post_request("/payment/create", body, &[], config).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_REQUEST");
}

#[actix_web::test]
async fn create_payment_for_unknown_order() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"orderId":"ord-404","amount":800,"currency":"INR"}"#;
    let config = configure_create(Some(unpaid_order()), idle_gateway());
    let (status, body) = post_request("/payment/create", body, &[], config).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "ORDER_NOT_FOUND");
}

#[actix_web::test]
async fn create_payment_for_paid_order() {
    let _ = env_logger::try_init().ok();
    let mut order = pending_order();
    order.payment_status = PaymentStatus::Paid;
    order.order_status = OrderStatusType::Confirmed;
    let body = r#"{"orderId":"ord-100","amount":800,"currency":"INR"}"#;
    let (status, body) = post_request("/payment/create", body, &[], configure_create(Some(order), idle_gateway())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ILLEGAL_TRANSITION");
}
