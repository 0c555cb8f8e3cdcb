use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use pod_common::{Money, Secret};
use settlement_engine::{
    db_types::{
        ArtistId,
        CommissionRate,
        EarningsRecord,
        EarningsStatus,
        LineItem,
        Order,
        OrderId,
        OrderStatusType,
        PaymentStatus,
    },
    events::EventProducers,
    helpers::sign_payment,
    traits::{CommitOutcome, InsertEarningsResult},
    SettlementApi,
};

use super::mocks::MockDatabase;

pub const MERCHANT_SECRET: &str = "rzp_test_secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";

pub fn merchant_secret() -> Secret<String> {
    Secret::new(MERCHANT_SECRET.to_string())
}

pub fn webhook_secret() -> Secret<String> {
    Secret::new(WEBHOOK_SECRET.to_string())
}

pub fn signature(gateway_order_id: &str, payment_id: &str) -> String {
    sign_payment(gateway_order_id, payment_id, &merchant_secret()).unwrap()
}

/// Order `ord-100`: a ₹500 tee and a ₹300 mug, both with designs by `priya`, awaiting payment against `order_1`.
pub fn pending_order() -> Order {
    let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let order_id = OrderId::from("ord-100");
    let item = |id: i64, product: &str, design: &str, price: i64| LineItem {
        id,
        order_id: order_id.clone(),
        product_id: product.to_string(),
        design_id: Some(design.into()),
        quantity: 1,
        unit_price: Money::from_major(price),
        base_cost: Money::default(),
        platform_profit: Money::default(),
        artist_commission: Money::default(),
    };
    Order {
        id: 1,
        order_id: order_id.clone(),
        user_id: Some("u-1".into()),
        guest_email: None,
        total_price: Money::from_major(800),
        currency: "INR".into(),
        payment_status: PaymentStatus::Pending,
        order_status: OrderStatusType::Placed,
        gateway_order_id: Some("order_1".into()),
        gateway_payment_id: None,
        verified_at: None,
        confirmed_at: None,
        cancelled_at: None,
        created_at: t,
        updated_at: t,
        line_items: vec![item(11, "tee-1", "d-lotus", 500), item(12, "mug-1", "d-tiger", 300)],
    }
}

/// A database that holds `order` (if any), where every design belongs to `priya` at 30%, and every write succeeds.
///
/// The settlement API clones its backend, so every clone is configured the same way.
pub fn mock_db(order: Option<Order>) -> MockDatabase {
    let mut db = MockDatabase::new();
    let stored = order.clone();
    db.expect_fetch_order().returning(move |id| Ok(stored.clone().filter(|o| &o.order_id == id)));
    let stored = order.clone();
    db.expect_fetch_order_by_gateway_order_id()
        .returning(move |gid| Ok(stored.clone().filter(|o| o.gateway_order_id.as_deref() == Some(gid))));
    // A paid order was settled earlier, so its earnings are already in the ledger
    let settled = order.as_ref().filter(|o| o.payment_status == PaymentStatus::Paid).map(|o| o.order_id.clone());
    db.expect_fetch_earnings_for_line_item()
        .returning(move |line_item_id| Ok(settled.clone().map(|order_id| existing_record(&order_id, line_item_id))));
    db.expect_fetch_artist_for_design().returning(|_| Ok(Some(ArtistId::from("priya"))));
    db.expect_fetch_artist_commission_rate().returning(|_| Ok(Some(CommissionRate::from_percent(30))));
    db.expect_update_order_status().returning(|_, updated| Ok(Some(updated.clone())));
    db.expect_commit_settlement().returning(|commit| {
        let earnings = commit
            .earnings
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                InsertEarningsResult::Inserted(EarningsRecord {
                    id: i as i64 + 1,
                    artist_id: r.artist_id,
                    order_id: r.order_id,
                    line_item_id: r.line_item_id,
                    amount: r.amount,
                    commission_rate: r.commission_rate,
                    status: EarningsStatus::Pending,
                    payout_reference: None,
                    created_at: Utc::now(),
                })
            })
            .collect();
        Ok(CommitOutcome::Committed { order: commit.transition.map(|(_, o)| o), earnings })
    });
    db.expect_clone().returning(move || mock_db(order.clone()));
    db
}

fn existing_record(order_id: &OrderId, line_item_id: i64) -> EarningsRecord {
    EarningsRecord {
        id: line_item_id,
        artist_id: ArtistId::from("priya"),
        order_id: order_id.clone(),
        line_item_id,
        amount: Money::from_major(90),
        commission_rate: CommissionRate::from_percent(30),
        status: EarningsStatus::Pending,
        payout_reference: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 5, 0).unwrap(),
    }
}

pub fn settlement_api(db: MockDatabase) -> SettlementApi<MockDatabase> {
    SettlementApi::new(db, merchant_secret(), EventProducers::default())
}

pub async fn post_request<F>(path: &str, body: &str, headers: &[(&str, &str)], configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::post().uri(path).insert_header(("Content-Type", "application/json"));
    for header in headers {
        req = req.insert_header(*header);
    }
    let req = req.set_payload(body.to_string()).to_request();
    let app = test::init_service(App::new().configure(configure)).await;
    debug!("Making request");
    match test::try_call_service(&app, req).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        // Middleware rejections surface as service errors
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}
