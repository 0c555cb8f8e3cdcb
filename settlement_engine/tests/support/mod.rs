#![allow(dead_code)]
use log::*;
use pod_common::Secret;
use settlement_engine::{
    db_types::{ArtistId, Buyer, CommissionRate, DesignId, Money, NewLineItem, NewOrder, Order, OrderId},
    events::EventProducers,
    helpers::{sign_payment, PaymentVerification},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    OrderManagement,
    SettlementApi,
    SettlementDatabase,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const MERCHANT_SECRET: &str = "rzp_test_secret";

pub fn merchant_secret() -> Secret<String> {
    Secret::new(MERCHANT_SECRET.to_string())
}

pub async fn setup() -> SettlementApi<SqliteDatabase> {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> SettlementApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    seed_catalogue(&db).await;
    SettlementApi::new(db, merchant_secret(), producers)
}

pub async fn tear_down(mut api: SettlementApi<SqliteDatabase>) {
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Failed to remove database {url}: {e}");
    }
}

/// Artist `priya` earns 30% on designs `d-lotus` and `d-tiger`.
pub async fn seed_catalogue(db: &SqliteDatabase) {
    let priya = ArtistId::from("priya");
    db.upsert_artist_profile(&priya, Some("Priya"), CommissionRate::from_percent(30)).await.expect("Error adding artist");
    for design in ["d-lotus", "d-tiger"] {
        db.insert_design(&DesignId::from(design), &priya, None).await.expect("Error adding design");
    }
}

/// A ₹500 tee and a ₹300 mug, both with designs by `priya`.
pub async fn place_two_item_order(api: &SettlementApi<SqliteDatabase>, order_id: &str) -> Order {
    let items = vec![
        NewLineItem::new("tee-1", Some(DesignId::from("d-lotus")), 1, Money::from_major(500)),
        NewLineItem::new("mug-1", Some(DesignId::from("d-tiger")), 1, Money::from_major(300)),
    ];
    let order = NewOrder::new(OrderId::from(order_id), Buyer::User("u-1".into()), items);
    api.db().create_order(order).await.expect("Error creating order")
}

pub fn signed_verification(order_id: &str, gateway_order_id: &str, payment_id: &str) -> PaymentVerification {
    let sig = sign_payment(gateway_order_id, payment_id, &merchant_secret()).expect("Error signing payment");
    PaymentVerification::new(gateway_order_id, payment_id, &sig, OrderId::from(order_id))
}
