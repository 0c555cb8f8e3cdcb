use cucumber::{gherkin::Step, given, then, when};
use pod_common::Secret;
use settlement_engine::{
    db_types::{ArtistId, Buyer, CommissionRate, DesignId, Money, NewLineItem, NewOrder, OrderId, OrderStatusType, PaymentStatus},
    helpers::{sign_payment, PaymentVerification},
    OrderEvent,
    OrderManagement,
};

use crate::cucumber::{SettlementWorld, MERCHANT_SECRET};

fn parse_line_items(step: &Step) -> Vec<NewLineItem> {
    let table = step.table.as_ref().expect("Line items table is missing");
    table
        .rows
        .iter()
        .skip(1)
        .map(|row| {
            let design = match row[1].trim() {
                "" | "-" => None,
                d => Some(DesignId::from(d)),
            };
            let quantity = row[2].trim().parse::<i64>().expect("Invalid quantity");
            let price = row[3].trim().parse::<Money>().expect("Invalid price");
            NewLineItem::new(row[0].trim(), design, quantity, price)
        })
        .collect()
}

#[given(expr = "an order {word} from user '{word}' with the line items")]
async fn place_order(world: &mut SettlementWorld, step: &Step, order_id: String, user: String) {
    let items = parse_line_items(step);
    let order = NewOrder::new(OrderId::from(order_id), Buyer::User(user), items);
    world.db().create_order(order).await.expect("Error creating order");
}

#[given(expr = "the buyer started paying for order {word} with gateway order {word}")]
async fn begin_payment(world: &mut SettlementWorld, order_id: String, gateway_order_id: String) {
    world.api().begin_payment(&OrderId::from(order_id), &gateway_order_id).await.expect("Error starting payment");
}

#[given(expr = "the gateway reported a failed payment for order {word}")]
async fn payment_failed(world: &mut SettlementWorld, order_id: String) {
    world.api().record_payment_failure(&OrderId::from(order_id)).await.expect("Error recording payment failure");
}

#[given(expr = "order {word} is cancelled")]
#[when(expr = "order {word} is cancelled")]
async fn cancel_order(world: &mut SettlementWorld, order_id: String) {
    world.api().apply_event(&OrderId::from(order_id), OrderEvent::Cancel).await.expect("Error cancelling order");
}

async fn settle(world: &mut SettlementWorld, order_id: String, gateway_order_id: String, payment_id: String, sig: String) {
    let verification = PaymentVerification::new(&gateway_order_id, &payment_id, &sig, OrderId::from(order_id));
    let result = world.api().settle(&verification).await;
    world.last_result = Some(result);
}

#[when(expr = "the gateway confirms payment {word} of gateway order {word} for order {word}")]
async fn signed_callback(world: &mut SettlementWorld, payment_id: String, gateway_order_id: String, order_id: String) {
    let secret = Secret::new(MERCHANT_SECRET.to_string());
    let sig = sign_payment(&gateway_order_id, &payment_id, &secret).expect("Error signing payment");
    settle(world, order_id, gateway_order_id, payment_id, sig).await;
}

#[when(expr = "a forged callback claims payment {word} of gateway order {word} for order {word}")]
async fn forged_callback(world: &mut SettlementWorld, payment_id: String, gateway_order_id: String, order_id: String) {
    let secret = Secret::new("not_the_merchant_secret".to_string());
    let sig = sign_payment(&gateway_order_id, &payment_id, &secret).expect("Error signing payment");
    settle(world, order_id, gateway_order_id, payment_id, sig).await;
}

#[when(expr = "artist {word} changes their commission rate to {word}")]
async fn change_rate(world: &mut SettlementWorld, artist: String, rate: String) {
    let rate = rate.parse::<CommissionRate>().expect("Invalid commission rate");
    world.db().upsert_artist_profile(&ArtistId::from(artist), None, rate).await.expect("Error saving artist profile");
}

#[then(expr = "the settlement succeeds with {int} earnings created and {int} existing")]
async fn settlement_succeeds(world: &mut SettlementWorld, created: usize, existing: usize) {
    let result = world.last_result().as_ref().expect("Settlement failed");
    assert_eq!(result.earnings_created, created, "earnings created");
    assert_eq!(result.earnings_existing, existing, "earnings existing");
}

#[then(expr = "the settlement reports the order as already settled")]
async fn already_settled(world: &mut SettlementWorld) {
    let result = world.last_result().as_ref().expect("Settlement failed");
    assert!(result.already_settled);
}

#[then(expr = "the settlement skipped {int} line item(s)")]
async fn settlement_skipped(world: &mut SettlementWorld, skipped: usize) {
    let result = world.last_result().as_ref().expect("Settlement failed");
    assert_eq!(result.skipped.len(), skipped);
}

#[then(expr = "the settlement fails with {word}")]
async fn settlement_fails(world: &mut SettlementWorld, code: String) {
    match world.last_result() {
        Ok(r) => panic!("Expected the settlement to fail with {code}, but it succeeded: {r:?}"),
        Err(e) => assert_eq!(e.code(), code),
    }
}

#[then(expr = "order {word} has order status {word} and payment status {word}")]
async fn order_has_status(world: &mut SettlementWorld, order_id: String, order_status: String, payment_status: String) {
    let order = world.db().fetch_order(&OrderId::from(order_id)).await.expect("Error fetching order").expect("No order");
    assert_eq!(order.order_status, order_status.parse::<OrderStatusType>().expect("Invalid order status"));
    assert_eq!(order.payment_status, payment_status.parse::<PaymentStatus>().expect("Invalid payment status"));
}

#[then(expr = "order {word} has a confirmation date")]
async fn has_confirmation_date(world: &mut SettlementWorld, order_id: String) {
    let order = world.db().fetch_order(&OrderId::from(order_id)).await.expect("Error fetching order").expect("No order");
    assert!(order.confirmed_at.is_some());
    assert!(order.verified_at.is_some());
}

#[then(expr = "order {word} has no earnings")]
async fn no_earnings(world: &mut SettlementWorld, order_id: String) {
    let earnings = world.api().earnings_for_order(&OrderId::from(order_id)).await.expect("Error fetching earnings");
    assert!(earnings.is_empty(), "Expected no earnings, found {earnings:?}");
}

#[then(expr = "the earnings for order {word} are")]
async fn earnings_table(world: &mut SettlementWorld, step: &Step, order_id: String) {
    let table = step.table.as_ref().expect("Earnings table is missing");
    let earnings = world.api().earnings_for_order(&OrderId::from(order_id)).await.expect("Error fetching earnings");
    let expected = table.rows.iter().skip(1).collect::<Vec<_>>();
    assert_eq!(earnings.len(), expected.len(), "Number of earnings records");
    for (record, row) in earnings.iter().zip(expected) {
        assert_eq!(record.artist_id.as_str(), row[0].trim());
        assert_eq!(record.amount.to_string(), row[1].trim());
        assert_eq!(record.commission_rate.to_string(), row[2].trim());
        assert_eq!(record.status.to_string(), row[3].trim());
    }
}
