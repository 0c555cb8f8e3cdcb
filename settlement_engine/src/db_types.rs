use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use pod_common::{CommissionRate, Money};
use pod_common::DEFAULT_CURRENCY_CODE;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {field}: {value}")]
pub struct ConversionError {
    pub field: &'static str,
    pub value: String,
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The storefront's identifier for an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   ArtistId / DesignId  -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ArtistId(pub String);

impl<S: Into<String>> From<S> for ArtistId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for ArtistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ArtistId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct DesignId(pub String);

impl<S: Into<String>> From<S> for DesignId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for DesignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl DesignId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No captured payment yet.
    #[default]
    Pending,
    /// The gateway captured the payment and its authenticity was verified.
    Paid,
    /// The gateway reported the payment attempt as failed.
    Failed,
    /// A captured payment was returned to the buyer.
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError { field: "payment_status", value: s.to_string() }),
        }
    }
}

//--------------------------------------   OrderStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed by the buyer and is awaiting payment.
    #[default]
    Placed,
    /// Payment is settled and the order has gone live for fulfilment.
    Confirmed,
    InProduction,
    Shipped,
    Delivered,
    /// The order was cancelled by the buyer or an admin.
    Cancelled,
}

impl OrderStatusType {
    /// True for the statuses that may only be reached once the payment has been settled.
    pub fn requires_payment(&self) -> bool {
        matches!(self, Self::Confirmed | Self::InProduction | Self::Shipped | Self::Delivered)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Placed => write!(f, "placed"),
            OrderStatusType::Confirmed => write!(f, "confirmed"),
            OrderStatusType::InProduction => write!(f, "in_production"),
            OrderStatusType::Shipped => write!(f, "shipped"),
            OrderStatusType::Delivered => write!(f, "delivered"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Placed");
            OrderStatusType::Placed
        })
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(Self::Placed),
            "confirmed" => Ok(Self::Confirmed),
            "in_production" => Ok(Self::InProduction),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError { field: "order_status", value: s.to_string() }),
        }
    }
}

//--------------------------------------        Buyer         ---------------------------------------------------------
/// Who placed the order: a registered user, or a guest identified only by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Buyer {
    User(String),
    Guest(String),
}

//--------------------------------------       LineItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: String,
    /// The design printed on the product. `None` for plain (non-artist) products, or when the design was deleted.
    pub design_id: Option<DesignId>,
    pub quantity: i64,
    pub unit_price: Money,
    pub base_cost: Money,
    pub platform_profit: Money,
    /// The commission estimate shown at checkout. The earnings ledger, not this field, is authoritative.
    pub artist_commission: Money,
}

impl LineItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub product_id: String,
    pub design_id: Option<DesignId>,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub base_cost: Money,
    #[serde(default)]
    pub platform_profit: Money,
    #[serde(default)]
    pub artist_commission: Money,
}

impl NewLineItem {
    pub fn new(product_id: &str, design_id: Option<DesignId>, quantity: i64, unit_price: Money) -> Self {
        Self {
            product_id: product_id.to_string(),
            design_id,
            quantity,
            unit_price,
            base_cost: Money::default(),
            platform_profit: Money::default(),
            artist_commission: Money::default(),
        }
    }

    pub fn with_costs(mut self, base_cost: Money, platform_profit: Money, artist_commission: Money) -> Self {
        self.base_cost = base_cost;
        self.platform_profit = platform_profit;
        self.artist_commission = artist_commission;
        self
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub user_id: Option<String>,
    pub guest_email: Option<String>,
    pub total_price: Money,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatusType,
    /// The gateway's order id, assigned when the buyer starts paying.
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    /// When the captured payment was verified as authentic.
    pub verified_at: Option<DateTime<Utc>>,
    /// When the order went live (the "live date").
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub line_items: Vec<LineItem>,
}

impl Order {
    pub fn buyer(&self) -> Option<Buyer> {
        match (&self.user_id, &self.guest_email) {
            (Some(user), _) => Some(Buyer::User(user.clone())),
            (None, Some(email)) => Some(Buyer::Guest(email.clone())),
            (None, None) => None,
        }
    }

    pub fn with_line_items(mut self, line_items: Vec<LineItem>) -> Self {
        self.line_items = line_items;
        self
    }

    /// The data-model invariant: an order can only be confirmed (or progress further) once it is paid.
    pub fn satisfies_payment_invariant(&self) -> bool {
        !self.order_status.requires_payment() || self.payment_status == PaymentStatus::Paid
    }
}

//--------------------------------------       NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    /// The order id as assigned by the storefront
    pub order_id: OrderId,
    pub buyer: Buyer,
    pub line_items: Vec<NewLineItem>,
    /// The currency of the order
    pub currency: String,
    /// The time the order was placed in the storefront
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, buyer: Buyer, line_items: Vec<NewLineItem>) -> Self {
        Self { order_id, buyer, line_items, currency: DEFAULT_CURRENCY_CODE.to_string(), created_at: Utc::now() }
    }

    pub fn total_price(&self) -> Money {
        self.line_items.iter().map(|li| li.unit_price * li.quantity).sum()
    }
}

//--------------------------------------    EarningsStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EarningsStatus {
    /// Accrued, awaiting payout.
    #[default]
    Pending,
    /// Included in a payout.
    Paid,
    /// Withheld, e.g. while a refund or dispute is open.
    Held,
}

impl Display for EarningsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EarningsStatus::Pending => write!(f, "pending"),
            EarningsStatus::Paid => write!(f, "paid"),
            EarningsStatus::Held => write!(f, "held"),
        }
    }
}

//--------------------------------------    EarningsRecord    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct EarningsRecord {
    pub id: i64,
    pub artist_id: ArtistId,
    pub order_id: OrderId,
    pub line_item_id: i64,
    pub amount: Money,
    /// The artist's rate at the moment of sale. Later profile changes never touch this value.
    pub commission_rate: CommissionRate,
    pub status: EarningsStatus,
    pub payout_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEarningsRecord {
    pub artist_id: ArtistId,
    pub order_id: OrderId,
    pub line_item_id: i64,
    pub amount: Money,
    pub commission_rate: CommissionRate,
}
