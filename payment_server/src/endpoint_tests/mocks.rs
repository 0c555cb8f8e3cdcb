use mockall::mock;
use pod_common::Money;
use razorpay_tools::{GatewayOrder, RazorpayApiError};
use settlement_engine::{
    db_types::{ArtistId, CommissionRate, DesignId, EarningsRecord, NewEarningsRecord, NewOrder, Order, OrderId},
    traits::{
        ArtistProfiles,
        CommitOutcome,
        EarningsManagement,
        InsertEarningsResult,
        OrderManagement,
        SettlementCommit,
        SettlementDatabase,
        SettlementDbError,
        StateGuard,
    },
};

use crate::integrations::razorpay::PaymentGateway;

mock! {
    pub Database {}
    impl Clone for Database {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for Database {
        async fn create_order(&self, order: NewOrder) -> Result<Order, SettlementDbError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, SettlementDbError>;
        async fn fetch_order_by_gateway_order_id(&self, gateway_order_id: &str) -> Result<Option<Order>, SettlementDbError>;
        async fn update_order_status(&self, expected: &StateGuard, updated: &Order) -> Result<Option<Order>, SettlementDbError>;
    }
    impl EarningsManagement for Database {
        async fn insert_earnings_record(&self, record: NewEarningsRecord) -> Result<InsertEarningsResult, SettlementDbError>;
        async fn fetch_earnings_for_line_item(&self, line_item_id: i64) -> Result<Option<EarningsRecord>, SettlementDbError>;
        async fn fetch_earnings_for_order(&self, order_id: &OrderId) -> Result<Vec<EarningsRecord>, SettlementDbError>;
        async fn fetch_earnings_for_artist(&self, artist_id: &ArtistId) -> Result<Vec<EarningsRecord>, SettlementDbError>;
    }
    impl ArtistProfiles for Database {
        async fn fetch_artist_for_design(&self, design_id: &DesignId) -> Result<Option<ArtistId>, SettlementDbError>;
        async fn fetch_artist_commission_rate(&self, artist_id: &ArtistId) -> Result<Option<CommissionRate>, SettlementDbError>;
    }
    impl SettlementDatabase for Database {
        fn url(&self) -> &str;
        async fn commit_settlement(&self, commit: SettlementCommit) -> Result<CommitOutcome, SettlementDbError>;
        async fn insert_earnings_records(&self, records: Vec<NewEarningsRecord>) -> Result<Vec<InsertEarningsResult>, SettlementDbError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_gateway_order(&self, order_id: &OrderId, amount: Money, currency: &str) -> Result<GatewayOrder, RazorpayApiError>;
    }
}
