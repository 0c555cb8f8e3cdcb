use cucumber::World;
use log::*;
use pod_common::Secret;
use settlement_engine::{
    events::EventProducers,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    SettlementApi,
    SettlementError,
    SettlementResult,
    SqliteDatabase,
};

pub const MERCHANT_SECRET: &str = "rzp_test_secret";

#[derive(Default, Debug, World)]
pub struct SettlementWorld {
    pub system: Option<SettlementSystem>,
    pub last_result: Option<Result<SettlementResult, SettlementError>>,
}

#[derive(Debug)]
pub struct SettlementSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub api: SettlementApi<SqliteDatabase>,
}

impl SettlementWorld {
    pub fn system(&self) -> &SettlementSystem {
        self.system.as_ref().expect("Settlement system not initialised")
    }

    pub fn api(&self) -> &SettlementApi<SqliteDatabase> {
        &self.system().api
    }

    pub fn db(&self) -> &SqliteDatabase {
        &self.system().db
    }

    pub fn last_result(&self) -> &Result<SettlementResult, SettlementError> {
        self.last_result.as_ref().expect("No settlement has been attempted yet")
    }
}

impl SettlementSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let secret = Secret::new(MERCHANT_SECRET.to_string());
        let api = SettlementApi::new(db.clone(), secret, EventProducers::default());
        Self { db_path: url, db, api }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
