use cucumber::given;
use settlement_engine::db_types::{ArtistId, CommissionRate, DesignId};

use crate::cucumber::{SettlementSystem, SettlementWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut SettlementWorld) {
    let system = SettlementSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "artist {word} with a commission rate of {word}")]
async fn artist_profile(world: &mut SettlementWorld, artist: String, rate: String) {
    let rate = rate.parse::<CommissionRate>().expect("Invalid commission rate");
    world.db().upsert_artist_profile(&ArtistId::from(artist), None, rate).await.expect("Error saving artist profile");
}

#[given(expr = "design {word} by artist {word}")]
async fn design_by_artist(world: &mut SettlementWorld, design: String, artist: String) {
    world
        .db()
        .insert_design(&DesignId::from(design), &ArtistId::from(artist), None)
        .await
        .expect("Error saving design");
}
