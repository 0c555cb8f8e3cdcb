use crate::{
    db_types::{ArtistId, CommissionRate, DesignId},
    traits::SettlementDbError,
};

/// Read access to the catalogue and artist profiles, as far as settlement needs it.
#[allow(async_fn_in_trait)]
pub trait ArtistProfiles {
    /// The artist who owns the design, or `None` if the design no longer exists.
    async fn fetch_artist_for_design(&self, design_id: &DesignId) -> Result<Option<ArtistId>, SettlementDbError>;

    /// The artist's commission rate as it stands right now, or `None` if the artist has no profile.
    async fn fetch_artist_commission_rate(
        &self,
        artist_id: &ArtistId,
    ) -> Result<Option<CommissionRate>, SettlementDbError>;
}
