use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{ArtistId, CommissionRate, DesignId};

pub async fn fetch_artist_for_design(
    design_id: &DesignId,
    conn: &mut SqliteConnection,
) -> Result<Option<ArtistId>, sqlx::Error> {
    let artist: Option<(ArtistId,)> = sqlx::query_as("SELECT artist_id FROM designs WHERE design_id = $1")
        .bind(design_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(artist.map(|(id,)| id))
}

pub async fn fetch_commission_rate(
    artist_id: &ArtistId,
    conn: &mut SqliteConnection,
) -> Result<Option<CommissionRate>, sqlx::Error> {
    let rate: Option<(CommissionRate,)> =
        sqlx::query_as("SELECT commission_rate FROM artist_profiles WHERE artist_id = $1")
            .bind(artist_id.as_str())
            .fetch_optional(conn)
            .await?;
    Ok(rate.map(|(r,)| r))
}

/// Creates the artist's profile, or changes the rate of an existing one. Earnings already recorded keep their rate.
pub async fn upsert_artist_profile(
    artist_id: &ArtistId,
    display_name: Option<&str>,
    rate: CommissionRate,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO artist_profiles (artist_id, display_name, commission_rate) VALUES ($1, $2, $3)
            ON CONFLICT (artist_id) DO UPDATE SET
                display_name = COALESCE(excluded.display_name, display_name),
                commission_rate = excluded.commission_rate,
                updated_at = CURRENT_TIMESTAMP;
        "#,
    )
    .bind(artist_id.as_str())
    .bind(display_name)
    .bind(rate)
    .execute(conn)
    .await?;
    debug!("🎨️ Artist {artist_id} earns {rate} per sale");
    Ok(())
}

pub async fn insert_design(
    design_id: &DesignId,
    artist_id: &ArtistId,
    title: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO designs (design_id, artist_id, title) VALUES ($1, $2, $3)
            ON CONFLICT (design_id) DO UPDATE SET artist_id = excluded.artist_id, title = excluded.title;
        "#,
    )
    .bind(design_id.as_str())
    .bind(artist_id.as_str())
    .bind(title)
    .execute(conn)
    .await?;
    debug!("🎨️ Design {design_id} belongs to {artist_id}");
    Ok(())
}
