//! Point-of-interest storage and nearest-neighbour paging.

pub mod error;
pub mod geo;
pub mod store;

pub use {
    error::{Error, Result},
    store::{NewPlace, Place, PlaceStore, SqlitePlaceStore},
};

/// Run database migrations for the places crate.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
