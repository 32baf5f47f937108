//! Per-sender session state and inbound text history.
//!
//! A session tracks where the sender is searching, how many result pages
//! they have seen, and when they last texted. Rows are never deleted.

pub mod error;
pub mod store;

pub use {
    error::{Error, Result},
    store::{SessionState, SessionStore, SqliteSessionStore, TextRecord},
};

/// Run database migrations for the sessions crate.
///
/// Creates the `sessions` and `texts` tables. Shares the `_sqlx_migrations`
/// ledger with `askgeorge_places::run_migrations`, hence `ignore_missing`.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
