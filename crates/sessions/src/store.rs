use std::time::Duration;

use {
    askgeorge_common::types::{Coordinate, SenderOrigin},
    async_trait::async_trait,
    sqlx::SqlitePool,
    tracing::debug,
};

use crate::error::{Context, Error, Result};

/// Persisted state for one sender.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub sender: String,
    pub origin: SenderOrigin,
    /// Coordinate of the sender's current search, set once a search succeeds.
    pub active_location: Option<Coordinate>,
    /// Unix epoch milliseconds of the last inbound text.
    pub last_active_at: Option<i64>,
    /// Count of completed result pages for the current search.
    pub next_page_no: u32,
    /// True until any activity has been recorded for the sender.
    pub is_first_contact: bool,
    pub created_at: i64,
}

/// One inbound text from the history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub sender: String,
    pub body: String,
    pub received_at: i64,
}

/// Read/write access to per-sender session state.
///
/// Timestamps are passed in by the caller so the reply pipeline's clock is the
/// only source of "now".
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the sender's session. Fails with [`Error::DuplicateSession`] when
    /// the sender owns more than one row.
    async fn find_session(&self, sender: &str) -> Result<Option<SessionState>>;
    async fn create_session(
        &self,
        sender: &str,
        origin: &SenderOrigin,
        now_ms: i64,
    ) -> Result<SessionState>;
    async fn update_active_location(&self, sender: &str, location: Coordinate) -> Result<()>;
    async fn active_location(&self, sender: &str) -> Result<Option<Coordinate>>;
    async fn record_message(&self, sender: &str, body: &str, now_ms: i64) -> Result<()>;
    async fn touch_last_active(&self, sender: &str, now_ms: i64) -> Result<()>;
    /// Time since the last recorded activity, `None` when nothing was recorded.
    async fn last_active_age(&self, sender: &str, now_ms: i64) -> Result<Option<Duration>>;
    async fn page_cursor(&self, sender: &str) -> Result<u32>;
    async fn set_page_cursor(&self, sender: &str, page_no: u32) -> Result<()>;
    /// Most recent texts first.
    async fn recent_messages(&self, sender: &str, limit: u32) -> Result<Vec<TextRecord>>;
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    sender: String,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    zip: Option<String>,
    active_lat: Option<f64>,
    active_lng: Option<f64>,
    last_active_at: Option<i64>,
    next_page_no: i64,
    created_at: i64,
}

impl TryFrom<SessionRow> for SessionState {
    type Error = Error;

    fn try_from(r: SessionRow) -> Result<Self> {
        let next_page_no = u32::try_from(r.next_page_no)
            .with_context(|| format!("page cursor for {} out of range", r.sender))?;
        Ok(Self {
            active_location: match (r.active_lat, r.active_lng) {
                (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
                _ => None,
            },
            is_first_contact: r.last_active_at.is_none(),
            last_active_at: r.last_active_at,
            next_page_no,
            origin: SenderOrigin {
                city: r.city,
                state: r.state,
                country: r.country,
                zip: r.zip,
            },
            sender: r.sender,
            created_at: r.created_at,
        })
    }
}

/// SQLite-backed session store.
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn expect_updated(sender: &str, rows_affected: u64) -> Result<()> {
    if rows_affected == 0 {
        return Err(Error::not_found(sender));
    }
    Ok(())
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn find_session(&self, sender: &str) -> Result<Option<SessionState>> {
        let mut rows = sqlx::query_as::<_, SessionRow>(
            "SELECT sender, city, state, country, zip, active_lat, active_lng,
                    last_active_at, next_page_no, created_at
             FROM sessions WHERE sender = ?",
        )
        .bind(sender)
        .fetch_all(&self.pool)
        .await?;

        match rows.len() {
            0 => Ok(None),
            1 => rows.pop().map(SessionState::try_from).transpose(),
            count => Err(Error::DuplicateSession {
                sender: sender.to_string(),
                count,
            }),
        }
    }

    async fn create_session(
        &self,
        sender: &str,
        origin: &SenderOrigin,
        now_ms: i64,
    ) -> Result<SessionState> {
        sqlx::query(
            "INSERT INTO sessions (sender, city, state, country, zip, next_page_no, created_at)
             VALUES (?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(sender)
        .bind(&origin.city)
        .bind(&origin.state)
        .bind(&origin.country)
        .bind(&origin.zip)
        .bind(now_ms)
        .execute(&self.pool)
        .await?;
        debug!(sender, "session created");

        Ok(SessionState {
            sender: sender.to_string(),
            origin: origin.clone(),
            active_location: None,
            last_active_at: None,
            next_page_no: 0,
            is_first_contact: true,
            created_at: now_ms,
        })
    }

    async fn update_active_location(&self, sender: &str, location: Coordinate) -> Result<()> {
        let result =
            sqlx::query("UPDATE sessions SET active_lat = ?, active_lng = ? WHERE sender = ?")
                .bind(location.lat)
                .bind(location.lng)
                .bind(sender)
                .execute(&self.pool)
                .await?;
        expect_updated(sender, result.rows_affected())
    }

    async fn active_location(&self, sender: &str) -> Result<Option<Coordinate>> {
        let row = sqlx::query_as::<_, (Option<f64>, Option<f64>)>(
            "SELECT active_lat, active_lng FROM sessions WHERE sender = ?",
        )
        .bind(sender)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some((Some(lat), Some(lng))) => Some(Coordinate::new(lat, lng)),
            _ => None,
        })
    }

    async fn record_message(&self, sender: &str, body: &str, now_ms: i64) -> Result<()> {
        sqlx::query("INSERT INTO texts (sender, body, received_at) VALUES (?, ?, ?)")
            .bind(sender)
            .bind(body)
            .bind(now_ms)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch_last_active(&self, sender: &str, now_ms: i64) -> Result<()> {
        let result = sqlx::query("UPDATE sessions SET last_active_at = ? WHERE sender = ?")
            .bind(now_ms)
            .bind(sender)
            .execute(&self.pool)
            .await?;
        expect_updated(sender, result.rows_affected())
    }

    async fn last_active_age(&self, sender: &str, now_ms: i64) -> Result<Option<Duration>> {
        let last = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT last_active_at FROM sessions WHERE sender = ?",
        )
        .bind(sender)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found(sender))?;

        Ok(last.map(|at| {
            let elapsed = u64::try_from(now_ms.saturating_sub(at)).unwrap_or(0);
            Duration::from_millis(elapsed)
        }))
    }

    async fn page_cursor(&self, sender: &str) -> Result<u32> {
        let page_no =
            sqlx::query_scalar::<_, i64>("SELECT next_page_no FROM sessions WHERE sender = ?")
                .bind(sender)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| Error::not_found(sender))?;
        u32::try_from(page_no).context("stored page cursor out of range")
    }

    async fn set_page_cursor(&self, sender: &str, page_no: u32) -> Result<()> {
        let result = sqlx::query("UPDATE sessions SET next_page_no = ? WHERE sender = ?")
            .bind(i64::from(page_no))
            .bind(sender)
            .execute(&self.pool)
            .await?;
        expect_updated(sender, result.rows_affected())
    }

    async fn recent_messages(&self, sender: &str, limit: u32) -> Result<Vec<TextRecord>> {
        let rows = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT sender, body, received_at FROM texts
             WHERE sender = ?
             ORDER BY received_at DESC, id DESC
             LIMIT ?",
        )
        .bind(sender)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(sender, body, received_at)| TextRecord {
                sender,
                body,
                received_at,
            })
            .collect())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, sqlx::sqlite::SqlitePoolOptions};

    async fn test_store() -> SqliteSessionStore {
        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::run_migrations(&pool).await.unwrap();
        SqliteSessionStore::new(pool)
    }

    fn origin() -> SenderOrigin {
        SenderOrigin {
            city: Some("BROOKLYN".into()),
            state: Some("NY".into()),
            country: Some("US".into()),
            zip: Some("11201".into()),
        }
    }

    #[tokio::test]
    async fn find_missing_session() {
        let store = test_store().await;
        assert!(store.find_session("+15550001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_then_find() {
        let store = test_store().await;
        let created = store
            .create_session("+15550001", &origin(), 1_700_000_000_000)
            .await
            .unwrap();
        assert!(created.is_first_contact);
        assert_eq!(created.next_page_no, 0);

        let found = store.find_session("+15550001").await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn duplicate_rows_are_a_fault() {
        let store = test_store().await;
        store.create_session("+15550001", &origin(), 1).await.unwrap();
        store.create_session("+15550001", &origin(), 2).await.unwrap();

        let err = store.find_session("+15550001").await.unwrap_err();
        assert!(matches!(err, Error::DuplicateSession { count: 2, .. }));
    }

    #[tokio::test]
    async fn touch_clears_first_contact_and_ages() {
        let store = test_store().await;
        store.create_session("+15550001", &origin(), 0).await.unwrap();
        assert_eq!(
            store.last_active_age("+15550001", 5_000).await.unwrap(),
            None
        );

        store.touch_last_active("+15550001", 60_000).await.unwrap();
        let age = store.last_active_age("+15550001", 660_000).await.unwrap();
        assert_eq!(age, Some(Duration::from_secs(600)));

        let session = store.find_session("+15550001").await.unwrap().unwrap();
        assert!(!session.is_first_contact);
        assert_eq!(session.last_active_at, Some(60_000));
    }

    #[tokio::test]
    async fn clock_skew_ages_to_zero() {
        let store = test_store().await;
        store.create_session("+15550001", &origin(), 0).await.unwrap();
        store.touch_last_active("+15550001", 10_000).await.unwrap();
        assert_eq!(
            store.last_active_age("+15550001", 9_000).await.unwrap(),
            Some(Duration::ZERO)
        );
    }

    #[tokio::test]
    async fn active_location_round_trip() {
        let store = test_store().await;
        store.create_session("+15550001", &origin(), 0).await.unwrap();
        assert!(store.active_location("+15550001").await.unwrap().is_none());

        let here = Coordinate::new(40.6943, -73.9903);
        store
            .update_active_location("+15550001", here)
            .await
            .unwrap();
        assert_eq!(store.active_location("+15550001").await.unwrap(), Some(here));
    }

    #[tokio::test]
    async fn page_cursor_updates() {
        let store = test_store().await;
        store.create_session("+15550001", &origin(), 0).await.unwrap();
        assert_eq!(store.page_cursor("+15550001").await.unwrap(), 0);

        store.set_page_cursor("+15550001", 3).await.unwrap();
        assert_eq!(store.page_cursor("+15550001").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn writes_for_unknown_sender_fail() {
        let store = test_store().await;
        assert!(matches!(
            store.set_page_cursor("+15559999", 1).await.unwrap_err(),
            Error::NotFound { .. }
        ));
        assert!(matches!(
            store.page_cursor("+15559999").await.unwrap_err(),
            Error::NotFound { .. }
        ));
        assert!(store.last_active_age("+15559999", 0).await.is_err());
    }

    #[tokio::test]
    async fn message_history_newest_first() {
        let store = test_store().await;
        store.record_message("+15550001", "hi", 1).await.unwrap();
        store.record_message("+15550001", "Brooklyn", 2).await.unwrap();
        store.record_message("+15550002", "other", 3).await.unwrap();
        store.record_message("+15550001", "next", 4).await.unwrap();

        let texts = store.recent_messages("+15550001", 2).await.unwrap();
        let bodies: Vec<_> = texts.iter().map(|t| t.body.as_str()).collect();
        assert_eq!(bodies, ["next", "Brooklyn"]);
    }
}
