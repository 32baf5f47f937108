//! Wiring shared by `serve` and `text`: database, providers, reply pipeline.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    askgeorge_auto_reply::{AutoReply, Collaborators, ReplySettings},
    askgeorge_config::AskGeorgeConfig,
    askgeorge_places::SqlitePlaceStore,
    askgeorge_providers::{bitly::BitlyShortener, google::GoogleMapsClient},
    askgeorge_sessions::SqliteSessionStore,
    sqlx::SqlitePool,
    tracing::{debug, info},
};

pub const DB_FILE_NAME: &str = "askgeorge.db";

/// Database file: `database.path` when set, else `<data_dir>/askgeorge.db`.
pub fn db_path(config: &AskGeorgeConfig) -> PathBuf {
    config
        .database
        .path
        .clone()
        .unwrap_or_else(|| askgeorge_config::data_dir().join(DB_FILE_NAME))
}

pub fn db_url(path: &Path) -> String {
    format!("sqlite:{}?mode=rwc", path.display())
}

/// Open (creating if needed) the database and bring its schema up to date.
pub async fn connect(path: &Path) -> anyhow::Result<SqlitePool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let pool = SqlitePool::connect(&db_url(path)).await?;
    migrate(&pool).await?;
    debug!(path = %path.display(), "database ready");
    Ok(pool)
}

/// Run every crate's migrations against one pool.
pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    askgeorge_sessions::run_migrations(pool)
        .await
        .map_err(|e| anyhow::anyhow!("sessions migrations failed: {e}"))?;
    askgeorge_places::run_migrations(pool)
        .await
        .map_err(|e| anyhow::anyhow!("places migrations failed: {e}"))?;
    Ok(())
}

/// Build the reply pipeline backed by SQLite and the live providers.
///
/// Fails when the Google or Bitly credentials are missing.
pub fn build_auto_reply(config: &AskGeorgeConfig, pool: SqlitePool) -> anyhow::Result<AutoReply> {
    let google = Arc::new(GoogleMapsClient::from_config(&config.google)?);
    let bitly = Arc::new(BitlyShortener::from_config(&config.bitly)?);

    let settings = ReplySettings::from_config(&config.search, &config.messages);
    info!(
        page_size = settings.page_size,
        inactivity_secs = settings.inactivity.as_secs(),
        timezone = %settings.timezone,
        "reply pipeline configured"
    );

    Ok(AutoReply::new(
        Collaborators {
            sessions: Arc::new(SqliteSessionStore::new(pool.clone())),
            places: Arc::new(SqlitePlaceStore::new(pool)),
            geocoder: google.clone(),
            details: google,
            shortener: bitly,
        },
        settings,
    ))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, askgeorge_config::DatabaseConfig, tempfile::TempDir};

    #[test]
    fn configured_db_path_wins() {
        let config = AskGeorgeConfig {
            database: DatabaseConfig {
                path: Some(PathBuf::from("/srv/george/live.db")),
            },
            ..Default::default()
        };
        assert_eq!(db_path(&config), PathBuf::from("/srv/george/live.db"));
    }

    #[test]
    fn default_db_path_is_in_data_dir() {
        let path = db_path(&AskGeorgeConfig::default());
        assert!(path.ends_with(DB_FILE_NAME));
    }

    #[test]
    fn db_url_creates_missing_file() {
        assert_eq!(
            db_url(Path::new("/tmp/a.db")),
            "sqlite:/tmp/a.db?mode=rwc"
        );
    }

    #[tokio::test]
    async fn connect_creates_parent_and_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(DB_FILE_NAME);

        let pool = connect(&path).await.unwrap();
        assert!(path.exists());

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap();
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert!(names.contains(&"sessions"));
        assert!(names.contains(&"texts"));
        assert!(names.contains(&"places"));

        // Running again against an up-to-date schema is a no-op.
        migrate(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn missing_credentials_fail_wiring() {
        let dir = TempDir::new().unwrap();
        let pool = connect(&dir.path().join(DB_FILE_NAME)).await.unwrap();
        assert!(build_auto_reply(&AskGeorgeConfig::default(), pool).is_err());
    }
}
