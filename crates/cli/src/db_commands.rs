use {
    clap::Subcommand,
    std::path::{Path, PathBuf},
};

use crate::app;

#[derive(Subcommand)]
pub enum DbAction {
    /// Delete the database file (sessions, text history and places).
    Reset,
    /// Run all pending database migrations.
    Migrate,
}

pub async fn handle_db(action: DbAction, db_path: &Path) -> anyhow::Result<()> {
    match action {
        DbAction::Reset => reset_database(db_path),
        DbAction::Migrate => run_migrations(db_path).await,
    }
}

/// The database file plus the WAL and SHM files SQLite may leave beside it.
fn db_files(db_path: &Path) -> Vec<PathBuf> {
    ["", "-wal", "-shm"]
        .iter()
        .map(|suffix| {
            let mut name = db_path.as_os_str().to_os_string();
            name.push(suffix);
            PathBuf::from(name)
        })
        .collect()
}

fn reset_database(db_path: &Path) -> anyhow::Result<()> {
    let mut deleted = false;
    for path in db_files(db_path) {
        if path.exists() {
            std::fs::remove_file(&path)?;
            println!("Deleted: {}", path.display());
            deleted = true;
        }
    }

    if deleted {
        println!("Database deleted. Run `askgeorge db migrate` to recreate it.");
    } else {
        println!("No database found at {}", db_path.display());
    }
    Ok(())
}

async fn run_migrations(db_path: &Path) -> anyhow::Result<()> {
    println!("Running migrations for {}...", db_path.display());
    let pool = app::connect(db_path).await?;
    pool.close().await;
    println!("All migrations complete.");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, tempfile::TempDir};

    #[test]
    fn db_files_include_sidecars() {
        let files = db_files(Path::new("/data/askgeorge.db"));
        assert_eq!(files, vec![
            PathBuf::from("/data/askgeorge.db"),
            PathBuf::from("/data/askgeorge.db-wal"),
            PathBuf::from("/data/askgeorge.db-shm"),
        ]);
    }

    #[tokio::test]
    async fn migrate_then_reset_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("askgeorge.db");

        handle_db(DbAction::Migrate, &path).await.unwrap();
        assert!(path.exists());

        handle_db(DbAction::Reset, &path).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn reset_without_database_is_ok() {
        let dir = TempDir::new().unwrap();
        handle_db(DbAction::Reset, &dir.path().join("missing.db"))
            .await
            .unwrap();
    }
}
