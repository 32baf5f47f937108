//! `askgeorge doctor`: config validation and environment audit.
//!
//! Prints a report with `[ok]`, `[warn]`, `[fail]`, `[skip]`, or `[info]`
//! per item and exits non-zero when any check fails.

use std::path::Path;

use {
    anyhow::Result,
    askgeorge_config::{AskGeorgeConfig, Severity, ValidationResult},
    secrecy::{ExposeSecret, Secret},
};

use crate::app;

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Skip,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Skip => DIM,
            Self::Info => CYAN,
        }
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Fail,
            Severity::Warning => Self::Warn,
            Severity::Info => Self::Info,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }
}

// ── Printing ────────────────────────────────────────────────────────────────

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
            match item.status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                _ => {},
            }
        }
        eprintln!();
    }

    (errors, warnings)
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub async fn handle_doctor() -> Result<()> {
    let config_dir = askgeorge_config::config_dir();
    let data_dir = askgeorge_config::data_dir();
    let config_file = askgeorge_config::find_config_file();

    eprintln!("{BOLD}askgeorge doctor{RESET}");
    eprintln!("{BOLD}================{RESET}\n");

    let config = askgeorge_config::discover_and_load();
    let db_path = app::db_path(&config);

    let sections = vec![
        check_config(config_file.as_deref()),
        check_directories(config_dir.as_deref(), &data_dir),
        check_database(&db_path).await,
        check_credentials(&config),
    ];

    let (errors, warnings) = print_report(&sections);
    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ── 1. Config validation ────────────────────────────────────────────────────

fn validate_file(path: &Path) -> ValidationResult {
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    if is_toml {
        match std::fs::read_to_string(path) {
            Ok(raw) => return askgeorge_config::validate_toml(&raw, Some(path.to_path_buf())),
            Err(e) => {
                let mut result = ValidationResult::default();
                result.push(Severity::Error, "syntax", "", format!("cannot read: {e}"));
                return result;
            },
        }
    }
    match askgeorge_config::load_config(path) {
        Ok(config) => ValidationResult {
            config_path: Some(path.to_path_buf()),
            ..askgeorge_config::validate(&config)
        },
        Err(e) => {
            let mut result = ValidationResult::default();
            result.push(Severity::Error, "syntax", "", format!("{e:#}"));
            result
        },
    }
}

fn check_config(config_file: Option<&Path>) -> Section {
    let Some(path) = config_file else {
        let mut section = Section::new("Config (defaults)");
        section.push(Status::Info, "No askgeorge config file found, using defaults");
        push_diagnostics(
            &mut section,
            &askgeorge_config::validate(&AskGeorgeConfig::default()),
        );
        return section;
    };

    let mut section = Section::new(format!("Config ({})", path.display()));
    let result = validate_file(path);

    let syntax: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.category == "syntax")
        .collect();
    if !syntax.is_empty() {
        for d in syntax {
            section.push(Status::Fail, format!("Syntax: {}", d.message));
        }
        return section;
    }
    section.push(Status::Ok, "Syntax valid");

    if result.diagnostics.iter().all(|d| d.category != "unknown-field") {
        section.push(Status::Ok, "All fields recognized");
    }
    push_diagnostics(&mut section, &result);
    section
}

/// Credentials are reported separately, after env fallbacks are applied.
fn push_diagnostics(section: &mut Section, result: &ValidationResult) {
    for d in &result.diagnostics {
        if d.category == "credentials" {
            continue;
        }
        let msg = if d.path.is_empty() {
            d.message.clone()
        } else {
            format!("{}: {}", d.path, d.message)
        };
        section.push(d.severity.into(), msg);
    }
}

// ── 2. Directories ──────────────────────────────────────────────────────────

fn check_directories(config_dir: Option<&Path>, data_dir: &Path) -> Section {
    let mut section = Section::new("Directories");

    match config_dir {
        Some(dir) if dir.is_dir() => {
            section.push(Status::Ok, format!("Config directory: {}", dir.display()));
        },
        Some(dir) => {
            section.push(
                Status::Info,
                format!("Config directory not created: {}", dir.display()),
            );
        },
        None => section.push(Status::Warn, "Unable to resolve config directory"),
    }

    if data_dir.is_dir() {
        section.push(Status::Ok, format!("Data directory: {}", data_dir.display()));
        check_writable(&mut section, data_dir, "Data directory");
    } else {
        section.push(
            Status::Warn,
            format!(
                "Data directory missing: {} (created by `askgeorge db migrate`)",
                data_dir.display()
            ),
        );
    }

    section
}

fn check_writable(section: &mut Section, dir: &Path, label: &str) {
    let probe = dir.join(".askgeorge-doctor-probe");
    match std::fs::write(&probe, b"probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            section.push(Status::Ok, format!("{label} writable"));
        },
        Err(e) => section.push(Status::Fail, format!("{label} not writable: {e}")),
    }
}

// ── 3. Database ─────────────────────────────────────────────────────────────

async fn check_database(db_path: &Path) -> Section {
    let mut section = Section::new(format!("Database ({})", db_path.display()));

    if !db_path.exists() {
        section.push(
            Status::Skip,
            "Database not found (run `askgeorge db migrate`)",
        );
        return section;
    }

    let db_url = format!("sqlite:{}?mode=ro", db_path.display());
    let pool = match sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            section.push(Status::Fail, format!("Cannot open database: {e}"));
            return section;
        },
    };

    for table in ["sessions", "texts", "places"] {
        let query = format!("SELECT COUNT(*) FROM {table}");
        match sqlx::query_scalar::<_, i64>(&query).fetch_one(&pool).await {
            Ok(0) if table == "places" => {
                section.push(
                    Status::Warn,
                    "places is empty; every search will say no more results",
                );
            },
            Ok(n) => section.push(Status::Ok, format!("{table}: {n} row(s)")),
            Err(e) => section.push(Status::Fail, format!("{table}: {e}")),
        }
    }

    pool.close().await;
    section
}

// ── 4. Credentials ──────────────────────────────────────────────────────────

fn is_set(secret: Option<&Secret<String>>) -> bool {
    secret.is_some_and(|s| !s.expose_secret().is_empty())
}

fn check_credentials(config: &AskGeorgeConfig) -> Section {
    let mut section = Section::new("Credentials");

    if is_set(config.google.api_key.as_ref()) {
        section.push(Status::Ok, "Google Maps API key configured");
    } else {
        section.push(
            Status::Fail,
            "Google Maps API key missing (google.api_key or GOOGLE_MAPS_API_KEY)",
        );
    }

    if is_set(config.bitly.access_token.as_ref()) {
        section.push(Status::Ok, "Bitly access token configured");
    } else {
        section.push(
            Status::Fail,
            "Bitly access token missing (bitly.access_token or BITLY_ACCESS_TOKEN)",
        );
    }

    section
}
