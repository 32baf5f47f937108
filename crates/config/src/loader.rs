use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::AskGeorgeConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "askgeorge.toml",
    "askgeorge.yaml",
    "askgeorge.yml",
    "askgeorge.json",
];

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);
static DATA_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Override the user-global config directory (e.g. from `--config-dir`).
pub fn set_config_dir(dir: PathBuf) {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.lock() {
        *guard = Some(dir);
    }
}

/// Override the data directory (e.g. from `--data-dir`).
pub fn set_data_dir(dir: PathBuf) {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.lock() {
        *guard = Some(dir);
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "askgeorge")
}

/// Returns the user-global config directory (`~/.config/askgeorge/`).
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = CONFIG_DIR_OVERRIDE.lock().ok().and_then(|g| g.clone()) {
        return Some(dir);
    }
    project_dirs().map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory holding the SQLite database.
///
/// Falls back to `./` when the platform has no home directory.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = DATA_DIR_OVERRIDE.lock().ok().and_then(|g| g.clone()) {
        return dir;
    }
    project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<AskGeorgeConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./askgeorge.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/askgeorge/askgeorge.{toml,yaml,yml,json}` (user-global)
///
/// Returns `AskGeorgeConfig::default()` if no config file is found. Credential
/// fallbacks from the environment are applied in every case.
pub fn discover_and_load() -> AskGeorgeConfig {
    let mut config = if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                AskGeorgeConfig::default()
            },
        }
    } else {
        debug!("no config file found, using defaults");
        AskGeorgeConfig::default()
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

/// Fill unset credentials from `GOOGLE_MAPS_API_KEY` and `BITLY_ACCESS_TOKEN`.
pub fn apply_env_overrides(config: &mut AskGeorgeConfig, lookup: impl Fn(&str) -> Option<String>) {
    if config.google.api_key.is_none()
        && let Some(key) = lookup("GOOGLE_MAPS_API_KEY").filter(|k| !k.is_empty())
    {
        config.google.api_key = Some(Secret::new(key));
    }
    if config.bitly.access_token.is_none()
        && let Some(token) = lookup("BITLY_ACCESS_TOKEN").filter(|t| !t.is_empty())
    {
        config.bitly.access_token = Some(Secret::new(token));
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<AskGeorgeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
