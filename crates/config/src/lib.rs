//! Configuration loading, validation, and env substitution.
//!
//! Config files: `askgeorge.toml`, `askgeorge.yaml`, or `askgeorge.json`
//! Searched in `./` then `~/.config/askgeorge/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, config_dir, data_dir, discover_and_load, find_config_file,
        load_config, set_config_dir, set_data_dir,
    },
    schema::{
        AskGeorgeConfig, BitlyConfig, DatabaseConfig, GoogleConfig, MessagesConfig,
        MetricsConfig, SearchConfig, ServerConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_toml},
};
