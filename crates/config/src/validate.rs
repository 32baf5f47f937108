//! Configuration validation.
//!
//! Detects unknown/misspelled fields in TOML files and reports settings that
//! would make the assistant misbehave at runtime.

use std::{collections::HashMap, path::PathBuf};

use secrecy::ExposeSecret;

use crate::schema::AskGeorgeConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "value", "credentials"
    pub category: &'static str,
    /// Dotted path, e.g. "search.page_size"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Append a diagnostic.
    pub fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Check a loaded config for values the assistant cannot run with.
#[must_use]
pub fn validate(config: &AskGeorgeConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_values(config, &mut result);
    result
}

/// Validate raw TOML text: syntax, unknown fields, then values.
#[must_use]
pub fn validate_toml(raw: &str, config_path: Option<PathBuf>) -> ValidationResult {
    let mut result = ValidationResult {
        diagnostics: Vec::new(),
        config_path,
    };

    let value: toml::Value = match toml::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            result.push(Severity::Error, "syntax", "", e.to_string());
            return result;
        },
    };
    check_unknown_fields(&value, &schema_map(), "", &mut result);

    match value.try_into::<AskGeorgeConfig>() {
        Ok(config) => check_values(&config, &mut result),
        Err(e) => result.push(Severity::Error, "syntax", "", e.to_string()),
    }
    result
}

fn check_values(config: &AskGeorgeConfig, result: &mut ValidationResult) {
    if config.search.page_size == 0 {
        result.push(
            Severity::Error,
            "value",
            "search.page_size",
            "page size must be at least 1",
        );
    }
    if config.search.tz().is_none() {
        result.push(
            Severity::Error,
            "value",
            "search.timezone",
            format!("unknown IANA timezone \"{}\"", config.search.timezone),
        );
    }
    if config.search.inactivity_minutes == 0 {
        result.push(
            Severity::Warning,
            "value",
            "search.inactivity_minutes",
            "every sender is treated as idle, so NEXT always returns the help text",
        );
    }
    if config
        .google
        .api_key
        .as_ref()
        .is_none_or(|k| k.expose_secret().is_empty())
    {
        result.push(
            Severity::Warning,
            "credentials",
            "google.api_key",
            "not set (GOOGLE_MAPS_API_KEY); address searches will fail",
        );
    }
    if config
        .bitly
        .access_token
        .as_ref()
        .is_none_or(|t| t.expose_secret().is_empty())
    {
        result.push(
            Severity::Warning,
            "credentials",
            "bitly.access_token",
            "not set (BITLY_ACCESS_TOKEN); result pages will fail to render",
        );
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration schema.
enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

fn schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    let leaves = |keys: &[&'static str]| Struct(keys.iter().map(|k| (*k, Leaf)).collect());

    Struct(HashMap::from([
        ("server", leaves(&["bind", "port"])),
        ("database", leaves(&["path"])),
        (
            "google",
            leaves(&["api_key", "geocode_url", "place_details_url"]),
        ),
        ("bitly", leaves(&["access_token", "api_url", "domain"])),
        (
            "search",
            leaves(&["page_size", "inactivity_minutes", "timezone"]),
        ),
        (
            "messages",
            leaves(&[
                "help",
                "not_found",
                "ambiguous",
                "no_more_results",
                "more_hint",
            ]),
        ),
        ("metrics", leaves(&["enabled"])),
    ]))
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    result: &mut ValidationResult,
) {
    let (KnownKeys::Struct(fields), toml::Value::Table(table)) = (schema, value) else {
        return;
    };
    for (key, child) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match fields.get(key.as_str()) {
            Some(known) => check_unknown_fields(child, known, &path, result),
            None => {
                let hint = fields
                    .keys()
                    .find(|k| edit_distance(k, key) <= 2)
                    .map(|k| format!(" (did you mean \"{k}\"?)"))
                    .unwrap_or_default();
                result.push(
                    Severity::Warning,
                    "unknown-field",
                    path,
                    format!("unknown field \"{key}\"{hint}"),
                );
            },
        }
    }
}

/// Levenshtein distance, used for "did you mean" hints.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut cur = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        prev = cur;
    }
    prev[b.len()]
}
