//! Config loader — reads `~/.studykit/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.studykit/config.json`
//! 3. Environment variables `STUDYKIT_<SECTION>__<FIELD>` (override JSON)
//!
//! Plain provider variables such as `GROQ_API_KEY` are not read here; the
//! provider registry falls back to them when a config key is empty.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

const PROVIDER_ENV_NAMES: &[(&str, &str)] = &[
    ("openrouter", "OPENROUTER"),
    ("groq", "GROQ"),
    ("together", "TOGETHER"),
    ("gemini", "GEMINI"),
    ("huggingface", "HUGGINGFACE"),
    ("openai", "OPENAI"),
];

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `STUDYKIT_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `STUDYKIT_PROVIDERS__<NAME>__API_KEY` → `providers.<name>.api_key`
/// - `STUDYKIT_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
/// - `STUDYKIT_PROVIDERS__<NAME>__MODEL` → `providers.<name>.model`
/// - `STUDYKIT_DISPATCH__TIMEOUT_SECS` → `dispatch.timeout_secs`
/// - `STUDYKIT_DISPATCH__MAX_TOKENS` → `dispatch.max_tokens`
/// - `STUDYKIT_DISPATCH__TEMPERATURE` → `dispatch.temperature`
/// - `STUDYKIT_SERVER__HOST` → `server.host`
/// - `STUDYKIT_SERVER__PORT` → `server.port`
fn apply_env_overrides(mut config: Config) -> Config {
    for (name, env_name) in PROVIDER_ENV_NAMES {
        if let Some(provider) = config.providers.get_mut_by_name(name) {
            apply_provider_env(provider, env_name);
        }
    }

    if let Ok(val) = std::env::var("STUDYKIT_DISPATCH__TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.dispatch.timeout_secs = n;
        }
    }
    if let Ok(val) = std::env::var("STUDYKIT_DISPATCH__MAX_TOKENS") {
        if let Ok(n) = val.parse::<u32>() {
            config.dispatch.max_tokens = n;
        }
    }
    if let Ok(val) = std::env::var("STUDYKIT_DISPATCH__TEMPERATURE") {
        if let Ok(t) = val.parse::<f64>() {
            config.dispatch.temperature = t;
        }
    }

    if let Ok(val) = std::env::var("STUDYKIT_SERVER__HOST") {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var("STUDYKIT_SERVER__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.server.port = p;
        }
    }

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(provider: &mut super::schema::ProviderConfig, name: &str) {
    if let Ok(val) = std::env::var(format!("STUDYKIT_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Ok(val) = std::env::var(format!("STUDYKIT_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
    if let Ok(val) = std::env::var(format!("STUDYKIT_PROVIDERS__{name}__MODEL")) {
        provider.model = Some(val);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
