//! Configuration loader
//!
//! Builds a [`Config`] from defaults, an optional file and the environment.
//!
//! ## Loading Strategy
//! 1. Read a `.env` file if one exists (never overrides the real environment)
//! 2. Load the file named by `SLOTLINE_CONFIG`, or the first probed config
//!    file, or fall back to defaults
//! 3. Apply `SLOTLINE_*` environment overrides on top
//! 4. Validate the result
//!
//! ## Environment Variables
//! - `SLOTLINE_CONFIG`: Explicit config file path
//! - `SLOTLINE_PORTAL_TIMEZONE`: IANA time zone of the booking portal
//! - `SLOTLINE_MIN_DISTINCT_SLOTS`: Distinct slots needed for a confident
//!   horizon estimate
//! - `SLOTLINE_MIN_OBSERVATIONS`: Observations needed for a confident estimate
//! - `SLOTLINE_BURST_MIN_SLOTS`: Newly listed slots that count as an advance
//! - `SLOTLINE_EDGE_MARGIN_DAYS`: Horizon edge margin in days
//! - `SLOTLINE_GRACE_CYCLES`: Cycles a slot may stay listed after its time
//! - `SLOTLINE_PAST_APPOINTMENTS_ONLY`: Report only settled slots (true/false)
//! - `SLOTLINE_WORKERS`: Dedicated worker pool size
//! - `SLOTLINE_LOG_LEVEL`: Default log filter
//! - `SLOTLINE_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./slotline.{toml,json}` then `./config.{toml,json}`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use slotline_domain::constants::ENV_PREFIX;
use slotline_domain::{Config, Result, SlotlineError};

const FILE_STEMS: [&str; 2] = ["slotline", "config"];
const FILE_EXTENSIONS: [&str; 2] = ["toml", "json"];

/// Load configuration with the full layering strategy
///
/// # Errors
/// Returns `SlotlineError::Config` if:
/// - `SLOTLINE_CONFIG` names a missing or unparsable file
/// - A probed file is unparsable
/// - An override has an invalid value
/// - The merged configuration fails validation
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let explicit = std::env::var(env_key("CONFIG")).ok().map(PathBuf::from);
    let mut config = match explicit.or_else(probe_config_paths) {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;

    tracing::info!(
        portal_timezone = %config.horizon.portal_timezone,
        centers = config.centers.len(),
        workers = ?config.reconstruction.workers,
        "Configuration loaded"
    );
    Ok(config)
}

/// Load configuration from defaults plus environment overrides only
///
/// # Errors
/// Returns `SlotlineError::Config` if an override has an invalid value or
/// the result fails validation.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Supports JSON and
/// TOML (detected by file extension). Missing sections take their defaults.
///
/// # Errors
/// Returns `SlotlineError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SlotlineError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SlotlineError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SlotlineError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SlotlineError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SlotlineError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SlotlineError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
        roots.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| {
            FILE_STEMS.iter().flat_map(move |stem| {
                FILE_EXTENSIONS.iter().map(move |ext| root.join(format!("{stem}.{ext}")))
            })
        })
        .find(|path| path.exists())
}

/// Apply `SLOTLINE_*` environment overrides to `config`
///
/// Unset variables leave the current value alone.
///
/// # Errors
/// Returns `SlotlineError::Config` naming the variable when a value does
/// not parse.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(tz) = env_string("PORTAL_TIMEZONE") {
        config.horizon.portal_timezone = tz;
    }
    if let Some(value) = env_parse("MIN_DISTINCT_SLOTS")? {
        config.horizon.min_distinct_slots = value;
    }
    if let Some(value) = env_parse("MIN_OBSERVATIONS")? {
        config.horizon.min_observations = value;
    }
    if let Some(value) = env_parse("BURST_MIN_SLOTS")? {
        config.horizon.burst_min_slots = value;
    }
    if let Some(value) = env_parse("EDGE_MARGIN_DAYS")? {
        config.reconstruction.edge_margin_days = value;
    }
    if let Some(value) = env_parse("GRACE_CYCLES")? {
        config.reconstruction.grace_cycles = value;
    }
    config.reconstruction.past_appointments_only =
        env_bool("PAST_APPOINTMENTS_ONLY", config.reconstruction.past_appointments_only);
    if let Some(value) = env_parse("WORKERS")? {
        config.reconstruction.workers = Some(value);
    }
    if let Some(level) = env_string("LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("LOG_JSON", config.logging.json);
    Ok(())
}

fn env_key(name: &str) -> String {
    format!("{ENV_PREFIX}{name}")
}

/// Non-empty value of `SLOTLINE_<name>`
fn env_string(name: &str) -> Option<String> {
    std::env::var(env_key(name)).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(name)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                SlotlineError::Config(format!("Invalid value for {}: {raw} ({e})", env_key(name)))
            })
        })
        .transpose()
}

/// Parse boolean from `SLOTLINE_<name>`
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(name: &str, default: bool) -> bool {
    env_string(name)
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
