use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::{
    batch::{BatchOptions, DEFAULT_BATCH_DELAY, DEFAULT_BATCH_SIZE},
    seed::DEFAULT_SEED_COUNT,
};

pub const DEFAULT_SETTINGS_FILE: &str = "roster.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid server url '{url}': {source}")]
    InvalidServerUrl { url: String, source: url::ParseError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub seed_count: usize,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:4943".into(),
            request_timeout_secs: 30,
            seed_count: DEFAULT_SEED_COUNT,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: DEFAULT_BATCH_DELAY.as_millis() as u64,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            batch_size: self.batch_size,
            delay: Duration::from_millis(self.batch_delay_ms),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        Url::parse(&self.server_url).map_err(|source| SettingsError::InvalidServerUrl {
            url: self.server_url.clone(),
            source,
        })?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
    seed_count: Option<usize>,
    batch_size: Option<usize>,
    batch_delay_ms: Option<u64>,
}

/// Defaults, then the settings file, then environment overrides.
///
/// With no explicit path a missing `roster.toml` is not an error; an
/// explicit path must exist.
pub fn load_settings(path: Option<&Path>) -> Result<ClientSettings, SettingsError> {
    let mut settings = ClientSettings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };

    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &path, &raw)?,
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(SettingsError::Read { path, source }),
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, path: &Path, raw: &str) -> Result<(), SettingsError> {
    let file_cfg: FileSettings = toml::from_str(raw).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.seed_count {
        settings.seed_count = v;
    }
    if let Some(v) = file_cfg.batch_size {
        settings.batch_size = v;
    }
    if let Some(v) = file_cfg.batch_delay_ms {
        settings.batch_delay_ms = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    if let Some(v) = lookup("ROSTER_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = parse_env("APP__REQUEST_TIMEOUT_SECS", v)?;
    }
    if let Some(v) = lookup("APP__SEED_COUNT") {
        settings.seed_count = parse_env("APP__SEED_COUNT", v)?;
    }
    if let Some(v) = lookup("APP__BATCH_SIZE") {
        settings.batch_size = parse_env("APP__BATCH_SIZE", v)?;
    }
    if let Some(v) = lookup("APP__BATCH_DELAY_MS") {
        settings.batch_delay_ms = parse_env("APP__BATCH_DELAY_MS", v)?;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidValue { key, value })
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
