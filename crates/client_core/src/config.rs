use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context};
use url::Url;

pub const SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub session_file: PathBuf,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            request_timeout_secs: 30,
            upload_timeout_secs: 120,
            session_file: default_session_file(),
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("receipts")
        .join("session.json")
}

/// Defaults, then `client.toml` in the working directory, then environment.
pub fn load_settings() -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("failed to read {SETTINGS_FILE}"))?;
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings.api_url = normalize_api_url(&settings.api_url)?;
    Ok(settings)
}

pub fn apply_file_overrides(settings: &mut ClientSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    if let Some(v) = file_cfg.get("api_url") {
        settings.api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("request_timeout_secs") {
        settings.request_timeout_secs = v
            .parse()
            .with_context(|| format!("invalid request_timeout_secs '{v}'"))?;
    }
    if let Some(v) = file_cfg.get("upload_timeout_secs") {
        settings.upload_timeout_secs = v
            .parse()
            .with_context(|| format!("invalid upload_timeout_secs '{v}'"))?;
    }
    if let Some(v) = file_cfg.get("session_file") {
        settings.session_file = PathBuf::from(v);
    }
    Ok(())
}

pub fn apply_env_overrides(settings: &mut ClientSettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("RECEIPTS_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Some(v) = env("APP__UPLOAD_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.upload_timeout_secs = parsed;
        }
    }

    if let Some(v) = env("APP__SESSION_FILE") {
        settings.session_file = PathBuf::from(v);
    }
}

/// Validates the API base URL and strips any trailing slash so endpoint
/// paths can be appended verbatim.
pub fn normalize_api_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    let url = Url::parse(raw).with_context(|| format!("invalid api url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("api url '{raw}' must use http or https");
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
