use std::{fs, io, path::Path};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AdError, Result};

pub const DEFAULT_SETTINGS_FILE: &str = "native_ad.toml";

/// Configuration injected into the registry; nothing here is read from
/// process-wide state after construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdSettings {
    /// Unit id used by `load` when the caller does not pass one.
    pub default_unit_id: Option<String>,
    /// Per-stream broadcast buffer; slower listeners lose the oldest events.
    pub event_capacity: usize,
    pub inbound_capacity: usize,
}

impl Default for AdSettings {
    fn default() -> Self {
        Self {
            default_unit_id: None,
            event_capacity: 1024,
            inbound_capacity: 256,
        }
    }
}

impl AdSettings {
    pub fn with_default_unit_id(unit_id: impl Into<String>) -> Self {
        Self {
            default_unit_id: Some(unit_id.into()),
            ..Self::default()
        }
    }

    /// The configured default unit id, ignoring blank values.
    pub fn default_unit_id(&self) -> Option<&str> {
        self.default_unit_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    fn normalized(mut self) -> Self {
        self.event_capacity = self.event_capacity.max(1);
        self.inbound_capacity = self.inbound_capacity.max(1);
        self
    }
}

/// Reads `path` if present, then applies environment overrides.
pub fn load_settings(path: impl AsRef<Path>) -> Result<AdSettings> {
    let path = path.as_ref();
    let settings = match fs::read_to_string(path) {
        Ok(raw) => parse_settings(&raw)
            .map_err(|err| AdError::Settings(format!("{}: {err}", path.display())))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, using defaults");
            AdSettings::default()
        }
        Err(err) => {
            return Err(AdError::Settings(format!(
                "failed to read {}: {err}",
                path.display()
            )))
        }
    };

    Ok(apply_env_overrides(settings, |key| std::env::var(key).ok()))
}

pub fn parse_settings(raw: &str) -> std::result::Result<AdSettings, toml::de::Error> {
    toml::from_str::<AdSettings>(raw).map(AdSettings::normalized)
}

fn apply_env_overrides(
    mut settings: AdSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> AdSettings {
    if let Some(v) = lookup("NATIVE_AD_DEFAULT_UNIT_ID") {
        settings.default_unit_id = Some(v);
    }
    if let Some(v) = lookup("APP__DEFAULT_UNIT_ID") {
        settings.default_unit_id = Some(v);
    }

    if let Some(v) = lookup("APP__EVENT_CAPACITY") {
        match v.parse::<usize>() {
            Ok(parsed) => settings.event_capacity = parsed,
            Err(_) => warn!(value = %v, "ignoring unparsable APP__EVENT_CAPACITY"),
        }
    }
    if let Some(v) = lookup("APP__INBOUND_CAPACITY") {
        match v.parse::<usize>() {
            Ok(parsed) => settings.inbound_capacity = parsed,
            Err(_) => warn!(value = %v, "ignoring unparsable APP__INBOUND_CAPACITY"),
        }
    }

    settings.normalized()
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
