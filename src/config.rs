//! Client configuration for the API host, site identity, guard landing path and
//! the durable state directory. Defaults live here; the CLI layers its flags and
//! their `FOLIO_*` environment fallbacks on top through [`Overrides`].
//! Configuration values are public; do not store secrets here.

use directories::ProjectDirs;
use std::{path::PathBuf, time::Duration};

pub const DEFAULT_SITE_NAME: &str = "Rajorshi Tah";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub site_name: String,
    pub landing_path: String,
    pub state_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            site_name: DEFAULT_SITE_NAME.to_string(),
            landing_path: crate::paths::DASHBOARD.to_string(),
            state_dir: default_state_dir(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Applies every override that is set; unset fields keep their value.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(value) = overrides.api_base_url {
            self.api_base_url = value;
        }
        if let Some(value) = overrides.site_name {
            self.site_name = value;
        }
        if let Some(value) = overrides.landing_path {
            self.landing_path = value;
        }
        if let Some(value) = overrides.state_dir {
            self.state_dir = PathBuf::from(value);
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
    }
}

/// Optional configuration values, already trimmed and empty-filtered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    pub api_base_url: Option<String>,
    pub site_name: Option<String>,
    pub landing_path: Option<String>,
    pub state_dir: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Trims a raw value and rejects it when empty.
#[must_use]
pub fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn default_state_dir() -> PathBuf {
    ProjectDirs::from("dev", "folio", "folio")
        .map_or_else(|| PathBuf::from(".folio"), |dirs| dirs.data_dir().to_path_buf())
}
