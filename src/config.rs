#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::metadata::LevelFilter;

use crate::{
    constants::{DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PROJECT_COLOR, DEFAULT_PROJECT_ICON},
    error::ConfigurationError,
};

/// Phabricator instance and credentials.
#[derive(Clone)]
pub struct PhabricatorEnv {
    /// Base URL of the instance, without a trailing slash.
    base_url:  String,
    /// Conduit API token.
    api_token: String,
}

impl PhabricatorEnv {
    /// Builds the credential bundle, normalising the base URL.
    fn new(url: String, token: String) -> Self {
        Self {
            base_url:  url.trim().trim_end_matches('/').to_string(),
            api_token: token.trim().to_string(),
        }
    }

    /// Returns the base URL of the instance.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the Conduit endpoint for `method`.
    pub fn endpoint(&self, method: &str) -> String {
        format!("{}/api/{method}", self.base_url)
    }

    /// Returns the Conduit API token.
    pub fn api_token(&self) -> &str {
        &self.api_token
    }
}

impl std::fmt::Debug for PhabricatorEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhabricatorEnv")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Settings shared by every workflow.
#[derive(Debug)]
pub struct ConfigState {
    /// Phabricator credentials.
    phabricator:   PhabricatorEnv,
    /// PHIDs added to every student project, eg. course staff.
    admin_phids:   Vec<String>,
    /// Icon for created projects.
    project_icon:  String,
    /// Color for created projects.
    project_color: String,
    /// Fixed seed for marker allocation, if any.
    seed:          Option<u64>,
    /// Timeout applied to each Conduit request.
    http_timeout:  Duration,
    /// Verbosity of the log output.
    log_level:     LevelFilter,
}

impl ConfigState {
    /// Reads settings from the process environment.
    fn new() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let url =
            read("PHABRICATOR_URL").ok_or(ConfigurationError::MissingSetting("PHABRICATOR_URL"))?;
        let token = read("PHABRICATOR_API_TOKEN")
            .ok_or(ConfigurationError::MissingSetting("PHABRICATOR_API_TOKEN"))?;

        let admin_phids = read("PHABRICATOR_ADMIN_PHIDS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let seed = read("PROPH_ALLOCATION_SEED")
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|e| ConfigurationError::InvalidSetting {
                        name:   "PROPH_ALLOCATION_SEED",
                        value:  raw.clone(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        let http_timeout = read("PROPH_HTTP_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| ConfigurationError::InvalidSetting {
                        name:   "PROPH_HTTP_TIMEOUT_SECS",
                        value:  raw.clone(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));

        let log_level = read("PROPH_LOG")
            .map(|raw| {
                raw.parse::<LevelFilter>()
                    .map_err(|e| ConfigurationError::InvalidSetting {
                        name:   "PROPH_LOG",
                        value:  raw.clone(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?
            .unwrap_or(LevelFilter::INFO);

        Ok(Self {
            phabricator: PhabricatorEnv::new(url, token),
            admin_phids,
            project_icon: read("PROPH_PROJECT_ICON")
                .unwrap_or_else(|| DEFAULT_PROJECT_ICON.to_string()),
            project_color: read("PROPH_PROJECT_COLOR")
                .unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()),
            seed,
            http_timeout,
            log_level,
        })
    }

    /// Returns the Phabricator credentials.
    pub fn phabricator(&self) -> &PhabricatorEnv {
        &self.phabricator
    }

    /// Returns the PHIDs appended to every student project.
    pub fn admin_phids(&self) -> &[String] {
        &self.admin_phids
    }

    /// Returns the icon for created projects.
    pub fn project_icon(&self) -> &str {
        &self.project_icon
    }

    /// Returns the color for created projects.
    pub fn project_color(&self) -> &str {
        &self.project_color
    }

    /// Returns the fixed allocation seed, if configured.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the per-request timeout.
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    /// Returns the configured log level.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    /// Builds an HTTP client honouring the configured timeout.
    pub fn http_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.http_timeout)
            // Avoid macOS dynamic store lookups that fail in sandboxed environments.
            .no_proxy()
            .build()
            .context("Failed to construct shared HTTP client")
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone, Debug)]
pub struct ConfigHandle(Arc<ConfigState>);

impl ConfigHandle {
    /// Wraps an explicitly built configuration.
    pub fn new(state: ConfigState) -> Self {
        Self(Arc::new(state))
    }
}

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ConfigState>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ConfigState>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Ensure the global configuration has been initialized and return a handle.
pub fn ensure_initialized() -> Result<ConfigHandle> {
    let mut guard = slot()
        .lock()
        .map_err(|_| anyhow::anyhow!("config slot poisoned"))?;
    if let Some(cfg) = guard.as_ref() {
        return Ok(ConfigHandle(Arc::clone(cfg)));
    }

    let cfg = Arc::new(ConfigState::new().context("Could not load configuration")?);
    *guard = Some(Arc::clone(&cfg));
    Ok(ConfigHandle(cfg))
}
