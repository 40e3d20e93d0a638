use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{CoreError, Result};

const DEFAULT_API_VERSION: &str = "9.2";
const DEFAULT_SOLUTION_PREFIX: &str = "RibbonExport";
const DEFAULT_OUTPUT_DIR: &str = "ribbon-export";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_EXPORT_TIMEOUT_SECS: u64 = 600;

/// Target organization and pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgConfig {
    /// Organization root, e.g. `https://contoso.crm.dynamics.com`
    #[serde(default)]
    pub organization_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Unique name of the publisher that owns exported solutions
    #[serde(default)]
    pub publisher_unique_name: String,
    #[serde(default = "default_solution_prefix")]
    pub solution_prefix: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_export_timeout_secs")]
    pub export_timeout_secs: u64,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_solution_prefix() -> String {
    DEFAULT_SOLUTION_PREFIX.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_export_timeout_secs() -> u64 {
    DEFAULT_EXPORT_TIMEOUT_SECS
}

impl OrgConfig {
    pub fn new(
        organization_url: impl Into<String>,
        publisher_unique_name: impl Into<String>,
    ) -> Self {
        Self {
            organization_url: organization_url.into(),
            api_version: default_api_version(),
            publisher_unique_name: publisher_unique_name.into(),
            solution_prefix: default_solution_prefix(),
            output_dir: default_output_dir(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            export_timeout_secs: DEFAULT_EXPORT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_solution_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.solution_prefix = prefix.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_timeouts(mut self, request: Duration, export: Duration) -> Self {
        self.request_timeout_secs = request.as_secs().max(1);
        self.export_timeout_secs = export.as_secs().max(1);
        self
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigMissing(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "Config loaded successfully");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast when a required field is absent.
    pub fn validate(&self) -> Result<()> {
        if self.organization_url.trim().is_empty() {
            return Err(CoreError::ConfigMissing("organization_url".to_string()));
        }
        if self.api_version.trim().is_empty() {
            return Err(CoreError::ConfigMissing("api_version".to_string()));
        }
        if self.publisher_unique_name.trim().is_empty() {
            return Err(CoreError::ConfigMissing("publisher_unique_name".to_string()));
        }
        if self.solution_prefix.trim().is_empty() {
            return Err(CoreError::ConfigMissing("solution_prefix".to_string()));
        }
        if !self.organization_url.starts_with("http://")
            && !self.organization_url.starts_with("https://")
        {
            return Err(CoreError::InvalidConfig(format!(
                "organization_url must be an http(s) URL: {}",
                self.organization_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.export_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "export_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `{organization_url}/api/data/v{api_version}`
    pub fn api_base_url(&self) -> String {
        format!(
            "{}/api/data/v{}",
            self.organization_url.trim_end_matches('/'),
            self.api_version.trim_start_matches('v')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }
}
