// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::warn;

use crate::compression::DEFAULT_COMPRESSION_LEVEL;
use crate::error::{ConfigurationError, Signal};

pub const DEFAULT_REGION: &str = "us";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const LISTENER_DOMAIN: &str = "example-backend.com";
const KNOWN_REGIONS: [&str; 7] = ["us", "eu", "uk", "au", "ca", "nl", "wa"];

/// Exporter configuration, immutable once an exporter is built from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Token authorizing trace shipping. Empty disables the traces signal.
    pub traces_token: String,
    /// Token authorizing metric shipping. Empty disables the metrics signal.
    pub metrics_token: String,
    /// Listener region code, e.g. `us` or `eu`
    pub region: String,
    /// Full listener URL, overrides the region
    pub custom_endpoint: Option<String>,
    /// Bound on each listener request, in seconds
    pub timeout_secs: u64,
    pub https_proxy: Option<String>,
    /// Gzip level, 0-9
    pub compression_level: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            traces_token: String::new(),
            metrics_token: String::new(),
            region: DEFAULT_REGION.to_string(),
            custom_endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            https_proxy: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ExportConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let traces_token = env::var("LISTENER_TRACES_TOKEN").unwrap_or_default();
        let metrics_token = env::var("LISTENER_METRICS_TOKEN").unwrap_or_default();
        let region = env::var("LISTENER_REGION")
            .map(|val| val.trim().to_lowercase())
            .unwrap_or_else(|_| DEFAULT_REGION.to_string());
        let custom_endpoint = env::var("LISTENER_CUSTOM_ENDPOINT")
            .ok()
            .filter(|val| !val.trim().is_empty());
        let timeout_secs = env::var("LISTENER_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let https_proxy = env::var("LISTENER_PROXY_HTTPS")
            .or_else(|_| env::var("HTTPS_PROXY"))
            .ok();
        let compression_level = env::var("LISTENER_COMPRESSION_LEVEL")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(DEFAULT_COMPRESSION_LEVEL);

        let config = Self {
            traces_token,
            metrics_token,
            region,
            custom_endpoint,
            timeout_secs,
            https_proxy,
            compression_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.traces_enabled() && !self.metrics_enabled() {
            return Err(ConfigurationError::NoToken);
        }

        if self.compression_level > 9 {
            return Err(ConfigurationError::Invalid(format!(
                "compression level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigurationError::Invalid(
                "timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(endpoint) = &self.custom_endpoint {
            let url = reqwest::Url::parse(endpoint).map_err(|e| {
                ConfigurationError::Invalid(format!("custom endpoint '{endpoint}': {e}"))
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigurationError::Invalid(format!(
                    "custom endpoint '{endpoint}' must use http or https"
                )));
            }
        }

        if !self.region.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigurationError::Invalid(format!(
                "region '{}' must be an alphanumeric code",
                self.region
            )));
        }

        Ok(())
    }

    /// Ensures the token of `signal` is set.
    pub fn require(&self, signal: Signal) -> Result<(), ConfigurationError> {
        if self.enabled(signal) {
            Ok(())
        } else {
            Err(ConfigurationError::SignalDisabled(signal))
        }
    }

    #[must_use]
    pub fn enabled(&self, signal: Signal) -> bool {
        match signal {
            Signal::Traces => self.traces_enabled(),
            Signal::Metrics => self.metrics_enabled(),
        }
    }

    #[must_use]
    pub fn traces_enabled(&self) -> bool {
        !self.traces_token.trim().is_empty()
    }

    #[must_use]
    pub fn metrics_enabled(&self) -> bool {
        !self.metrics_token.trim().is_empty()
    }

    #[must_use]
    pub fn token(&self, signal: Signal) -> &str {
        match signal {
            Signal::Traces => self.traces_token.trim(),
            Signal::Metrics => self.metrics_token.trim(),
        }
    }

    /// The URL payloads are posted to.
    #[must_use]
    pub fn listener_url(&self) -> String {
        match &self.custom_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => listener_url_for_region(&self.region),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `us` (or no region) is served by the unprefixed listener.
#[must_use]
pub fn listener_url_for_region(region: &str) -> String {
    let region = region.trim().to_lowercase();
    if region.is_empty() || region == DEFAULT_REGION {
        return format!("https://listener.{LISTENER_DOMAIN}");
    }
    if !KNOWN_REGIONS.contains(&region.as_str()) {
        warn!("Unknown listener region '{region}', using https://listener-{region}.{LISTENER_DOMAIN}");
    }
    format!("https://listener-{region}.{LISTENER_DOMAIN}")
}
