//! Configuration types for the DDNS system
//!
//! This module defines the per-run configuration consumed by the reconciler
//! and the timeouts bounding a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Upper bound for a single address source request
pub const MAX_SOURCE_TIMEOUT_SECS: u64 = 5;

/// Configuration of one reconciliation run
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
#[derive(Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Provider zone identifier
    pub zone_id: String,

    /// Provider API token
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Record name to keep up to date (e.g., "home.example.com")
    pub hostname: String,

    /// Address to publish instead of detecting one
    #[serde(default)]
    pub explicit_ip: Option<String>,

    /// Whether AAAA records are managed
    #[serde(default = "default_ipv6_enabled")]
    pub ipv6_enabled: bool,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("zone_id", &self.zone_id)
            .field("api_token", &"<REDACTED>")
            .field("hostname", &self.hostname)
            .field("explicit_ip", &self.explicit_ip)
            .field("ipv6_enabled", &self.ipv6_enabled)
            .finish()
    }
}

impl RunConfig {
    /// Create a new configuration with IPv6 enabled and no explicit address
    pub fn new(
        zone_id: impl Into<String>,
        api_token: impl Into<String>,
        hostname: impl Into<String>,
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            api_token: api_token.into(),
            hostname: hostname.into(),
            explicit_ip: None,
            ipv6_enabled: default_ipv6_enabled(),
        }
    }

    /// Publish `ip` instead of detecting the IPv4 address
    pub fn with_explicit_ip(mut self, ip: impl Into<String>) -> Self {
        self.explicit_ip = Some(ip.into());
        self
    }

    /// Enable or disable AAAA handling
    pub fn with_ipv6(mut self, enabled: bool) -> Self {
        self.ipv6_enabled = enabled;
        self
    }

    /// The explicit address, if one was given and it is not empty
    ///
    /// The text is returned as given. Surrounding whitespace is not stripped.
    pub fn explicit_ip(&self) -> Option<&str> {
        self.explicit_ip.as_deref().filter(|ip| !ip.is_empty())
    }

    /// Validate the configuration
    ///
    /// Fails with `MissingCredentials` naming every blank required field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let missing: Vec<&str> = [
            ("zone id", &self.zone_id),
            ("api token", &self.api_token),
            ("hostname", &self.hostname),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(crate::Error::missing_credentials(format!(
                "{} required",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}

fn default_ipv6_enabled() -> bool {
    true
}

/// Timeouts bounding a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Overall bound for one reconciliation run (in seconds)
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Bound for a single address source request (in seconds)
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,
}

impl TimeoutConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.run_timeout_secs == 0 {
            return Err(crate::Error::config("Run timeout must be > 0"));
        }
        if !(1..=MAX_SOURCE_TIMEOUT_SECS).contains(&self.source_timeout_secs) {
            return Err(crate::Error::config(format!(
                "Source timeout must be between 1 and {} seconds. Got: {}",
                MAX_SOURCE_TIMEOUT_SECS, self.source_timeout_secs
            )));
        }
        Ok(())
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            run_timeout_secs: default_run_timeout_secs(),
            source_timeout_secs: default_source_timeout_secs(),
        }
    }
}

fn default_run_timeout_secs() -> u64 {
    30
}

fn default_source_timeout_secs() -> u64 {
    MAX_SOURCE_TIMEOUT_SECS
}
