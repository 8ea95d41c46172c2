//! Configuration types for zonesync
//!
//! This module defines all configuration structures used throughout the crate.
//! Nothing here is process-global: a [`SyncConfig`] is passed explicitly to
//! the components that need it.

use crate::model::DEFAULT_API_VERSION;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main zonesync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Audit log configuration
    #[serde(default)]
    pub audit_log: AuditLogConfig,

    /// Change batch limits enforced before submission
    #[serde(default)]
    pub limits: ChangeBatchLimits,

    /// Provider API version, used for endpoint paths and the XML namespace
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Capacity of the progress event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Create a configuration with defaults for everything but the provider
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            audit_log: AuditLogConfig::default(),
            limits: ChangeBatchLimits::default(),
            api_version: default_api_version(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.audit_log.validate()?;
        self.limits.validate()?;

        if self.api_version.trim().is_empty() {
            return Err(crate::Error::config("API version cannot be empty"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Amazon Route 53
    ///
    /// Without explicit keys the standard AWS credential chain is used.
    Route53 {
        /// AWS access key id override
        #[serde(default)]
        access_key_id: Option<String>,
        /// AWS secret access key override
        #[serde(default)]
        secret_access_key: Option<String>,
        /// Session token for explicit temporary credentials
        #[serde(default)]
        session_token: Option<String>,
        /// Endpoint override (tests, compatible services)
        #[serde(default)]
        endpoint: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Route53 {
                access_key_id,
                secret_access_key,
                endpoint,
                ..
            } => {
                match (access_key_id, secret_access_key) {
                    (Some(key), _) if key.is_empty() => {
                        return Err(crate::Error::config("Route 53 access key id cannot be empty"));
                    }
                    (_, Some(secret)) if secret.is_empty() => {
                        return Err(crate::Error::config(
                            "Route 53 secret access key cannot be empty",
                        ));
                    }
                    (Some(_), None) | (None, Some(_)) => {
                        return Err(crate::Error::config(
                            "Route 53 access key id and secret access key must be set together",
                        ));
                    }
                    _ => {}
                }
                if let Some(endpoint) = endpoint {
                    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                        return Err(crate::Error::config(format!(
                            "Route 53 endpoint must be an http(s) URL, got {}",
                            endpoint
                        )));
                    }
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Route53 { .. } => "route53",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

// Credentials stay out of logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::Route53 {
                access_key_id,
                secret_access_key,
                session_token,
                endpoint,
            } => f
                .debug_struct("Route53")
                .field("access_key_id", access_key_id)
                .field(
                    "secret_access_key",
                    &secret_access_key.as_ref().map(|_| "<redacted>"),
                )
                .field("session_token", &session_token.as_ref().map(|_| "<redacted>"))
                .field("endpoint", endpoint)
                .finish(),
            ProviderConfig::Custom { factory, config } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", config)
                .finish(),
        }
    }
}

/// Audit log configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditLogConfig {
    /// No audit trail
    #[default]
    Disabled,

    /// In-memory audit log (not persistent)
    Memory,

    /// JSON file audit log
    File {
        /// Path to the audit file
        path: String,
    },
}

impl AuditLogConfig {
    /// Validate the audit log configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            AuditLogConfig::File { path } if path.trim().is_empty() => {
                Err(crate::Error::config("Audit log path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Provider limits on a single change batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatchLimits {
    /// Maximum number of changes
    #[serde(default = "default_max_changes")]
    pub max_changes: usize,

    /// Maximum number of record values across all changes
    #[serde(default = "default_max_values")]
    pub max_values: usize,

    /// Maximum number of characters across all record values
    #[serde(default = "default_max_value_chars")]
    pub max_value_chars: usize,
}

impl ChangeBatchLimits {
    /// Validate the limits
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_changes == 0 || self.max_values == 0 || self.max_value_chars == 0 {
            return Err(crate::Error::config("Change batch limits must be > 0"));
        }
        Ok(())
    }
}

impl Default for ChangeBatchLimits {
    fn default() -> Self {
        Self {
            max_changes: default_max_changes(),
            max_values: default_max_values(),
            max_value_chars: default_max_value_chars(),
        }
    }
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_max_changes() -> usize {
    100
}

fn default_max_values() -> usize {
    1000
}

fn default_max_value_chars() -> usize {
    10000
}
