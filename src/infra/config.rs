//! Configuration management infrastructure.
//!
//! Signing preferences and certificate issuance settings are persisted as
//! TOML in the user's config directory.

use crate::domain::constants::{
    DEFAULT_CA_COMMON_NAME, DEFAULT_ORGANIZATION, DEFAULT_SIGNED_SUFFIX,
};
use crate::domain::crypto::SerialNumberPolicy;
use crate::domain::envelope::EnvelopeFormat;
use crate::infra::error::{SigningError, SigningResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerConfiguration {
    /// Suffix appended to a document's blob key for its signed copy
    pub signed_suffix: String,

    /// Envelope written when signing
    pub envelope_format: EnvelopeFormat,

    /// Whether the per-signature private key is stored on the record
    pub retain_private_key: bool,

    /// Organization (O) placed in issued certificate subjects
    pub organization: String,

    /// Common name of generated CA certificates
    pub ca_common_name: String,

    /// How certificate serial numbers are chosen
    pub serial_policy: SerialNumberPolicy,

    /// Long-lived CA certificate (PEM), loaded when both CA paths are set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<PathBuf>,

    /// Long-lived CA private key (PEM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_key_path: Option<PathBuf>,
}

impl Default for SignerConfiguration {
    fn default() -> Self {
        Self {
            signed_suffix: DEFAULT_SIGNED_SUFFIX.to_string(),
            envelope_format: EnvelopeFormat::Text,
            retain_private_key: true,
            organization: DEFAULT_ORGANIZATION.to_string(),
            ca_common_name: DEFAULT_CA_COMMON_NAME.to_string(),
            serial_policy: SerialNumberPolicy::Timestamp,
            ca_cert_path: None,
            ca_key_path: None,
        }
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> SigningResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> SigningResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("document-signer").join("config.toml"))
        } else {
            Ok(PathBuf::from("document-signer-config.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> SigningResult<SignerConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = SignerConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> SigningResult<SignerConfiguration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            SigningError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: SignerConfiguration = toml::from_str(&content).map_err(|e| {
            SigningError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &SignerConfiguration) -> SigningResult<()> {
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SigningError::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            SigningError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            SigningError::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        log::info!("Configuration saved successfully");
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(config: &SignerConfiguration) -> SigningResult<()> {
        let suffix = &config.signed_suffix;
        if suffix.is_empty() || suffix.contains('/') || suffix.contains('\\') {
            return Err(SigningError::ConfigurationError(format!(
                "Invalid signed suffix '{suffix}': must be non-empty and contain no path separators"
            )));
        }

        if config.organization.trim().is_empty() {
            return Err(SigningError::ConfigurationError(
                "Organization must not be empty".to_string(),
            ));
        }

        if config.ca_common_name.trim().is_empty() {
            return Err(SigningError::ConfigurationError(
                "CA common name must not be empty".to_string(),
            ));
        }

        if config.ca_cert_path.is_some() != config.ca_key_path.is_some() {
            return Err(SigningError::ConfigurationError(
                "ca_cert_path and ca_key_path must be set together".to_string(),
            ));
        }

        Ok(())
    }

    /// Update a specific configuration value. An empty value clears the
    /// optional CA paths.
    pub fn update_value(&self, key: &str, value: &str) -> SigningResult<()> {
        let mut config = self.load()?;

        match key {
            "signed_suffix" => config.signed_suffix = value.to_string(),
            "envelope_format" => {
                config.envelope_format = value
                    .parse()
                    .map_err(|e: SigningError| SigningError::ConfigurationError(e.to_string()))?;
            }
            "retain_private_key" => {
                config.retain_private_key = value.parse().map_err(|_| {
                    SigningError::ConfigurationError(format!("Invalid boolean value: {value}"))
                })?;
            }
            "organization" => config.organization = value.to_string(),
            "ca_common_name" => config.ca_common_name = value.to_string(),
            "serial_policy" => {
                config.serial_policy = value
                    .parse()
                    .map_err(|e: SigningError| SigningError::ConfigurationError(e.to_string()))?;
            }
            "ca_cert_path" => config.ca_cert_path = optional_path(value),
            "ca_key_path" => config.ca_key_path = optional_path(value),
            _ => {
                return Err(SigningError::ConfigurationError(format!(
                    "Unknown configuration key: {key}"
                )));
            }
        }

        Self::validate(&config)?;
        self.save(&config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Export configuration as a portable format
    pub fn export_config(&self, format: ExportFormat) -> SigningResult<String> {
        let config = self.load()?;

        match format {
            ExportFormat::Toml => toml::to_string_pretty(&config)
                .map_err(|e| SigningError::ConfigurationError(format!("TOML export failed: {e}"))),
            ExportFormat::Json => serde_json::to_string_pretty(&config)
                .map_err(|e| SigningError::ConfigurationError(format!("JSON export failed: {e}"))),
        }
    }

    /// Import configuration from a string
    pub fn import_config(&self, content: &str, format: ExportFormat) -> SigningResult<()> {
        let config: SignerConfiguration = match format {
            ExportFormat::Toml => toml::from_str(content).map_err(|e| {
                SigningError::ConfigurationError(format!("TOML import failed: {e}"))
            })?,
            ExportFormat::Json => serde_json::from_str(content).map_err(|e| {
                SigningError::ConfigurationError(format!("JSON import failed: {e}"))
            })?,
        };

        Self::validate(&config)?;
        self.save(&config)
    }
}

/// Configuration export/import formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Toml,
    Json,
}

impl FromStr for ExportFormat {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(ExportFormat::Toml),
            "json" => Ok(ExportFormat::Json),
            other => Err(SigningError::ConfigurationError(format!(
                "Unknown export format: {other}"
            ))),
        }
    }
}

fn optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}
