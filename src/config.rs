//! Configuration loading via `ortho-config`.
//!
//! Each provider has its own layered configuration: defaults, then a
//! provider-specific file, then environment variables. The two providers share
//! key names such as `api_key`, so they never read the same file.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Production endpoint of the DigitalOcean v1 API.
pub const DIGITAL_OCEAN_API_BASE: &str = "https://api.digitalocean.com/v1";

/// Production endpoint of the JiffyBox API.
pub const JIFFYBOX_API_BASE: &str = "https://api.jiffybox.de";

const APP_NAME: &str = "boxctl";

/// DigitalOcean account credentials and droplet defaults.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "DIGITAL_OCEAN",
    discovery(
        app_name = "boxctl",
        env_var = "BOXCTL_DIGITAL_OCEAN_CONFIG_PATH",
        config_file_name = "digitalocean.toml",
        dotfile_name = ".boxctl-digitalocean.toml",
        project_file_name = "boxctl-digitalocean.toml"
    )
)]
pub struct DigitalOceanConfig {
    /// Client identifier sent with every request. Required.
    pub client_id: Option<String>,
    /// API key sent with every request. Required.
    pub api_key: Option<String>,
    /// Region used by `create` when no flag overrides it.
    #[ortho_config(default = 2)]
    pub default_region_id: u64,
    /// Size used by `create` when no flag overrides it.
    #[ortho_config(default = 66)]
    pub default_size_id: u64,
    /// Image used by `create` when no flag overrides it.
    #[ortho_config(default = 350_076)]
    pub default_image_id: u64,
    /// SSH key installed on new droplets.
    pub default_ssh_key: Option<u64>,
    /// API endpoint; overridden in tests.
    #[ortho_config(default = DIGITAL_OCEAN_API_BASE.to_owned())]
    pub api_base: String,
}

/// JiffyBox credentials and box defaults.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "JIFFYBOX",
    discovery(
        app_name = "boxctl",
        env_var = "BOXCTL_JIFFYBOX_CONFIG_PATH",
        config_file_name = "jiffybox.toml",
        dotfile_name = ".boxctl-jiffybox.toml",
        project_file_name = "boxctl-jiffybox.toml"
    )
)]
pub struct JiffyBoxConfig {
    /// API key embedded in every request path. Required.
    pub api_key: Option<String>,
    /// Plan used by `create` when no flag overrides it.
    #[ortho_config(default = 20)]
    pub default_plan_id: u64,
    /// Distribution used by `create` when no flag overrides it.
    #[ortho_config(default = "ubuntu_12_4_lts_64bit".to_owned())]
    pub default_distribution: String,
    /// Root password for new and cloned boxes.
    pub default_password: Option<String>,
    /// API endpoint; overridden in tests.
    #[ortho_config(default = JIFFYBOX_API_BASE.to_owned())]
    pub api_base: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
    file: &'static str,
}

impl FieldMetadata {
    const fn new(
        description: &'static str,
        env_var: &'static str,
        toml_key: &'static str,
        file: &'static str,
    ) -> Self {
        Self {
            description,
            env_var,
            toml_key,
            file,
        }
    }

    fn message(&self) -> String {
        format!(
            "missing {}: set {} or add {} to {}",
            self.description, self.env_var, self.toml_key, self.file
        )
    }
}

/// Appends a message for `metadata` when `value` is absent or blank.
fn require(value: Option<&str>, metadata: &FieldMetadata, missing: &mut Vec<String>) {
    if value.is_none_or(|text| text.trim().is_empty()) {
        missing.push(metadata.message());
    }
}

fn require_non_empty(value: &str, metadata: &FieldMetadata, missing: &mut Vec<String>) {
    require(Some(value), metadata, missing);
}

fn finish(missing: Vec<String>) -> Result<(), ConfigError> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingFields(missing))
    }
}

impl DigitalOceanConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from(APP_NAME)])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Checks that both credentials are present, reporting every missing one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFields`] naming each absent credential.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const FILE: &str = "digitalocean.toml";
        let mut missing = Vec::new();
        require(
            self.client_id.as_deref(),
            &FieldMetadata::new(
                "DigitalOcean client id",
                "DIGITAL_OCEAN_CLIENT_ID",
                "client_id",
                FILE,
            ),
            &mut missing,
        );
        require(
            self.api_key.as_deref(),
            &FieldMetadata::new(
                "DigitalOcean API key",
                "DIGITAL_OCEAN_API_KEY",
                "api_key",
                FILE,
            ),
            &mut missing,
        );
        require_non_empty(
            &self.api_base,
            &FieldMetadata::new("API endpoint", "DIGITAL_OCEAN_API_BASE", "api_base", FILE),
            &mut missing,
        );
        finish(missing)
    }
}

impl JiffyBoxConfig {
    /// Loads configuration without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from(APP_NAME)])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Checks that the API key is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFields`] naming each absent field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const FILE: &str = "jiffybox.toml";
        let mut missing = Vec::new();
        require(
            self.api_key.as_deref(),
            &FieldMetadata::new("JiffyBox API key", "JIFFYBOX_API_KEY", "api_key", FILE),
            &mut missing,
        );
        require_non_empty(
            &self.default_distribution,
            &FieldMetadata::new(
                "default distribution",
                "JIFFYBOX_DEFAULT_DISTRIBUTION",
                "default_distribution",
                FILE,
            ),
            &mut missing,
        );
        require_non_empty(
            &self.api_base,
            &FieldMetadata::new("API endpoint", "JIFFYBOX_API_BASE", "api_base", FILE),
            &mut missing,
        );
        finish(missing)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// One or more required fields are empty or missing; one message per field.
    #[error("{}", .0.join("\n"))]
    MissingFields(Vec<String>),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// The HTTP client could not be built from the configuration.
    #[error("unable to build HTTP client: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn digital_ocean() -> DigitalOceanConfig {
        DigitalOceanConfig {
            client_id: Some(String::from("client")),
            api_key: Some(String::from("secret")),
            default_region_id: 2,
            default_size_id: 66,
            default_image_id: 350_076,
            default_ssh_key: None,
            api_base: String::from(DIGITAL_OCEAN_API_BASE),
        }
    }

    #[fixture]
    fn jiffybox() -> JiffyBoxConfig {
        JiffyBoxConfig {
            api_key: Some(String::from("jb-key")),
            default_plan_id: 20,
            default_distribution: String::from("ubuntu_12_4_lts_64bit"),
            default_password: None,
            api_base: String::from(JIFFYBOX_API_BASE),
        }
    }

    #[rstest]
    fn complete_digital_ocean_config_is_valid(digital_ocean: DigitalOceanConfig) {
        assert_eq!(digital_ocean.validate(), Ok(()));
    }

    #[rstest]
    fn both_missing_credentials_are_reported(digital_ocean: DigitalOceanConfig) {
        let cfg = DigitalOceanConfig {
            client_id: None,
            api_key: Some(String::from("  ")),
            ..digital_ocean
        };

        let ConfigError::MissingFields(fields) = cfg.validate().expect_err("must fail") else {
            panic!("expected MissingFields");
        };
        assert_eq!(fields.len(), 2);
        assert!(fields.first().is_some_and(|m| m.contains("DIGITAL_OCEAN_CLIENT_ID")));
        assert!(fields.get(1).is_some_and(|m| m.contains("DIGITAL_OCEAN_API_KEY")));
    }

    #[rstest]
    fn missing_field_message_is_actionable(digital_ocean: DigitalOceanConfig) {
        let cfg = DigitalOceanConfig {
            api_key: None,
            ..digital_ocean
        };

        let message = cfg.validate().expect_err("must fail").to_string();
        assert_eq!(
            message,
            "missing DigitalOcean API key: set DIGITAL_OCEAN_API_KEY or add api_key to digitalocean.toml"
        );
    }

    #[rstest]
    fn jiffybox_requires_api_key(jiffybox: JiffyBoxConfig) {
        assert_eq!(jiffybox.validate(), Ok(()));

        let cfg = JiffyBoxConfig {
            api_key: None,
            ..jiffybox
        };
        let message = cfg.validate().expect_err("must fail").to_string();
        assert!(message.contains("JIFFYBOX_API_KEY"), "{message}");
        assert!(message.contains("jiffybox.toml"), "{message}");
    }

    #[rstest]
    fn messages_are_joined_one_per_line() {
        let err = ConfigError::MissingFields(vec![String::from("a"), String::from("b")]);
        assert_eq!(err.to_string(), "a\nb");
    }
}
