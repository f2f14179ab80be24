//! Layered settings for mail, notifications and record naming
//!
//! Sources, later ones winning: built-in defaults, `config.toml`, then
//! `RND_<SECTION>__<KEY>` environment variables. Keep the SMTP password in
//! the environment.

use crate::constants::{DEFAULT_NAMING_PREFIX, QUALITY_MANAGER_ROLE, RND_MANAGER_ROLE};
use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "RND Nutrition".to_string(),
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// SMTP server host
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// Use TLS for SMTP
    pub smtp_tls: bool,
    /// SMTP username (if required)
    pub smtp_username: String,
    /// SMTP password (should be in env var RND_EMAIL__SMTP_PASSWORD)
    #[serde(default)]
    pub smtp_password: String,
    /// From address for emails
    pub from_address: String,
    /// From name for emails
    pub from_name: String,
    /// Log emails instead of sending them
    pub mock: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_tls: true,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "noreply@localhost".to_string(),
            from_name: "RND Nutrition".to_string(),
            mock: true,
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Send notifications at all
    pub enabled: bool,
    /// Roles told about approved formulation changes
    pub approval_roles: Vec<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            approval_roles: vec![
                RND_MANAGER_ROLE.to_string(),
                QUALITY_MANAGER_ROLE.to_string(),
            ],
        }
    }
}

/// Change log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeLogConfig {
    /// Prefix of generated record names
    pub naming_prefix: String,
}

impl Default for ChangeLogConfig {
    fn default() -> Self {
        Self {
            naming_prefix: DEFAULT_NAMING_PREFIX.to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub email: EmailConfig,
    pub notifications: NotificationConfig,
    pub change_log: ChangeLogConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file (optional)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // Override with environment variables (RND_ prefix)
            // e.g., RND_EMAIL__MOCK, RND_SITE__NAME
            .add_source(
                Environment::with_prefix("RND")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reload configuration from file
    pub fn reload() -> Result<(), ConfigError> {
        let new_config = Self::load()?;
        if let Ok(mut config) = APP_CONFIG.write() {
            *config = new_config;
            log::info!("Configuration reloaded");
        }
        Ok(())
    }
}

/// Initialize application configuration
///
/// This triggers the lazy loading of the config file and logs the result.
/// Should be called early in application startup.
pub fn init() {
    let config = get_config();
    log::info!(
        "Configuration loaded: site.name = {}, approval roles = {:?}",
        config.site.name,
        config.notifications.approval_roles
    );
}

// Convenience functions for accessing global config

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

/// Get site configuration
pub fn site() -> SiteConfig {
    get_config().site
}

/// Get email configuration
pub fn email() -> EmailConfig {
    get_config().email
}

/// Get notification configuration
pub fn notifications() -> NotificationConfig {
    get_config().notifications
}

/// Get change log configuration
pub fn change_log() -> ChangeLogConfig {
    get_config().change_log
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.site.name, "RND Nutrition");
        assert_eq!(config.email.smtp_port, 587);
        assert!(config.email.mock);
        assert_eq!(config.change_log.naming_prefix, "FCL-");
    }

    #[test]
    fn test_default_approval_roles() {
        let config = AppConfig::default();
        assert!(config.notifications.enabled);
        assert_eq!(
            config.notifications.approval_roles,
            vec!["RND Manager".to_string(), "Quality Manager".to_string()]
        );
    }

    #[test]
    #[serial]
    fn test_load_from_toml_file() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[site]
name = "Feed Lab"

[email]
smtp_host = "smtp.example.com"
from_address = "lab@example.com"
mock = false

[notifications]
approval_roles = ["Quality Manager"]

[change_log]
naming_prefix = "CHG-"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(temp_file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.site.name, "Feed Lab");
        assert_eq!(config.email.smtp_host, "smtp.example.com");
        assert_eq!(config.email.from_address, "lab@example.com");
        assert!(!config.email.mock);
        assert_eq!(
            config.notifications.approval_roles,
            vec!["Quality Manager".to_string()]
        );
        assert_eq!(config.change_log.naming_prefix, "CHG-");
        // Defaults should still apply for unspecified values
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.site.base_url, "http://localhost:8000");
    }

    #[test]
    #[serial]
    fn test_missing_config_file_uses_defaults() {
        let config = AppConfig::load_from_path("/nonexistent/config.toml").unwrap();
        assert_eq!(config.site.name, "RND Nutrition");
        assert_eq!(config.notifications.approval_roles.len(), 2);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        std::env::set_var("RND_EMAIL__SMTP_HOST", "mail.internal");
        let config = AppConfig::load_from_path("/nonexistent/config.toml");
        std::env::remove_var("RND_EMAIL__SMTP_HOST");

        assert_eq!(config.unwrap().email.smtp_host, "mail.internal");
    }

    #[test]
    #[serial]
    fn test_global_accessors_fall_back_to_defaults() {
        init();
        assert!(AppConfig::reload().is_ok());
        assert_eq!(site().name, "RND Nutrition");
        assert_eq!(change_log().naming_prefix, "FCL-");
        assert!(notifications().enabled);
        assert!(email().mock);
    }
}
