use crate::models::{TableSettings, UserConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment};
use std::fs;

/// Prefix for environment variables that override file settings,
/// e.g. `USERTABLE_ENDPOINT` or `USERTABLE_REQUEST_TIMEOUT`.
pub const ENV_PREFIX: &str = "USERTABLE";

/// Configuration manager for loading and saving the YAML configuration file.
///
/// Manages `UserTable Config.yaml` inside a configuration directory. Values
/// read from the file can be overridden by `USERTABLE_*` environment variables.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory,
    /// creating the directory if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            user_config_path: config_dir.join("UserTable Config.yaml"),
            config_dir,
        })
    }

    /// Load the user configuration with environment overrides applied.
    ///
    /// A missing file yields defaults.
    pub fn load_user_config(&self) -> Result<UserConfig> {
        let mut config = self.load_user_config_file()?;
        Self::apply_overrides(
            &mut config.settings,
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )?;
        Ok(config)
    }

    /// Load the user configuration file only, ignoring the environment.
    pub fn load_user_config_file(&self) -> Result<UserConfig> {
        if !self.user_config_path.exists() {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
            return Ok(UserConfig::default());
        }

        let file_contents = fs::read_to_string(&self.user_config_path)
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let config: UserConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        tracing::info!("Loaded user config from {}", self.user_config_path);
        Ok(config)
    }

    /// Layer values from `source` on top of `settings`.
    ///
    /// Keys are the lowercase field names (`endpoint`, `request_timeout`,
    /// `debug_mode`, `log_directory`). Keys that are absent leave the current
    /// value alone; keys that are present but unparsable are an error.
    pub fn apply_overrides(settings: &mut TableSettings, source: Environment) -> Result<()> {
        let overrides = Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read environment overrides")?;

        if let Some(endpoint) = Self::lookup(&overrides, "endpoint", Config::get_string)? {
            tracing::info!("Endpoint overridden from environment: {}", endpoint);
            settings.endpoint = endpoint;
        }
        if let Some(timeout) = Self::lookup(&overrides, "request_timeout", Config::get_int)? {
            settings.request_timeout = u32::try_from(timeout)
                .with_context(|| format!("Request timeout out of range: {}", timeout))?;
        }
        if let Some(debug) = Self::lookup(&overrides, "debug_mode", Config::get_bool)? {
            settings.debug_mode = debug;
        }
        if let Some(dir) = Self::lookup(&overrides, "log_directory", Config::get_string)? {
            settings.log_directory = dir;
        }

        Ok(())
    }

    fn lookup<T>(
        overrides: &Config,
        key: &str,
        get: impl Fn(&Config, &str) -> Result<T, config::ConfigError>,
    ) -> Result<Option<T>> {
        match get(overrides, key) {
            Ok(value) => Ok(Some(value)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Invalid override for {}", key)),
        }
    }

    /// Save the user configuration file.
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn user_config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }
}
